use crate::error::Result;
use crate::samples::Sample;

/// Lazy grouping of a sample stream into fixed-size batches.
///
/// Pulls at most `batch_size` samples per step, so the underlying stream
/// is never materialized; the final batch may be shorter. Rebuilding the
/// adaptor from a fresh source iterator restarts it for the next epoch.
/// The first failed sample read ends the stream with that error.
pub struct SampleBatches<I> {
    batch_size: usize,
    samples: I,
    failed: bool,
}

impl<I> SampleBatches<I>
where
    I: Iterator<Item = Result<Sample>>,
{
    pub fn new(batch_size: usize, samples: I) -> SampleBatches<I> {
        debug_assert!(batch_size > 0, "batch_size must be at least 1");
        SampleBatches {
            batch_size,
            samples,
            failed: false,
        }
    }
}

impl<I> Iterator for SampleBatches<I>
where
    I: Iterator<Item = Result<Sample>>,
{
    type Item = Result<Vec<Sample>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            match self.samples.next() {
                Some(Ok(sample)) => batch.push(sample),
                Some(Err(error)) => {
                    self.failed = true;
                    return Some(Err(error));
                }
                None => break,
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}
