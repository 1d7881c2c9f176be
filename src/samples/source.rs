use std::sync::Arc;

use crate::error::{Error, Result};
use crate::samples::Sample;

/// Fallible sample stream; an `Err` item aborts the consuming run.
pub type SampleIter<'a> = Box<dyn Iterator<Item = Result<Sample>> + 'a>;

/// Supplier of the two sample streams a training run consumes: the
/// training set iterated every epoch and the held-out testing set
/// evaluated after each epoch.
///
/// Implementations must yield the samples in the same order on every
/// call within one run; the engine relies on repeatable-per-epoch
/// iteration and nothing else. I/O failures surface as `Err` items.
pub trait SampleSource {
    fn training(&self) -> SampleIter<'_>;

    fn testing(&self) -> SampleIter<'_>;
}

impl<S: SampleSource + ?Sized> SampleSource for Arc<S> {
    fn training(&self) -> SampleIter<'_> {
        (**self).training()
    }

    fn testing(&self) -> SampleIter<'_> {
        (**self).testing()
    }
}

impl<S: SampleSource + ?Sized> SampleSource for &S {
    fn training(&self) -> SampleIter<'_> {
        (**self).training()
    }

    fn testing(&self) -> SampleIter<'_> {
        (**self).testing()
    }
}

/// Sample source backed by owned in-memory lists.
#[derive(Debug, Clone, Default)]
pub struct InMemorySampleSource {
    training: Vec<Sample>,
    testing: Vec<Sample>,
}

impl InMemorySampleSource {
    pub fn new(training: Vec<Sample>, testing: Vec<Sample>) -> InMemorySampleSource {
        InMemorySampleSource { training, testing }
    }

    /// Splits one list into training and testing parts. The training
    /// picks are spread evenly across the list rather than taken as a
    /// prefix, so ordered datasets keep both parts representative.
    pub fn from_split(training_ratio: f64, samples: Vec<Sample>) -> Result<InMemorySampleSource> {
        if !(training_ratio > 0.0 && training_ratio < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "training ratio must lie strictly between 0 and 1, got {training_ratio}"
            )));
        }
        if samples.is_empty() {
            return Err(Error::InvalidConfig(
                "cannot split an empty sample list".into(),
            ));
        }

        let mut remaining = samples;
        let count = (remaining.len() as f64 * training_ratio).ceil() as usize;
        let step = remaining.len() as f64 / count as f64;
        let last = remaining.len() - 1;

        let mut training = Vec::with_capacity(count);
        for i in 0..count {
            let index = (last as f64 - i as f64 * step).round().max(0.0) as usize;
            training.push(remaining.remove(index.min(remaining.len() - 1)));
        }
        training.reverse();
        Ok(InMemorySampleSource {
            training,
            testing: remaining,
        })
    }

    pub fn training_len(&self) -> usize {
        self.training.len()
    }

    pub fn testing_len(&self) -> usize {
        self.testing.len()
    }
}

impl SampleSource for InMemorySampleSource {
    fn training(&self) -> SampleIter<'_> {
        Box::new(self.training.iter().cloned().map(Ok))
    }

    fn testing(&self) -> SampleIter<'_> {
        Box::new(self.testing.iter().cloned().map(Ok))
    }
}
