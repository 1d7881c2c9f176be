use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use crate::error::Result;
use crate::samples::source::{SampleIter, SampleSource};
use crate::samples::Sample;

/// Sample source streaming from binary files in the documented byte
/// layout: one (source, target) matrix pair per sample, back to back.
///
/// Files on each side are read in order and concatenated; an optional
/// per-side limit caps how many samples a pass yields. Reads are lazy,
/// so datasets larger than memory stream through untouched.
#[derive(Debug, Clone)]
pub struct FileSampleSource {
    training_files: Vec<PathBuf>,
    training_limit: usize,
    testing_files: Vec<PathBuf>,
    testing_limit: usize,
}

impl FileSampleSource {
    pub fn new(training_files: Vec<PathBuf>, testing_files: Vec<PathBuf>) -> FileSampleSource {
        FileSampleSource {
            training_files,
            training_limit: usize::MAX,
            testing_files,
            testing_limit: usize::MAX,
        }
    }

    /// Caps how many samples each side yields per pass.
    pub fn with_limits(mut self, training_limit: usize, testing_limit: usize) -> FileSampleSource {
        self.training_limit = training_limit;
        self.testing_limit = testing_limit;
        self
    }
}

impl SampleSource for FileSampleSource {
    fn training(&self) -> SampleIter<'_> {
        Box::new(SampleReader::new(
            self.training_limit,
            self.training_files.clone(),
        ))
    }

    fn testing(&self) -> SampleIter<'_> {
        Box::new(SampleReader::new(
            self.testing_limit,
            self.testing_files.clone(),
        ))
    }
}

struct SampleReader {
    limit: usize,
    count: usize,
    files: std::vec::IntoIter<PathBuf>,
    reader: Option<BufReader<File>>,
}

impl SampleReader {
    fn new(limit: usize, files: Vec<PathBuf>) -> SampleReader {
        SampleReader {
            limit,
            count: 0,
            files: files.into_iter(),
            reader: None,
        }
    }
}

impl Iterator for SampleReader {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.count >= self.limit {
            return None;
        }

        loop {
            let Some(reader) = self.reader.as_mut() else {
                match self.files.next() {
                    None => return None,
                    Some(path) => match File::open(&path) {
                        Ok(file) => {
                            self.reader = Some(BufReader::new(file));
                            continue;
                        }
                        Err(error) => return Some(Err(error.into())),
                    },
                }
            };

            // A clean end-of-file moves on to the next file; anything
            // short of a full sample is a stream error.
            match reader.fill_buf() {
                Ok(buffer) if buffer.is_empty() => {
                    self.reader = None;
                    continue;
                }
                Ok(_) => {}
                Err(error) => return Some(Err(error.into())),
            }

            return match Sample::read_from(reader) {
                Ok(sample) => {
                    self.count += 1;
                    Some(Ok(sample))
                }
                Err(error) => {
                    self.reader = None;
                    Some(Err(error))
                }
            };
        }
    }
}
