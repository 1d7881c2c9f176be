pub mod batches;
pub mod file;
pub mod sample;
pub mod source;

pub use batches::SampleBatches;
pub use file::FileSampleSource;
pub use sample::Sample;
pub use source::{InMemorySampleSource, SampleIter, SampleSource};
