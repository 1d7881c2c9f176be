pub mod activation;
pub mod error;
pub mod experiment;
pub mod math;
pub mod net;
pub mod rate;
pub mod samples;
pub mod train;

// Convenience re-exports
pub use activation::Activation;
pub use error::{Error, Result};
pub use experiment::{Experiment, ExperimentParameters, ExperimentResult, Experimenter};
pub use math::Matrix;
pub use net::{Net, NetParameters};
pub use rate::Rate;
pub use samples::{FileSampleSource, InMemorySampleSource, Sample, SampleBatches, SampleSource};
pub use train::{StopReason, Tester, Trainer, TrainingParameters, TrainingResult};
