pub mod experimenter;
pub mod params;

pub use experimenter::{Experiment, ExperimentResult, Experimenter};
pub use params::ExperimentParameters;
