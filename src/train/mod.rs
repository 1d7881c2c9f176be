pub mod params;
pub mod result;
pub mod tester;
pub mod trainer;

pub use params::TrainingParameters;
pub use result::{StopReason, TrainingResult};
pub use tester::Tester;
pub use trainer::Trainer;
