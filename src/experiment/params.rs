use serde::{Deserialize, Serialize};

use crate::net::NetParameters;
use crate::train::TrainingParameters;

/// Full configuration of one experiment: the architecture to build and
/// the hyperparameters to train it with. Both halves are validated at
/// their own construction, so an `ExperimentParameters` is always
/// runnable. Grid generation over these lives outside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentParameters {
    net_parameters: NetParameters,
    training_parameters: TrainingParameters,
}

impl ExperimentParameters {
    pub fn new(
        net_parameters: NetParameters,
        training_parameters: TrainingParameters,
    ) -> ExperimentParameters {
        ExperimentParameters {
            net_parameters,
            training_parameters,
        }
    }

    pub fn net_parameters(&self) -> &NetParameters {
        &self.net_parameters
    }

    pub fn training_parameters(&self) -> &TrainingParameters {
        &self.training_parameters
    }
}
