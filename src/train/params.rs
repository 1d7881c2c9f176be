use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rate::Rate;

/// Hyperparameters of one training run.
///
/// # Fields
/// - `rate`        — learning-rate schedule consulted once per batch update
/// - `max_epochs`  — epoch budget; reaching it stops the run
/// - `batch_size`  — samples per gradient accumulation; `1` for online SGD
/// - `error_limit` — held-out error below which the run stops as converged
///
/// All fields are required and validated here, before a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingParameters {
    rate: Rate,
    max_epochs: usize,
    batch_size: usize,
    error_limit: f64,
}

impl TrainingParameters {
    pub fn new(
        rate: Rate,
        max_epochs: usize,
        batch_size: usize,
        error_limit: f64,
    ) -> Result<TrainingParameters> {
        if max_epochs == 0 {
            return Err(Error::InvalidConfig("max_epochs must be at least 1".into()));
        }
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".into()));
        }
        if !(error_limit.is_finite() && error_limit > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "error_limit must be a positive finite number, got {error_limit}"
            )));
        }
        Ok(TrainingParameters {
            rate,
            max_epochs,
            batch_size,
            error_limit,
        })
    }

    pub fn rate(&self) -> &Rate {
        &self.rate
    }

    pub fn max_epochs(&self) -> usize {
        self.max_epochs
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn error_limit(&self) -> f64 {
        self.error_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_eagerly() {
        let rate = Rate::default();
        assert!(TrainingParameters::new(rate, 0, 1, 0.1).is_err());
        assert!(TrainingParameters::new(rate, 10, 0, 0.1).is_err());
        assert!(TrainingParameters::new(rate, 10, 1, 0.0).is_err());
        assert!(TrainingParameters::new(rate, 10, 1, f64::INFINITY).is_err());
        assert!(TrainingParameters::new(rate, 10, 1, 0.1).is_ok());
    }
}
