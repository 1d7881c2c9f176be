use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::net::Net;

/// Terminal condition of a training run, in decision priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The held-out error fell below the configured limit.
    MinError,
    /// The epoch budget was exhausted.
    MaxEpoch,
    /// The held-out error started rising while training continued.
    Overfitting,
}

impl StopReason {
    pub fn description(&self) -> &'static str {
        match self {
            StopReason::MinError => "the error limit was reached",
            StopReason::MaxEpoch => "the epoch budget was exhausted",
            StopReason::Overfitting => "the held-out error started rising",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Everything one training run produced: the recorded series, the stop
/// reason, the best net seen on the held-out set, and the wall-clock
/// duration. Assembled once when the run terminates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Mean training loss of every batch, in execution order.
    pub training_errors: Vec<f64>,
    /// Mean held-out loss per test pass (the first entry precedes epoch 1).
    pub testing_errors: Vec<f64>,
    /// Held-out argmax agreement per test pass, as a fraction in [0, 1].
    pub testing_accuracies: Vec<f64>,
    pub epoch_count: usize,
    pub stop_reason: StopReason,
    pub duration: Duration,
    /// Deep copy of the net at its best held-out error.
    pub best_net: Net,
}

impl TrainingResult {
    pub fn min_testing_error(&self) -> f64 {
        series_stats(&self.testing_errors).0
    }

    /// Moving average of the per-batch training losses, clamping the
    /// window at both ends of the series. Useful for plotting the noisy
    /// batch-loss curve.
    pub fn smoothed_training_errors(&self, window: usize) -> Vec<f64> {
        let errors = &self.training_errors;
        if errors.is_empty() || window < 2 {
            return errors.clone();
        }

        let half = window / 2;
        let mut smoothed = Vec::with_capacity(errors.len());
        for i in 0..errors.len() {
            let from = i.saturating_sub(half);
            let to = (i + half + 1).min(errors.len());
            let sum: f64 = errors[from..to].iter().sum();
            smoothed.push(sum / (to - from) as f64);
        }
        smoothed
    }
}

impl fmt::Display for TrainingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "training result:")?;
        writeln!(f, "  epochs:      {}", self.epoch_count)?;
        writeln!(f, "  stop reason: {}", self.stop_reason)?;
        let (min, mid, max) = series_stats(&self.training_errors);
        writeln!(f, "  training error:   min={min:.3} mid={mid:.3} max={max:.3}")?;
        let (min, mid, max) = series_stats(&self.testing_errors);
        writeln!(f, "  testing error:    min={min:.3} mid={mid:.3} max={max:.3}")?;
        let (min, mid, max) = series_stats(&self.testing_accuracies);
        writeln!(
            f,
            "  testing accuracy: min={:.1}% mid={:.1}% max={:.1}%",
            min * 100.0,
            mid * 100.0,
            max * 100.0
        )?;
        write!(f, "  duration:    {:.1?}", self.duration)
    }
}

/// (min, mean, max) of a series; zeros for an empty one.
fn series_stats(series: &[f64]) -> (f64, f64, f64) {
    if series.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for &value in series {
        min = min.min(value);
        max = max.max(value);
        sum += value;
    }
    (min, sum / series.len() as f64, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn stats_cover_the_series() {
        let (min, mid, max) = series_stats(&[3.0, 1.0, 2.0]);
        assert_eq!(min, 1.0);
        assert_relative_eq!(mid, 2.0);
        assert_eq!(max, 3.0);
        assert_eq!(series_stats(&[]), (0.0, 0.0, 0.0));
    }

    #[test]
    fn smoothing_clamps_at_the_edges() {
        let result = TrainingResult {
            training_errors: vec![4.0, 2.0, 0.0, 2.0, 4.0],
            testing_errors: vec![],
            testing_accuracies: vec![],
            epoch_count: 0,
            stop_reason: StopReason::MaxEpoch,
            duration: Duration::ZERO,
            best_net: crate::net::NetParameters::uniform(
                vec![1, 1],
                crate::activation::Activation::default(),
            )
            .unwrap()
            .create_net()
            .unwrap(),
        };
        let smoothed = result.smoothed_training_errors(3);
        assert_eq!(smoothed.len(), 5);
        assert_relative_eq!(smoothed[0], 3.0); // (4 + 2) / 2
        assert_relative_eq!(smoothed[2], (2.0 + 0.0 + 2.0) / 3.0);
        assert_relative_eq!(smoothed[4], 3.0);
    }
}
