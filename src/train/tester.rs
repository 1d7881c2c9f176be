use std::sync::Arc;

use log::{debug, trace};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::error::{Error, Result};
use crate::math::Matrix;
use crate::net::Net;
use crate::samples::Sample;
use crate::train::params::TrainingParameters;
use crate::train::result::StopReason;

/// Held-out error growth rate above which a run is declared overfitted.
pub const OVERFITTING_LIMIT: f64 = 1.0;

/// Evaluates a net on the held-out set after every epoch, tracks the
/// best net seen so far, and decides when training should stop.
///
/// The trend of the held-out error curve is estimated with a backward
/// finite-difference stencil over up to six trailing points, which damps
/// single-epoch noise while staying responsive as history accumulates.
/// With a pool attached, per-sample evaluation fans out one task per
/// held-out sample; the reduction is an order-independent sum.
pub struct Tester {
    name: String,
    error_limit: f64,
    max_epochs: usize,
    min_testing_error: f64,
    testing_errors: Vec<f64>,
    testing_accuracies: Vec<f64>,
    best_net: Option<Net>,
    stop_reason: Option<StopReason>,
    pool: Option<Arc<ThreadPool>>,
}

impl Tester {
    pub fn new(name: impl Into<String>, parameters: &TrainingParameters) -> Tester {
        Tester {
            name: name.into(),
            error_limit: parameters.error_limit(),
            max_epochs: parameters.max_epochs(),
            min_testing_error: f64::MAX,
            testing_errors: Vec::new(),
            testing_accuracies: Vec::new(),
            best_net: None,
            stop_reason: None,
            pool: None,
        }
    }

    pub fn with_pool(
        name: impl Into<String>,
        parameters: &TrainingParameters,
        pool: Arc<ThreadPool>,
    ) -> Tester {
        let mut tester = Tester::new(name, parameters);
        tester.pool = Some(pool);
        tester
    }

    /// Runs one held-out evaluation pass and updates the stop decision.
    pub fn test<I>(&mut self, net: &Net, samples: I, epoch: usize) -> Result<()>
    where
        I: Iterator<Item = Result<Sample>>,
    {
        debug!("{} | testing started: epoch={epoch}", self.name);

        let (error, accuracy) = match self.pool.clone() {
            Some(pool) => self.perform_parallel(net, samples, &pool)?,
            None => self.perform_serial(net, samples)?,
        };

        self.record(net, error, accuracy);
        let speed = self.speed();
        debug!(
            "{} | testing completed: epoch={epoch}, error={error:.4}, accuracy={:.1}%, speed={speed:+.4}",
            self.name,
            accuracy * 100.0
        );

        self.determine(epoch, error, speed);
        Ok(())
    }

    fn perform_serial<I>(&self, net: &Net, samples: I) -> Result<(f64, f64)>
    where
        I: Iterator<Item = Result<Sample>>,
    {
        let mut error = 0.0;
        let mut correct = 0usize;
        let mut count = 0usize;

        for sample in samples {
            let sample = sample?;
            let (loss, agreed) = evaluate(net, &sample)?;
            error += loss;
            if agreed {
                correct += 1;
            }
            count += 1;
            trace!(
                "{} | testing: count={count}, loss={loss:.4}, classified={agreed}",
                self.name
            );
        }

        reduce(error, correct, count)
    }

    fn perform_parallel<I>(&self, net: &Net, samples: I, pool: &ThreadPool) -> Result<(f64, f64)>
    where
        I: Iterator<Item = Result<Sample>>,
    {
        // Materialize the stream first; the evaluation tasks then only
        // read the net and one sample each.
        let samples: Vec<Sample> = samples.collect::<Result<_>>()?;
        let outcomes: Result<Vec<(f64, bool)>> =
            pool.install(|| samples.par_iter().map(|sample| evaluate(net, sample)).collect());

        let mut error = 0.0;
        let mut correct = 0usize;
        for (loss, agreed) in outcomes? {
            error += loss;
            if agreed {
                correct += 1;
            }
        }
        reduce(error, correct, samples.len())
    }

    fn record(&mut self, net: &Net, error: f64, accuracy: f64) {
        self.testing_errors.push(error);
        self.testing_accuracies.push(accuracy);
        if error < self.min_testing_error {
            self.min_testing_error = error;
            self.best_net = Some(net.clone());
        }
    }

    fn determine(&mut self, epoch: usize, error: f64, speed: f64) {
        // The first reason is terminal for the run.
        if self.stop_reason.is_some() {
            return;
        }
        if error < self.error_limit {
            self.stop_reason = Some(StopReason::MinError);
        } else if epoch >= self.max_epochs {
            self.stop_reason = Some(StopReason::MaxEpoch);
        } else if speed > OVERFITTING_LIMIT {
            debug!("{} | testing stopped the run: speed={speed:.4}", self.name);
            self.stop_reason = Some(StopReason::Overfitting);
        }
    }

    /// Trend of the held-out error curve, estimated from its trailing
    /// points.
    pub fn speed(&self) -> f64 {
        speed_of(&self.testing_errors)
    }

    pub fn is_continue(&self) -> bool {
        self.stop_reason.is_none()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn best_net(&self) -> Option<&Net> {
        self.best_net.as_ref()
    }

    pub fn testing_errors(&self) -> &[f64] {
        &self.testing_errors
    }

    pub fn testing_accuracies(&self) -> &[f64] {
        &self.testing_accuracies
    }

    pub(crate) fn into_outcome(self) -> TesterOutcome {
        TesterOutcome {
            testing_errors: self.testing_errors,
            testing_accuracies: self.testing_accuracies,
            best_net: self.best_net,
        }
    }
}

pub(crate) struct TesterOutcome {
    pub testing_errors: Vec<f64>,
    pub testing_accuracies: Vec<f64>,
    pub best_net: Option<Net>,
}

/// Loss and argmax agreement of one sample.
fn evaluate(net: &Net, sample: &Sample) -> Result<(f64, bool)> {
    let output = net.forward(sample.source())?;
    let error = sample.target().sub(&output)?;
    let loss = error.sum_of_squares() / 2.0;
    let agreed = arg_max(&output) == arg_max(sample.target());
    Ok((loss, agreed))
}

fn reduce(error: f64, correct: usize, count: usize) -> Result<(f64, f64)> {
    if count == 0 {
        return Err(Error::InvalidConfig(
            "the testing sampling yielded no samples".into(),
        ));
    }
    Ok((error / count as f64, correct as f64 / count as f64))
}

fn arg_max(matrix: &Matrix) -> usize {
    let mut best = 0;
    for (index, value) in matrix.iter().enumerate() {
        if value > matrix.as_slice()[best] {
            best = index;
        }
    }
    best
}

/// Backward finite-difference derivative estimate over the largest
/// stencil available, up to six trailing points.
fn speed_of(errors: &[f64]) -> f64 {
    let at = |back: usize| errors[errors.len() - 1 - back];
    match errors.len() {
        0 | 1 => 0.0,
        2 => at(0) - at(1),
        3 => (3.0 * at(0) - 4.0 * at(1) + at(2)) / 2.0,
        4 => (11.0 * at(0) - 18.0 * at(1) + 9.0 * at(2) - 2.0 * at(3)) / 6.0,
        5 => (25.0 * at(0) - 48.0 * at(1) + 36.0 * at(2) - 16.0 * at(3) + 3.0 * at(4)) / 12.0,
        _ => {
            (137.0 * at(0) - 300.0 * at(1) + 300.0 * at(2) - 200.0 * at(3) + 75.0 * at(4)
                - 12.0 * at(5))
                / 60.0
        }
    }
}
