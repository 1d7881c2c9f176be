use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::error::Result;
use crate::experiment::ExperimentParameters;
use crate::samples::SampleSource;
use crate::train::{Trainer, TrainingResult};

/// One independent training run over a shared sample source.
///
/// Experiments are shared-nothing: each run builds its own net, scratch
/// arena and RNG state, so any number of them can execute concurrently
/// against the same (read-only) source.
pub struct Experiment<S> {
    name: String,
    parameters: ExperimentParameters,
    sample_source: Arc<S>,
}

impl<S: SampleSource> Experiment<S> {
    pub fn new(
        name: impl Into<String>,
        parameters: ExperimentParameters,
        sample_source: Arc<S>,
    ) -> Experiment<S> {
        Experiment {
            name: name.into(),
            parameters,
            sample_source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &ExperimentParameters {
        &self.parameters
    }

    pub fn run(&self) -> Result<TrainingResult> {
        Trainer::new(
            self.parameters.net_parameters().clone(),
            self.parameters.training_parameters().clone(),
            Arc::clone(&self.sample_source),
        )
        .with_name(format!("{}-trainer", self.name))
        .learn()
    }
}

/// Outcome of a batch of experiments: one `(parameters, result)` pair
/// per run, in submission order, plus the wall-clock duration of the
/// whole sweep. A failed run keeps its `Err` without affecting the
/// siblings.
pub struct ExperimentResult {
    pub experiences: Vec<(ExperimentParameters, Result<TrainingResult>)>,
    pub duration: Duration,
}

impl ExperimentResult {
    /// The successful run with the lowest held-out error, if any run
    /// succeeded.
    pub fn best(&self) -> Option<(&ExperimentParameters, &TrainingResult)> {
        self.experiences
            .iter()
            .filter_map(|(parameters, result)| result.as_ref().ok().map(|r| (parameters, r)))
            .min_by(|a, b| {
                a.1.min_testing_error()
                    .total_cmp(&b.1.min_testing_error())
            })
    }
}

/// Runs a list of experiments, optionally fanning them out over an
/// explicit worker pool; without one the runs execute serially. Each
/// experiment owns its mutable state exclusively, so the pool sees only
/// independent tasks.
pub struct Experimenter<S> {
    name: String,
    experiments: Vec<Experiment<S>>,
    pool: Option<Arc<ThreadPool>>,
}

impl<S: SampleSource + Send + Sync> Experimenter<S> {
    pub fn new(
        parameters: Vec<ExperimentParameters>,
        sample_source: Arc<S>,
    ) -> Experimenter<S> {
        let name = "experimenter0".to_string();
        let experiments = parameters
            .into_iter()
            .enumerate()
            .map(|(index, p)| {
                Experiment::new(
                    format!("{name}-experiment{index}"),
                    p,
                    Arc::clone(&sample_source),
                )
            })
            .collect();
        Experimenter {
            name,
            experiments,
            pool: None,
        }
    }

    /// Fans the runs out over the given pool, one task per experiment.
    pub fn with_pool(mut self, pool: Arc<ThreadPool>) -> Experimenter<S> {
        self.pool = Some(pool);
        self
    }

    pub fn run(&self) -> ExperimentResult {
        info!(
            "{} | running {} experiment(s)",
            self.name,
            self.experiments.len()
        );
        let started = Instant::now();

        let experiences = match &self.pool {
            Some(pool) => pool.install(|| {
                self.experiments
                    .par_iter()
                    .map(|experiment| (experiment.parameters().clone(), experiment.run()))
                    .collect()
            }),
            None => self
                .experiments
                .iter()
                .map(|experiment| (experiment.parameters().clone(), experiment.run()))
                .collect(),
        };

        let duration = started.elapsed();
        info!("{} | completed in {:.1?}", self.name, duration);
        ExperimentResult {
            experiences,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Activation;
    use crate::net::NetParameters;
    use crate::rate::Rate;
    use crate::samples::{InMemorySampleSource, Sample};
    use crate::train::{StopReason, TrainingParameters};

    fn classification_source() -> InMemorySampleSource {
        let samples = vec![
            Sample::from_values(&[1.0, 0.0], &[1.0, 0.0]).unwrap(),
            Sample::from_values(&[0.0, 1.0], &[0.0, 1.0]).unwrap(),
        ];
        InMemorySampleSource::new(samples.clone(), samples)
    }

    fn quick_parameters(max_epochs: usize) -> ExperimentParameters {
        ExperimentParameters::new(
            NetParameters::uniform(vec![2, 2], Activation::Logistic { scale: 1.0 }).unwrap(),
            // A tiny step keeps the held-out curve flat, so these short
            // runs always exhaust their epoch budget.
            TrainingParameters::new(Rate::Constant { value: 1e-3 }, max_epochs, 1, 1e-9).unwrap(),
        )
    }

    #[test]
    fn runs_every_experiment_serially() {
        let source = Arc::new(classification_source());
        let experimenter =
            Experimenter::new(vec![quick_parameters(2), quick_parameters(3)], source);
        let result = experimenter.run();

        assert_eq!(result.experiences.len(), 2);
        for (parameters, outcome) in &result.experiences {
            let outcome = outcome.as_ref().unwrap();
            assert_eq!(outcome.stop_reason, StopReason::MaxEpoch);
            assert_eq!(outcome.epoch_count, parameters.training_parameters().max_epochs());
        }
        assert!(result.best().is_some());
    }

    #[test]
    fn runs_experiments_on_a_pool() {
        let pool = Arc::new(
            rayon::ThreadPoolBuilder::new()
                .num_threads(2)
                .build()
                .unwrap(),
        );
        let source = Arc::new(classification_source());
        let experimenter = Experimenter::new(
            vec![quick_parameters(2), quick_parameters(2), quick_parameters(2)],
            source,
        )
        .with_pool(pool);

        let result = experimenter.run();
        assert_eq!(result.experiences.len(), 3);
        assert!(result
            .experiences
            .iter()
            .all(|(_, outcome)| outcome.is_ok()));
    }
}
