use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, trace};
use rayon::ThreadPool;

use crate::error::Result;
use crate::math::{ops, Matrix};
use crate::net::{Net, NetParameters};
use crate::samples::{Sample, SampleBatches, SampleSource};
use crate::train::params::TrainingParameters;
use crate::train::result::TrainingResult;
use crate::train::tester::Tester;

/// Drives the epoch → batch → sample training loop for one run.
///
/// Per sample: forward pass retaining every intermediate activation,
/// error against the target, backward pass, gradient accumulation. Per
/// batch: one weight update scaled by the epoch's learning rate. Per
/// epoch: a held-out evaluation whose stop decision ends the run.
///
/// All per-sample buffers live in a scratch arena sized once at run
/// start, so the hot loop allocates nothing. A malformed sample aborts
/// the run through the shape error of the first kernel it hits.
pub struct Trainer<S> {
    name: String,
    net_parameters: NetParameters,
    training_parameters: TrainingParameters,
    sample_source: S,
    pool: Option<Arc<ThreadPool>>,
}

impl<S: SampleSource> Trainer<S> {
    pub fn new(
        net_parameters: NetParameters,
        training_parameters: TrainingParameters,
        sample_source: S,
    ) -> Trainer<S> {
        Trainer {
            name: "trainer0".into(),
            net_parameters,
            training_parameters,
            sample_source,
            pool: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Trainer<S> {
        self.name = name.into();
        self
    }

    /// Attaches a worker pool used for parallel held-out evaluation.
    pub fn with_pool(mut self, pool: Arc<ThreadPool>) -> Trainer<S> {
        self.pool = Some(pool);
        self
    }

    /// Creates a fresh net from the net parameters and trains it.
    pub fn learn(&self) -> Result<TrainingResult> {
        self.learn_net(self.net_parameters.create_net()?)
    }

    /// Trains the given net in place until the tester stops the run.
    pub fn learn_net(&self, mut net: Net) -> Result<TrainingResult> {
        info!("{} | learning started", self.name);

        let parameters = &self.training_parameters;
        let mut tester = match &self.pool {
            Some(pool) => Tester::with_pool(&self.name, parameters, Arc::clone(pool)),
            None => Tester::new(&self.name, parameters),
        };
        let mut scratch = Scratch::new(&net)?;
        let mut training_errors = Vec::new();

        // Baseline evaluation before any training.
        tester.test(&net, self.sample_source.testing(), 0)?;

        let mut epoch_count = 0;
        let started = Instant::now();
        let stop_reason = loop {
            debug!("{} | epoch {} started", self.name, epoch_count + 1);
            let rate = parameters.rate().apply(epoch_count);

            let batches =
                SampleBatches::new(parameters.batch_size(), self.sample_source.training());
            for (batch_count, batch) in batches.enumerate() {
                let batch = batch?;
                scratch.zero_corrections();

                let mut batch_error = 0.0;
                for (sample_count, sample) in batch.iter().enumerate() {
                    let sample_error = scratch.pass(&net, sample)?;
                    batch_error += sample_error;
                    scratch.accumulate()?;
                    trace!(
                        "{} | training: epoch={}, batch={}, sample={}, error={:.4}",
                        self.name,
                        epoch_count + 1,
                        batch_count + 1,
                        sample_count + 1,
                        sample_error
                    );
                }

                // The loss metric divides by the configured batch size;
                // the correction stays an unscaled sum.
                training_errors.push(batch_error / parameters.batch_size() as f64);
                scratch.apply_corrections(&mut net, rate)?;
            }

            epoch_count += 1;
            tester.test(&net, self.sample_source.testing(), epoch_count)?;
            if let Some(reason) = tester.stop_reason() {
                break reason;
            }
        };
        let duration = started.elapsed();
        debug!(
            "{} | training completed: epochs={epoch_count}, reason: {stop_reason}",
            self.name
        );

        let outcome = tester.into_outcome();
        info!("{} | learning completed", self.name);
        Ok(TrainingResult {
            training_errors,
            testing_errors: outcome.testing_errors,
            testing_accuracies: outcome.testing_accuracies,
            epoch_count,
            stop_reason,
            duration,
            // A net that never produced a comparable error (all NaN)
            // leaves no snapshot; fall back to the final state.
            best_net: outcome.best_net.unwrap_or(net),
        })
    }
}

/// Pre-sized arena for everything one forward/backward pass touches.
///
/// `y[0]` holds the sample input and `y[i + 1]` the activations of
/// boundary i; `v` the pre-activation sums; `g` the deltas; `dw`/`db`
/// the per-sample gradients and `acc_w`/`acc_b` the per-batch sums.
struct Scratch {
    y: Vec<Matrix>,
    v: Vec<Matrix>,
    g: Vec<Matrix>,
    dw: Vec<Matrix>,
    db: Vec<Matrix>,
    acc_w: Vec<Matrix>,
    acc_b: Vec<Matrix>,
    error: Matrix,
}

impl Scratch {
    fn new(net: &Net) -> Result<Scratch> {
        let weights = net.weights();
        let boundaries = weights.len();

        let mut y = Vec::with_capacity(boundaries + 1);
        let mut v = Vec::with_capacity(boundaries);
        let mut g = Vec::with_capacity(boundaries);
        let mut dw = Vec::with_capacity(boundaries);
        let mut db = Vec::with_capacity(boundaries);
        let mut acc_w = Vec::with_capacity(boundaries);
        let mut acc_b = Vec::with_capacity(boundaries);

        y.push(Matrix::zeros(1, weights[0].rows())?);
        for weight in weights {
            y.push(Matrix::zeros(1, weight.columns())?);
            v.push(Matrix::zeros(1, weight.columns())?);
            g.push(Matrix::zeros(1, weight.columns())?);
            dw.push(Matrix::zeros(weight.rows(), weight.columns())?);
            db.push(Matrix::zeros(1, weight.columns())?);
            acc_w.push(Matrix::zeros(weight.rows(), weight.columns())?);
            acc_b.push(Matrix::zeros(1, weight.columns())?);
        }
        let error = Matrix::zeros(1, weights[boundaries - 1].columns())?;

        Ok(Scratch {
            y,
            v,
            g,
            dw,
            db,
            acc_w,
            acc_b,
            error,
        })
    }

    /// Forward pass, error, backward pass for one sample; returns the
    /// sample's training loss `0.5 · Σe²`.
    fn pass(&mut self, net: &Net, sample: &Sample) -> Result<f64> {
        self.forward(net, sample.source())?;
        let error_value = self.calc_error(sample.target())?;
        self.backward(net)?;
        Ok(error_value)
    }

    fn forward(&mut self, net: &Net, input: &Matrix) -> Result<()> {
        ops::copy(input, &mut self.y[0])?;
        for i in 0..net.inter_layer_count() {
            // v[i] = y[i] · W[i] + b[i];  y[i+1] = f(v[i])
            ops::mul(&self.y[i], &net.weights()[i], &mut self.v[i])?;
            ops::add_assign(&mut self.v[i], &net.biases()[i])?;
            let activation = net.activations()[i];
            ops::apply(&self.v[i], |x| activation.value(x), &mut self.y[i + 1])?;
        }
        Ok(())
    }

    fn calc_error(&mut self, target: &Matrix) -> Result<f64> {
        // e = t - o
        ops::sub(target, &self.y[self.y.len() - 1], &mut self.error)?;
        Ok(self.error.sum_of_squares() / 2.0)
    }

    fn backward(&mut self, net: &Net) -> Result<()> {
        let weights = net.weights();
        let last = self.g.len() - 1;

        // δ[last] = -f'(v[last]) ⊙ e
        let activation = net.activations()[last];
        ops::apply(&self.v[last], |x| activation.derivative(x), &mut self.g[last])?;
        ops::prod_assign(&mut self.g[last], &self.error)?;
        ops::scale_assign(&mut self.g[last], -1.0);

        // ΔW[last] = y[last]ᵀ · δ[last];  Δb[last] = δ[last]
        ops::t_mul(&self.y[last], &self.g[last], &mut self.dw[last])?;
        ops::copy(&self.g[last], &mut self.db[last])?;

        for i in (0..last).rev() {
            // δ[i] = f'(v[i]) ⊙ (δ[i+1] · W[i+1]ᵀ)
            let activation = net.activations()[i];
            ops::apply_assign(&mut self.v[i], |x| activation.derivative(x));
            let (deltas, next_deltas) = self.g.split_at_mut(i + 1);
            ops::mul_t(&next_deltas[0], &weights[i + 1], &mut deltas[i])?;
            ops::prod_assign(&mut deltas[i], &self.v[i])?;

            // ΔW[i] = y[i]ᵀ · δ[i];  Δb[i] = δ[i]
            ops::t_mul(&self.y[i], &deltas[i], &mut self.dw[i])?;
            ops::copy(&deltas[i], &mut self.db[i])?;
        }
        Ok(())
    }

    /// Adds the last pass's gradients into the batch accumulators.
    fn accumulate(&mut self) -> Result<()> {
        for i in 0..self.acc_w.len() {
            ops::add_assign(&mut self.acc_w[i], &self.dw[i])?;
            ops::add_assign(&mut self.acc_b[i], &self.db[i])?;
        }
        Ok(())
    }

    fn zero_corrections(&mut self) {
        ops::zero(&mut self.acc_w);
        ops::zero(&mut self.acc_b);
    }

    /// `W[i] -= rate · ΣΔW[i]`, `b[i] -= rate · ΣΔb[i]`.
    fn apply_corrections(&self, net: &mut Net, rate: f64) -> Result<()> {
        let (weights, biases) = net.parts_mut();
        for i in 0..weights.len() {
            ops::scale_sub_assign(&mut weights[i], &self.acc_w[i], rate)?;
            ops::scale_sub_assign(&mut biases[i], &self.acc_b[i], rate)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Activation;
    use crate::rate::Rate;
    use crate::samples::InMemorySampleSource;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn loss(net: &Net, sample: &Sample) -> f64 {
        let output = net.forward(sample.source()).unwrap();
        sample.target().sub(&output).unwrap().sum_of_squares() / 2.0
    }

    /// Central-difference check of the analytic gradients from one
    /// backward pass.
    fn check_gradients(layer_sizes: Vec<usize>, activations: Vec<Activation>, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let parameters = NetParameters::new(layer_sizes.clone(), activations).unwrap();
        let mut net = parameters.create_net_with_rng(&mut rng).unwrap();

        let inputs = layer_sizes[0];
        let outputs = layer_sizes[layer_sizes.len() - 1];
        let sample = Sample::new(
            Matrix::random_with_rng(1, inputs, &mut rng).unwrap(),
            Matrix::random_with_rng(1, outputs, &mut rng).unwrap(),
        )
        .unwrap();

        let mut scratch = Scratch::new(&net).unwrap();
        scratch.pass(&net, &sample).unwrap();
        let analytic_w: Vec<Matrix> = scratch.dw.clone();
        let analytic_b: Vec<Matrix> = scratch.db.clone();

        let h = 1e-6;
        for layer in 0..net.inter_layer_count() {
            for row in 0..analytic_w[layer].rows() {
                for column in 0..analytic_w[layer].columns() {
                    let original = net.weights()[layer].get(row, column);
                    net.parts_mut().0[layer].set(row, column, original + h);
                    let plus = loss(&net, &sample);
                    net.parts_mut().0[layer].set(row, column, original - h);
                    let minus = loss(&net, &sample);
                    net.parts_mut().0[layer].set(row, column, original);

                    let numeric = (plus - minus) / (2.0 * h);
                    assert_relative_eq!(
                        analytic_w[layer].get(row, column),
                        numeric,
                        max_relative = 1e-4,
                        epsilon = 1e-7
                    );
                }
            }
            for column in 0..analytic_b[layer].columns() {
                let original = net.biases()[layer].get(0, column);
                net.parts_mut().1[layer].set(0, column, original + h);
                let plus = loss(&net, &sample);
                net.parts_mut().1[layer].set(0, column, original - h);
                let minus = loss(&net, &sample);
                net.parts_mut().1[layer].set(0, column, original);

                let numeric = (plus - minus) / (2.0 * h);
                assert_relative_eq!(
                    analytic_b[layer].get(0, column),
                    numeric,
                    max_relative = 1e-4,
                    epsilon = 1e-7
                );
            }
        }
    }

    #[test]
    fn gradients_match_finite_differences_two_layers() {
        check_gradients(
            vec![3, 2],
            vec![Activation::Logistic { scale: 1.0 }],
            11,
        );
    }

    #[test]
    fn gradients_match_finite_differences_three_layers() {
        check_gradients(
            vec![2, 4, 3],
            vec![
                Activation::Tanh { scale: 0.8 },
                Activation::Logistic { scale: 1.2 },
            ],
            17,
        );
    }

    #[test]
    fn gradients_match_finite_differences_mixed_activations() {
        check_gradients(
            vec![3, 5, 4, 2],
            vec![
                Activation::Atan { scale: 1.0 },
                Activation::Tanh { scale: 0.5 },
                Activation::Logistic { scale: 2.0 },
            ],
            23,
        );
    }

    #[test]
    fn malformed_sample_aborts_the_run() {
        let parameters =
            NetParameters::uniform(vec![2, 2], Activation::Logistic { scale: 1.0 }).unwrap();
        let training =
            TrainingParameters::new(Rate::default(), 5, 1, 1e-6).unwrap();
        // Source length 3 does not match the input layer size 2.
        let bad = Sample::from_values(&[1.0, 2.0, 3.0], &[0.0, 1.0]).unwrap();
        let good = Sample::from_values(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        let source = InMemorySampleSource::new(vec![bad], vec![good]);

        let trainer = Trainer::new(parameters, training, source);
        assert!(trainer.learn().is_err());
    }

    #[test]
    fn corrections_sum_over_the_batch() {
        let parameters =
            NetParameters::uniform(vec![2, 2], Activation::Logistic { scale: 1.0 }).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let net = parameters.create_net_with_rng(&mut rng).unwrap();
        let sample = Sample::from_values(&[0.3, -0.7], &[1.0, 0.0]).unwrap();

        let mut scratch = Scratch::new(&net).unwrap();
        scratch.zero_corrections();
        scratch.pass(&net, &sample).unwrap();
        scratch.accumulate().unwrap();
        let single = scratch.acc_w[0].clone();

        scratch.pass(&net, &sample).unwrap();
        scratch.accumulate().unwrap();
        assert_eq!(scratch.acc_w[0], single.scale(2.0));
    }
}
