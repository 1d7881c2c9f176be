use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::error::{Error, Result};
use crate::math::Matrix;
use crate::net::params::NetParameters;

/// Fully-connected feedforward network.
///
/// Layer i owns the weight matrix `W[i]` (shape `size[i] × size[i+1]`),
/// the bias row vector `b[i]` (shape `1 × size[i+1]`) and the activation
/// applied at that boundary. A net with L layers therefore carries L-1
/// of each. `Clone` deep-copies every matrix, so a snapshot never shares
/// buffers with a live, still-training net.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Net {
    weights: Vec<Matrix>,
    biases: Vec<Matrix>,
    activations: Vec<Activation>,
}

impl Net {
    pub fn new(parameters: &NetParameters) -> Result<Net> {
        Net::with_rng(parameters, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(parameters: &NetParameters, rng: &mut R) -> Result<Net> {
        let layer_sizes = parameters.layer_sizes();
        let activations = parameters.activations();

        let mut weights = Vec::with_capacity(layer_sizes.len() - 1);
        let mut biases = Vec::with_capacity(layer_sizes.len() - 1);
        for boundary in layer_sizes.windows(2) {
            weights.push(Matrix::random_with_rng(boundary[0], boundary[1], rng)?);
            biases.push(Matrix::random_with_rng(1, boundary[1], rng)?);
        }
        Ok(Net {
            weights,
            biases,
            activations: activations.to_vec(),
        })
    }

    /// Builds a net from existing matrices, validating the layer chain.
    pub fn from_parts(
        weights: Vec<Matrix>,
        biases: Vec<Matrix>,
        activations: Vec<Activation>,
    ) -> Result<Net> {
        if weights.is_empty() {
            return Err(Error::InvalidConfig(
                "a net needs at least one inter-layer boundary".into(),
            ));
        }
        if weights.len() != biases.len() {
            return Err(Error::InvalidConfig(format!(
                "weight and bias counts must match, got {} and {}",
                weights.len(),
                biases.len()
            )));
        }
        if weights.len() != activations.len() {
            return Err(Error::InvalidConfig(format!(
                "expected one activation per inter-layer boundary ({}), got {}",
                weights.len(),
                activations.len()
            )));
        }
        for i in 0..weights.len() {
            if biases[i].rows() != 1 {
                return Err(Error::InvalidConfig(format!(
                    "bias {i} must be a row vector, got {} rows",
                    biases[i].rows()
                )));
            }
            weights[i].check_same_columns(&biases[i])?;
            if i + 1 < weights.len() {
                weights[i].check_inner_dims(&weights[i + 1])?;
            }
        }
        Ok(Net {
            weights,
            biases,
            activations,
        })
    }

    /// Number of layers, counting input and output.
    pub fn layer_count(&self) -> usize {
        self.weights.len() + 1
    }

    /// Number of inter-layer boundaries (weight matrices).
    pub fn inter_layer_count(&self) -> usize {
        self.weights.len()
    }

    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.layer_count());
        sizes.push(self.weights[0].rows());
        for weight in &self.weights {
            sizes.push(weight.columns());
        }
        sizes
    }

    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    pub fn biases(&self) -> &[Matrix] {
        &self.biases
    }

    pub fn activations(&self) -> &[Activation] {
        &self.activations
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut [Matrix], &mut [Matrix]) {
        (&mut self.weights, &mut self.biases)
    }

    /// Forward pass: `y[i+1] = f_i(y[i] · W[i] + b[i])`, returning the
    /// output activation row. Read-only with respect to the net.
    pub fn forward(&self, input: &Matrix) -> Result<Matrix> {
        let mut output = input.clone();
        for i in 0..self.weights.len() {
            let activation = self.activations[i];
            output = output
                .mul(&self.weights[i])?
                .add(&self.biases[i])?
                .apply(|x| activation.value(x));
        }
        Ok(output)
    }

    /// Serializes the net to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a net from a JSON file previously written by
    /// [`Net::save_json`].
    pub fn load_json(path: &str) -> Result<Net> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
