use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::error::{Error, Result};
use crate::net::Net;

/// Architecture description: layer sizes plus one activation per
/// inter-layer boundary. Validated at construction so a bad shape never
/// reaches a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetParameters {
    layer_sizes: Vec<usize>,
    activations: Vec<Activation>,
}

impl NetParameters {
    pub fn new(layer_sizes: Vec<usize>, activations: Vec<Activation>) -> Result<NetParameters> {
        if layer_sizes.len() < 2 {
            return Err(Error::InvalidConfig(format!(
                "a net needs at least input and output layers, got {} size(s)",
                layer_sizes.len()
            )));
        }
        if let Some(zero) = layer_sizes.iter().position(|&size| size == 0) {
            return Err(Error::InvalidConfig(format!(
                "layer {zero} has size 0; every layer needs at least one neuron"
            )));
        }
        if activations.len() != layer_sizes.len() - 1 {
            return Err(Error::InvalidConfig(format!(
                "expected one activation per inter-layer boundary ({}), got {}",
                layer_sizes.len() - 1,
                activations.len()
            )));
        }
        Ok(NetParameters {
            layer_sizes,
            activations,
        })
    }

    /// One activation choice applied at every boundary.
    pub fn uniform(layer_sizes: Vec<usize>, activation: Activation) -> Result<NetParameters> {
        let boundaries = layer_sizes.len().saturating_sub(1);
        NetParameters::new(layer_sizes, Activation::uniform(activation, boundaries))
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    pub fn activations(&self) -> &[Activation] {
        &self.activations
    }

    pub fn input_size(&self) -> usize {
        self.layer_sizes[0]
    }

    pub fn output_size(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    pub fn create_net(&self) -> Result<Net> {
        Net::new(self)
    }

    pub fn create_net_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Net> {
        Net::with_rng(self, rng)
    }
}
