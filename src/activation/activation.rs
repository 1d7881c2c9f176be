use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Differentiable scalar activation, stretched along the input axis by a
/// configurable `scale` factor k.
///
/// Each variant supplies the value function and its exact analytic
/// derivative; the forward pass applies `value` elementwise and the
/// backward pass applies `derivative` to the same pre-activation values.
/// Two activations are equal when both the kind and the scale match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Activation {
    /// `1 / (1 + e^{-kx})`
    Logistic { scale: f64 },
    /// `tanh(kx)`
    Tanh { scale: f64 },
    /// `(2/π) · atan(kx)`, ranging over (-1, 1)
    Atan { scale: f64 },
    /// `sin(kx)` clamped to ±1 outside the central half-wave
    Sin { scale: f64 },
    /// `kx` for positive inputs, zero otherwise
    ReLU { scale: f64 },
}

impl Activation {
    pub fn value(&self, x: f64) -> f64 {
        match *self {
            Activation::Logistic { scale } => 1.0 / (1.0 + (-scale * x).exp()),
            Activation::Tanh { scale } => (scale * x).tanh(),
            Activation::Atan { scale } => 2.0 / PI * (scale * x).atan(),
            Activation::Sin { scale } => {
                if x < -PI / (2.0 * scale) {
                    -1.0
                } else if x > PI / (2.0 * scale) {
                    1.0
                } else {
                    (scale * x).sin()
                }
            }
            Activation::ReLU { scale } => {
                if x > 0.0 {
                    scale * x
                } else {
                    0.0
                }
            }
        }
    }

    pub fn derivative(&self, x: f64) -> f64 {
        match *self {
            Activation::Logistic { scale } => {
                let fx = self.value(x);
                scale * fx * (1.0 - fx)
            }
            Activation::Tanh { scale } => {
                let t = (scale * x).tanh();
                scale * (1.0 - t * t)
            }
            Activation::Atan { scale } => {
                let sx = scale * x;
                2.0 / PI * scale / (1.0 + sx * sx)
            }
            Activation::Sin { scale } => {
                if x.abs() > PI / (2.0 * scale) {
                    0.0
                } else {
                    scale * (scale * x).cos()
                }
            }
            Activation::ReLU { scale } => {
                if x > 0.0 {
                    scale
                } else {
                    0.0
                }
            }
        }
    }

    pub fn scale(&self) -> f64 {
        match *self {
            Activation::Logistic { scale }
            | Activation::Tanh { scale }
            | Activation::Atan { scale }
            | Activation::Sin { scale }
            | Activation::ReLU { scale } => scale,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Activation::Logistic { .. } => "logistic",
            Activation::Tanh { .. } => "tanh",
            Activation::Atan { .. } => "atan",
            Activation::Sin { .. } => "sin",
            Activation::ReLU { .. } => "relu",
        }
    }

    /// One activation choice repeated for every inter-layer boundary.
    pub fn uniform(activation: Activation, count: usize) -> Vec<Activation> {
        vec![activation; count]
    }
}

impl Default for Activation {
    fn default() -> Self {
        Activation::Logistic { scale: 0.2 }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.scale())
    }
}
