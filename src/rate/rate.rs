use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Learning-rate schedule: a pure function of the epoch index.
///
/// Each variant exposes its tunable factors as an ordered vector so
/// external sweep tooling can enumerate and replace them without knowing
/// the variant. All factors are strictly positive; use the checked
/// constructors rather than building variants directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Rate {
    /// The same step size every epoch.
    Constant { value: f64 },
    /// `start / (epoch + 1)`
    Linear { start: f64 },
    /// `height · e^{-curve · epoch}`
    Exponent { height: f64, curve: f64 },
}

impl Rate {
    pub fn constant(value: f64) -> Result<Rate> {
        check_factor("value", value)?;
        Ok(Rate::Constant { value })
    }

    pub fn linear(start: f64) -> Result<Rate> {
        check_factor("start", start)?;
        Ok(Rate::Linear { start })
    }

    pub fn exponent(height: f64, curve: f64) -> Result<Rate> {
        check_factor("height", height)?;
        check_factor("curve", curve)?;
        Ok(Rate::Exponent { height, curve })
    }

    /// Step size for the given epoch.
    pub fn apply(&self, epoch: usize) -> f64 {
        match *self {
            Rate::Constant { value } => value,
            Rate::Linear { start } => start / (epoch + 1) as f64,
            Rate::Exponent { height, curve } => height * (-curve * epoch as f64).exp(),
        }
    }

    /// Ordered vector of the tunable factors.
    pub fn factors(&self) -> Vec<f64> {
        match *self {
            Rate::Constant { value } => vec![value],
            Rate::Linear { start } => vec![start],
            Rate::Exponent { height, curve } => vec![height, curve],
        }
    }

    /// Replaces the tunable factors, validating count and positivity.
    pub fn set_factors(&mut self, factors: &[f64]) -> Result<()> {
        let expected = self.factors().len();
        if factors.len() != expected {
            return Err(Error::InvalidConfig(format!(
                "{} rate takes {} factor(s), got {}",
                self.name(),
                expected,
                factors.len()
            )));
        }
        *self = match self {
            Rate::Constant { .. } => Rate::constant(factors[0])?,
            Rate::Linear { .. } => Rate::linear(factors[0])?,
            Rate::Exponent { .. } => Rate::exponent(factors[0], factors[1])?,
        };
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rate::Constant { .. } => "constant",
            Rate::Linear { .. } => "linear",
            Rate::Exponent { .. } => "exponent",
        }
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::Constant { value: 1.0 }
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.name(), self.factors())
    }
}

fn check_factor(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidConfig(format!(
            "rate factor \"{name}\" must be a positive finite number, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_ignores_the_epoch() {
        let rate = Rate::constant(0.3).unwrap();
        assert_eq!(rate.apply(0), 0.3);
        assert_eq!(rate.apply(500), 0.3);
    }

    #[test]
    fn linear_decays_harmonically() {
        let rate = Rate::linear(10.0).unwrap();
        assert_relative_eq!(rate.apply(0), 10.0);
        assert_relative_eq!(rate.apply(1), 5.0);
        assert_relative_eq!(rate.apply(9), 1.0);
    }

    #[test]
    fn exponent_decays_geometrically() {
        let rate = Rate::exponent(2.0, 0.5).unwrap();
        assert_relative_eq!(rate.apply(0), 2.0);
        assert_relative_eq!(rate.apply(2), 2.0 * (-1.0f64).exp());
    }

    #[test]
    fn factors_round_trip() {
        let mut rate = Rate::exponent(1.0, 1.0).unwrap();
        assert_eq!(rate.factors(), vec![1.0, 1.0]);
        rate.set_factors(&[3.0, 0.25]).unwrap();
        assert_eq!(rate, Rate::Exponent { height: 3.0, curve: 0.25 });
    }

    #[test]
    fn non_positive_factors_are_rejected() {
        assert!(Rate::constant(0.0).is_err());
        assert!(Rate::linear(-1.0).is_err());
        assert!(Rate::exponent(1.0, f64::NAN).is_err());
        let mut rate = Rate::default();
        assert!(rate.set_factors(&[1.0, 2.0]).is_err());
        assert!(rate.set_factors(&[-1.0]).is_err());
    }
}
