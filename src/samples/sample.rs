use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::Matrix;

/// One training example: a source row vector and the target row vector
/// the net should produce for it. Both operands must have exactly one
/// row; anything else is rejected at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    source: Matrix,
    target: Matrix,
}

impl Sample {
    pub fn new(source: Matrix, target: Matrix) -> Result<Sample> {
        if source.rows() != 1 {
            return Err(Error::SampleShape {
                side: "source",
                rows: source.rows(),
            });
        }
        if target.rows() != 1 {
            return Err(Error::SampleShape {
                side: "target",
                rows: target.rows(),
            });
        }
        Ok(Sample { source, target })
    }

    /// Builds a sample straight from value slices.
    pub fn from_values(source: &[f64], target: &[f64]) -> Result<Sample> {
        Sample::new(Matrix::row(source.to_vec())?, Matrix::row(target.to_vec())?)
    }

    pub fn source(&self) -> &Matrix {
        &self.source
    }

    pub fn target(&self) -> &Matrix {
        &self.target
    }

    pub fn source_size(&self) -> usize {
        self.source.columns()
    }

    pub fn target_size(&self) -> usize {
        self.target.columns()
    }

    /// Writes the sample as its source matrix followed by its target
    /// matrix, both in the documented byte layout.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        self.source.write_to(out)?;
        self.target.write_to(out)
    }

    /// Reads a sample written by [`Sample::write_to`].
    pub fn read_from<R: Read>(input: &mut R) -> Result<Sample> {
        let source = Matrix::read_from(input)?;
        let target = Matrix::read_from(input)?;
        Sample::new(source, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_multi_row_operands() {
        let tall = Matrix::zeros(2, 2).unwrap();
        let row = Matrix::row(vec![1.0, 2.0]).unwrap();
        assert!(matches!(
            Sample::new(tall.clone(), row.clone()),
            Err(Error::SampleShape {
                side: "source",
                rows: 2
            })
        ));
        assert!(matches!(
            Sample::new(row, tall),
            Err(Error::SampleShape {
                side: "target",
                rows: 2
            })
        ));
    }

    #[test]
    fn exposes_sizes() {
        let sample = Sample::from_values(&[1.0, 2.0, 3.0], &[1.0]).unwrap();
        assert_eq!(sample.source_size(), 3);
        assert_eq!(sample.target_size(), 1);
    }

    #[test]
    fn byte_layout_round_trip() {
        let sample = Sample::from_values(&[0.25, -0.5], &[1.0, 0.0]).unwrap();
        let mut bytes = Vec::new();
        sample.write_to(&mut bytes).unwrap();
        let restored = Sample::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(restored, sample);
    }
}
