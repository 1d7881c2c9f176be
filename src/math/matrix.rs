use std::io::{Read, Write};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::ops;

/// Dense 2D matrix of `f64` values stored row-major in a flat buffer.
///
/// The buffer length always equals `rows * columns` and both dimensions
/// are positive. Every algebraic method here allocates a fresh result;
/// the in-place kernels in [`crate::math::ops`] cover the training hot
/// loop where per-sample allocation matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    columns: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, columns: usize) -> Result<Matrix> {
        if rows == 0 || columns == 0 {
            return Err(Error::InvalidDimensions {
                rows: rows as i64,
                columns: columns as i64,
            });
        }
        Ok(Matrix {
            rows,
            columns,
            data: vec![0.0; rows * columns],
        })
    }

    pub fn from_vec(rows: usize, columns: usize, data: Vec<f64>) -> Result<Matrix> {
        if rows == 0 || columns == 0 {
            return Err(Error::InvalidDimensions {
                rows: rows as i64,
                columns: columns as i64,
            });
        }
        if data.len() != rows * columns {
            return Err(Error::DataLength {
                rows,
                columns,
                expected: rows * columns,
                actual: data.len(),
            });
        }
        Ok(Matrix { rows, columns, data })
    }

    /// Single-row matrix (a row vector).
    pub fn row(data: Vec<f64>) -> Result<Matrix> {
        let columns = data.len();
        Matrix::from_vec(1, columns, data)
    }

    /// Fills a new matrix from an initializer, called once per cell in
    /// row-major order.
    pub fn from_fn(rows: usize, columns: usize, mut init: impl FnMut() -> f64) -> Result<Matrix> {
        let mut matrix = Matrix::zeros(rows, columns)?;
        for item in &mut matrix.data {
            *item = init();
        }
        Ok(matrix)
    }

    pub fn random(rows: usize, columns: usize) -> Result<Matrix> {
        Matrix::random_with_rng(rows, columns, &mut rand::thread_rng())
    }

    /// Uniform values in [-1, 1) drawn from the given generator.
    pub fn random_with_rng<R: Rng + ?Sized>(
        rows: usize,
        columns: usize,
        rng: &mut R,
    ) -> Result<Matrix> {
        Matrix::from_fn(rows, columns, || rng.gen::<f64>() * 2.0 - 1.0)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of items in the matrix. Never zero: both dimensions are
    /// positive by construction.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, row: usize, column: usize) -> f64 {
        assert!(
            row < self.rows && column < self.columns,
            "index ({row}, {column}) out of bounds for a {}x{} matrix",
            self.rows,
            self.columns
        );
        self.data[row * self.columns + column]
    }

    pub fn set(&mut self, row: usize, column: usize, value: f64) {
        assert!(
            row < self.rows && column < self.columns,
            "index ({row}, {column}) out of bounds for a {}x{} matrix",
            self.rows,
            self.columns
        );
        self.data[row * self.columns + column] = value;
    }

    /// Row-major view of the data.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }

    // ── Pure algebra ────────────────────────────────────────────────────

    /// Elementwise sum.
    pub fn add(&self, rhs: &Matrix) -> Result<Matrix> {
        let mut out = Matrix::zeros(self.rows, self.columns)?;
        ops::add(self, rhs, &mut out)?;
        Ok(out)
    }

    /// Elementwise difference.
    pub fn sub(&self, rhs: &Matrix) -> Result<Matrix> {
        let mut out = Matrix::zeros(self.rows, self.columns)?;
        ops::sub(self, rhs, &mut out)?;
        Ok(out)
    }

    /// Elementwise (Hadamard) product.
    pub fn prod(&self, rhs: &Matrix) -> Result<Matrix> {
        let mut out = Matrix::zeros(self.rows, self.columns)?;
        ops::prod(self, rhs, &mut out)?;
        Ok(out)
    }

    /// Matrix product `self · rhs`.
    pub fn mul(&self, rhs: &Matrix) -> Result<Matrix> {
        self.check_inner_dims(rhs)?;
        let mut out = Matrix::zeros(self.rows, rhs.columns)?;
        ops::mul(self, rhs, &mut out)?;
        Ok(out)
    }

    /// `selfᵀ · rhs` without materializing the transpose; requires equal
    /// row counts.
    pub fn t_mul(&self, rhs: &Matrix) -> Result<Matrix> {
        self.check_same_rows(rhs)?;
        let mut out = Matrix::zeros(self.columns, rhs.columns)?;
        ops::t_mul(self, rhs, &mut out)?;
        Ok(out)
    }

    /// `self · rhsᵀ` without materializing the transpose; requires equal
    /// column counts.
    pub fn mul_t(&self, rhs: &Matrix) -> Result<Matrix> {
        self.check_same_columns(rhs)?;
        let mut out = Matrix::zeros(self.rows, rhs.rows)?;
        ops::mul_t(self, rhs, &mut out)?;
        Ok(out)
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = vec![0.0; self.data.len()];
        for i in 0..self.rows {
            for j in 0..self.columns {
                data[j * self.rows + i] = self.data[i * self.columns + j];
            }
        }
        Matrix {
            rows: self.columns,
            columns: self.rows,
            data,
        }
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.apply(|x| x * factor)
    }

    /// `self + factor · rhs`.
    pub fn scale_add(&self, factor: f64, rhs: &Matrix) -> Result<Matrix> {
        let mut out = Matrix::zeros(self.rows, self.columns)?;
        ops::scale_add(self, rhs, factor, &mut out)?;
        Ok(out)
    }

    /// Elementwise map.
    pub fn apply(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix {
            rows: self.rows,
            columns: self.columns,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Divides every item by the Euclidean (Frobenius) norm.
    pub fn normalize(&self) -> Matrix {
        self.scale(1.0 / self.norm())
    }

    pub fn norm(&self) -> f64 {
        self.sum_of_squares().sqrt()
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn sum_of_squares(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum()
    }

    pub fn average(&self) -> f64 {
        self.sum() / self.data.len() as f64
    }

    /// Resets every item to zero, keeping the shape.
    pub fn zero_fill(&mut self) {
        self.data.fill(0.0);
    }

    // ── Binary layout ───────────────────────────────────────────────────

    /// Writes the matrix in the interchange layout: row count and column
    /// count as big-endian 4-byte signed integers, then the row-major
    /// data as big-endian 8-byte IEEE-754 doubles.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&(self.rows as i32).to_be_bytes())?;
        out.write_all(&(self.columns as i32).to_be_bytes())?;
        for value in &self.data {
            out.write_all(&value.to_be_bytes())?;
        }
        Ok(())
    }

    /// Reads a matrix written by [`Matrix::write_to`].
    pub fn read_from<R: Read>(input: &mut R) -> Result<Matrix> {
        let mut word = [0u8; 4];
        input.read_exact(&mut word)?;
        let rows = i32::from_be_bytes(word);
        input.read_exact(&mut word)?;
        let columns = i32::from_be_bytes(word);
        if rows <= 0 || columns <= 0 {
            return Err(Error::InvalidDimensions {
                rows: rows as i64,
                columns: columns as i64,
            });
        }

        let mut matrix = Matrix::zeros(rows as usize, columns as usize)?;
        let mut item = [0u8; 8];
        for value in &mut matrix.data {
            input.read_exact(&mut item)?;
            *value = f64::from_be_bytes(item);
        }
        Ok(matrix)
    }

    // ── Shape checks ────────────────────────────────────────────────────

    pub(crate) fn check_same_rows(&self, other: &Matrix) -> Result<()> {
        if self.rows != other.rows {
            return Err(Error::RowsMismatch(self.rows, other.rows));
        }
        Ok(())
    }

    pub(crate) fn check_same_columns(&self, other: &Matrix) -> Result<()> {
        if self.columns != other.columns {
            return Err(Error::ColumnsMismatch(self.columns, other.columns));
        }
        Ok(())
    }

    pub(crate) fn check_same_shape(&self, other: &Matrix) -> Result<()> {
        self.check_same_rows(other)?;
        self.check_same_columns(other)
    }

    pub(crate) fn check_inner_dims(&self, other: &Matrix) -> Result<()> {
        if self.columns != other.rows {
            return Err(Error::InnerDimMismatch(self.columns, other.rows));
        }
        Ok(())
    }
}
