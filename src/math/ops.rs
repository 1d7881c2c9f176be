//! In-place matrix kernels for the training hot loop.
//!
//! Every kernel writes into a caller-owned, pre-sized output and
//! validates all operand shapes (inputs and output) before touching any
//! data. The `*_assign` forms mutate their first operand; the borrow
//! rules make accidental aliasing of distinct inputs and outputs
//! impossible.

use crate::error::Result;
use crate::math::matrix::Matrix;

/// `out = a + b`, elementwise.
pub fn add(a: &Matrix, b: &Matrix, out: &mut Matrix) -> Result<()> {
    a.check_same_shape(b)?;
    a.check_same_shape(out)?;
    for ((o, x), y) in out.as_mut_slice().iter_mut().zip(a.as_slice()).zip(b.as_slice()) {
        *o = x + y;
    }
    Ok(())
}

/// `out = a - b`, elementwise.
pub fn sub(a: &Matrix, b: &Matrix, out: &mut Matrix) -> Result<()> {
    a.check_same_shape(b)?;
    a.check_same_shape(out)?;
    for ((o, x), y) in out.as_mut_slice().iter_mut().zip(a.as_slice()).zip(b.as_slice()) {
        *o = x - y;
    }
    Ok(())
}

/// `out = a ⊙ b`, the elementwise (Hadamard) product.
pub fn prod(a: &Matrix, b: &Matrix, out: &mut Matrix) -> Result<()> {
    a.check_same_shape(b)?;
    a.check_same_shape(out)?;
    for ((o, x), y) in out.as_mut_slice().iter_mut().zip(a.as_slice()).zip(b.as_slice()) {
        *o = x * y;
    }
    Ok(())
}

/// `out = a · b`, the matrix product.
pub fn mul(a: &Matrix, b: &Matrix, out: &mut Matrix) -> Result<()> {
    a.check_inner_dims(b)?;
    a.check_same_rows(out)?;
    b.check_same_columns(out)?;

    let (n, m, inner) = (a.rows(), b.columns(), a.columns());
    let av = a.as_slice();
    let bv = b.as_slice();
    let ov = out.as_mut_slice();
    for i in 0..n {
        for j in 0..m {
            let mut acc = 0.0;
            for k in 0..inner {
                acc += av[i * inner + k] * bv[k * m + j];
            }
            ov[i * m + j] = acc;
        }
    }
    Ok(())
}

/// `out = aᵀ · b`, reading `a` column-major instead of materializing the
/// transpose. Requires `a.rows == b.rows`.
pub fn t_mul(a: &Matrix, b: &Matrix, out: &mut Matrix) -> Result<()> {
    a.check_same_rows(b)?;
    a.check_inner_dims(out)?;
    b.check_same_columns(out)?;

    let (n, m, inner) = (a.columns(), b.columns(), a.rows());
    let av = a.as_slice();
    let bv = b.as_slice();
    let ov = out.as_mut_slice();
    for i in 0..n {
        for j in 0..m {
            let mut acc = 0.0;
            for k in 0..inner {
                acc += av[k * n + i] * bv[k * m + j];
            }
            ov[i * m + j] = acc;
        }
    }
    Ok(())
}

/// `out = a · bᵀ`, reading `b` column-major instead of materializing the
/// transpose. Requires `a.columns == b.columns`.
pub fn mul_t(a: &Matrix, b: &Matrix, out: &mut Matrix) -> Result<()> {
    a.check_same_columns(b)?;
    a.check_same_rows(out)?;
    out.check_inner_dims(b)?;

    let (n, m, inner) = (a.rows(), b.rows(), a.columns());
    let av = a.as_slice();
    let bv = b.as_slice();
    let ov = out.as_mut_slice();
    for i in 0..n {
        for j in 0..m {
            let mut acc = 0.0;
            for k in 0..inner {
                acc += av[i * inner + k] * bv[j * inner + k];
            }
            ov[i * m + j] = acc;
        }
    }
    Ok(())
}

/// `out = a · factor`.
pub fn scale(a: &Matrix, factor: f64, out: &mut Matrix) -> Result<()> {
    a.check_same_shape(out)?;
    for (o, x) in out.as_mut_slice().iter_mut().zip(a.as_slice()) {
        *o = x * factor;
    }
    Ok(())
}

/// `out = a + factor · b`.
pub fn scale_add(a: &Matrix, b: &Matrix, factor: f64, out: &mut Matrix) -> Result<()> {
    a.check_same_shape(b)?;
    a.check_same_shape(out)?;
    for ((o, x), y) in out.as_mut_slice().iter_mut().zip(a.as_slice()).zip(b.as_slice()) {
        *o = x + factor * y;
    }
    Ok(())
}

/// `out = a - factor · b`.
pub fn scale_sub(a: &Matrix, b: &Matrix, factor: f64, out: &mut Matrix) -> Result<()> {
    a.check_same_shape(b)?;
    a.check_same_shape(out)?;
    for ((o, x), y) in out.as_mut_slice().iter_mut().zip(a.as_slice()).zip(b.as_slice()) {
        *o = x - factor * y;
    }
    Ok(())
}

/// `out = f(a)`, elementwise.
pub fn apply(a: &Matrix, f: impl Fn(f64) -> f64, out: &mut Matrix) -> Result<()> {
    a.check_same_shape(out)?;
    for (o, x) in out.as_mut_slice().iter_mut().zip(a.as_slice()) {
        *o = f(*x);
    }
    Ok(())
}

/// `out = a`.
pub fn copy(a: &Matrix, out: &mut Matrix) -> Result<()> {
    a.check_same_shape(out)?;
    out.as_mut_slice().copy_from_slice(a.as_slice());
    Ok(())
}

/// `a += b`, elementwise.
pub fn add_assign(a: &mut Matrix, b: &Matrix) -> Result<()> {
    a.check_same_shape(b)?;
    for (x, y) in a.as_mut_slice().iter_mut().zip(b.as_slice()) {
        *x += y;
    }
    Ok(())
}

/// `a ⊙= b`, elementwise.
pub fn prod_assign(a: &mut Matrix, b: &Matrix) -> Result<()> {
    a.check_same_shape(b)?;
    for (x, y) in a.as_mut_slice().iter_mut().zip(b.as_slice()) {
        *x *= y;
    }
    Ok(())
}

/// `a *= factor`.
pub fn scale_assign(a: &mut Matrix, factor: f64) {
    for x in a.as_mut_slice() {
        *x *= factor;
    }
}

/// `a = f(a)`, elementwise.
pub fn apply_assign(a: &mut Matrix, f: impl Fn(f64) -> f64) {
    for x in a.as_mut_slice() {
        *x = f(*x);
    }
}

/// `a -= factor · b`.
pub fn scale_sub_assign(a: &mut Matrix, b: &Matrix, factor: f64) -> Result<()> {
    a.check_same_shape(b)?;
    for (x, y) in a.as_mut_slice().iter_mut().zip(b.as_slice()) {
        *x -= factor * y;
    }
    Ok(())
}

/// Zeroes a set of matrices, keeping their shapes.
pub fn zero(matrices: &mut [Matrix]) {
    for m in matrices {
        m.zero_fill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn m(rows: usize, columns: usize, data: &[f64]) -> Matrix {
        Matrix::from_vec(rows, columns, data.to_vec()).unwrap()
    }

    #[test]
    fn into_kernels_match_pure_operations() {
        let a = m(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = m(2, 3, &[0.5, 1.5, 2.5, 3.5, 4.5, 5.5]);
        let c = m(3, 2, &[6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
        let mut out = Matrix::zeros(2, 3).unwrap();
        let mut product = Matrix::zeros(2, 2).unwrap();

        add(&a, &b, &mut out).unwrap();
        assert_eq!(out, a.add(&b).unwrap());

        sub(&a, &b, &mut out).unwrap();
        assert_eq!(out, a.sub(&b).unwrap());

        prod(&a, &b, &mut out).unwrap();
        assert_eq!(out, a.prod(&b).unwrap());

        mul(&a, &c, &mut product).unwrap();
        assert_eq!(product, a.mul(&c).unwrap());

        t_mul(&a, &b, &mut Matrix::zeros(3, 3).unwrap()).unwrap();
        mul_t(&a, &b, &mut product).unwrap();
        assert_eq!(product, a.mul_t(&b).unwrap());

        scale_add(&a, &b, 2.0, &mut out).unwrap();
        assert_eq!(out, a.scale_add(2.0, &b).unwrap());

        scale_sub(&a, &b, 2.0, &mut out).unwrap();
        assert_eq!(out, a.scale_add(-2.0, &b).unwrap());

        apply(&a, |x| x * x, &mut out).unwrap();
        assert_eq!(out, a.apply(|x| x * x));
    }

    #[test]
    fn output_shape_is_validated() {
        let a = m(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = m(2, 3, &[1.0; 6]);
        let mut wrong = Matrix::zeros(3, 3).unwrap();
        assert!(matches!(
            add(&a, &b, &mut wrong),
            Err(Error::RowsMismatch(2, 3))
        ));

        let c = m(3, 2, &[1.0; 6]);
        let mut wrong = Matrix::zeros(2, 3).unwrap();
        assert!(matches!(
            mul(&a, &c, &mut wrong),
            Err(Error::ColumnsMismatch(2, 3))
        ));
    }

    #[test]
    fn assign_kernels() {
        let mut a = m(1, 4, &[1.0, 2.0, 3.0, 4.0]);
        let b = m(1, 4, &[2.0, 2.0, 2.0, 2.0]);

        add_assign(&mut a, &b).unwrap();
        assert_eq!(a.as_slice(), &[3.0, 4.0, 5.0, 6.0]);

        prod_assign(&mut a, &b).unwrap();
        assert_eq!(a.as_slice(), &[6.0, 8.0, 10.0, 12.0]);

        scale_assign(&mut a, 0.5);
        assert_eq!(a.as_slice(), &[3.0, 4.0, 5.0, 6.0]);

        apply_assign(&mut a, |x| x - 3.0);
        assert_eq!(a.as_slice(), &[0.0, 1.0, 2.0, 3.0]);

        scale_sub_assign(&mut a, &b, 0.5).unwrap();
        assert_eq!(a.as_slice(), &[-1.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn zero_clears_every_matrix() {
        let mut matrices = vec![m(1, 2, &[1.0, 2.0]), m(2, 1, &[3.0, 4.0])];
        zero(&mut matrices);
        assert!(matrices.iter().all(|m| m.iter().all(|x| x == 0.0)));
    }
}
