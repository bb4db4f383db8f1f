//! Direct graph projector (§4.4): dense-only, factors `I + w·ÃᵀÃ` (or its
//! Woodbury dual `I + w·ÃÃᵀ` when `m < n`) once at `Init`, then answers
//! every `Project` call with two matvecs and a triangular solve pair.
//! `tol` is ignored — both branches solve to machine precision.
//!
//! The factorization itself is a plain dense Cholesky implemented directly
//! against `faer::Mat`, the same hand-rolled-kernel texture as
//! [`crate::cone`]'s Jacobi eigensolver: the normal-equations matrix here is
//! always small and dense regardless of `Ã`'s own backend, so there is no
//! need for a general sparse/symmetric factorization abstraction.

use faer::{Col, ColMut, ColRef, Mat};
use problemo::Problem;

use crate::Scalar;
use crate::matrix::{DenseMatrix, Matrix, Trans};
use crate::projector::{Projector, ProjectorError};
use crate::vector;

/// Which normal-equations system was factored: the primal `I + w·ÃᵀÃ`
/// (`n × n`) or, when `m < n`, the dual `I + w·ÃÃᵀ` (`m × m`) combined with
/// the Woodbury identity to recover `x`.
enum Factorization<T: Scalar> {
    Primal(Mat<T>),
    Dual(Mat<T>),
}

pub struct DirectProjector<T: Scalar> {
    factor: Option<Factorization<T>>,
    w_cached: T,
    m: usize,
    n: usize,
}

impl<T: Scalar> DirectProjector<T> {
    fn factorize(&mut self, a: &Mat<T>, w: T) -> Result<(), Problem> {
        let m = a.nrows();
        let n = a.ncols();

        if n <= m {
            let normal = normal_equations(a, w, Trans::Trans); // I + w A^T A, n x n
            let l = cholesky(&normal).ok_or(ProjectorError::FactorizationFailed)?;
            self.factor = Some(Factorization::Primal(l));
        } else {
            let normal = normal_equations(a, w, Trans::No); // I + w A A^T, m x m
            let l = cholesky(&normal).ok_or(ProjectorError::FactorizationFailed)?;
            self.factor = Some(Factorization::Dual(l));
        }
        self.w_cached = w;
        Ok(())
    }
}

/// Builds `I + w·AᵀA` (`trans = Trans` → `n×n`) or `I + w·AAᵀ`
/// (`trans = No` → `m×m`) by direct accumulation.
fn normal_equations<T: Scalar>(a: &Mat<T>, w: T, trans: Trans) -> Mat<T> {
    let (m, n) = (a.nrows(), a.ncols());
    match trans {
        Trans::Trans => Mat::from_fn(n, n, |i, j| {
            let mut acc = T::zero();
            for k in 0..m {
                acc = acc + a[(k, i)] * a[(k, j)];
            }
            let diag = if i == j { T::one() } else { T::zero() };
            diag + w * acc
        }),
        Trans::No => Mat::from_fn(m, m, |i, j| {
            let mut acc = T::zero();
            for k in 0..n {
                acc = acc + a[(i, k)] * a[(j, k)];
            }
            let diag = if i == j { T::one() } else { T::zero() };
            diag + w * acc
        }),
    }
}

/// Lower-triangular Cholesky factor `L` of symmetric positive definite `a`
/// (`a = L·Lᵀ`), or `None` if a pivot is non-positive.
fn cholesky<T: Scalar>(a: &Mat<T>) -> Option<Mat<T>> {
    let n = a.nrows();
    let mut l = vec![vec![T::zero(); n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[(i, j)];
            for k in 0..j {
                sum = sum - l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= T::zero() {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }
    Some(Mat::from_fn(n, n, |i, j| l[i][j]))
}

/// Solves `L·Lᵀ·x = b` in place given the lower-triangular factor `l`.
fn cholesky_solve<T: Scalar>(l: &Mat<T>, b: &mut Col<T>) {
    let n = l.nrows();
    // Forward solve L y = b.
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum = sum - l[(i, k)] * b[k];
        }
        b[i] = sum / l[(i, i)];
    }
    // Back solve L^T x = y.
    for i in (0..n).rev() {
        let mut sum = b[i];
        for k in (i + 1)..n {
            sum = sum - l[(k, i)] * b[k];
        }
        b[i] = sum / l[(i, i)];
    }
}

impl<T: Scalar> Projector<T, DenseMatrix<T>> for DirectProjector<T> {
    fn new() -> Self {
        Self {
            factor: None,
            w_cached: T::zero(),
            m: 0,
            n: 0,
        }
    }

    fn init(&mut self, mat: &DenseMatrix<T>) -> Result<(), Problem> {
        self.m = mat.rows();
        self.n = mat.cols();
        self.factorize(mat.scaled(), T::one())
    }

    fn project(
        &mut self,
        mat: &DenseMatrix<T>,
        c_x: ColRef<'_, T>,
        c_y: ColRef<'_, T>,
        w: T,
        mut x_out: ColMut<'_, T>,
        mut y_out: ColMut<'_, T>,
        _tol: T,
    ) -> Result<(), Problem> {
        if c_x.nrows() != self.n || c_y.nrows() != self.m {
            return Err(ProjectorError::DimensionMismatch.into());
        }
        if self.factor.is_none() {
            return Err(ProjectorError::Uninitialized.into());
        }
        if w != self.w_cached {
            self.factorize(mat.scaled(), w)?;
        }

        let a = mat.scaled();

        // rhs = c_x + w * A^T c_y  (length n).
        let mut rhs = c_x.to_owned();
        let mut atcy = Col::<T>::zeros(self.n);
        mat.mul(Trans::Trans, T::one(), c_y, T::zero(), atcy.as_mut())?;
        vector::axpy(w, atcy.as_ref(), rhs.as_mut());

        let x = match self.factor.as_ref().unwrap() {
            Factorization::Primal(l) => {
                let mut sol = rhs.clone();
                cholesky_solve(l, &mut sol);
                sol
            }
            Factorization::Dual(l) => {
                // x = rhs - w * A^T * (N^{-1} * (A * rhs))
                let mut a_rhs = Col::<T>::zeros(self.m);
                mat.mul(Trans::No, T::one(), rhs.as_ref(), T::zero(), a_rhs.as_mut())?;
                cholesky_solve(l, &mut a_rhs);
                let mut at_term = Col::<T>::zeros(self.n);
                mat.mul(Trans::Trans, T::one(), a_rhs.as_ref(), T::zero(), at_term.as_mut())?;
                let mut sol = rhs.clone();
                vector::axpy(-w, at_term.as_ref(), sol.as_mut());
                sol
            }
        };

        vector::memcpy(x_out.as_mut(), x.as_ref());
        mat.mul(Trans::No, T::one(), x_out.as_ref(), T::zero(), y_out.as_mut())?;

        let _ = a; // kept for symmetry with the CGLS projector's signature
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use faer::Mat;

    use super::*;

    fn small_matrix() -> DenseMatrix<f64> {
        // 3x2, full column rank.
        let a = Mat::from_fn(3, 2, |i, j| [[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]][i][j]);
        DenseMatrix::new(a)
    }

    #[test]
    fn test_project_lands_on_graph() {
        let mut mat = small_matrix();
        Matrix::init(&mut mat).unwrap();
        let no_d = crate::equilibration::no_constraint::<f64>();
        let no_e = crate::equilibration::no_constraint::<f64>();
        let mut d = Col::<f64>::from_fn(3, |_| 1.0);
        let mut e = Col::<f64>::from_fn(2, |_| 1.0);
        mat.equil(d.as_mut(), e.as_mut(), no_d.as_ref(), no_e.as_ref()).unwrap();

        let mut projector = DirectProjector::<f64>::new();
        projector.init(&mat).unwrap();

        let c_x = Col::<f64>::from_fn(2, |i| [1.0, 2.0][i]);
        let c_y = Col::<f64>::from_fn(3, |i| [0.0, 0.0, 5.0][i]);
        let mut x_out = Col::<f64>::zeros(2);
        let mut y_out = Col::<f64>::zeros(3);
        projector
            .project(&mat, c_x.as_ref(), c_y.as_ref(), 1.0, x_out.as_mut(), y_out.as_mut(), 1e-8)
            .unwrap();

        let mut check = Col::<f64>::zeros(3);
        mat.mul(Trans::No, 1.0, x_out.as_ref(), 0.0, check.as_mut()).unwrap();
        for i in 0..3 {
            assert!((check[i] - y_out[i]).abs() < 1e-8);
        }
    }
}
