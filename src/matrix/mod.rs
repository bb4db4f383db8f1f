//! Matrix operator contract (C2) and its three backends: dense, sparse, and
//! a closure-based "fast operator" form for matrix-free `A`.

pub mod dense;
pub mod operator;
pub mod sparse;

pub use dense::DenseMatrix;
pub use operator::FastOperatorMatrix;
pub use sparse::SparseMatrix;

use derive_more::{Display, Error};
use faer::{ColMut, ColRef};
use problemo::Problem;

use crate::Scalar;
use crate::equilibration::ConstrainFn;

#[derive(Debug, Display, Error, PartialEq)]
pub enum MatrixError {
    #[display("matrix has not been initialized")]
    Uninitialized,
    #[display("equilibrated operator could not be assembled")]
    BadEquilibration,
    #[display("dimension mismatch in matrix-vector product")]
    DimensionMismatch,
}

/// Which operator a [`Matrix::mul`] call applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trans {
    No,
    Trans,
}

/// Uniform multiply contract over dense / sparse / fast-operator backends.
/// `Init` is idempotent and must be called before `Mul`; after `Equil`
/// returns, `Mul` applies the *equilibrated* operator `Ã = diag(d)·A·diag(e)`,
/// not the original `A`.
pub trait Matrix<T: Scalar> {
    fn init(&mut self) -> Result<(), Problem>;

    fn rows(&self) -> usize;
    fn cols(&self) -> usize;

    /// Produces positive diagonal scalings `(d, e)`, honoring the
    /// cone-averaging constraints, and internally switches this operator to
    /// apply `Ã` from then on.
    fn equil(
        &mut self,
        d: ColMut<'_, T>,
        e: ColMut<'_, T>,
        constrain_d: &ConstrainFn<'_, T>,
        constrain_e: &ConstrainFn<'_, T>,
    ) -> Result<(), Problem>;

    /// `y ← α·op(Ã)·x + β·y`.
    fn mul(&self, trans: Trans, alpha: T, x: ColRef<'_, T>, beta: T, y: ColMut<'_, T>) -> Result<(), Problem>;
}
