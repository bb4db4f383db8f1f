//! Graph projector contract (C4): projects `(c_x, c_y)` onto the graph
//! `{(x, y) : y = Ã x}` of the equilibrated operator. Two strategies ship
//! with the core: [`direct::DirectProjector`] (dense only, one Cholesky
//! factorization reused across calls) and [`cgls::CglsProjector`]
//! (any backend, matrix-free, warm-started conjugate gradient).

pub mod cgls;
pub mod direct;

use derive_more::{Display, Error};
use faer::{ColMut, ColRef};
use problemo::Problem;

use crate::Scalar;
use crate::matrix::Matrix;

#[derive(Debug, Display, Error, PartialEq)]
pub enum ProjectorError {
    #[display("projector used before init()")]
    Uninitialized,
    #[display("direct projector's normal-equations factorization failed")]
    FactorizationFailed,
    #[display("CGLS did not reach the requested tolerance within the iteration budget")]
    CglsMaxIterExceeded,
    #[display("dimension mismatch in projector input")]
    DimensionMismatch,
}

/// Solves `minimize 1/2||x-c_x||^2 + w/2||y-c_y||^2 s.t. y = Ã x` for `w > 0`.
pub trait Projector<T: Scalar, M: Matrix<T>> {
    fn new() -> Self
    where
        Self: Sized;

    /// One-time setup against the equilibrated operator (factorization for
    /// the direct strategy; buffer allocation for CGLS). Must be re-run if
    /// the operator's equilibration changes.
    fn init(&mut self, mat: &M) -> Result<(), Problem>;

    /// Projects `(c_x, c_y)`, writing the result into `x_out`/`y_out`.
    /// `x_out` is also the warm start for iterative strategies.
    #[allow(clippy::too_many_arguments)]
    fn project(
        &mut self,
        mat: &M,
        c_x: ColRef<'_, T>,
        c_y: ColRef<'_, T>,
        w: T,
        x_out: ColMut<'_, T>,
        y_out: ColMut<'_, T>,
        tol: T,
    ) -> Result<(), Problem>;
}
