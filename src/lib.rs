//! POGS: a first-order ADMM engine for graph-form convex problems
//!
//! ```text
//!   minimize    f(y) + g(x)
//!   subject to  y = A x
//! ```
//!
//! and, as a specialization, cone programs in standard form. See
//! `solver::PogsSolver` for the public entry point.

use std::any::Any;

use dyn_clone::DynClone;
use faer::traits::ComplexField;
use faer::traits::num_traits::Float;
use macros::build_options;

/// Scalar element type a solver instance is built over. `f32` and `f64` both
/// satisfy it; the ADMM driver, vector façade, and matrix/projector backends
/// are all generic over `T: Scalar`.
pub trait Scalar: ComplexField<Real = Self> + Float + 'static {}
impl<T> Scalar for T where T: ComplexField<Real = T> + Float + 'static {}

pub mod cone;
pub mod equilibration;
pub mod matrix;
pub mod objective;
pub mod projector;
pub mod report;
pub mod solver;
pub mod terminators;
pub mod vector;

#[cfg(test)]
pub mod tests;

pub use status::Status;

/// Trait bound satisfied by every concrete option value type (`bool`,
/// `usize`, `f64`, ...). Mirrors the teacher crate's option registry: a
/// type-erased map keyed by option name, with type-safe get/set through a
/// downcast.
pub trait OptionTrait: Any + Sync + Send + DynClone {}
impl OptionTrait for bool {}
impl OptionTrait for usize {}
impl OptionTrait for f32 {}
impl OptionTrait for f64 {}

impl Clone for Box<dyn OptionTrait> {
    fn clone(&self) -> Self {
        dyn_clone::clone_box(&**self)
    }
}

mod status {
    /// Outcome of a `Solve` call. Every exit path of the driver goes through
    /// one of these variants; no panics escape `solve`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum Status {
        #[default]
        /// The solver has not yet returned. Never observed by a caller
        /// after `solve` returns.
        InProgress,
        /// Converged to the requested tolerances.
        Success,
        /// Hit `max_iter` without converging.
        MaxIter,
        /// A residual went non-finite (NaN or Inf); the current iterate is
        /// still returned.
        NanFound,
        /// A cone index was out of range or duplicated across cones.
        InvalidCone,
        /// A user-installed Ctrl-C handler fired; behaves like `MaxIter` to
        /// callers.
        Interrupted,
        /// A wall-clock terminator's deadline elapsed; behaves like
        /// `MaxIter` to callers.
        TimeLimit,
    }

    impl std::fmt::Display for Status {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            let s = match self {
                Status::InProgress => "in progress",
                Status::Success => "optimal",
                Status::MaxIter => "reached max iterations",
                Status::NanFound => "diverged (nan/inf residual)",
                Status::InvalidCone => "invalid cone configuration",
                Status::Interrupted => "interrupted",
                Status::TimeLimit => "reached time limit",
            };
            f.write_str(s)
        }
    }
}

build_options!(registry_name = OPTION_REGISTRY);

/// Friendly alias for the generated option registry type (the
/// `build_options!` macro always names the struct it generates `Options`).
pub type SolverOptions = Options;
