//! CGLS graph projector (§4.4): generic over any [`Matrix`] backend,
//! matrix-free, warm-started from the previous call's `x_out`. Solves the
//! normal equations `(I + w·ÃᵀÃ)·x = c_x + w·Ãᵀ·c_y` with conjugate
//! gradient rather than factoring them, since the sparse/fast-operator
//! backends don't expose a dense factor to cache.

use faer::{Col, ColMut, ColRef};
use problemo::Problem;

use crate::Scalar;
use crate::matrix::{Matrix, Trans};
use crate::projector::{Projector, ProjectorError};
use crate::vector;

pub struct CglsProjector<T: Scalar> {
    m: usize,
    n: usize,
    max_iter: usize,
    initialized: bool,
    x_warm: Col<T>,
}

impl<T: Scalar> CglsProjector<T> {
    /// Overrides the default iteration budget (`2 * (m + n)`, rebuilt at the
    /// next `init`). Mirrors the original's `kCgTolFactor`-style knob but
    /// expressed as a hard cap rather than a tolerance multiplier, since
    /// spec §4.4 leaves the exact budget to the implementation.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Applies `v ↦ v + w·Ãᵀ(Ã v)`, the implicit SPD operator CG runs
    /// against.
    fn apply_normal<M: Matrix<T>>(
        mat: &M,
        w: T,
        v: ColRef<'_, T>,
        out: ColMut<'_, T>,
        scratch: ColMut<'_, T>,
    ) -> Result<(), Problem> {
        let mut scratch = scratch;
        mat.mul(Trans::No, T::one(), v, T::zero(), scratch.as_mut())?;
        let mut out = out;
        mat.mul(Trans::Trans, w, scratch.as_ref(), T::zero(), out.as_mut())?;
        vector::axpy(T::one(), v, out.as_mut());
        Ok(())
    }
}

impl<T: Scalar, M: Matrix<T>> Projector<T, M> for CglsProjector<T> {
    fn new() -> Self {
        Self {
            m: 0,
            n: 0,
            max_iter: 0,
            initialized: false,
            x_warm: Col::zeros(0),
        }
    }

    fn init(&mut self, mat: &M) -> Result<(), Problem> {
        self.m = mat.rows();
        self.n = mat.cols();
        if self.max_iter == 0 {
            self.max_iter = 2 * (self.m + self.n);
        }
        self.x_warm = Col::zeros(self.n);
        self.initialized = true;
        Ok(())
    }

    fn project(
        &mut self,
        mat: &M,
        c_x: ColRef<'_, T>,
        c_y: ColRef<'_, T>,
        w: T,
        mut x_out: ColMut<'_, T>,
        mut y_out: ColMut<'_, T>,
        tol: T,
    ) -> Result<(), Problem> {
        if !self.initialized {
            return Err(ProjectorError::Uninitialized.into());
        }
        if c_x.nrows() != self.n || c_y.nrows() != self.m {
            return Err(ProjectorError::DimensionMismatch.into());
        }

        // rhs = c_x + w * A^T c_y
        let mut rhs = c_x.to_owned();
        let mut atcy = Col::<T>::zeros(self.n);
        mat.mul(Trans::Trans, T::one(), c_y, T::zero(), atcy.as_mut())?;
        vector::axpy(w, atcy.as_ref(), rhs.as_mut());

        // CG on (I + w A^T A) x = rhs, warm-started from the previous solve.
        let mut x = self.x_warm.clone();
        let mut scratch_m = Col::<T>::zeros(self.m);
        let mut ax = Col::<T>::zeros(self.n);
        Self::apply_normal(mat, w, x.as_ref(), ax.as_mut(), scratch_m.as_mut())?;

        let mut r = rhs.clone();
        vector::axpy(-T::one(), ax.as_ref(), r.as_mut());
        let mut p = r.clone();
        let mut rs_old = vector::dot(r.as_ref(), r.as_ref());

        let rhs_norm = vector::nrm2(rhs.as_ref());
        let stop_thresh = if rhs_norm > T::zero() {
            tol * tol * rhs_norm * rhs_norm
        } else {
            tol * tol
        };

        let mut converged = rs_old <= stop_thresh;
        if !converged {
            for _ in 0..self.max_iter {
                let mut ap = Col::<T>::zeros(self.n);
                Self::apply_normal(mat, w, p.as_ref(), ap.as_mut(), scratch_m.as_mut())?;
                let p_ap = vector::dot(p.as_ref(), ap.as_ref());
                if p_ap <= T::zero() {
                    break;
                }
                let alpha = rs_old / p_ap;
                vector::axpy(alpha, p.as_ref(), x.as_mut());
                vector::axpy(-alpha, ap.as_ref(), r.as_mut());
                let rs_new = vector::dot(r.as_ref(), r.as_ref());
                if rs_new <= stop_thresh {
                    converged = true;
                    break;
                }
                let beta = rs_new / rs_old;
                vector::scal(beta, p.as_mut());
                vector::axpy(T::one(), r.as_ref(), p.as_mut());
                rs_old = rs_new;
            }
        }

        if !converged {
            return Err(ProjectorError::CglsMaxIterExceeded.into());
        }

        vector::memcpy(x_out.as_mut(), x.as_ref());
        self.x_warm = x;
        mat.mul(Trans::No, T::one(), x_out.as_ref(), T::zero(), y_out.as_mut())?;
        Ok(())
    }
}
