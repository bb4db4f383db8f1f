//! A matrix-free operator backend, grounded on the original implementation's
//! `MatrixFAO`: the operator is defined purely by two closures (forward and
//! adjoint apply) plus a sample count and a sweep count used to equilibrate
//! it without ever materializing `A`.

use faer::rand::SeedableRng;
use faer::rand::rngs::StdRng;
use faer::stats::DistributionExt;
use faer::stats::prelude::{CwiseMatDistribution, StandardNormal};
use faer::{Col, ColMut, ColRef};
use problemo::Problem;

use crate::Scalar;
use crate::equilibration::{ConstrainFn, sinkhorn_sweep};
use crate::matrix::{Matrix, MatrixError, Trans};
use crate::vector;

/// `y ← α·A·x + β·y` (or the adjoint), supplied by the caller as a plain
/// closure — the operator never sees the representation of `A`.
pub type ApplyFn<T> = Box<dyn Fn(T, ColRef<'_, T>, T, ColMut<'_, T>) + Send + Sync>;

/// Matrix-free linear operator. `samples` Gaussian probe vectors are used
/// per equilibration sweep to unbiasedly estimate row/column sums-of-squares
/// of `A` (see [`Self::equil`]); `equil_steps` bounds how many alternating
/// sweeps are run, mirroring `MatrixFAO::_samples` / `_equil_steps` in the
/// original implementation.
pub struct FastOperatorMatrix<T: Scalar> {
    m: usize,
    n: usize,
    amul: ApplyFn<T>,
    atmul: ApplyFn<T>,
    samples: usize,
    equil_steps: usize,
    d: Col<T>,
    e: Col<T>,
    initialized: bool,
    done_equil: bool,
    seed: u64,
}

impl<T: Scalar> FastOperatorMatrix<T> {
    pub fn new(
        m: usize,
        n: usize,
        amul: ApplyFn<T>,
        atmul: ApplyFn<T>,
        samples: usize,
        equil_steps: usize,
    ) -> Self {
        Self {
            m,
            n,
            amul,
            atmul,
            samples,
            equil_steps,
            d: Col::from_fn(m, |_| T::one()),
            e: Col::from_fn(n, |_| T::one()),
            initialized: false,
            done_equil: false,
            seed: 0,
        }
    }

    /// Applies the *unscaled* user operator directly; used internally by
    /// `mul` after scaling the input/output by `e`/`d`.
    fn apply_raw(&self, trans: Trans, x: ColRef<'_, T>, mut y: ColMut<'_, T>) {
        match trans {
            Trans::No => (self.amul)(T::one(), x, T::zero(), y.as_mut()),
            Trans::Trans => (self.atmul)(T::one(), x, T::zero(), y.as_mut()),
        }
    }

    fn probe_col(&mut self, len: usize) -> Col<T> {
        self.seed = self.seed.wrapping_add(1);
        let rng = &mut StdRng::seed_from_u64(self.seed);
        let probe = CwiseMatDistribution {
            nrows: len,
            ncols: 1,
            dist: StandardNormal,
        }
        .rand::<T>(rng);
        Col::from_fn(len, |i| probe[(i, 0)])
    }
}

impl<T: Scalar> Matrix<T> for FastOperatorMatrix<T> {
    fn init(&mut self) -> Result<(), Problem> {
        self.initialized = true;
        Ok(())
    }

    fn rows(&self) -> usize {
        self.m
    }

    fn cols(&self) -> usize {
        self.n
    }

    fn equil(
        &mut self,
        mut d: ColMut<'_, T>,
        mut e: ColMut<'_, T>,
        constrain_d: &ConstrainFn<'_, T>,
        constrain_e: &ConstrainFn<'_, T>,
    ) -> Result<(), Problem> {
        if !self.initialized {
            return Err(MatrixError::Uninitialized.into());
        }

        for i in 0..d.nrows() {
            d[i] = T::one();
        }
        for j in 0..e.nrows() {
            e[j] = T::one();
        }

        let m = self.m;
        let n = self.n;
        let samples = self.samples.max(1);

        // Row sums-of-squares: for a Gaussian probe r ~ N(0, I_n), the vector
        // A·(e ⊙ r) has E[(A·(e⊙r))_i²] = Σⱼ (A[i,j]·e[j])², an unbiased
        // estimator averaged over `samples` independent probes.
        for _ in 0..self.equil_steps.max(1) {
            let mut sumsq_m = Col::<T>::zeros(m);
            for _ in 0..samples {
                let r = self.probe_col(n);
                let scaled_r = vector::elementwise_mul(e.as_ref(), r.as_ref());
                let mut out = Col::<T>::zeros(m);
                self.apply_raw(Trans::No, scaled_r.as_ref(), out.as_mut());
                for i in 0..m {
                    sumsq_m[i] = sumsq_m[i] + out[i] * out[i];
                }
            }
            for i in 0..m {
                let avg = sumsq_m[i] / T::from(samples as f64).unwrap();
                d[i] = if avg > T::zero() { T::one() / avg.sqrt() } else { T::one() };
            }
            constrain_d(d.as_mut());

            let mut sumsq_n = Col::<T>::zeros(n);
            for _ in 0..samples {
                let r = self.probe_col(m);
                let scaled_r = vector::elementwise_mul(d.as_ref(), r.as_ref());
                let mut out = Col::<T>::zeros(n);
                self.apply_raw(Trans::Trans, scaled_r.as_ref(), out.as_mut());
                for j in 0..n {
                    sumsq_n[j] = sumsq_n[j] + out[j] * out[j];
                }
            }
            for j in 0..n {
                let avg = sumsq_n[j] / T::from(samples as f64).unwrap();
                e[j] = if avg > T::zero() { T::one() / avg.sqrt() } else { T::one() };
            }
            constrain_e(e.as_mut());
        }

        // See `DenseMatrix::equil`: a non-finite operator output can zero
        // out a `d[i]`/`e[j]` (or, via the randomized probe, drive a
        // sum-of-squares to NaN/Inf directly); either way this is left to
        // surface through the driver's residual-finiteness check rather
        // than failing `equil` here (spec §7, §8 scenario 6).
        self.d = d.to_owned();
        self.e = e.to_owned();
        self.done_equil = true;

        Ok(())
    }

    fn mul(
        &self,
        trans: Trans,
        alpha: T,
        x: ColRef<'_, T>,
        beta: T,
        mut y: ColMut<'_, T>,
    ) -> Result<(), Problem> {
        match trans {
            Trans::No => {
                if x.nrows() != self.n || y.nrows() != self.m {
                    return Err(MatrixError::DimensionMismatch.into());
                }
                let scaled_x = vector::elementwise_mul(self.e.as_ref(), x);
                let mut raw = Col::<T>::zeros(self.m);
                self.apply_raw(Trans::No, scaled_x.as_ref(), raw.as_mut());
                for i in 0..self.m {
                    y[i] = alpha * self.d[i] * raw[i] + beta * y[i];
                }
            }
            Trans::Trans => {
                if x.nrows() != self.m || y.nrows() != self.n {
                    return Err(MatrixError::DimensionMismatch.into());
                }
                let scaled_x = vector::elementwise_mul(self.d.as_ref(), x);
                let mut raw = Col::<T>::zeros(self.n);
                self.apply_raw(Trans::Trans, scaled_x.as_ref(), raw.as_mut());
                for j in 0..self.n {
                    y[j] = alpha * self.e[j] * raw[j] + beta * y[j];
                }
            }
        }
        Ok(())
    }
}
