//! ADMM driver (C6): the fixed-point loop that ties the matrix backend (C2),
//! the graph projector (C4), and the proximal objective (C5) together.
//! Grounded directly on the original implementation's
//! `PogsImplementation<T, M, P>::Solve` — every constant, branch, and the
//! post-processing rescale mirror it; the surrounding plumbing (builder
//! setters, `Reporter`/`Terminator` hooks, `Problem` errors) follows this
//! crate's own `qp`/`nlp` solver drivers.

use std::time::Instant;

use faer::Col;
use problemo::Problem;

use crate::Scalar;
use crate::Status;
use crate::matrix::{Matrix, Trans};
use crate::objective::Objective;
use crate::projector::Projector;
use crate::report::{IterationReport, Reporter, SolveSummary, VerboseReporter};
use crate::terminators::Terminator;
use crate::vector;
use crate::SolverOptions;

const ALPHA: f64 = 1.7;
const RHO_INIT: f64 = 1.0;
const DELTA_MIN: f64 = 1.05;
const GAMMA: f64 = 1.01;
const TAU: f64 = 0.8;
const KAPPA: f64 = 0.9;
const RHO_MIN: f64 = 1e-4;
const RHO_MAX: f64 = 1e4;
const PROJ_TOL_NUMERATOR: f64 = 1e-2;
const PROJ_TOL_FLOOR: f64 = 1e-8;
const PROJ_TOL_POW: f64 = 1.3;

/// Hard-coded to `true` in the original (spec's Open Question on
/// `use_exact_stop`, resolved here by keeping it always-on rather than
/// exposing an approximate-only stopping mode no one exercises).
const USE_EXACT_STOP: bool = true;

/// The ADMM driver for `minimize f(y) + g(x) s.t. y = Ã x` (or, via
/// [`crate::objective::cone::ConeObjective`], a cone program in standard
/// form). Generic over the scalar type, the matrix backend, and the
/// projector strategy, so `(f32|f64) × (dense|sparse|operator) ×
/// (direct|cgls)` all monomorphize through the same loop body.
pub struct PogsSolver<T: Scalar, M: Matrix<T>, P: Projector<T, M>> {
    a: M,
    p: P,
    m: usize,
    n: usize,
    done_init: bool,

    d: Col<T>,
    e: Col<T>,
    z: Col<T>,
    zt: Col<T>,
    rho: T,

    x: Col<T>,
    y: Col<T>,
    mu: Col<T>,
    lambda: Col<T>,
    optval: T,
    final_iter: usize,

    abs_tol: T,
    rel_tol: T,
    max_iter: usize,
    init_iter: usize,
    adaptive_rho: bool,
    gap_stop: bool,
    verbose: usize,

    init_x: Option<Col<T>>,
    init_lambda: Option<Col<T>>,

    reporter: Box<dyn Reporter>,
    terminator: Option<Box<dyn Terminator>>,
}

impl<T: Scalar, M: Matrix<T>, P: Projector<T, M>> PogsSolver<T, M, P> {
    /// Builds a solver over `a`, sized from `a.rows()`/`a.cols()`. Matches
    /// spec §6 defaults: `abs_tol = 1e-4`, `rel_tol = 1e-3`, `max_iter =
    /// 2500`, `init_iter = 10`, `rho = 1.0`, `adaptive_rho = true`,
    /// `gap_stop = false`, `verbose = 2`.
    pub fn new(a: M) -> Self {
        let m = a.rows();
        let n = a.cols();
        let p = P::new();

        let mut options = SolverOptions::new();
        let _ = options.set_option("verbose", 2usize);

        Self {
            a,
            p,
            m,
            n,
            done_init: false,
            d: Col::zeros(m),
            e: Col::zeros(n),
            z: Col::zeros(m + n),
            zt: Col::zeros(m + n),
            rho: T::from(RHO_INIT).unwrap(),
            x: Col::zeros(n),
            y: Col::zeros(m),
            mu: Col::zeros(n),
            lambda: Col::zeros(m),
            optval: T::zero(),
            final_iter: 0,
            abs_tol: T::from(1e-4).unwrap(),
            rel_tol: T::from(1e-3).unwrap(),
            max_iter: 2500,
            init_iter: 10,
            adaptive_rho: true,
            gap_stop: false,
            verbose: 2,
            init_x: None,
            init_lambda: None,
            reporter: Box::new(VerboseReporter::new(&options)),
            terminator: None,
        }
    }

    pub fn with_abs_tol(mut self, abs_tol: T) -> Self {
        self.abs_tol = abs_tol;
        self
    }

    pub fn with_rel_tol(mut self, rel_tol: T) -> Self {
        self.rel_tol = rel_tol;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_init_iter(mut self, init_iter: usize) -> Self {
        self.init_iter = init_iter;
        self
    }

    pub fn with_rho(mut self, rho: T) -> Self {
        self.rho = rho;
        self
    }

    pub fn with_adaptive_rho(mut self, adaptive_rho: bool) -> Self {
        self.adaptive_rho = adaptive_rho;
        self
    }

    pub fn with_gap_stop(mut self, gap_stop: bool) -> Self {
        self.gap_stop = gap_stop;
        self
    }

    /// Also rebuilds the default reporter so its own verbosity gating
    /// (see [`crate::report::VerboseReporter`]) matches. Call
    /// [`Self::with_reporter`] afterwards to override with a custom one.
    pub fn with_verbose(mut self, verbose: usize) -> Self {
        self.verbose = verbose;
        let mut options = SolverOptions::new();
        let _ = options.set_option("verbose", verbose);
        self.reporter = Box::new(VerboseReporter::new(&options));
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_terminator(mut self, terminator: Box<dyn Terminator>) -> Self {
        self.terminator = Some(terminator);
        self
    }

    /// Warm start from a known-good `x₀` (consumed by the next `solve`).
    pub fn with_init_x(mut self, x0: Col<T>) -> Self {
        self.init_x = Some(x0);
        self
    }

    /// Warm start from a known-good `λ₀` (consumed by the next `solve`).
    pub fn with_init_lambda(mut self, lambda0: Col<T>) -> Self {
        self.init_lambda = Some(lambda0);
        self
    }

    pub fn x(&self) -> &Col<T> {
        &self.x
    }

    pub fn y(&self) -> &Col<T> {
        &self.y
    }

    pub fn mu(&self) -> &Col<T> {
        &self.mu
    }

    pub fn lambda(&self) -> &Col<T> {
        &self.lambda
    }

    pub fn optval(&self) -> T {
        self.optval
    }

    pub fn final_iter(&self) -> usize {
        self.final_iter
    }

    pub fn rho(&self) -> T {
        self.rho
    }

    fn init_problem<O: Objective<T>>(&mut self, obj: &O) -> Result<(), Problem> {
        self.a.init()?;
        let constrain_d = |v: faer::ColMut<'_, T>| obj.constrain_d(v);
        let constrain_e = |v: faer::ColMut<'_, T>| obj.constrain_e(v);
        self.a
            .equil(self.d.as_mut(), self.e.as_mut(), &constrain_d, &constrain_e)?;
        self.p.init(&self.a)?;
        self.done_init = true;
        Ok(())
    }

    /// Runs the ADMM loop to completion against `objective`, which is
    /// mutated once (by `scale`) and otherwise borrowed for the duration of
    /// this call only (spec §5's ownership model).
    pub fn solve<O: Objective<T>>(&mut self, objective: &mut O) -> Result<Status, Problem> {
        let t0 = Instant::now();
        if !self.done_init {
            self.init_problem(objective)?;
        }

        let m = self.m;
        let n = self.n;

        objective.scale(self.d.as_ref(), self.e.as_ref());

        let mut z = self.z.clone();
        let mut zt = self.zt.clone();
        let mut rho = self.rho;

        // Warm start (spec §4.6). The `init_λ ∧ ¬init_x` branch is marked
        // unreachable (`ASSERT(false)`) in the original; resolved here (see
        // DESIGN.md) by running it symmetrically to `init_x ∧ ¬init_λ`
        // rather than rejecting the configuration. The iteration-0
        // alternating-projection bootstrap for `init_x ∧ ¬init_λ` is
        // omitted — it depends on an abstract `ProjSubgradEval` absent from
        // the `Objective` contract — so `z_t` simply starts at zero.
        if let Some(x0) = self.init_x.take() {
            let xtemp = vector::elementwise_div(x0.as_ref(), self.e.as_ref());
            let mut ytemp = Col::<T>::zeros(m);
            self.a
                .mul(Trans::No, T::one(), xtemp.as_ref(), T::zero(), ytemp.as_mut())?;
            vector::memcpy(z.as_mut().subrows_mut(0, n), xtemp.as_ref());
            vector::memcpy(z.as_mut().subrows_mut(n, m), ytemp.as_ref());
        }
        if let Some(lambda0) = self.init_lambda.take() {
            let mut ytemp = vector::elementwise_div(lambda0.as_ref(), self.d.as_ref());
            let mut xtemp = Col::<T>::zeros(n);
            self.a
                .mul(Trans::Trans, T::one(), ytemp.as_ref(), T::zero(), xtemp.as_mut())?;
            let scale = -T::one() / rho;
            vector::scal(scale, xtemp.as_mut());
            vector::scal(scale, ytemp.as_mut());
            vector::memcpy(zt.as_mut().subrows_mut(0, n), xtemp.as_ref());
            vector::memcpy(zt.as_mut().subrows_mut(n, m), ytemp.as_ref());
        }

        if let Some(terminator) = self.terminator.as_mut() {
            terminator.initialize();
        }

        let init_time = t0.elapsed();
        self.reporter.banner();

        let sqrtn_atol = T::from((n as f64).sqrt()).unwrap() * self.abs_tol;
        let sqrtm_atol = T::from((m as f64).sqrt()).unwrap() * self.abs_tol;
        let sqrtmn_atol = T::from(((m + n) as f64).sqrt()).unwrap() * self.abs_tol;

        let delta_min = T::from(DELTA_MIN).unwrap();
        let gamma = T::from(GAMMA).unwrap();
        let tau = T::from(TAU).unwrap();
        let alpha = T::from(ALPHA).unwrap();
        let rho_min = T::from(RHO_MIN).unwrap();
        let rho_max = T::from(RHO_MAX).unwrap();
        let kappa = T::from(KAPPA).unwrap();
        let proj_tol_numerator = T::from(PROJ_TOL_NUMERATOR).unwrap();
        let proj_tol_floor = T::from(PROJ_TOL_FLOOR).unwrap();
        let proj_tol_pow = T::from(PROJ_TOL_POW).unwrap();

        let mut delta = delta_min;
        let mut xi = T::one();
        let mut kd: usize = 0;
        let mut ku: usize = 0;

        let mut z_prev = Col::<T>::zeros(m + n);
        let mut z_half = Col::<T>::zeros(m + n);
        let mut z_resid = Col::<T>::zeros(m + n);
        let mut z_tmp = Col::<T>::zeros(m + n);

        let mut nrm_r = T::zero();
        let mut nrm_s = T::zero();
        let mut gap = T::zero();
        let mut eps_pri = T::zero();
        let mut eps_dua = T::zero();
        let mut eps_gap = T::zero();

        let mut status = Status::InProgress;

        for k in 0..self.max_iter {
            vector::memcpy(z_prev.as_mut(), z.as_ref());

            // Step 2: prox step. z <- z - zt, then write post-prox into z_half.
            vector::axpy(-T::one(), zt.as_ref(), z.as_mut());
            {
                let (x_in, y_in) = z.as_ref().split_at_row(n);
                let (x_half, y_half) = z_half.as_mut().split_at_row_mut(n);
                objective.prox(x_in, y_in, x_half, y_half, rho);
            }

            // z_resid = (z - zt) - z_half, i.e. the pre-project residual the
            // original reuses its `z` buffer to hold at this point.
            vector::memcpy(z_resid.as_mut(), z.as_ref());
            vector::axpy(-T::one(), z_half.as_ref(), z_resid.as_mut());

            gap = vector::dot(z_resid.as_ref(), z_half.as_ref()).abs();
            eps_gap = sqrtmn_atol
                + self.rel_tol * vector::nrm2(z_resid.as_ref()) * vector::nrm2(z_half.as_ref());
            eps_pri = sqrtm_atol + self.rel_tol * vector::nrm2(z_half.as_ref().subrows(n, m));
            eps_dua = sqrtn_atol + self.rel_tol * rho * vector::nrm2(z_resid.as_ref().subrows(0, n));

            // Step 3: over-relax, then project onto y = Ã x.
            vector::memcpy(z_tmp.as_mut(), zt.as_ref());
            vector::axpy(alpha, z_half.as_ref(), z_tmp.as_mut());
            vector::axpy(T::one() - alpha, z_prev.as_ref(), z_tmp.as_mut());

            let proj_tol = {
                let raw = proj_tol_numerator / T::from((k + 1) as f64).unwrap().powf(proj_tol_pow);
                raw.max(proj_tol_floor)
            };
            {
                let (c_x, c_y) = z_tmp.as_ref().split_at_row(n);
                let (x_out, y_out) = z.as_mut().split_at_row_mut(n);
                // A projector failure mid-loop (factorization breakdown,
                // CGLS exhausting its iteration budget) is a backend
                // failure, not a programming error; spec §7 has the driver
                // surface it as NAN_FOUND rather than propagating a `Problem`.
                if self
                    .p
                    .project(&self.a, c_x, c_y, T::one(), x_out, y_out, proj_tol)
                    .is_err()
                {
                    status = Status::NanFound;
                    self.final_iter = k;
                    break;
                }
            }

            // Step 4: approximate residual norms.
            let mut diff_s = z_prev.clone();
            vector::axpy(-T::one(), z.as_ref(), diff_s.as_mut());
            nrm_s = rho * vector::nrm2(diff_s.as_ref());

            let mut diff_r = z_half.clone();
            vector::axpy(-T::one(), z.as_ref(), diff_r.as_mut());
            nrm_r = vector::nrm2(diff_r.as_ref());

            // Step 5: exact residual refresh.
            let mut exact = false;
            if (nrm_r < eps_pri && nrm_s < eps_dua) || USE_EXACT_STOP {
                let x_half = z_half.as_ref().subrows(0, n);
                let y_half = z_half.as_ref().subrows(n, m);

                let mut y_exact = y_half.to_owned();
                self.a
                    .mul(Trans::No, T::one(), x_half, -T::one(), y_exact.as_mut())?;
                nrm_r = vector::nrm2(y_exact.as_ref());

                if nrm_r < eps_pri || USE_EXACT_STOP {
                    let mut x_exact = x_half.to_owned();
                    vector::axpy(T::one(), zt.as_ref().subrows(0, n), x_exact.as_mut());
                    vector::axpy(-T::one(), z_prev.as_ref().subrows(0, n), x_exact.as_mut());

                    let mut y_term = y_half.to_owned();
                    vector::axpy(T::one(), zt.as_ref().subrows(n, m), y_term.as_mut());
                    vector::axpy(-T::one(), z_prev.as_ref().subrows(n, m), y_term.as_mut());

                    self.a
                        .mul(Trans::Trans, T::one(), y_term.as_ref(), T::one(), x_exact.as_mut())?;
                    nrm_s = rho * vector::nrm2(x_exact.as_ref());
                    exact = true;
                }
            }

            if !nrm_r.is_finite() || !nrm_s.is_finite() || !gap.is_finite() {
                status = Status::NanFound;
                self.final_iter = k;
                break;
            }

            let converged =
                exact && nrm_r < eps_pri && nrm_s < eps_dua && (!self.gap_stop || gap < eps_gap);

            self.reporter.iteration(&IterationReport {
                iter: k,
                r: to_f64(nrm_r),
                s: to_f64(nrm_s),
                eps_pri: to_f64(eps_pri),
                eps_dua: to_f64(eps_dua),
                gap: to_f64(gap),
                eps_gap: to_f64(eps_gap),
                rho: to_f64(rho),
            });

            if let Some(terminator) = self.terminator.as_mut() {
                if let Some(term_status) = terminator.terminate() {
                    status = term_status;
                    self.final_iter = k;
                    break;
                }
            }

            if converged {
                status = Status::Success;
                self.final_iter = k;
                break;
            }
            if k == self.max_iter - 1 {
                status = Status::MaxIter;
                self.final_iter = k;
                break;
            }

            // Step 8: dual update.
            vector::axpy(alpha, z_half.as_ref(), zt.as_mut());
            vector::axpy(T::one() - alpha, z_prev.as_ref(), zt.as_mut());
            vector::axpy(-T::one(), z.as_ref(), zt.as_mut());

            // Step 9: adaptive rho.
            if self.adaptive_rho {
                let k_t = T::from(k as f64).unwrap();
                if nrm_s < xi * eps_dua && nrm_r > xi * eps_pri && tau * k_t > T::from(kd as f64).unwrap() {
                    if rho < rho_max {
                        rho = rho * delta;
                        vector::scal(T::one() / delta, zt.as_mut());
                        delta = gamma * delta;
                        ku = k;
                    }
                } else if nrm_s > xi * eps_dua
                    && nrm_r < xi * eps_pri
                    && tau * k_t > T::from(ku as f64).unwrap()
                {
                    if rho > rho_min {
                        rho = rho / delta;
                        vector::scal(delta, zt.as_mut());
                        delta = gamma * delta;
                        kd = k;
                    }
                } else if nrm_s < xi * eps_dua && nrm_r < xi * eps_pri {
                    xi = xi * kappa;
                } else {
                    delta = delta_min;
                }
                rho = rho.max(rho_min).min(rho_max);
            }
        }

        if status == Status::InProgress {
            status = Status::MaxIter;
            self.final_iter = self.max_iter.saturating_sub(1);
        }

        // Post-processing: rescale to user coordinates (spec §4.6).
        let mut z_out = zt.clone();
        vector::axpy(-T::one(), z_prev.as_ref(), z_out.as_mut());
        vector::axpy(T::one(), z_half.as_ref(), z_out.as_mut());
        vector::scal(-rho, z_out.as_mut());

        let mu = vector::elementwise_div(z_out.as_ref().subrows(0, n), self.e.as_ref());
        let lambda = vector::elementwise_mul(z_out.as_ref().subrows(n, m), self.d.as_ref());

        // `scale` (top of this call) already absorbed `(d, e)` into
        // `objective`'s stored parameters, so `evaluate` must run on the
        // scaled half-iterate, before `x_out`/`y_out` are unscaled below —
        // matches the original's `obj->evaluate(x12.data, y12.data)`.
        self.optval = objective.evaluate(
            z_half.as_ref().subrows(0, n),
            z_half.as_ref().subrows(n, m),
        );

        let x_out = vector::elementwise_mul(z_half.as_ref().subrows(0, n), self.e.as_ref());
        let y_out = vector::elementwise_div(z_half.as_ref().subrows(n, m), self.d.as_ref());
        self.x = x_out;
        self.y = y_out;
        self.mu = mu;
        self.lambda = lambda;
        self.rho = rho;
        self.zt = zt;
        // The original stores `zprev`, not the post-projection iterate, as
        // the persisted `z` so a subsequent warm re-solve resumes one step
        // short of the last projection.
        self.z = z_prev;

        let solve_time = t0.elapsed().saturating_sub(init_time);
        self.reporter.summary(&SolveSummary {
            status,
            final_iter: self.final_iter,
            init_time,
            solve_time,
            r_ratio: to_f64(nrm_r) / to_f64(eps_pri),
            s_ratio: to_f64(nrm_s) / to_f64(eps_dua),
            gap_ratio: to_f64(gap) / to_f64(eps_gap),
        });

        Ok(status)
    }
}

fn to_f64<T: Scalar>(v: T) -> f64 {
    v.to_f64().unwrap_or(f64::NAN)
}
