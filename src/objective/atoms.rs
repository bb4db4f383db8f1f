//! Scalar proximable atom library backing [`super::separable::SeparableObjective`].
//!
//! Each atom represents `c * h(a*t - b) + d*t + (e/2)*t^2` for one of a
//! fixed set of convex kernels `h`, grounded on the affine parameterization
//! of the original implementation's `FunctionObj<T>` (`a`, `b`, `c`, `d`,
//! `e` fields transformed by `scale`, see §4.5). The quadratic/linear/affine
//! wrapper lets a single kernel (e.g. `Square`, `Abs`, `IndGe0`) cover the
//! common derived atoms (ridge, lasso, box/half-space indicators) just by
//! setting parameters, rather than needing one kernel per use site.

use crate::Scalar;

/// The convex kernel `h` an atom wraps. Coverage mirrors a practical subset
/// of the original pogs prox-function enum (`Zero`, `Abs`, `Square`,
/// `Identity`, the box/half-line/point indicators, `Huber`, `Logistic`,
/// `MaxPos0`, `MaxNeg0`): enough to express every end-to-end scenario in
/// the testable-properties section (NNLS, Lasso, hinge-loss, ridge).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    /// `h(t) = 0`.
    Zero,
    /// `h(t) = |t|`.
    Abs,
    /// `h(t) = t^2 / 2`.
    Square,
    /// `h(t) = t`.
    Identity,
    /// `h(t) = 0` if `t >= 0`, else `+inf` (indicator of `[0, inf)`).
    IndGe0,
    /// `h(t) = 0` if `t <= 0`, else `+inf`.
    IndLe0,
    /// `h(t) = 0` if `t == 0`, else `+inf`.
    IndEq0,
    /// `h(t) = 0` if `t in [0, 1]`, else `+inf`.
    IndBox01,
    /// Huber loss with unit transition: quadratic for `|t| <= 1`, linear
    /// beyond.
    Huber,
    /// `h(t) = log(1 + exp(t))`.
    Logistic,
    /// `h(t) = max(t, 0)`.
    MaxPos0,
    /// `h(t) = max(-t, 0)`.
    MaxNeg0,
}

/// One scalar atom `c * h(a*t - b) + d*t + (e/2)*t^2`. `a > 0`, `c >= 0`,
/// `e >= 0` are the caller's responsibility to maintain (not re-validated
/// here — matches the original's lack of runtime checks on these fields).
#[derive(Debug, Clone, Copy)]
pub struct FunctionObj<T: Scalar> {
    pub h: Kernel,
    pub a: T,
    pub b: T,
    pub c: T,
    pub d: T,
    pub e: T,
}

impl<T: Scalar> FunctionObj<T> {
    /// An atom with the identity affine map (`a=1, b=0`), no linear/quadratic
    /// term (`d=0, e=0`), and unit weight (`c=1`) — just `h(t)`.
    pub fn new(h: Kernel) -> Self {
        Self {
            h,
            a: T::one(),
            b: T::zero(),
            c: T::one(),
            d: T::zero(),
            e: T::zero(),
        }
    }

    pub fn with_scale(mut self, a: T) -> Self {
        self.a = a;
        self
    }

    pub fn with_shift(mut self, b: T) -> Self {
        self.b = b;
        self
    }

    pub fn with_weight(mut self, c: T) -> Self {
        self.c = c;
        self
    }

    pub fn with_linear(mut self, d: T) -> Self {
        self.d = d;
        self
    }

    pub fn with_quadratic(mut self, e: T) -> Self {
        self.e = e;
        self
    }

    /// `c * h(a*t - b) + d*t + (e/2)*t^2`.
    pub fn evaluate(&self, t: T) -> T {
        let half = T::one() / (T::one() + T::one());
        let u = self.a * t - self.b;
        self.c * eval_kernel(self.h, u) + self.d * t + half * self.e * t * t
    }

    /// `argmin_t  c*h(a*t-b) + d*t + (e/2)*t^2 + (rho/2)*(t-v)^2`.
    ///
    /// Reduces to a prox of the bare kernel by completing the square on the
    /// quadratic/linear terms and undoing the affine map: with
    /// `rho' = (e + rho) / a^2` and `v' = a * ((rho*v - d) / (e + rho)) - b`,
    /// the minimizer is `t = (prox_{h, rho'/c}(v') + b) / a`.
    pub fn prox(&self, v: T, rho: T) -> T {
        let combined = self.e + rho;
        let x0_eff = (rho * v - self.d) / combined;
        let rho_prime = combined / (self.a * self.a);
        let v_prime = self.a * x0_eff - self.b;
        let u = prox_kernel(self.h, v_prime, rho_prime / self.c);
        (u + self.b) / self.a
    }
}

fn eval_kernel<T: Scalar>(h: Kernel, u: T) -> T {
    let zero = T::zero();
    let one = T::one();
    let half = one / (one + one);
    match h {
        Kernel::Zero => zero,
        Kernel::Abs => u.abs(),
        Kernel::Square => half * u * u,
        Kernel::Identity => u,
        Kernel::IndGe0 => {
            if u >= zero {
                zero
            } else {
                T::from(f64::INFINITY).unwrap()
            }
        }
        Kernel::IndLe0 => {
            if u <= zero {
                zero
            } else {
                T::from(f64::INFINITY).unwrap()
            }
        }
        Kernel::IndEq0 => {
            if u == zero {
                zero
            } else {
                T::from(f64::INFINITY).unwrap()
            }
        }
        Kernel::IndBox01 => {
            if u >= zero && u <= one {
                zero
            } else {
                T::from(f64::INFINITY).unwrap()
            }
        }
        Kernel::Huber => {
            if u.abs() <= one {
                half * u * u
            } else {
                u.abs() - half
            }
        }
        Kernel::Logistic => (one + u.exp()).ln(),
        Kernel::MaxPos0 => {
            if u > zero {
                u
            } else {
                zero
            }
        }
        Kernel::MaxNeg0 => {
            if u < zero {
                -u
            } else {
                zero
            }
        }
    }
}

/// `argmin_u h(u) + (rho/2)*(u-v)^2`, for the bare kernel (no affine
/// wrapper — that's handled by the caller, [`FunctionObj::prox`]).
fn prox_kernel<T: Scalar>(h: Kernel, v: T, rho: T) -> T {
    let zero = T::zero();
    let one = T::one();
    match h {
        Kernel::Zero => v,
        Kernel::Abs => {
            // Soft threshold.
            let thresh = one / rho;
            if v > thresh {
                v - thresh
            } else if v < -thresh {
                v + thresh
            } else {
                zero
            }
        }
        Kernel::Square => rho * v / (one + rho),
        Kernel::Identity => v - one / rho,
        Kernel::IndGe0 => {
            if v > zero {
                v
            } else {
                zero
            }
        }
        Kernel::IndLe0 => {
            if v < zero {
                v
            } else {
                zero
            }
        }
        Kernel::IndEq0 => zero,
        Kernel::IndBox01 => {
            if v < zero {
                zero
            } else if v > one {
                one
            } else {
                v
            }
        }
        Kernel::Huber => {
            // prox of Huber: shrink like soft-threshold outside the
            // quadratic region, like a damped identity inside it.
            let shrunk = v * rho / (one + rho);
            if shrunk.abs() <= one {
                shrunk
            } else {
                let thresh = one / rho;
                if v > zero { v - thresh } else { v + thresh }
            }
        }
        Kernel::Logistic => prox_newton(v, rho, |u| one / (one + (-u).exp())),
        Kernel::MaxPos0 => {
            if v - one / rho > zero {
                v - one / rho
            } else if v < zero {
                v
            } else {
                zero
            }
        }
        Kernel::MaxNeg0 => {
            if v + one / rho < zero {
                v + one / rho
            } else if v > zero {
                v
            } else {
                zero
            }
        }
    }
}

/// Newton's method for `u + dh(u)/rho = v`, used by kernels without a
/// closed-form prox (only `Logistic` in this library).
fn prox_newton<T: Scalar>(v: T, rho: T, dh: impl Fn(T) -> T) -> T {
    let mut u = v;
    let step_eps = T::from(1e-12).unwrap();
    for _ in 0..50 {
        let f = u + dh(u) / rho - v;
        // Finite-difference derivative of dh; avoids needing a second
        // closure per kernel for the rare non-closed-form case.
        let h = T::from(1e-6).unwrap();
        let df = T::one() + (dh(u + h) - dh(u - h)) / (h + h) / rho;
        if df.abs() < T::from(1e-14).unwrap() {
            break;
        }
        let step = f / df;
        u = u - step;
        if step.abs() < step_eps {
            break;
        }
    }
    u
}
