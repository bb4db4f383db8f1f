//! Cone constraints and their projections. `ConeConstraint` models "cone
//! index arrays owned per-raw-cone" (spec §9 design note) as a `Vec<usize>`
//! of indices into the buffer a cone acts on, tagged with a [`ConeKind`].
//! [`ConeKind::is_separable`] drives both the equilibration averaging
//! constraint (§4.3) and which cones a `prox` call can project coordinate-
//! wise versus which need the joint projections in this module.

use derive_more::{Display, Error};
use faer::{Col, ColMut};

use crate::Scalar;

#[derive(Debug, Display, Error, PartialEq)]
pub enum ConeError {
    #[display("cone index {_0} is out of range for a buffer of length {_1}")]
    IndexOutOfRange(usize, usize),
    #[display("index {_0} appears in more than one cone")]
    DuplicateIndex(usize),
    #[display("second-order cone must have at least 2 indices (t, x...)")]
    SecondOrderTooSmall,
    #[display("semidefinite cone index count {_0} is not a perfect square")]
    SdpNotSquare(usize),
    #[display("exponential cone index count {_0} is not a multiple of 3")]
    ExpNotTriple(usize),
}

/// The kind of cone a [`ConeConstraint`] projects onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConeKind {
    /// `{0}` — every coordinate pinned to zero.
    Zero,
    /// `{x : x >= 0}`, coordinate-wise.
    NonNeg,
    /// `{(t, x) : ||x||_2 <= t}`. `idx[0]` is `t`, `idx[1..]` is `x`.
    SecondOrder,
    /// The cone of `k x k` symmetric positive semidefinite matrices,
    /// stored as `k*k` indices in row-major order (`k = sqrt(idx.len())`).
    Sdp,
    /// The exponential cone `{(x,y,z) : y*exp(x/y) <= z, y>0}` (closure
    /// includes `y=0, x<=0, z>=0`). `idx` is a flat list of `(x,y,z)` triples.
    Exp,
    /// The dual exponential cone, `-K_exp^*`. Same triple layout as `Exp`.
    DualExp,
}

impl ConeKind {
    /// `true` iff this cone's projection decomposes coordinate-wise — the
    /// only kind of cone whose entries may be rescaled independently during
    /// equilibration (spec §4.3).
    pub fn is_separable(self) -> bool {
        matches!(self, ConeKind::Zero | ConeKind::NonNeg)
    }
}

/// One cone constraint: a kind plus the (not necessarily contiguous) indices
/// of the buffer it acts on.
#[derive(Debug, Clone)]
pub struct ConeConstraint {
    pub kind: ConeKind,
    pub idx: Vec<usize>,
}

impl ConeConstraint {
    pub fn new(kind: ConeKind, idx: Vec<usize>) -> Self {
        Self { kind, idx }
    }

    fn validate_shape(&self) -> Result<(), ConeError> {
        match self.kind {
            ConeKind::Zero | ConeKind::NonNeg => Ok(()),
            ConeKind::SecondOrder => {
                if self.idx.len() < 2 {
                    Err(ConeError::SecondOrderTooSmall)
                } else {
                    Ok(())
                }
            }
            ConeKind::Sdp => {
                let k = (self.idx.len() as f64).sqrt().round() as usize;
                if k * k != self.idx.len() {
                    Err(ConeError::SdpNotSquare(self.idx.len()))
                } else {
                    Ok(())
                }
            }
            ConeKind::Exp | ConeKind::DualExp => {
                if self.idx.len() % 3 != 0 {
                    Err(ConeError::ExpNotTriple(self.idx.len()))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Validates that every cone's indices are in range, no index belongs to
/// more than one cone, and each cone's index count matches its kind. Called
/// once before the ADMM loop starts (spec §7: invalid cones fail `Solve`
/// with `INVALID_CONE` before any iteration).
pub fn validate_cones(cones: &[ConeConstraint], dim: usize) -> Result<(), ConeError> {
    let mut seen = vec![false; dim];
    for cone in cones {
        cone.validate_shape()?;
        for &i in &cone.idx {
            if i >= dim {
                return Err(ConeError::IndexOutOfRange(i, dim));
            }
            if seen[i] {
                return Err(ConeError::DuplicateIndex(i));
            }
            seen[i] = true;
        }
    }
    Ok(())
}

/// Projects `v` onto the Cartesian product of `cones`, in place. Indices of
/// `v` not covered by any cone are left untouched (an implicit free cone).
pub fn project_cones<T: Scalar>(cones: &[ConeConstraint], mut v: ColMut<'_, T>) {
    for cone in cones {
        match cone.kind {
            ConeKind::Zero => {
                for &i in &cone.idx {
                    v[i] = T::zero();
                }
            }
            ConeKind::NonNeg => {
                for &i in &cone.idx {
                    if v[i] < T::zero() {
                        v[i] = T::zero();
                    }
                }
            }
            ConeKind::SecondOrder => project_second_order(&cone.idx, v.as_mut()),
            ConeKind::Sdp => project_sdp(&cone.idx, v.as_mut()),
            ConeKind::Exp => project_exp_triples(&cone.idx, v.as_mut(), false),
            ConeKind::DualExp => project_exp_triples(&cone.idx, v.as_mut(), true),
        }
    }
}

fn project_second_order<T: Scalar>(idx: &[usize], mut v: ColMut<'_, T>) {
    let t_idx = idx[0];
    let x_idx = &idx[1..];

    let mut norm_sq = T::zero();
    for &i in x_idx {
        norm_sq = norm_sq + v[i] * v[i];
    }
    let norm = norm_sq.sqrt();
    let t = v[t_idx];

    if norm <= t {
        return; // already inside the cone
    }
    if norm <= -t {
        for &i in x_idx {
            v[i] = T::zero();
        }
        v[t_idx] = T::zero();
        return;
    }

    let scale = (norm + t) / (T::one() + T::one()) / norm;
    for &i in x_idx {
        v[i] = v[i] * scale;
    }
    v[t_idx] = (norm + t) / (T::one() + T::one());
}

/// Projects a vectorized (row-major) `k x k` symmetric matrix onto the PSD
/// cone by symmetrizing, diagonalizing via cyclic Jacobi rotations, clamping
/// negative eigenvalues to zero, and reconstructing.
fn project_sdp<T: Scalar>(idx: &[usize], mut v: ColMut<'_, T>) {
    let k = (idx.len() as f64).sqrt().round() as usize;
    let half = T::one() / (T::one() + T::one());

    let mut a = vec![vec![T::zero(); k]; k];
    for i in 0..k {
        for j in 0..k {
            let vij = v[idx[i * k + j]];
            let vji = v[idx[j * k + i]];
            a[i][j] = (vij + vji) * half;
        }
    }

    let mut eigvecs = vec![vec![T::zero(); k]; k];
    for i in 0..k {
        eigvecs[i][i] = T::one();
    }

    jacobi_eigen(&mut a, &mut eigvecs, k);

    // a is now (numerically) diagonal; clamp negative eigenvalues.
    let mut eigvals: Vec<T> = (0..k).map(|i| a[i][i]).collect();
    for e in eigvals.iter_mut() {
        if *e < T::zero() {
            *e = T::zero();
        }
    }

    for i in 0..k {
        for j in 0..k {
            let mut acc = T::zero();
            for l in 0..k {
                acc = acc + eigvecs[i][l] * eigvals[l] * eigvecs[j][l];
            }
            v[idx[i * k + j]] = acc;
        }
    }
}

/// Classic cyclic Jacobi eigenvalue algorithm: diagonalizes symmetric `a` in
/// place, accumulating the rotation into `v` (so `v`'s columns become the
/// eigenvectors of the original `a`).
fn jacobi_eigen<T: Scalar>(a: &mut [Vec<T>], v: &mut [Vec<T>], k: usize) {
    const SWEEPS: usize = 100;
    let tol = T::from(1e-12).unwrap();

    for _ in 0..SWEEPS {
        let mut off = T::zero();
        for p in 0..k {
            for q in (p + 1)..k {
                off = off + a[p][q] * a[p][q];
            }
        }
        if off.sqrt() < tol {
            break;
        }

        for p in 0..k {
            for q in (p + 1)..k {
                if a[p][q].abs() < tol {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (a[p][q] * T::from(2.0).unwrap());
                let t_val = theta.signum() / (theta.abs() + (theta * theta + T::one()).sqrt());
                let t_val = if theta == T::zero() { T::one() } else { t_val };
                let c = T::one() / (t_val * t_val + T::one()).sqrt();
                let s = t_val * c;

                for i in 0..k {
                    let aip = a[i][p];
                    let aiq = a[i][q];
                    a[i][p] = c * aip - s * aiq;
                    a[i][q] = s * aip + c * aiq;
                }
                for i in 0..k {
                    let api = a[p][i];
                    let aqi = a[q][i];
                    a[p][i] = c * api - s * aqi;
                    a[q][i] = s * api + c * aqi;
                }
                for i in 0..k {
                    let vip = v[i][p];
                    let viq = v[i][q];
                    v[i][p] = c * vip - s * viq;
                    v[i][q] = s * vip + c * viq;
                }
            }
        }
    }
}

/// Projects each `(x, y, z)` triple onto the exponential cone (or its dual
/// when `dual` is set).
fn project_exp_triples<T: Scalar>(idx: &[usize], mut v: ColMut<'_, T>, dual: bool) {
    let n_triples = idx.len() / 3;
    for t in 0..n_triples {
        let (ix, iy, iz) = (idx[3 * t], idx[3 * t + 1], idx[3 * t + 2]);
        let (x, y, z) = (v[ix], v[iy], v[iz]);

        let (px, py, pz) = if dual {
            // Moreau decomposition for the polar-cone pair `K_exp`,
            // `K_exp^*`: `P_{K*}(v) = v + P_K(-v)`.
            let (qx, qy, qz) = project_exp_point(-x, -y, -z);
            (x + qx, y + qy, z + qz)
        } else {
            project_exp_point(x, y, z)
        };

        v[ix] = px;
        v[iy] = py;
        v[iz] = pz;
    }
}

/// Projects `(x, y, z)` onto the exponential cone `{(x,y,z) : y*exp(x/y) <=
/// z, y > 0}` (closure includes `y=0, x<=0, z>=0`).
///
/// Already-feasible points, and points whose negation is feasible for the
/// polar cone (in which case the projection is the origin, by Moreau
/// decomposition applied to the self-polar-up-to-reflection structure of
/// this cone), are handled directly. Otherwise the projection lies on the
/// smooth boundary `y = t*exp(-x/t)` parametrized by `s = x/y`: for fixed
/// `s`, minimizing the squared distance over `y` alone is a one-dimensional
/// quadratic with a closed-form minimizer, so the search reduces to a
/// golden-section line search over the single variable `s`.
fn project_exp_point<T: Scalar>(x: T, y: T, z: T) -> (T, T, T) {
    let zero = T::zero();

    if (y > zero && y * (x / y).exp() <= z) || (y == zero && x <= zero && z >= zero) {
        return (x, y, z);
    }
    let (nx, ny, nz) = (-x, -y, -z);
    if (ny > zero && ny * (nx / ny).exp() <= nz) || (ny == zero && nx <= zero && nz >= zero) {
        return (zero, zero, zero);
    }

    // For fixed `s`, `y(s) = argmin_y (s*y-x)^2 + (y-y0)^2 + (y*exp(s)-z)^2`
    // clamped to `y >= 0`; `x(s) = s*y(s)`, `z(s) = y(s)*exp(s)`.
    let eval = |s: T| -> (T, T, T, T) {
        let es = s.exp();
        let denom = s * s + T::one() + es * es;
        let mut yo = (s * x + y + es * z) / denom;
        if yo < zero {
            yo = zero;
        }
        let xo = s * yo;
        let zo = yo * es;
        let d = (xo - x) * (xo - x) + (yo - y) * (yo - y) + (zo - z) * (zo - z);
        (d, xo, yo, zo)
    };

    let mut lo = T::from(-50.0).unwrap();
    let mut hi = T::from(50.0).unwrap();
    let gr = T::from(0.6180339887498949).unwrap();
    let mut c = hi - (hi - lo) * gr;
    let mut d = lo + (hi - lo) * gr;
    for _ in 0..100 {
        let (fc, ..) = eval(c);
        let (fd, ..) = eval(d);
        if fc < fd {
            hi = d;
        } else {
            lo = c;
        }
        c = hi - (hi - lo) * gr;
        d = lo + (hi - lo) * gr;
    }
    let s_star = (lo + hi) / (T::one() + T::one());
    let (_, xo, yo, zo) = eval(s_star);
    (xo, yo, zo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_cones_detects_duplicate() {
        let cones = vec![
            ConeConstraint::new(ConeKind::NonNeg, vec![0, 1]),
            ConeConstraint::new(ConeKind::Zero, vec![1]),
        ];
        assert_eq!(
            validate_cones(&cones, 3),
            Err(ConeError::DuplicateIndex(1))
        );
    }

    #[test]
    fn test_validate_cones_detects_out_of_range() {
        let cones = vec![ConeConstraint::new(ConeKind::NonNeg, vec![5])];
        assert_eq!(
            validate_cones(&cones, 3),
            Err(ConeError::IndexOutOfRange(5, 3))
        );
    }

    #[test]
    fn test_project_nonneg() {
        let cones = vec![ConeConstraint::new(ConeKind::NonNeg, vec![0, 1, 2])];
        let mut v = Col::<f64>::from_fn(3, |i| [-1.0, 0.0, 2.0][i]);
        project_cones(&cones, v.as_mut());
        assert_eq!(v[0], 0.0);
        assert_eq!(v[1], 0.0);
        assert_eq!(v[2], 2.0);
    }

    #[test]
    fn test_project_second_order_already_feasible() {
        let cones = vec![ConeConstraint::new(ConeKind::SecondOrder, vec![0, 1, 2])];
        let mut v = Col::<f64>::from_fn(3, |i| [5.0, 1.0, 1.0][i]);
        project_cones(&cones, v.as_mut());
        assert_eq!(v[0], 5.0);
    }

    #[test]
    fn test_project_second_order_outside() {
        let cones = vec![ConeConstraint::new(ConeKind::SecondOrder, vec![0, 1, 2])];
        let mut v = Col::<f64>::from_fn(3, |i| [0.0, 3.0, 4.0][i]);
        project_cones(&cones, v.as_mut());
        let norm = (v[1] * v[1] + v[2] * v[2]).sqrt();
        assert!(norm <= v[0] + 1e-8);
    }

    #[test]
    fn test_project_sdp_clamps_negative_eigenvalue() {
        // diag(-1, 2) is already diagonal; projection should zero the -1.
        let idx = vec![0, 1, 2, 3];
        let cones = vec![ConeConstraint::new(ConeKind::Sdp, idx)];
        let mut v = Col::<f64>::from_fn(4, |i| [-1.0, 0.0, 0.0, 2.0][i]);
        project_cones(&cones, v.as_mut());
        assert!(v[0].abs() < 1e-8);
        assert!((v[3] - 2.0).abs() < 1e-6);
    }
}
