//! Cone objective (§4.5): `minimize cᵀx s.t. b - Ax in K_y, x in K_x`.
//! Grounded on the original implementation's `PogsObjectiveCone<T>`, with
//! the per-cone projections delegated to [`crate::cone`].

use faer::{Col, ColMut, ColRef};

use crate::Scalar;
use crate::cone::{ConeConstraint, ConeError, project_cones, validate_cones};
use crate::objective::Objective;
use crate::vector;

/// `minimize cᵀx  s.t.  b - Ax ∈ K_y,  x ∈ K_x`. Constructed via
/// [`ConeObjective::new`], which validates both cone lists (spec §7:
/// `INVALID_CONE` must surface before the ADMM loop starts).
pub struct ConeObjective<T: Scalar> {
    b: Col<T>,
    c: Col<T>,
    kx: Vec<ConeConstraint>,
    ky: Vec<ConeConstraint>,
}

impl<T: Scalar> ConeObjective<T> {
    pub fn new(
        b: Col<T>,
        c: Col<T>,
        kx: Vec<ConeConstraint>,
        ky: Vec<ConeConstraint>,
    ) -> Result<Self, ConeError> {
        validate_cones(&kx, c.nrows())?;
        validate_cones(&ky, b.nrows())?;
        Ok(Self { b, c, kx, ky })
    }
}

impl<T: Scalar> Objective<T> for ConeObjective<T> {
    fn evaluate(&self, x: ColRef<'_, T>, _y: ColRef<'_, T>) -> T {
        vector::dot(self.c.as_ref(), x)
    }

    fn prox(
        &self,
        x_in: ColRef<'_, T>,
        y_in: ColRef<'_, T>,
        mut x_out: ColMut<'_, T>,
        mut y_out: ColMut<'_, T>,
        rho: T,
    ) {
        // x_out <- x_in - c/rho, then project onto K_x.
        for j in 0..x_out.nrows() {
            x_out[j] = x_in[j] - self.c[j] / rho;
        }
        project_cones(&self.kx, x_out.as_mut());

        // y_out <- b - y_in, project onto K_y, then y_out <- b - y_out.
        for i in 0..y_out.nrows() {
            y_out[i] = self.b[i] - y_in[i];
        }
        project_cones(&self.ky, y_out.as_mut());
        for i in 0..y_out.nrows() {
            y_out[i] = self.b[i] - y_out[i];
        }
    }

    fn scale(&mut self, d: ColRef<'_, T>, e: ColRef<'_, T>) {
        for j in 0..self.c.nrows() {
            self.c[j] = self.c[j] * e[j];
        }
        for i in 0..self.b.nrows() {
            self.b[i] = self.b[i] * d[i];
        }
    }

    /// Averages `d` within every non-separable cone of `K_y` (spec §4.3).
    fn constrain_d(&self, mut d: ColMut<'_, T>) {
        for cone in &self.ky {
            if cone.kind.is_separable() {
                continue;
            }
            let mean = vector::mean_at(d.as_ref(), &cone.idx);
            vector::fill_at(d.as_mut(), &cone.idx, mean);
        }
    }

    /// Averages `e` within every non-separable cone of `K_x`.
    fn constrain_e(&self, mut e: ColMut<'_, T>) {
        for cone in &self.kx {
            if cone.kind.is_separable() {
                continue;
            }
            let mean = vector::mean_at(e.as_ref(), &cone.idx);
            vector::fill_at(e.as_mut(), &cone.idx, mean);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cone::ConeKind;

    #[test]
    fn test_new_rejects_invalid_cone() {
        let b = Col::<f64>::zeros(2);
        let c = Col::<f64>::zeros(2);
        let kx = vec![ConeConstraint::new(ConeKind::NonNeg, vec![5])];
        let ky = vec![];
        assert!(ConeObjective::new(b, c, kx, ky).is_err());
    }

    #[test]
    fn test_evaluate_is_linear_in_x() {
        let b = Col::<f64>::zeros(2);
        let c = Col::<f64>::from_fn(2, |i| [1.0, 2.0][i]);
        let kx = vec![ConeConstraint::new(ConeKind::NonNeg, vec![0, 1])];
        let ky = vec![ConeConstraint::new(ConeKind::Zero, vec![0, 1])];
        let obj = ConeObjective::new(b, c, kx, ky).unwrap();
        let x = Col::<f64>::from_fn(2, |i| [3.0, 4.0][i]);
        let y = Col::<f64>::zeros(2);
        assert_eq!(obj.evaluate(x.as_ref(), y.as_ref()), 11.0);
    }

    #[test]
    fn test_prox_projects_x_onto_nonneg_cone() {
        let b = Col::<f64>::zeros(1);
        let c = Col::<f64>::zeros(1);
        let kx = vec![ConeConstraint::new(ConeKind::NonNeg, vec![0])];
        let ky = vec![ConeConstraint::new(ConeKind::Zero, vec![0])];
        let obj = ConeObjective::new(b, c, kx, ky).unwrap();
        let x_in = Col::<f64>::from_fn(1, |_| -2.0);
        let y_in = Col::<f64>::zeros(1);
        let mut x_out = Col::<f64>::zeros(1);
        let mut y_out = Col::<f64>::zeros(1);
        obj.prox(x_in.as_ref(), y_in.as_ref(), x_out.as_mut(), y_out.as_mut(), 1.0);
        assert_eq!(x_out[0], 0.0);
        assert_eq!(y_out[0], 0.0);
    }

    #[test]
    fn test_constrain_e_averages_nonseparable_cone() {
        let b = Col::<f64>::zeros(1);
        let c = Col::<f64>::zeros(3);
        let kx = vec![ConeConstraint::new(ConeKind::SecondOrder, vec![0, 1, 2])];
        let ky = vec![];
        let obj = ConeObjective::new(b, c, kx, ky).unwrap();
        let mut e = Col::<f64>::from_fn(3, |i| [1.0, 2.0, 3.0][i]);
        obj.constrain_e(e.as_mut());
        assert_eq!(e[0], 2.0);
        assert_eq!(e[1], 2.0);
        assert_eq!(e[2], 2.0);
    }
}
