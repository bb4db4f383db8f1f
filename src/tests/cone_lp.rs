//! Scenario 3: a cone program specialized to a linear program. `minimize
//! x1 + x2 s.t. x1 + 2*x2 = 4, x >= 0`. Substituting the equality constraint
//! shows the objective is `4 - x2` over the feasible segment, so the unique
//! optimum is the vertex `x = (0, 2)`.

use faer::{Col, Mat};

use crate::Status;
use crate::cone::{ConeConstraint, ConeKind};
use crate::matrix::DenseMatrix;
use crate::objective::cone::ConeObjective;
use crate::projector::direct::DirectProjector;
use crate::solver::PogsSolver;

#[test]
fn test_lp_converges_to_vertex() {
    let a = Mat::<f64>::from_fn(1, 2, |_, j| if j == 0 { 1.0 } else { 2.0 });
    let mut solver = PogsSolver::<f64, DenseMatrix<f64>, DirectProjector<f64>>::new(DenseMatrix::new(a))
        .with_max_iter(3000)
        .with_verbose(0);

    let b = Col::<f64>::from_fn(1, |_| 4.0);
    let c = Col::<f64>::from_fn(2, |_| 1.0);
    let kx = vec![ConeConstraint::new(ConeKind::NonNeg, vec![0, 1])];
    let ky = vec![ConeConstraint::new(ConeKind::Zero, vec![0])];
    let mut objective = ConeObjective::new(b, c, kx, ky).unwrap();

    let status = solver.solve(&mut objective).unwrap();
    assert_eq!(status, Status::Success);
    assert!(solver.x()[0].abs() < 5e-2, "x1 = {}", solver.x()[0]);
    assert!((solver.x()[1] - 2.0).abs() < 5e-2, "x2 = {}", solver.x()[1]);

    // Feasibility: x1 + 2*x2 = 4.
    let residual = solver.x()[0] + 2.0 * solver.x()[1] - 4.0;
    assert!(residual.abs() < 1e-2, "residual = {residual}");
}
