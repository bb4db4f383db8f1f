//! Scenario 4: a second-order cone program. `minimize t s.t. x1 = 3,
//! (t, x1, x2) in SecondOrder`, i.e. `||(x1,x2)||_2 <= t`. Forcing `x1 = 3`
//! pins the optimum at `t = 3, x2 = 0` (any `x2 != 0` would need a larger
//! `t`, and `t < 3` is infeasible with `x1 = 3`).

use faer::{Col, Mat};

use crate::Status;
use crate::cone::{ConeConstraint, ConeKind};
use crate::matrix::DenseMatrix;
use crate::objective::cone::ConeObjective;
use crate::projector::direct::DirectProjector;
use crate::solver::PogsSolver;

#[test]
fn test_socp_converges_to_known_optimum() {
    // Variables (t, x1, x2) indexed 0, 1, 2. Constraint: x1 = 3.
    let a = Mat::<f64>::from_fn(1, 3, |_, j| if j == 1 { 1.0 } else { 0.0 });
    let mut solver = PogsSolver::<f64, DenseMatrix<f64>, DirectProjector<f64>>::new(DenseMatrix::new(a))
        .with_max_iter(3000)
        .with_verbose(0);

    let b = Col::<f64>::from_fn(1, |_| 3.0);
    let c = Col::<f64>::from_fn(3, |i| if i == 0 { 1.0 } else { 0.0 });
    let kx = vec![ConeConstraint::new(ConeKind::SecondOrder, vec![0, 1, 2])];
    let ky = vec![ConeConstraint::new(ConeKind::Zero, vec![0])];
    let mut objective = ConeObjective::new(b, c, kx, ky).unwrap();

    let status = solver.solve(&mut objective).unwrap();
    assert_eq!(status, Status::Success);
    assert!((solver.x()[0] - 3.0).abs() < 5e-2, "t = {}", solver.x()[0]);
    assert!((solver.x()[1] - 3.0).abs() < 5e-2, "x1 = {}", solver.x()[1]);
    assert!(solver.x()[2].abs() < 5e-2, "x2 = {}", solver.x()[2]);

    let norm = (solver.x()[1] * solver.x()[1] + solver.x()[2] * solver.x()[2]).sqrt();
    assert!(norm <= solver.x()[0] + 1e-2, "cone violated: norm={norm}, t={}", solver.x()[0]);
}
