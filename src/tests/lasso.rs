//! Scenario 2: Lasso, `minimize (1/2)||y-b||^2 + lambda*|x|_1 s.t. y = x`
//! (`A = I`, so the coupling is trivial and the fixed point is exactly the
//! scalar soft-threshold of `b`, independent of the per-iteration `rho` the
//! ADMM loop happens to be using at convergence).

use faer::Mat;

use crate::Status;
use crate::matrix::DenseMatrix;
use crate::objective::atoms::{FunctionObj, Kernel};
use crate::objective::separable::SeparableObjective;
use crate::projector::direct::DirectProjector;
use crate::solver::PogsSolver;

#[test]
fn test_soft_thresholds_to_known_solution() {
    // b = (3.0, 0.1), lambda = 1.0: soft_threshold(3.0, 1.0) = 2.0,
    // soft_threshold(0.1, 1.0) = 0.0 (below the threshold).
    let b = [3.0, 0.1];
    let lambda = 1.0;

    let a = Mat::<f64>::from_fn(2, 2, |i, j| if i == j { 1.0 } else { 0.0 });
    let mut solver = PogsSolver::<f64, DenseMatrix<f64>, DirectProjector<f64>>::new(DenseMatrix::new(a))
        .with_max_iter(1000)
        .with_verbose(0);

    let f = (0..2)
        .map(|i| FunctionObj::<f64>::new(Kernel::Square).with_shift(b[i]))
        .collect();
    let g = (0..2).map(|_| FunctionObj::<f64>::new(Kernel::Abs).with_weight(lambda)).collect();
    let mut objective = SeparableObjective::new(f, g);

    let status = solver.solve(&mut objective).unwrap();
    assert_eq!(status, Status::Success);
    assert!((solver.x()[0] - 2.0).abs() < 1e-2, "x[0] = {}", solver.x()[0]);
    assert!(solver.x()[1].abs() < 1e-2, "x[1] = {}", solver.x()[1]);
}
