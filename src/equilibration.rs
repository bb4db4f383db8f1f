//! Shared diagonal-equilibration math (C3): produces positive scalings
//! `(d, e)` so that `diag(d)·A·diag(e)` has approximately unit row/column
//! ℓ₂ norm, honoring the cone-averaging constraints supplied by the
//! objective (C5). The iteration itself (a Sinkhorn-style alternation
//! between row and column rescaling) is backend-independent; only how a
//! backend computes row/column sums-of-squares differs, which is why this
//! lives in its own module rather than being duplicated per backend.

use faer::{Col, ColMut, ColRef};

use crate::Scalar;

/// Number of alternating row/column sweeps run by [`sinkhorn_sweep`].
pub const EQUIL_ITERS: usize = 50;

/// A cone-averaging constraint callback: replaces entries of the scaling
/// vector within each non-separable cone by their arithmetic mean.
pub type ConstrainFn<'a, T> = dyn Fn(ColMut<'_, T>) + 'a;

/// Runs `iters` alternating row/column rescaling sweeps.
///
/// `row_sumsq(e, out)` must fill `out[i]` with `Σⱼ (A[i,j]·e[j])²`; `col_sumsq(d, out)` must fill
/// `out[j]` with `Σᵢ (A[i,j]·d[i])²`. Passing the *current* opposite-side scaling lets both exact
/// (dense/sparse) and randomized-probe (operator) backends implement this contract without this
/// module needing to know the matrix representation.
pub fn sinkhorn_sweep<T, RowSumSq, ColSumSq>(
    mut d: ColMut<'_, T>,
    mut e: ColMut<'_, T>,
    mut row_sumsq: RowSumSq,
    mut col_sumsq: ColSumSq,
    constrain_d: &ConstrainFn<'_, T>,
    constrain_e: &ConstrainFn<'_, T>,
    iters: usize,
) where
    T: Scalar,
    RowSumSq: FnMut(ColRef<'_, T>, ColMut<'_, T>),
    ColSumSq: FnMut(ColRef<'_, T>, ColMut<'_, T>),
{
    let m = d.nrows();
    let n = e.nrows();
    let mut sumsq_m = Col::<T>::zeros(m);
    let mut sumsq_n = Col::<T>::zeros(n);

    for _ in 0..iters {
        row_sumsq(e.as_ref(), sumsq_m.as_mut());
        for i in 0..m {
            let s = sumsq_m[i];
            d[i] = if s > T::zero() { T::one() / s.sqrt() } else { T::one() };
        }
        constrain_d(d.as_mut());

        col_sumsq(d.as_ref(), sumsq_n.as_mut());
        for j in 0..n {
            let s = sumsq_n[j];
            e[j] = if s > T::zero() { T::one() / s.sqrt() } else { T::one() };
        }
        constrain_e(e.as_mut());
    }
}

/// No-op constraint: every cone in the backend is already separable.
pub fn no_constraint<T: Scalar>() -> Box<ConstrainFn<'static, T>> {
    Box::new(|_| {})
}

/// Builds a constraint closure from a list of index groups (one per
/// non-separable cone), each group replaced by its arithmetic mean.
pub fn group_mean_constraint<T: Scalar>(groups: Vec<Vec<usize>>) -> Box<ConstrainFn<'static, T>> {
    Box::new(move |mut v: ColMut<'_, T>| {
        for group in &groups {
            if group.is_empty() {
                continue;
            }
            let mut acc = T::zero();
            for &i in group {
                acc = acc + v[i];
            }
            let mean = acc / T::from(group.len() as f64).unwrap();
            for &i in group {
                v[i] = mean;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sinkhorn_sweep_identity_matrix_converges_to_unit_scaling() {
        let n = 4;
        let mut d = Col::<f64>::from_fn(n, |_| 1.0);
        let mut e = Col::<f64>::from_fn(n, |_| 1.0);

        let row_sumsq = |e: ColRef<'_, f64>, mut out: ColMut<'_, f64>| {
            for i in 0..n {
                out[i] = e[i] * e[i];
            }
        };
        let col_sumsq = |d: ColRef<'_, f64>, mut out: ColMut<'_, f64>| {
            for j in 0..n {
                out[j] = d[j] * d[j];
            }
        };

        let no_d = no_constraint::<f64>();
        let no_e = no_constraint::<f64>();
        sinkhorn_sweep(
            d.as_mut(),
            e.as_mut(),
            row_sumsq,
            col_sumsq,
            no_d.as_ref(),
            no_e.as_ref(),
            EQUIL_ITERS,
        );

        for i in 0..n {
            assert!((d[i] * e[i] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_group_mean_constraint_averages_within_group() {
        let constrain = group_mean_constraint::<f64>(vec![vec![0, 1]]);
        let mut v = Col::<f64>::from_fn(3, |i| [2.0, 4.0, 9.0][i]);
        constrain(v.as_mut());
        assert_eq!(v[0], 3.0);
        assert_eq!(v[1], 3.0);
        assert_eq!(v[2], 9.0);
    }
}
