//! Thin contract over dense vector ops (C1). Everything here acts on
//! contiguous `faer::Col<T>` buffers or views over them; subvector views
//! alias their parent, so writes through a view are observed by the owner.

use faer::{Col, ColMut, ColRef, unzip, zip};

use crate::Scalar;

/// `y ← α·x + y`
pub fn axpy<T: Scalar>(alpha: T, x: ColRef<'_, T>, mut y: ColMut<'_, T>) {
    zip!(x, y.as_mut()).for_each(|unzip!(x, y)| *y = alpha * *x + *y);
}

/// `x ← α·x`
pub fn scal<T: Scalar>(alpha: T, mut x: ColMut<'_, T>) {
    zip!(x.as_mut()).for_each(|unzip!(x)| *x = alpha * *x);
}

/// Euclidean norm.
pub fn nrm2<T: Scalar>(x: ColRef<'_, T>) -> T {
    let mut acc = T::zero();
    zip!(x).for_each(|unzip!(x)| acc = acc + *x * *x);
    acc.sqrt()
}

/// Inner product.
pub fn dot<T: Scalar>(x: ColRef<'_, T>, y: ColRef<'_, T>) -> T {
    let mut acc = T::zero();
    zip!(x, y).for_each(|unzip!(x, y)| acc = acc + *x * *y);
    acc
}

/// `dst ← src`, element by element.
pub fn memcpy<T: Scalar>(mut dst: ColMut<'_, T>, src: ColRef<'_, T>) {
    zip!(dst.as_mut(), src).for_each(|unzip!(dst, src)| *dst = *src);
}

/// Elementwise product `x1 ⊙ x2`.
pub fn elementwise_mul<T: Scalar>(x1: ColRef<'_, T>, x2: ColRef<'_, T>) -> Col<T> {
    let mut out = Col::<T>::zeros(x1.nrows());
    zip!(x1, x2, out.as_mut()).for_each(|unzip!(x1, x2, out)| *out = *x1 * *x2);
    out
}

/// Elementwise quotient `x1 ⊘ x2`.
pub fn elementwise_div<T: Scalar>(x1: ColRef<'_, T>, x2: ColRef<'_, T>) -> Col<T> {
    let mut out = Col::<T>::zeros(x1.nrows());
    zip!(x1, x2, out.as_mut()).for_each(|unzip!(x1, x2, out)| *out = *x1 / *x2);
    out
}

/// Elementwise reciprocal, `1 ⊘ x`.
pub fn elementwise_inverse<T: Scalar>(x: ColRef<'_, T>) -> Col<T> {
    let mut out = Col::<T>::zeros(x.nrows());
    zip!(x, out.as_mut()).for_each(|unzip!(x, out)| *out = T::one() / *x);
    out
}

/// `true` iff every entry of `x` is strictly positive.
pub fn is_col_positive<T: Scalar>(x: ColRef<'_, T>) -> bool {
    let mut res = true;
    zip!(x).for_each(|unzip!(x)| {
        if *x <= T::zero() {
            res = false;
        }
    });
    res
}

/// Arithmetic mean of a (non-empty) set of indices into `x`. Used by the
/// cone-averaging equilibration constraints (`constrain_d`/`constrain_e`).
pub fn mean_at<T: Scalar>(x: ColRef<'_, T>, idx: &[usize]) -> T {
    let mut acc = T::zero();
    for &i in idx {
        acc = acc + x[i];
    }
    acc / T::from(idx.len() as f64).unwrap()
}

/// Overwrite `x[idx]` with `value` for every index in `idx`.
pub fn fill_at<T: Scalar>(mut x: ColMut<'_, T>, idx: &[usize], value: T) {
    for &i in idx {
        x[i] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axpy() {
        let x = Col::<f64>::from_fn(3, |i| (i + 1) as f64);
        let mut y = Col::<f64>::from_fn(3, |i| (i + 1) as f64);
        axpy(2.0, x.as_ref(), y.as_mut());
        assert_eq!(y, Col::<f64>::from_fn(3, |i| 3.0 * (i + 1) as f64));
    }

    #[test]
    fn test_nrm2_and_dot() {
        let x = Col::<f64>::from_fn(2, |i| if i == 0 { 3.0 } else { 4.0 });
        assert_eq!(nrm2(x.as_ref()), 5.0);
        assert_eq!(dot(x.as_ref(), x.as_ref()), 25.0);
    }

    #[test]
    fn test_elementwise_div() {
        let x1 = Col::<f64>::from_fn(3, |i| [1.0, 2.0, 3.0][i]);
        let x2 = Col::<f64>::from_fn(3, |i| [4.0, 5.0, 6.0][i]);
        let result = elementwise_div(x1.as_ref(), x2.as_ref());
        let expected = Col::<f64>::from_fn(3, |i| [0.25, 0.4, 0.5][i]);
        assert_eq!(result, expected);
    }

    #[test]
    fn test_is_col_positive() {
        let x1 = Col::<f64>::from_fn(3, |i| [1.0, 2.0, 3.0][i]);
        let x2 = Col::<f64>::from_fn(3, |i| [1.0, -2.0, 3.0][i]);
        assert!(is_col_positive(x1.as_ref()));
        assert!(!is_col_positive(x2.as_ref()));
    }

    #[test]
    fn test_mean_at() {
        let x = Col::<f64>::from_fn(4, |i| (i + 1) as f64);
        assert_eq!(mean_at(x.as_ref(), &[0, 2]), 2.0);
    }

    #[test]
    fn test_subvector_view_aliases() {
        let mut buf = Col::<f64>::zeros(4);
        {
            let mut view = buf.as_mut().subrows_mut(1, 2);
            scal(3.0, view.as_mut());
            memcpy(
                view.as_mut(),
                Col::<f64>::from_fn(2, |i| (i + 1) as f64).as_ref(),
            );
        }
        assert_eq!(buf[0], 0.0);
        assert_eq!(buf[1], 1.0);
        assert_eq!(buf[2], 2.0);
        assert_eq!(buf[3], 0.0);
    }
}
