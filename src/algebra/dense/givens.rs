#![allow(non_snake_case)]
use crate::algebra::{FloatT, Matrix};

/// A plane (Givens) rotation acting on index pairs of vectors or on
/// row/column pairs of matrices.
///
/// The rotation is stored as the pair `(c, s)` with
/// `[c s; -s c] * [f; g] = [r; 0]`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GivensRotation<T> {
    pub c: T,
    pub s: T,
}

impl<T> GivensRotation<T>
where
    T: FloatT,
{
    /// Compute the rotation annihilating `g` against `f`, returning the
    /// rotation and the resulting value `r = c*f + s*g`.
    pub fn new(f: T, g: T) -> (Self, T) {
        // hypot-free construction, scaled for stability
        let (c, s);
        if g == T::zero() {
            (c, s) = (T::one(), T::zero());
        } else if g.abs() > f.abs() {
            let t = f / g;
            let sv = T::recip(T::sqrt(T::one() + t * t));
            (c, s) = (sv * t, sv);
        } else {
            let t = g / f;
            let cv = T::recip(T::sqrt(T::one() + t * t));
            (c, s) = (cv, cv * t);
        }
        let r = c * f + s * g;
        (Self { c, s }, r)
    }

    /// Apply to a scalar pair, producing `(c*f + s*g, -s*f + c*g)`.
    #[inline]
    pub fn apply(&self, f: T, g: T) -> (T, T) {
        (self.c * f + self.s * g, -self.s * f + self.c * g)
    }

    /// Right-multiplication acting on the column pair `(c1, c2)`:
    /// `col1 <- c*col1 + s*col2`, `col2 <- -s*col1 + c*col2`.
    pub fn rotate_cols(&self, M: &mut Matrix<T>, c1: usize, c2: usize) {
        let (col1, col2) = M.col_pair_mut(c1, c2);
        for (a, b) in col1.iter_mut().zip(col2.iter_mut()) {
            let (f, g) = self.apply(*a, *b);
            *a = f;
            *b = g;
        }
    }

    /// Left-multiplication acting on the row pair `(r1, r2)`, restricted
    /// to columns `lo..hi`.
    pub fn rotate_rows(&self, M: &mut Matrix<T>, r1: usize, r2: usize, lo: usize, hi: usize) {
        for j in lo..hi {
            let (f, g) = self.apply(M[(r1, j)], M[(r2, j)]);
            M[(r1, j)] = f;
            M[(r2, j)] = g;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annihilation() {
        let (G, r) = GivensRotation::<f64>::new(3.0, 4.0);
        let (f, g) = G.apply(3.0, 4.0);
        assert!((f - 5.0).abs() < 1e-14);
        assert!((r - 5.0).abs() < 1e-14);
        assert!(g.abs() < 1e-14);
        // orthogonality
        assert!((G.c * G.c + G.s * G.s - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_rotate_cols_preserves_norms() {
        use crate::algebra::VectorMath;
        let mut M = Matrix::<f64>::from(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let sumsq_before = M.data().sumsq();
        let (G, _) = GivensRotation::new(0.6, 0.8);
        G.rotate_cols(&mut M, 0, 1);
        assert!((M.data().sumsq() - sumsq_before).abs() < 1e-12);
    }
}
