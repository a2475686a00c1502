use super::FloatT;

// All internal math in the solver goes through these core traits,
// implemented generically for floats of type FloatT.

/// Vector operations on slices of [`FloatT`](crate::algebra::FloatT)

pub trait VectorMath {
    type T;

    /// Copy values from `src` to `self`
    fn copy_from(&mut self, src: &Self) -> &mut Self;

    /// Apply an elementwise operation on a vector.
    fn scalarop(&mut self, op: impl Fn(Self::T) -> Self::T) -> &mut Self;

    /// set all elements to the same value
    fn set(&mut self, c: Self::T) -> &mut Self;

    /// Elementwise scaling.
    fn scale(&mut self, c: Self::T) -> &mut Self;

    /// Elementwise negation of entries.
    fn negate(&mut self) -> &mut Self;

    /// Dot product
    fn dot(&self, y: &Self) -> Self::T;

    /// Standard Euclidian or 2-norm distance from `self` to `y`
    fn dist(&self, y: &Self) -> Self::T;

    /// Sum of squares of the elements.
    fn sumsq(&self) -> Self::T;

    /// 2-norm
    fn norm(&self) -> Self::T;

    /// Infinity norm
    fn norm_inf(&self) -> Self::T;

    /// Infinity norm of the elementwise difference to `b`
    fn norm_inf_diff(&self, b: &Self) -> Self::T;

    /// Maximum value in vector
    fn maximum(&self) -> Self::T;

    /// Checks if all elements are finite, i.e. no Infs or NaNs
    fn is_finite(&self) -> bool;

    //blas-like vector ops
    //--------------------

    /// BLAS-like shift and scale in place.  Produces `self = a*x+b*self`
    fn axpby(&mut self, a: Self::T, x: &Self, b: Self::T) -> &mut Self;

    /// BLAS-like shift and scale, non in-place version.  Produces `self = a*x+b*y`
    fn waxpby(&mut self, a: Self::T, x: &Self, b: Self::T, y: &Self) -> &mut Self;
}

/// Matrix operations for dense matrices of [`FloatT`](crate::algebra::FloatT)

pub trait MatrixMath {
    type T: FloatT;

    /// BLAS-like general matrix-vector multiply.  Produces
    /// `y = a*op(self)*x + b*y`, where `op` is selected by the shape flag.
    fn gemv(
        &self,
        y: &mut [Self::T],
        trans: super::MatrixShape,
        x: &[Self::T],
        a: Self::T,
        b: Self::T,
    );

    /// Quadratic form `y^T*self*x` for a square matrix.
    fn quad_form(&self, y: &[Self::T], x: &[Self::T]) -> Self::T;

    /// Overwrite with the symmetric part `(self + self')/2`.
    fn symmetric_part(&mut self);
}
