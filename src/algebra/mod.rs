//! Dense linear algebra support for the solver.
//!
//! Internal matrix representations are dense and column major.  All
//! internal math goes through the [`VectorMath`](crate::algebra::VectorMath)
//! and [`MatrixMath`](crate::algebra::MatrixMath) traits, implemented
//! generically for floats of type [`FloatT`](crate::algebra::FloatT).

mod floats;
pub use floats::*;
mod math_traits;
pub use math_traits::*;
mod vecmath;
mod dense;
pub use dense::*;

/// Matrix orientation marker.  T = transpose, N = non-transposed
#[derive(PartialEq, Eq, Copy, Clone)]
pub enum MatrixShape {
    /// Normal matrix orientation
    N,
    /// Transposed matrix orientation
    T,
}
