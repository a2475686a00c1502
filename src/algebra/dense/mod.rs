mod core;
pub use self::core::*;
mod matrix_math;
mod givens;
pub(crate) use self::givens::*;
mod cholesky;
pub(crate) use self::cholesky::*;
