//! Solver main module.
//!
//! Contains the updatable factorizations, the active-set iteration and
//! the user-facing [`ActiveSetSolver`](crate::solver::ActiveSetSolver)
//! container with its settings and solution types.

mod active_set;
mod info_print;
mod nullspace_ldl;
mod qr;
mod settings;
#[allow(clippy::module_inception)]
mod solver;

pub(crate) use info_print::DefaultInfo;

pub use nullspace_ldl::NullspaceLDL;
pub use qr::UpdatableQR;
pub use settings::{DefaultSettings, DefaultSettingsBuilder, SettingsError};
pub use solver::{
    solve_qp, ActiveSetSolver, DefaultProblemData, DefaultSolution, SolverError, SolverStatus,
};

#[cfg(feature = "serde")]
mod json;
#[cfg(feature = "serde")]
pub use json::SolverJSONReadWrite;
