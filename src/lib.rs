//! __asqp__ is an active-set solver for dense quadratic programs
//!
//! $$
//! \begin{array}{rl}
//! \text{minimize} & \frac{1}{2}x^T P x + q^T x\\\\\[2ex\]
//!  \text{subject to} & Ax \le b \\\\\[1ex\]
//!         & r_{\min} \le \lVert x \rVert \le r_{\max}
//!  \end{array}
//! $$
//!
//! with decision variable $x \in \mathbb{R}^n$ and data
//! $P=P^\top \in \mathbb{R}^{n \times n}$ (not necessarily positive
//! semidefinite), $q \in \mathbb{R}^n$, $A \in \mathbb{R}^{m \times n}$,
//! $b \in \mathbb{R}^m$ and optional norm bounds on the iterate.
//!
//! Starting from a feasible point, the solver maintains a QR
//! factorization of the working constraints and an updatable
//! factorization of the Hessian projected onto their nullspace, both
//! modified in O(n²) as constraints are activated and released.
//! Indefinite problems are handled by exploring one negative-curvature
//! direction at a time; for positive semidefinite `P` the result is a
//! global minimizer, otherwise a KKT point.
//!
//! Obtaining the initial feasible point is out of scope: pair the solver
//! with any LP/QP phase-1 routine.
//!
//! ## Example
//!
//! ```
//! use asqp::algebra::Matrix;
//! use asqp::solver::*;
//!
//! let P = Matrix::from(&[[2.0, 0.0], [0.0, 2.0]]);
//! let q = [-2.0, -5.0];
//! let A = Matrix::from(&[
//!     [-1.0, 2.0],
//!     [1.0, 2.0],
//!     [1.0, -2.0],
//!     [-1.0, 0.0],
//!     [0.0, -1.0],
//! ]);
//! let b = [2.0, 6.0, 2.0, 0.0, 0.0];
//! let x0 = [2.0, 0.0];
//!
//! let settings = DefaultSettings::default();
//! let mut solver = ActiveSetSolver::new(&P, &q, &A, &b, &x0, settings).unwrap();
//! solver.solve();
//!
//! assert_eq!(solver.solution.status, SolverStatus::Solved);
//! ```

//Rust hates greek characters
#![allow(confusable_idents)]

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod algebra;
pub mod io;
pub mod solver;
