#![allow(non_snake_case)]
use super::active_set::ActiveSetIterator;
use super::{DefaultInfo, DefaultSettings};
use crate::algebra::*;
use crate::io::ConfigurablePrintTarget;
use num_traits::ToPrimitive;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

// ---------------------------------
// Solver status type
// ---------------------------------

/// Status of solver at termination

#[repr(u32)]
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolverStatus {
    /// Problem is not solved (solver hasn't run).
    Unsolved,
    /// Solver terminated at a point satisfying the optimality conditions.
    Solved,
    /// Iteration limit reached before the optimality test passed.
    MaxIterations,
    /// An unbounded descent ray was detected.  The returned iterate is
    /// the last (feasible, non-optimal) point visited.
    Unbounded,
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Default for SolverStatus {
    fn default() -> Self {
        SolverStatus::Unsolved
    }
}

// ---------------------------------
// API error type
// ---------------------------------

/// Error type returned on malformed problem input.  All variants are
/// raised before the first iteration; the solve loop itself does not
/// throw.
#[derive(Error, Debug)]
pub enum SolverError {
    /// Problem matrix and vector dimensions are inconsistent
    #[error("Dimension mismatch in {0}")]
    DimensionMismatch(&'static str),
    /// The supplied starting point violates `Ax <= b`
    #[error("Starting point is infeasible (violation {0})")]
    InfeasibleStartingPoint(f64),
    /// The supplied starting point violates the radius bounds
    #[error("Starting point norm {0} is outside the radius bounds")]
    StartingPointOutsideRadius(f64),
    /// r_min/r_max do not describe a nonempty shell
    #[error("Invalid radius bounds")]
    BadRadiusBounds,
}

// ---------------------------------
// problem data
// ---------------------------------

/// Problem instance in standard form:
/// minimize `½x'Px + q'x` subject to `Ax ≤ b`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
pub struct DefaultProblemData<T> {
    /// Hessian of the objective (symmetrized on entry)
    pub P: Matrix<T>,
    /// linear cost
    pub q: Vec<T>,
    /// constraint matrix
    pub A: Matrix<T>,
    /// constraint right-hand side
    pub b: Vec<T>,
    /// number of variables
    pub n: usize,
    /// number of constraint rows
    pub m: usize,
}

impl<T> DefaultProblemData<T>
where
    T: FloatT,
{
    pub fn new(P: &Matrix<T>, q: &[T], A: &Matrix<T>, b: &[T]) -> Result<Self, SolverError> {
        let n = P.nrows();
        let m = A.nrows();

        if !P.is_square() {
            return Err(SolverError::DimensionMismatch("P"));
        }
        if q.len() != n {
            return Err(SolverError::DimensionMismatch("q"));
        }
        if A.ncols() != n {
            return Err(SolverError::DimensionMismatch("A"));
        }
        if b.len() != m {
            return Err(SolverError::DimensionMismatch("b"));
        }

        let mut P = P.clone();
        P.symmetric_part();

        Ok(Self {
            P,
            q: q.to_vec(),
            A: A.clone(),
            b: b.to_vec(),
            n,
            m,
        })
    }
}

// ---------------------------------
// solution type
// ---------------------------------

/// Solver output
#[derive(Debug, Clone)]
pub struct DefaultSolution<T> {
    /// primal solution
    pub x: Vec<T>,
    /// Lagrange multipliers, zero at inactive constraints
    pub λ: Vec<T>,
    /// final solver status
    pub status: SolverStatus,
    /// primal objective value
    pub obj_val: T,
    /// number of iterations
    pub iterations: u32,
}

impl<T> DefaultSolution<T>
where
    T: FloatT,
{
    fn new(n: usize, m: usize) -> Self {
        Self {
            x: vec![T::zero(); n],
            λ: vec![T::zero(); m],
            status: SolverStatus::Unsolved,
            obj_val: T::nan(),
            iterations: 0,
        }
    }
}

// ---------------------------------
// top level solver container type
// ---------------------------------

/// Active-set QP solver.
///
/// Constructed from a problem instance, a feasible starting point and a
/// settings object; [`solve`](ActiveSetSolver::solve) then iterates to a
/// KKT point, an unbounded-ray report or the iteration cap.
pub struct ActiveSetSolver<T: FloatT = f64> {
    pub data: DefaultProblemData<T>,
    pub settings: DefaultSettings<T>,
    pub solution: DefaultSolution<T>,
    pub(crate) info: DefaultInfo<T>,
    core: ActiveSetIterator<T>,
}

impl<T> ActiveSetSolver<T>
where
    T: FloatT,
{
    /// Set up a solver for one problem instance.
    ///
    /// The starting point must satisfy `A x0 <= b` and the radius bounds
    /// to within `settings.tol_feas`; an infeasible or mis-sized input is
    /// rejected here rather than detected mid-iteration.
    pub fn new(
        P: &Matrix<T>,
        q: &[T],
        A: &Matrix<T>,
        b: &[T],
        x0: &[T],
        settings: DefaultSettings<T>,
    ) -> Result<Self, SolverError> {
        let data = DefaultProblemData::new(P, q, A, b)?;

        if x0.len() != data.n {
            return Err(SolverError::DimensionMismatch("x0"));
        }
        if settings.r_min > settings.r_max || settings.r_min < T::zero() {
            return Err(SolverError::BadRadiusBounds);
        }

        // feasibility of the starting point
        let mut ax = vec![T::zero(); data.m];
        data.A.gemv(&mut ax, MatrixShape::N, x0, T::one(), T::zero());
        ax.axpby(-T::one(), &data.b, T::one());
        let violation = ax.maximum();
        if violation > settings.tol_feas {
            return Err(SolverError::InfeasibleStartingPoint(
                violation.to_f64().unwrap_or(f64::NAN),
            ));
        }

        let norm_x0 = x0.norm();
        if norm_x0 > settings.r_max + settings.tol_feas
            || norm_x0 < settings.r_min - settings.tol_feas
        {
            return Err(SolverError::StartingPointOutsideRadius(
                norm_x0.to_f64().unwrap_or(f64::NAN),
            ));
        }

        let core = ActiveSetIterator::new(&data, x0, &settings);
        let solution = DefaultSolution::new(data.n, data.m);

        Ok(Self {
            data,
            settings,
            solution,
            info: DefaultInfo::new(),
            core,
        })
    }

    /// The current iterate: the starting point before
    /// [`solve`](ActiveSetSolver::solve) is called, the terminal point
    /// afterwards.
    pub fn current_iterate(&self) -> &[T] {
        &self.core.x
    }

    /// Run the active-set iteration to termination.
    pub fn solve(&mut self) {
        self.info
            .print_configuration(&self.settings, &self.data, &self.core)
            .ok();
        self.info.print_status_header(&self.settings).ok();

        while !self.core.done {
            self.core.step(&self.data, &self.settings);

            if self.settings.verbose
                && (self.core.done
                    || self.core.iterations % self.settings.print_interval.max(1) == 0)
            {
                self.info
                    .print_status(&self.settings, &self.data, &self.core)
                    .ok();
            }
        }

        self.info.print_footer(&self.settings, &self.core).ok();

        self.solution.x.copy_from(&self.core.x);
        self.solution.λ.copy_from(&self.core.λ);
        self.solution.status = self.core.status;
        self.solution.obj_val = self.core.objective(&self.data);
        self.solution.iterations = self.core.iterations;
    }
}

impl<T: FloatT> ConfigurablePrintTarget for ActiveSetSolver<T> {
    fn print_to_stdout(&mut self) {
        self.info.stream.print_to_stdout()
    }
    fn print_to_buffer(&mut self) {
        self.info.stream.print_to_buffer()
    }
    fn print_to_sink(&mut self) {
        self.info.stream.print_to_sink()
    }
    fn get_print_buffer(&mut self) -> std::io::Result<String> {
        self.info.stream.get_print_buffer()
    }
}

/// One-shot convenience wrapper around
/// [`ActiveSetSolver`](ActiveSetSolver): construct, solve, and return the
/// solution.
pub fn solve_qp<T: FloatT>(
    P: &Matrix<T>,
    q: &[T],
    A: &Matrix<T>,
    b: &[T],
    x0: &[T],
    settings: DefaultSettings<T>,
) -> Result<DefaultSolution<T>, SolverError> {
    let mut solver = ActiveSetSolver::new(P, q, A, b, x0, settings)?;
    solver.solve();
    Ok(solver.solution)
}
