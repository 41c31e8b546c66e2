//! Solver backends, and the traits they implement.
//!
//! A backend is represented by two types:
//!  - a value implementing [Solver], created once by the caller. It plays the role of the
//!    solver environment: it holds the backend options and opens sessions.
//!  - a session implementing [SolverSession]: one problem loaded into the backend's own
//!    structures, which can be mutated incrementally and solved repeatedly.
//!
//! Most users drive a session through a [SolverAdapter](crate::SolverAdapter),
//! which keeps it consistent with the [Problem] it was bound from.
use std::fmt::Debug;
use std::ops::Range;

use crate::constraint::Constraint;
use crate::error::SolverError;
use crate::problem::Problem;
use crate::variable::VariableKind;

#[macro_use]
mod macros;
pub(crate) mod staged;

#[cfg(feature = "coin_cbc")]
pub mod coin_cbc;
#[cfg(feature = "highs")]
pub mod highs;
#[cfg(feature = "lp-solvers")]
pub mod lp_solvers;
#[cfg(feature = "microlp")]
pub mod microlp;

/// Whether to search for the variable values that give the highest
/// or the lowest value of the objective function.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub enum ObjectiveDirection {
    /// Find the highest value
    Maximisation,
    /// Find the lowest value
    Minimisation,
}

/// The outcome of a solve, independent of the backend
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    ///  There exists no solution that satisfies all of the constraints
    Infeasible,
    /// The problem is [unbounded](https://www.matem.unam.mx/~omar/math340/unbounded.html).
    /// The objective can be made infinitely large without violating any constraints.
    Unbounded,
    /// Anything else: time limits, numerical trouble, or codes such as
    /// "infeasible or unbounded" that cannot be told apart without another solve
    Other,
}

/// The result of a solve.
///
/// A solve that did not find an optimum is still a `Solution`: its [status](Solution::status)
/// tells what happened, and its values are `NaN` when the backend could not provide any.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    values: Vec<f64>,
    objective_value: f64,
    status: SolutionStatus,
    feasible: bool,
}

impl Solution {
    pub(crate) fn new(
        values: Vec<f64>,
        objective_value: f64,
        status: SolutionStatus,
        feasible: bool,
    ) -> Self {
        Solution {
            values,
            objective_value,
            status,
            feasible,
        }
    }

    /// The value of the given column
    pub fn value(&self, column: usize) -> f64 {
        self.values[column]
    }

    /// The values of all the columns
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Consumes the solution, returning its values
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// The value of the objective function
    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    /// The backend-independent status
    pub fn status(&self) -> SolutionStatus {
        self.status
    }

    /// Whether the values satisfy the constraints
    pub fn is_feasible(&self) -> bool {
        self.feasible
    }

    /// Whether the values are an optimum
    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}

/// A solver backend, holding the options shared by all of its sessions.
///
/// The value is owned by the caller, and passed by reference wherever a problem needs
/// to be bound, so that several sessions can share the same environment.
pub trait Solver {
    /// The session type of this backend
    type Session: SolverSession;

    /// Load a validated problem into a new session
    fn bind(&self, problem: &Problem) -> Result<Self::Session, SolverError>;

    /// A human-readable name for the solver
    fn name() -> &'static str;
}

/// The capabilities a backend session must expose.
///
/// Rows are addressed by position, so callers are responsible for keeping
/// the session aligned with the model it mirrors.
pub trait SolverSession {
    /// The backend's own status code
    type StatusCode: Copy + Debug + PartialEq;

    /// Run the backend until it reaches a terminal status
    fn optimize(&mut self) -> Result<Self::StatusCode, SolverError>;

    /// Map a backend status code to a [SolutionStatus]
    fn classify(code: Self::StatusCode) -> SolutionStatus;

    /// Whether the backend reports a feasible point for this status
    fn reports_feasible(code: Self::StatusCode) -> bool {
        Self::classify(code) == SolutionStatus::Optimal
    }

    /// Status of the last solve, `None` if nothing was solved since the last change
    fn status_code(&self) -> Option<Self::StatusCode>;

    /// Column values of the last solve
    fn solution_vector(&self) -> Option<&[f64]>;

    /// Objective value of the last solve
    fn objective_value(&self) -> Option<f64>;

    /// The objective coefficients currently loaded
    fn objective(&self) -> &[f64];

    /// Replace the objective coefficients
    fn change_objective(&mut self, objective: &[f64]);

    /// Replace the column kinds
    fn change_variable_kinds(&mut self, kinds: &[VariableKind]);

    /// Append a row
    fn add_row(&mut self, constraint: &Constraint);

    /// Delete a contiguous range of rows
    fn delete_rows(&mut self, rows: Range<usize>);

    /// Set the bounds of a column
    fn set_column_bounds(&mut self, column: usize, lower: f64, upper: f64);

    /// Change matrix coefficients, given as `(row, column, value)`
    fn change_coefficients(&mut self, changes: &[(usize, usize, f64)]);

    /// Change right-hand sides, given as `(row, value)`
    fn change_rhs(&mut self, changes: &[(usize, f64)]);

    /// Number of rows loaded
    fn num_rows(&self) -> usize;

    /// Number of columns loaded
    fn num_cols(&self) -> usize;

    /// Release the session. Calling it again has no effect.
    fn close(&mut self);

    /// Whether [SolverSession::close] was called
    fn is_closed(&self) -> bool;
}

/// A solver that can stop after a given amount of wall-clock time
pub trait WithTimeLimit {
    /// Sets the time limit in seconds
    fn with_time_limit<T: Into<f64>>(self, seconds: T) -> Self;
}

/// The backend used when none is named explicitly
#[cfg(feature = "microlp")]
pub type DefaultSolver = microlp::MicroLp;
