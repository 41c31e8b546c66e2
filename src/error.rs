//! Error types.
//!
//! Structural mistakes (wrong shapes, bad indices) are reported as errors at the point of misuse.
//! Solver outcomes such as infeasibility are *not* errors: they are carried by
//! [Solution](crate::Solution) as a [SolutionStatus].
use thiserror::Error;

use crate::problem::ProblemKind;
use crate::solvers::SolutionStatus;

/// A problem definition, or a mutation of it, is inconsistent
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProblemError {
    /// A vector or matrix does not have the length the problem declares
    #[error("{what} has length {found}, expected {expected}")]
    ShapeMismatch {
        /// The offending vector or matrix dimension
        what: &'static str,
        /// The length required by the problem
        expected: usize,
        /// The actual length
        found: usize,
    },
    /// A column has a lower bound above its upper bound
    #[error("column {column} has lower bound {lower} above upper bound {upper}")]
    BoundsMismatch {
        /// Index of the column
        column: usize,
        /// Its lower bound
        lower: f64,
        /// Its upper bound
        upper: f64,
    },
    /// A sense symbol could not be understood, or a range row has no range value
    #[error("invalid sense: {0}")]
    InvalidSense(String),
    /// A variable kind could not be understood, or is not allowed by the problem kind
    #[error("invalid variable kind: {0}")]
    InvalidKind(String),
    /// A constraint references a column that does not exist
    #[error("column index {index} is out of range for a problem with {num_cols} columns")]
    IndexOutOfRange {
        /// The requested column
        index: usize,
        /// The number of columns of the problem
        num_cols: usize,
    },
    /// A matrix entry lies outside of the matrix
    #[error("entry ({row}, {col}) is outside of a {rows}x{cols} matrix")]
    EntryOutOfRange {
        /// Row of the entry
        row: usize,
        /// Column of the entry
        col: usize,
        /// Number of rows of the matrix
        rows: usize,
        /// Number of columns of the matrix
        cols: usize,
    },
    /// More rows were removed than the problem contains
    #[error("cannot remove {requested} rows, only {available} exist")]
    RowUnderflow {
        /// The number of rows to remove
        requested: usize,
        /// The number of rows present
        available: usize,
    },
    /// A problem needs at least one column
    #[error("a problem needs at least one column")]
    EmptyProblem,
}

/// An error occurring while binding a problem to a solver, or while talking to it
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    /// The problem failed validation, or an operation was given inconsistent data
    #[error(transparent)]
    Problem(#[from] ProblemError),
    /// The backend cannot handle this kind of problem
    #[error("{0} problems are not supported by this solver")]
    UnsupportedKind(ProblemKind),
    /// The session was already closed
    #[error("the solver session is closed")]
    Closed,
    /// The backend itself failed (missing binary, crashed process, ...)
    #[error("{backend} failed: {message}")]
    Backend {
        /// Name of the backend
        backend: &'static str,
        /// What went wrong
        message: String,
    },
}

/// An error that stops a hit-and-run walk
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SamplingError {
    /// A line intersection did not solve to optimality.
    /// The current point of the walk can no longer be trusted to be feasible.
    #[error("line intersection ended with status {0:?}")]
    Status(SolutionStatus),
    /// The start point was checked and is not inside the polytope
    #[error("the start point is not feasible")]
    InfeasibleStart,
    /// The polytope or a point given to the sampler is malformed
    #[error(transparent)]
    Problem(#[from] ProblemError),
    /// The underlying solver failed
    #[error(transparent)]
    Solver(#[from] SolverError),
}
