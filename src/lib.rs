//! Linear and mixed-integer programming problems that can be modified incrementally
//! once they are loaded into a solver, and hit-and-run sampling of the polytopes they describe.
//!
//! ```rust
//! use polylp::{MatrixData, ModelUpdate, Problem, Sense, SolverAdapter};
//! use polylp::solvers::{DefaultSolver, ObjectiveDirection};
//!
//! // minimise x + 4y + 9z with x + y <= 5, x + z >= 10, x <= 4, -1 <= y <= 1
//! let mut problem = Problem::new(0, 3)?;
//! problem.set_direction(ObjectiveDirection::Minimisation);
//! problem.set_objective(vec![1., 4., 9.]);
//! problem.set_upper_bounds(vec![4., 1., f64::INFINITY]);
//! problem.set_lower_bounds(vec![f64::NEG_INFINITY, -1., f64::NEG_INFINITY]);
//! problem.set_matrix(MatrixData::Dense(vec![vec![1., 1., 0.], vec![1., 0., 1.]]))?;
//! problem.set_rhs(vec![5., 10.]);
//! problem.set_senses(vec![Sense::LessEq, Sense::GreaterEq]);
//!
//! let solver = DefaultSolver::default();
//! let mut adapter = SolverAdapter::bind(&solver, problem)?;
//! let solution = adapter.solve()?;
//! assert!((solution.objective_value() - 54.).abs() < 1e-9);
//!
//! // z - y >= 8
//! let extra = polylp::Constraint::new([1, 2], [-1., 1.], Sense::GreaterEq, 8.)?;
//! adapter.add_constraint(&extra, ModelUpdate::Mirror)?;
//! let solution = adapter.solve()?;
//! println!("x={} y={} z={}", solution.value(0), solution.value(1), solution.value(2));
//! assert!((solution.objective_value() - 62.).abs() < 1e-9);
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

pub use adapter::{ModelUpdate, SolverAdapter};
pub use constraint::{Constraint, Sense};
pub use error::{ProblemError, SamplingError, SolverError};
pub use problem::{MatrixData, Problem, ProblemKind};
pub use sampler::{DirectionNormalization, PolytopeSampler, SamplerConfig};
pub use solvers::{
    ObjectiveDirection, Solution, SolutionStatus, Solver, SolverSession, WithTimeLimit,
};
pub use sparse::{SparseMatrix, SparseRow};
pub use variable::{variable, VariableDefinition, VariableKind};

#[cfg(feature = "coin_cbc")]
pub use solvers::coin_cbc::CoinCbc;
#[cfg(feature = "highs")]
pub use solvers::highs::Highs;
#[cfg(feature = "lp-solvers")]
pub use solvers::lp_solvers::LpSolver;
#[cfg(feature = "microlp")]
pub use solvers::microlp::MicroLp;
#[cfg(feature = "microlp")]
pub use solvers::DefaultSolver;

mod adapter;
pub mod constraint;
mod error;
pub mod problem;
mod sampler;
pub mod solvers;
mod sparse;
pub mod variable;

#[cfg(not(any(
    feature = "coin_cbc",
    feature = "highs",
    feature = "lp-solvers",
    feature = "microlp",
)))]
compile_error!(
    "No solver available. \
You need to activate at least one solver feature flag in polylp. \
You can by activating the coin_cbc, highs, lp-solvers or microlp features."
);
