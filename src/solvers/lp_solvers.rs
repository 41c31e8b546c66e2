//! This module allows solving problems is external solver binaries.
//! Contrarily to other solver modules, this one doesn't require linking your program to any solver.
//! A solver binary will need to be present on the user's computer at runtime.
//!
//! The session is written to a temporary LP file and handed to the binary on every solve.

use std::cmp::Ordering;

use lp_solvers::lp_format::LpObjective;
use lp_solvers::problem::StrExpression;
pub use lp_solvers::solvers::*;

use crate::error::SolverError;
use crate::problem::Problem;
use crate::solvers::staged::{RunOutcome, StagedModel};
use crate::solvers::{ObjectiveDirection, SolutionStatus, Solver, WithTimeLimit};

/// An external solver
#[derive(Debug, Clone)]
pub struct LpSolver<T: SolverTrait>(pub T);

impl<T: SolverTrait + Clone> Solver for LpSolver<T> {
    type Session = LpSolverSession<T>;

    fn bind(&self, problem: &Problem) -> Result<Self::Session, SolverError> {
        if problem.kind().is_quadratic() {
            return Err(SolverError::UnsupportedKind(problem.kind()));
        }
        Ok(LpSolverSession {
            staged: StagedModel::from_problem(problem),
            solver: self.0.clone(),
            last: None,
        })
    }

    fn name() -> &'static str {
        "External Solver (through lp_solvers)"
    }
}

impl<T> WithTimeLimit for LpSolver<T>
where
    T: SolverTrait + WithMaxSeconds<T>,
{
    fn with_time_limit<U: Into<f64>>(self, seconds: U) -> Self {
        LpSolver(self.0.with_max_seconds(seconds.into() as u32))
    }
}

/// The status reported by an external solver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalStatus {
    /// The solver found an optimum
    Optimal,
    /// The solver stopped on a feasible point that may not be optimal
    SubOptimal,
    /// No point satisfies the constraints
    Infeasible,
    /// The objective is unbounded
    Unbounded,
    /// The solver did not solve the problem
    NotSolved,
}

/// A problem to be used by lp-solvers
#[derive(Debug, Clone)]
pub struct LpSolverSession<T: SolverTrait> {
    staged: StagedModel,
    solver: T,
    last: Option<RunOutcome<ExternalStatus>>,
}

staged_session!(impl<T: SolverTrait> LpSolverSession<T>, ExternalStatus);

impl<T: SolverTrait> LpSolverSession<T> {
    /// The lp-solvers problem for the current state of the session.
    /// Column `i` is named `x{i}`. Range rows become two constraints.
    pub fn to_lp_problem(&self) -> lp_solvers::problem::Problem {
        let staged = &self.staged;
        let variables = (0..staged.num_cols())
            .map(|col| {
                let (lower_bound, upper_bound) = staged.column_bounds(col);
                lp_solvers::problem::Variable {
                    name: format!("x{}", col),
                    is_integer: staged.kinds[col].is_integer(),
                    lower_bound,
                    upper_bound,
                }
            })
            .collect();
        let objective = linear_coefficients_str(
            staged
                .objective
                .iter()
                .copied()
                .enumerate()
                .filter(|&(_, c)| c != 0.),
        );
        let mut constraints = Vec::with_capacity(staged.num_rows());
        for row in &staged.rows {
            let (lower, upper) = row.interval();
            let lhs = || linear_coefficients_str(row.terms.iter().copied());
            let mut push = |operator, rhs| {
                constraints.push(lp_solvers::lp_format::Constraint {
                    lhs: lhs(),
                    operator,
                    rhs,
                })
            };
            if lower == upper {
                push(Ordering::Equal, lower);
                continue;
            }
            if lower > f64::NEG_INFINITY {
                push(Ordering::Greater, lower);
            }
            if upper < f64::INFINITY {
                push(Ordering::Less, upper);
            }
        }
        lp_solvers::problem::Problem {
            name: "polylp_problem".to_string(),
            sense: match staged.direction {
                ObjectiveDirection::Maximisation => LpObjective::Maximize,
                ObjectiveDirection::Minimisation => LpObjective::Minimize,
            },
            objective,
            variables,
            constraints,
        }
    }

    fn run(&mut self) -> Result<RunOutcome<ExternalStatus>, SolverError> {
        let problem = self.to_lp_problem();
        let map = self
            .solver
            .run(&problem)
            .map_err(|message| SolverError::Backend {
                backend: "lp-solvers",
                message,
            })?;
        let code = match map.status {
            Status::Optimal => ExternalStatus::Optimal,
            Status::SubOptimal => ExternalStatus::SubOptimal,
            Status::Infeasible => ExternalStatus::Infeasible,
            Status::Unbounded => ExternalStatus::Unbounded,
            Status::NotSolved => ExternalStatus::NotSolved,
            #[allow(unreachable_patterns)]
            _ => ExternalStatus::NotSolved,
        };
        if !matches!(code, ExternalStatus::Optimal | ExternalStatus::SubOptimal) {
            return Ok(RunOutcome::without_values(code));
        }
        let values: Vec<f64> = problem
            .variables
            .iter()
            .map(|v| f64::from(*map.results.get(&v.name).unwrap_or(&0.)))
            .collect();
        Ok(RunOutcome {
            code,
            objective: Some(self.staged.eval_objective(&values)),
            values: Some(values),
        })
    }

    fn classify_code(code: ExternalStatus) -> SolutionStatus {
        match code {
            ExternalStatus::Optimal => SolutionStatus::Optimal,
            ExternalStatus::Infeasible => SolutionStatus::Infeasible,
            ExternalStatus::Unbounded => SolutionStatus::Unbounded,
            ExternalStatus::SubOptimal | ExternalStatus::NotSolved => SolutionStatus::Other,
        }
    }

    fn feasible_code(code: ExternalStatus) -> bool {
        matches!(code, ExternalStatus::Optimal | ExternalStatus::SubOptimal)
    }
}

/// LP files cannot hold an empty expression, so `0 x0` stands for zero
fn linear_coefficients_str(terms: impl Iterator<Item = (usize, f64)>) -> StrExpression {
    let formatted: Vec<String> = terms
        .map(|(col, coeff)| format!("{:+} x{}", coeff, col))
        .collect();
    if formatted.is_empty() {
        return StrExpression("0 x0".to_string());
    }
    StrExpression(formatted.join(" "))
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use crate::constraint::Sense;
    use crate::problem::{MatrixData, Problem};
    use crate::solvers::lp_solvers::{GlpkSolver, LpSolver};
    use crate::solvers::{ObjectiveDirection, Solver};

    fn problem(objective: Vec<f64>) -> Problem {
        let mut p = Problem::new(0, 2).unwrap();
        p.set_direction(ObjectiveDirection::Minimisation);
        p.set_objective(objective);
        p
    }

    #[test]
    fn coefficient_formatting_pos_pos() {
        let session = LpSolver(GlpkSolver::new()).bind(&problem(vec![1., 2.])).unwrap();
        assert_eq!(session.to_lp_problem().objective.0, "+1 x0 +2 x1");
    }

    #[test]
    fn coefficient_formatting_pos_neg() {
        let session = LpSolver(GlpkSolver::new()).bind(&problem(vec![1., -2.])).unwrap();
        assert_eq!(session.to_lp_problem().objective.0, "+1 x0 -2 x1");
    }

    #[test]
    fn coefficient_formatting_neg_neg() {
        let session = LpSolver(GlpkSolver::new()).bind(&problem(vec![-1., -2.])).unwrap();
        assert_eq!(session.to_lp_problem().objective.0, "-1 x0 -2 x1");
    }

    #[test]
    fn zero_objective() {
        let session = LpSolver(GlpkSolver::new()).bind(&problem(vec![0., 0.])).unwrap();
        assert_eq!(session.to_lp_problem().objective.0, "0 x0");
    }

    #[test]
    fn range_rows_become_two_constraints() {
        let mut p = problem(vec![1., 0.]);
        p.set_matrix(MatrixData::Dense(vec![vec![1., -1.], vec![0., 1.]]))
            .unwrap();
        p.set_rhs(vec![1., 4.]);
        p.set_senses(vec![Sense::Range, Sense::Equal]);
        p.set_range_values(Some(vec![2., 0.]));
        let session = LpSolver(GlpkSolver::new()).bind(&p).unwrap();
        let constraints = session.to_lp_problem().constraints;
        assert_eq!(constraints.len(), 3);
        assert_eq!(constraints[0].lhs.0, "+1 x0 -1 x1");
        assert_eq!(constraints[0].operator, Ordering::Greater);
        assert_eq!(constraints[0].rhs, 1.);
        assert_eq!(constraints[1].operator, Ordering::Less);
        assert_eq!(constraints[1].rhs, 3.);
        assert_eq!(constraints[2].operator, Ordering::Equal);
        assert_eq!(constraints[2].rhs, 4.);
    }
}
