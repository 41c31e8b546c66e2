//! A solver that uses [microlp](https://docs.rs/microlp), a pure rust solver.
//! This is the default backend.

use crate::error::SolverError;
use crate::problem::Problem;
use crate::solvers::staged::{RunOutcome, StagedModel};
use crate::solvers::{ObjectiveDirection, SolutionStatus, Solver};
use crate::variable::VariableKind;

/// The [microlp](https://docs.rs/microlp) solver.
///
/// microlp has no global state, so this value only serves as the environment
/// sessions are opened from.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLp;

impl Solver for MicroLp {
    type Session = MicroLpSession;

    fn bind(&self, problem: &Problem) -> Result<Self::Session, SolverError> {
        if problem.kind().is_quadratic() {
            return Err(SolverError::UnsupportedKind(problem.kind()));
        }
        Ok(MicroLpSession {
            staged: StagedModel::from_problem(problem),
            last: None,
        })
    }

    fn name() -> &'static str {
        "Microlp"
    }
}

/// The status codes of microlp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroLpStatus {
    /// An optimal solution was found
    Solved,
    /// The constraints can't simultaneously be satisfied
    Infeasible,
    /// The objective function is unbounded
    Unbounded,
    /// microlp reported an internal error
    InternalError,
}

/// A problem loaded for microlp
#[derive(Debug, Clone)]
pub struct MicroLpSession {
    staged: StagedModel,
    last: Option<RunOutcome<MicroLpStatus>>,
}

staged_session!(MicroLpSession, MicroLpStatus);

impl MicroLpSession {
    /// Build the microlp problem corresponding to the current state of the session
    pub fn to_inner(&self) -> (microlp::Problem, Vec<microlp::Variable>) {
        let staged = &self.staged;
        let mut problem = microlp::Problem::new(match staged.direction {
            ObjectiveDirection::Maximisation => microlp::OptimizationDirection::Maximize,
            ObjectiveDirection::Minimisation => microlp::OptimizationDirection::Minimize,
        });
        let variables: Vec<microlp::Variable> = (0..staged.num_cols())
            .map(|col| {
                let coeff = staged.objective[col];
                let (min, max) = staged.column_bounds(col);
                match staged.kinds[col] {
                    VariableKind::Continuous => problem.add_var(coeff, (min, max)),
                    VariableKind::Binary if min == 0. && max == 1. => {
                        problem.add_binary_var(coeff)
                    }
                    // Infinite bounds saturate to the i32 range
                    _ => problem.add_integer_var(coeff, (min.ceil() as i32, max.floor() as i32)),
                }
            })
            .collect();
        for row in &staged.rows {
            if row.terms.is_empty() {
                continue;
            }
            let (lower, upper) = row.interval();
            let expr = || {
                let mut linear_expr = microlp::LinearExpr::empty();
                for &(col, coefficient) in &row.terms {
                    linear_expr.add(variables[col], coefficient);
                }
                linear_expr
            };
            if lower == upper {
                problem.add_constraint(expr(), microlp::ComparisonOp::Eq, lower);
                continue;
            }
            if lower > f64::NEG_INFINITY {
                problem.add_constraint(expr(), microlp::ComparisonOp::Ge, lower);
            }
            if upper < f64::INFINITY {
                problem.add_constraint(expr(), microlp::ComparisonOp::Le, upper);
            }
        }
        (problem, variables)
    }

    fn run(&mut self) -> Result<RunOutcome<MicroLpStatus>, SolverError> {
        // An empty row constrains nothing but the constant 0
        let empty_row_violated = self.staged.rows.iter().any(|row| {
            let (lower, upper) = row.interval();
            row.terms.is_empty() && (lower > 0. || upper < 0.)
        });
        if empty_row_violated {
            return Ok(RunOutcome::without_values(MicroLpStatus::Infeasible));
        }
        let (problem, variables) = self.to_inner();
        Ok(match problem.solve() {
            Ok(solution) => {
                let values: Vec<f64> = variables.iter().map(|&v| solution[v]).collect();
                RunOutcome {
                    code: MicroLpStatus::Solved,
                    objective: Some(self.staged.eval_objective(&values)),
                    values: Some(values),
                }
            }
            Err(microlp::Error::Infeasible) => RunOutcome::without_values(MicroLpStatus::Infeasible),
            Err(microlp::Error::Unbounded) => RunOutcome::without_values(MicroLpStatus::Unbounded),
            Err(microlp::Error::InternalError(message)) => {
                log::warn!("microlp internal error: {}", message);
                RunOutcome::without_values(MicroLpStatus::InternalError)
            }
        })
    }

    fn classify_code(code: MicroLpStatus) -> SolutionStatus {
        match code {
            MicroLpStatus::Solved => SolutionStatus::Optimal,
            MicroLpStatus::Infeasible => SolutionStatus::Infeasible,
            MicroLpStatus::Unbounded => SolutionStatus::Unbounded,
            MicroLpStatus::InternalError => SolutionStatus::Other,
        }
    }

    fn feasible_code(code: MicroLpStatus) -> bool {
        code == MicroLpStatus::Solved
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::{MicroLp, MicroLpSession, MicroLpStatus};
    use crate::constraint::{Constraint, Sense};
    use crate::problem::{MatrixData, Problem, ProblemKind};
    use crate::solvers::{SolutionStatus, Solver, SolverSession};
    use crate::variable::{variable, VariableKind};

    fn easy_problem() -> Problem {
        // maximise x + y, 0 <= x <= 2, 1 <= y <= 3, 2x + y <= 4
        let mut p = Problem::new(0, 2).unwrap();
        p.define_column(0, variable().clamp(0, 2).objective(1)).unwrap();
        p.define_column(1, variable().clamp(1, 3).objective(1)).unwrap();
        p.set_matrix(MatrixData::Dense(vec![vec![2., 1.]])).unwrap();
        p.set_rhs(vec![4.]);
        p.set_senses(vec![Sense::LessEq]);
        p
    }

    #[test]
    fn can_solve_easy() {
        let mut session = MicroLp.bind(&easy_problem()).unwrap();
        assert_eq!(session.optimize(), Ok(MicroLpStatus::Solved));
        let x = session.solution_vector().unwrap();
        assert_float_eq!(x[0], 0.5, abs <= 1e-9);
        assert_float_eq!(x[1], 3., abs <= 1e-9);
        assert_float_eq!(session.objective_value().unwrap(), 3.5, abs <= 1e-9);
    }

    #[test]
    fn mutations_invalidate_the_last_solution() {
        let mut session = MicroLp.bind(&easy_problem()).unwrap();
        session.optimize().unwrap();
        session.add_row(&Constraint::bound(1, Sense::LessEq, 2.));
        assert_eq!(session.status_code(), None);
        session.optimize().unwrap();
        assert_float_eq!(session.solution_vector().unwrap()[0], 1., abs <= 1e-9);
        session.delete_rows(1..2);
        session.set_column_bounds(0, 3., 3.);
        assert_eq!(session.optimize(), Ok(MicroLpStatus::Infeasible));
        assert_eq!(
            MicroLpSession::classify(MicroLpStatus::Infeasible),
            SolutionStatus::Infeasible
        );
        assert!(session.solution_vector().is_none());
    }

    #[test]
    fn integer_columns() {
        let mut p = easy_problem();
        p.set_kind(ProblemKind::Milp);
        p.set_variable_kinds(vec![VariableKind::Integer, VariableKind::Integer]);
        let mut session = MicroLp.bind(&p).unwrap();
        assert_eq!(session.optimize(), Ok(MicroLpStatus::Solved));
        let x = session.solution_vector().unwrap();
        assert_float_eq!(x[0] + x[1], 3., abs <= 1e-9);
    }

    #[test]
    fn unbounded() {
        let mut p = Problem::new(0, 1).unwrap();
        p.set_objective(vec![1.]);
        p.add_bound_constraint(0, Sense::GreaterEq, 0.).unwrap();
        let mut session = MicroLp.bind(&p).unwrap();
        assert_eq!(session.optimize(), Ok(MicroLpStatus::Unbounded));
    }

    #[test]
    fn violated_empty_row() {
        let mut p = Problem::new(1, 1).unwrap();
        p.set_rhs(vec![1.]);
        let mut session = MicroLp.bind(&p).unwrap();
        assert_eq!(session.optimize(), Ok(MicroLpStatus::Infeasible));
    }

    #[test]
    fn quadratic_problems_are_rejected() {
        let mut p = easy_problem();
        p.set_kind(ProblemKind::Qp);
        assert!(MicroLp.bind(&p).is_err());
    }
}
