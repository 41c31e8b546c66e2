//! A solver that uses [highs](https://docs.rs/highs), a parallel C++ solver.

use std::collections::HashMap;

use highs::HighsModelStatus;

use crate::error::SolverError;
use crate::problem::Problem;
use crate::solvers::staged::{RunOutcome, StagedModel};
use crate::solvers::{ObjectiveDirection, SolutionStatus, Solver, WithTimeLimit};

/// Whether HiGHS runs its presolve phase before each solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighsPresolveType {
    /// Never presolve
    Off,
    /// Let HiGHS decide
    #[default]
    Choose,
    /// Always presolve
    On,
}

/// The algorithm HiGHS uses on continuous problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighsSolverType {
    /// Dual simplex, which keeps a warm basis between sampler steps
    Simplex,
    /// Let HiGHS decide
    #[default]
    Choose,
    /// Interior point
    Ipm,
}

impl From<HighsPresolveType> for HighsOptionValue {
    fn from(presolve: HighsPresolveType) -> Self {
        let name = match presolve {
            HighsPresolveType::Off => "off",
            HighsPresolveType::Choose => "choose",
            HighsPresolveType::On => "on",
        };
        Self::String(name.to_string())
    }
}

impl From<HighsSolverType> for HighsOptionValue {
    fn from(solver: HighsSolverType) -> Self {
        let name = match solver {
            HighsSolverType::Simplex => "simplex",
            HighsSolverType::Choose => "choose",
            HighsSolverType::Ipm => "ipm",
        };
        Self::String(name.to_string())
    }
}

/// The value of one entry of the HiGHS option table.
#[derive(Debug, Clone, PartialEq)]
pub enum HighsOptionValue {
    /// A named choice, such as `"simplex"`
    String(String),
    /// An on/off switch
    Bool(bool),
    /// A count or a level
    Int(i32),
    /// A tolerance or a limit
    Float(f64),
}

macro_rules! option_value_from {
    ($($t:ty => $variant:ident),*) => {
        $(impl From<$t> for HighsOptionValue {
            fn from(v: $t) -> Self {
                Self::$variant(v.into())
            }
        })*
    };
}

option_value_from!(bool => Bool, i32 => Int, f64 => Float, String => String, &str => String);

/// The [highs](https://docs.rs/highs) solver.
///
/// The options set here apply to every session opened from this value.
#[derive(Debug, Clone, Default)]
pub struct Highs {
    verbose: bool,
    options: HashMap<String, HighsOptionValue>,
}

impl Highs {
    /// Sets whether or not HiGHS should display verbose logging information to the console
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose
    }

    /// Sets the HiGHS option. See https://ergo-code.github.io/HiGHS/dev/options/definitions/
    pub fn set_option<K: Into<String>, V: Into<HighsOptionValue>>(mut self, key: K, value: V) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// The value given to an option, if any
    pub fn option(&self, key: &str) -> Option<&HighsOptionValue> {
        self.options.get(key)
    }

    /// Choose when HiGHS presolves
    pub fn set_presolve(self, presolve: HighsPresolveType) -> Highs {
        self.set_option("presolve", presolve)
    }

    /// Choose the continuous algorithm
    pub fn set_solver(self, solver: HighsSolverType) -> Highs {
        self.set_option("solver", solver)
    }

    /// Sets HiGHS Tolerance on Relative Gap Option, used on mixed-integer problems
    pub fn set_mip_rel_gap(self, mip_rel_gap: f64) -> Result<Highs, SolverError> {
        if mip_rel_gap.is_sign_negative() || !mip_rel_gap.is_finite() {
            Err(SolverError::Backend {
                backend: Self::name(),
                message: format!("invalid relative mip gap {}", mip_rel_gap),
            })
        } else {
            Ok(self.set_option("mip_rel_gap", mip_rel_gap))
        }
    }

    /// Sets number of threads used by HiGHS
    pub fn set_threads(self, threads: u32) -> Highs {
        self.set_option("threads", threads as i32)
    }
}

impl WithTimeLimit for Highs {
    fn with_time_limit<T: Into<f64>>(self, seconds: T) -> Self {
        self.set_option("time_limit", seconds.into())
    }
}

impl Solver for Highs {
    type Session = HighsSession;

    fn bind(&self, problem: &Problem) -> Result<Self::Session, SolverError> {
        if problem.kind().is_quadratic() {
            return Err(SolverError::UnsupportedKind(problem.kind()));
        }
        Ok(HighsSession {
            staged: StagedModel::from_problem(problem),
            verbose: self.verbose,
            options: self.options.clone(),
            last: None,
        })
    }

    fn name() -> &'static str {
        "Highs"
    }
}

/// A problem loaded for HiGHS
#[derive(Debug, Clone)]
pub struct HighsSession {
    staged: StagedModel,
    verbose: bool,
    options: HashMap<String, HighsOptionValue>,
    last: Option<RunOutcome<HighsModelStatus>>,
}

staged_session!(HighsSession, HighsModelStatus);

impl HighsSession {
    /// Get a highs model for the current state of the session
    pub fn to_inner(&self) -> highs::Model {
        let staged = &self.staged;
        let mut problem = highs::RowProblem::default();
        let columns: Vec<highs::Col> = (0..staged.num_cols())
            .map(|col| {
                let (min, max) = staged.column_bounds(col);
                let is_integer = staged.kinds[col].is_integer();
                problem.add_column_with_integrality(staged.objective[col], min..max, is_integer)
            })
            .collect();
        for row in &staged.rows {
            let (lower, upper) = row.interval();
            let factors = row.terms.iter().map(|&(col, factor)| (columns[col], factor));
            problem.add_row(lower..=upper, factors);
        }
        let mut model = problem.optimise(match staged.direction {
            ObjectiveDirection::Maximisation => highs::Sense::Maximise,
            ObjectiveDirection::Minimisation => highs::Sense::Minimise,
        });
        if self.verbose {
            model.set_option(&b"output_flag"[..], true);
            model.set_option(&b"log_to_console"[..], true);
            model.set_option(&b"log_dev_level"[..], 2);
        }
        for (k, v) in &self.options {
            match v {
                HighsOptionValue::String(v) => model.set_option(k.as_str(), v.as_str()),
                HighsOptionValue::Float(v) => model.set_option(k.as_str(), *v),
                HighsOptionValue::Bool(v) => model.set_option(k.as_str(), *v),
                HighsOptionValue::Int(v) => model.set_option(k.as_str(), *v),
            }
        }
        model
    }

    fn run(&mut self) -> Result<RunOutcome<HighsModelStatus>, SolverError> {
        let solved = self.to_inner().solve();
        let code = solved.status();
        if code != HighsModelStatus::Optimal {
            return Ok(RunOutcome::without_values(code));
        }
        let values = solved.get_solution().columns().to_vec();
        Ok(RunOutcome {
            code,
            objective: Some(self.staged.eval_objective(&values)),
            values: Some(values),
        })
    }

    fn classify_code(code: HighsModelStatus) -> SolutionStatus {
        match code {
            HighsModelStatus::Optimal => SolutionStatus::Optimal,
            HighsModelStatus::Infeasible => SolutionStatus::Infeasible,
            HighsModelStatus::Unbounded => SolutionStatus::Unbounded,
            // telling these apart needs another solve without presolve
            HighsModelStatus::UnboundedOrInfeasible => SolutionStatus::Other,
            _ => SolutionStatus::Other,
        }
    }

    fn feasible_code(code: HighsModelStatus) -> bool {
        code == HighsModelStatus::Optimal
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::{Highs, HighsOptionValue, HighsPresolveType, HighsSolverType};
    use crate::constraint::Sense;
    use crate::problem::{MatrixData, Problem};
    use crate::solvers::{Solver, SolverSession, WithTimeLimit};

    #[test]
    fn options_reach_the_session() {
        let highs = Highs::default().with_time_limit(10);
        assert!(highs.option("time_limit").is_some());
        assert!(highs.clone().set_mip_rel_gap(-1.).is_err());
        let highs = highs
            .set_presolve(HighsPresolveType::Off)
            .set_solver(HighsSolverType::Simplex);
        assert_eq!(
            highs.option("solver"),
            Some(&HighsOptionValue::String("simplex".into()))
        );
        assert_eq!(
            highs.option("presolve"),
            Some(&HighsOptionValue::String("off".into()))
        );
    }

    #[test]
    fn range_rows() {
        // maximise x with 1 <= x + y <= 3 and y >= 0.5
        let mut p = Problem::new(0, 2).unwrap();
        p.set_objective(vec![1., 0.]);
        p.set_lower_bounds(vec![0., 0.5]);
        p.set_matrix(MatrixData::Dense(vec![vec![1., 1.]])).unwrap();
        p.set_rhs(vec![1.]);
        p.set_senses(vec![Sense::Range]);
        p.set_range_values(Some(vec![2.]));
        let mut session = Highs::default().bind(&p).unwrap();
        session.optimize().unwrap();
        assert_float_eq!(session.objective_value().unwrap(), 2.5, abs <= 1e-6);
    }
}
