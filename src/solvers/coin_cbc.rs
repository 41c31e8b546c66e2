//! A solver that uses a [Cbc](https://www.coin-or.org/Cbc/) [native library binding](https://docs.rs/coin_cbc).
//! This solver is activated using the `coin_cbc` feature.
use std::collections::HashMap;

use coin_cbc::{raw::Status, Col, Model, Sense};

use crate::error::SolverError;
use crate::problem::Problem;
use crate::solvers::staged::{RunOutcome, StagedModel};
use crate::solvers::{ObjectiveDirection, SolutionStatus, Solver, WithTimeLimit};

/// The Cbc [COIN-OR](https://www.coin-or.org/) solver library.
///
/// Parameters set here are passed to every session opened from this value.
#[derive(Debug, Clone, Default)]
pub struct CoinCbc {
    parameters: HashMap<String, String>,
}

impl CoinCbc {
    /// Set an option in cbc. For the list of available options, start the cbc binary and type '?'
    /// ```
    /// use polylp::CoinCbc;
    /// let cbc = CoinCbc::default().set_parameter("log", "1"); // Pass parameters directly to cbc
    /// assert_eq!(cbc.parameter("log"), Some("1"));
    /// ```
    pub fn set_parameter(mut self, key: &str, value: &str) -> Self {
        self.parameters.insert(key.to_string(), value.to_string());
        self
    }

    /// The value given to a parameter, if any
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Relative gap at which the branch and bound stops, on mixed-integer problems
    pub fn with_mip_gap(self, mip_gap: f64) -> Result<Self, SolverError> {
        if mip_gap.is_sign_negative() || !mip_gap.is_finite() {
            return Err(SolverError::Backend {
                backend: Self::name(),
                message: format!("invalid mip gap {}", mip_gap),
            });
        }
        Ok(self.set_parameter("ratiogap", &mip_gap.to_string()))
    }
}

impl WithTimeLimit for CoinCbc {
    fn with_time_limit<T: Into<f64>>(self, seconds: T) -> Self {
        let seconds = seconds.into().ceil() as usize;
        self.set_parameter("sec", &seconds.to_string())
    }
}

impl Solver for CoinCbc {
    type Session = CoinCbcSession;

    fn bind(&self, problem: &Problem) -> Result<Self::Session, SolverError> {
        if problem.kind().is_quadratic() {
            return Err(SolverError::UnsupportedKind(problem.kind()));
        }
        Ok(CoinCbcSession {
            staged: StagedModel::from_problem(problem),
            parameters: self.parameters.clone(),
            last: None,
        })
    }

    fn name() -> &'static str {
        "Coin Cbc"
    }
}

/// How a cbc run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CbcStatus {
    /// The search finished with a solution
    Optimal,
    /// The problem was proven infeasible
    Infeasible,
    /// The continuous relaxation is unbounded
    Unbounded,
    /// The time limit was reached. The values are the best found so far.
    TimeLimit,
    /// The search stopped for another reason
    Stopped,
    /// The search was abandoned, usually because of numerical difficulties
    Abandoned,
    /// An event handler stopped the search
    UserEvent,
}

/// A problem loaded for cbc
#[derive(Debug, Clone)]
pub struct CoinCbcSession {
    staged: StagedModel,
    parameters: HashMap<String, String>,
    last: Option<RunOutcome<CbcStatus>>,
}

staged_session!(CoinCbcSession, CbcStatus);

impl CoinCbcSession {
    /// Build the cbc model corresponding to the current state of the session
    pub fn to_inner(&self) -> Model {
        let staged = &self.staged;
        let mut model = Model::default();
        let columns: Vec<Col> = (0..staged.num_cols())
            .map(|col| {
                let (min, max) = staged.column_bounds(col);
                let c = model.add_col();
                // Variables are created with a default min of 0
                model.set_col_lower(c, min);
                if max < f64::INFINITY {
                    model.set_col_upper(c, max)
                }
                if staged.kinds[col].is_integer() {
                    model.set_integer(c);
                }
                model.set_obj_coeff(c, staged.objective[col]);
                c
            })
            .collect();
        for staged_row in &staged.rows {
            let (lower, upper) = staged_row.interval();
            let row = model.add_row();
            if lower == upper {
                model.set_row_equal(row, lower);
            } else {
                if lower > f64::NEG_INFINITY {
                    model.set_row_lower(row, lower);
                }
                if upper < f64::INFINITY {
                    model.set_row_upper(row, upper);
                }
            }
            for &(col, coeff) in &staged_row.terms {
                model.set_weight(row, columns[col], coeff);
            }
        }
        model.set_obj_sense(match staged.direction {
            ObjectiveDirection::Maximisation => Sense::Maximize,
            ObjectiveDirection::Minimisation => Sense::Minimize,
        });
        for (key, value) in &self.parameters {
            model.set_parameter(key, value);
        }
        model
    }

    fn run(&mut self) -> Result<RunOutcome<CbcStatus>, SolverError> {
        let solution = self.to_inner().solve();
        let raw = solution.raw();
        let code = match raw.status() {
            Status::Stopped if raw.is_seconds_limit_reached() => CbcStatus::TimeLimit,
            Status::Stopped => CbcStatus::Stopped,
            Status::Abandoned => CbcStatus::Abandoned,
            Status::UserEvent => CbcStatus::UserEvent,
            Status::Finished // The optimization finished, but may not have found a solution
            | Status::Unlaunched // The solver didn't have to be launched, presolve handled it
            => {
                if raw.is_continuous_unbounded() {
                    CbcStatus::Unbounded
                } else if raw.is_proven_infeasible() {
                    CbcStatus::Infeasible
                } else {
                    CbcStatus::Optimal
                }
            }
        };
        if !matches!(code, CbcStatus::Optimal | CbcStatus::TimeLimit) {
            return Ok(RunOutcome::without_values(code));
        }
        let values = raw.col_solution().to_vec();
        Ok(RunOutcome {
            code,
            objective: Some(self.staged.eval_objective(&values)),
            values: Some(values),
        })
    }

    fn classify_code(code: CbcStatus) -> SolutionStatus {
        match code {
            CbcStatus::Optimal => SolutionStatus::Optimal,
            CbcStatus::Infeasible => SolutionStatus::Infeasible,
            CbcStatus::Unbounded => SolutionStatus::Unbounded,
            _ => SolutionStatus::Other,
        }
    }

    /// Cbc can hit its time limit before it has an incumbent, in which case the
    /// column values it returns are not a feasible point.
    fn feasible_code(code: CbcStatus) -> bool {
        code == CbcStatus::Optimal
    }
}
