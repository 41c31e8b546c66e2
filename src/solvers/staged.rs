//! The backend-side copy of a bound problem.
//!
//! None of the engines we bind to can rewrite a single coefficient or delete an arbitrary row
//! of an already-built model, so each session stages the problem in this form, applies
//! incremental changes here, and materialises a fresh engine model when it is solved.
use std::ops::Range;

use crate::constraint::{Constraint, Sense};
use crate::problem::Problem;
use crate::solvers::ObjectiveDirection;
use crate::sparse::{merge_terms, set_in_row, SparseRow};
use crate::variable::VariableKind;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StagedRow {
    pub(crate) terms: SparseRow,
    pub(crate) sense: Sense,
    pub(crate) rhs: f64,
    pub(crate) range: f64,
}

impl StagedRow {
    pub(crate) fn interval(&self) -> (f64, f64) {
        self.sense.interval(self.rhs, self.range)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StagedModel {
    pub(crate) direction: ObjectiveDirection,
    pub(crate) objective: Vec<f64>,
    pub(crate) lower: Vec<f64>,
    pub(crate) upper: Vec<f64>,
    pub(crate) kinds: Vec<VariableKind>,
    pub(crate) rows: Vec<StagedRow>,
    closed: bool,
}

impl StagedModel {
    pub(crate) fn from_problem(problem: &Problem) -> Self {
        let ranges = problem.range_values();
        let rows = problem
            .matrix()
            .rows()
            .enumerate()
            .map(|(i, terms)| StagedRow {
                terms: terms.to_vec(),
                sense: problem.senses()[i],
                rhs: problem.rhs()[i],
                range: ranges.map_or(0., |r| r[i]),
            })
            .collect();
        StagedModel {
            direction: problem.direction(),
            objective: problem.objective().to_vec(),
            lower: problem.lower_bounds().to_vec(),
            upper: problem.upper_bounds().to_vec(),
            kinds: problem.variable_kinds().to_vec(),
            rows,
            closed: false,
        }
    }

    pub(crate) fn num_cols(&self) -> usize {
        self.objective.len()
    }

    pub(crate) fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Binary columns are integer columns clamped to `[0, 1]`
    pub(crate) fn column_bounds(&self, column: usize) -> (f64, f64) {
        let (lower, upper) = (self.lower[column], self.upper[column]);
        match self.kinds[column] {
            VariableKind::Binary => (lower.max(0.), upper.min(1.)),
            _ => (lower, upper),
        }
    }

    pub(crate) fn eval_objective(&self, values: &[f64]) -> f64 {
        self.objective.iter().zip(values).map(|(c, v)| c * v).sum()
    }

    pub(crate) fn change_objective(&mut self, objective: &[f64]) {
        self.objective = objective.to_vec();
    }

    pub(crate) fn change_variable_kinds(&mut self, kinds: &[VariableKind]) {
        self.kinds = kinds.to_vec();
    }

    pub(crate) fn add_row(&mut self, constraint: &Constraint) {
        self.rows.push(StagedRow {
            terms: merge_terms(constraint.terms()),
            sense: constraint.sense(),
            rhs: constraint.rhs(),
            range: constraint.range().unwrap_or(0.),
        });
    }

    pub(crate) fn delete_rows(&mut self, rows: Range<usize>) {
        self.rows.drain(rows);
    }

    pub(crate) fn set_column_bounds(&mut self, column: usize, lower: f64, upper: f64) {
        self.lower[column] = lower;
        self.upper[column] = upper;
    }

    pub(crate) fn change_coefficients(&mut self, changes: &[(usize, usize, f64)]) {
        for &(row, col, value) in changes {
            set_in_row(&mut self.rows[row].terms, col, value);
        }
    }

    pub(crate) fn change_rhs(&mut self, changes: &[(usize, f64)]) {
        for &(row, value) in changes {
            self.rows[row].rhs = value;
        }
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }
}

/// What a backend run produced
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RunOutcome<C> {
    pub(crate) code: C,
    pub(crate) values: Option<Vec<f64>>,
    pub(crate) objective: Option<f64>,
}

impl<C> RunOutcome<C> {
    pub(crate) fn without_values(code: C) -> Self {
        RunOutcome {
            code,
            values: None,
            objective: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StagedModel;
    use crate::constraint::{Constraint, Sense};
    use crate::problem::{MatrixData, Problem};

    #[test]
    fn rows_follow_incremental_changes() {
        let mut p = Problem::new(0, 2).unwrap();
        p.set_matrix(MatrixData::Dense(vec![vec![1., 0.], vec![0., 1.]]))
            .unwrap();
        p.set_rhs(vec![0., 0.]);
        p.set_senses(vec![Sense::Equal, Sense::Equal]);
        let mut staged = StagedModel::from_problem(&p);
        staged.change_coefficients(&[(0, 1, -0.5), (1, 1, 0.)]);
        staged.change_rhs(&[(1, 3.)]);
        assert_eq!(staged.rows[0].terms, vec![(0, 1.), (1, -0.5)]);
        assert!(staged.rows[1].terms.is_empty());
        assert_eq!(staged.rows[1].interval(), (3., 3.));

        staged.add_row(&Constraint::bound(0, Sense::LessEq, 2.));
        staged.delete_rows(0..1);
        assert_eq!(staged.num_rows(), 2);
        assert_eq!(staged.rows[1].interval(), (f64::NEG_INFINITY, 2.));
    }
}
