//! Keeps a [Problem] and the [SolverSession] it was bound to in step.
//!
//! Rows are addressed by position on both sides, so every row added or removed through the
//! adapter is applied to the session and, unless asked otherwise, to the problem as well.
use std::io;

use crate::constraint::{Constraint, Sense};
use crate::error::{ProblemError, SolverError};
use crate::problem::{Problem, ProblemKind};
use crate::solvers::{Solution, Solver, SolverSession};
use crate::variable::VariableKind;

/// Where a new row goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelUpdate {
    /// Append the row to both the session and the problem
    #[default]
    Mirror,
    /// Append the row to the session only.
    /// The problem does not see it, and exporting the problem will not show it.
    SessionOnly,
}

/// A problem bound to a solver session.
///
/// ```
/// use polylp::{MatrixData, Problem, Sense, SolverAdapter, ModelUpdate};
/// use polylp::solvers::{DefaultSolver, SolutionStatus};
///
/// // maximise x + y with x + 2y <= 4 and 0 <= x, y <= 3
/// let mut problem = Problem::new(0, 2).unwrap();
/// problem.set_objective(vec![1., 1.]);
/// problem.set_lower_bounds(vec![0., 0.]);
/// problem.set_upper_bounds(vec![3., 3.]);
/// problem.set_matrix(MatrixData::Dense(vec![vec![1., 2.]])).unwrap();
/// problem.set_rhs(vec![4.]);
/// problem.set_senses(vec![Sense::LessEq]);
///
/// let mut adapter = SolverAdapter::bind(&DefaultSolver::default(), problem).unwrap();
/// let solution = adapter.solve().unwrap();
/// assert_eq!(solution.status(), SolutionStatus::Optimal);
/// assert!((solution.objective_value() - 3.5).abs() < 1e-9);
///
/// adapter.add_bound_constraint(0, Sense::LessEq, 1., ModelUpdate::Mirror).unwrap();
/// assert_eq!(adapter.problem().num_rows(), 2);
/// assert!((adapter.solve().unwrap().objective_value() - 2.5).abs() < 1e-9);
/// ```
#[derive(Debug)]
pub struct SolverAdapter<S: SolverSession> {
    name: String,
    problem: Problem,
    session: S,
    /// For each session row, whether the problem holds a copy of it
    mirrored: Vec<bool>,
}

impl<S: SolverSession> SolverAdapter<S> {
    /// Validate the problem and load it into a new session of the given solver
    pub fn bind<B>(solver: &B, problem: Problem) -> Result<Self, SolverError>
    where
        B: Solver<Session = S>,
    {
        problem.validate()?;
        let session = solver.bind(&problem)?;
        log::debug!(
            "bound a {} problem with {} rows and {} columns to {}",
            problem.kind(),
            problem.num_rows(),
            problem.num_cols(),
            B::name()
        );
        Ok(SolverAdapter {
            name: B::name().to_string(),
            mirrored: vec![true; problem.num_rows()],
            problem,
            session,
        })
    }

    /// Rename the adapter. The name shows up in logs and in exported problems.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The name of the adapter
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound problem, including every mirrored change
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// The underlying session
    pub fn as_inner(&self) -> &S {
        &self.session
    }

    /// Number of rows loaded in the session, including session-only rows
    pub fn num_rows(&self) -> usize {
        self.mirrored.len()
    }

    /// Number of columns
    pub fn num_cols(&self) -> usize {
        self.problem.num_cols()
    }

    /// Solve with the stored objective
    pub fn solve(&mut self) -> Result<Solution, SolverError> {
        let code = self.session.optimize()?;
        Ok(collect_solution(&self.session, code))
    }

    /// Solve once with another objective. The stored objective is restored afterwards,
    /// including when the solve fails.
    pub fn solve_with_objective(&mut self, objective: &[f64]) -> Result<Solution, SolverError> {
        self.check_columns_len("objective", objective.len())?;
        let previous = self.session.objective().to_vec();
        let mut guard = Restore {
            session: &mut self.session,
            undo: move |session: &mut S| session.change_objective(&previous),
        };
        guard.session.change_objective(objective);
        let code = guard.session.optimize()?;
        Ok(collect_solution(&*guard.session, code))
    }

    /// Solve, with `objective` instead of the stored objective when given
    pub fn solve_maybe_with(&mut self, objective: Option<&[f64]>) -> Result<Solution, SolverError> {
        match objective {
            Some(objective) => self.solve_with_objective(objective),
            None => self.solve(),
        }
    }

    /// Replace the objective coefficients, in the session and in the problem
    pub fn change_objective(&mut self, objective: Vec<f64>) -> Result<(), SolverError> {
        self.check_columns_len("objective", objective.len())?;
        self.session.change_objective(&objective);
        self.problem.set_objective(objective);
        Ok(())
    }

    /// Replace the column kinds.
    /// A linear problem that gains integer columns becomes a mixed-integer one.
    pub fn change_variable_kinds(&mut self, kinds: Vec<VariableKind>) -> Result<(), SolverError> {
        self.check_columns_len("variable kinds", kinds.len())?;
        if kinds.iter().any(|k| k.is_integer()) {
            match self.problem.kind() {
                ProblemKind::Lp => self.problem.set_kind(ProblemKind::Milp),
                ProblemKind::Qp => self.problem.set_kind(ProblemKind::Miqp),
                ProblemKind::Milp | ProblemKind::Miqp => {}
            }
        }
        self.session.change_variable_kinds(&kinds);
        self.problem.set_variable_kinds(kinds);
        Ok(())
    }

    /// Append a row to the session, and to the problem unless `update` is [ModelUpdate::SessionOnly]
    pub fn add_constraint(
        &mut self,
        constraint: &Constraint,
        update: ModelUpdate,
    ) -> Result<(), SolverError> {
        constraint.check_columns(self.num_cols())?;
        if update == ModelUpdate::Mirror {
            self.problem.add_constraint(constraint)?;
        }
        self.session.add_row(constraint);
        self.mirrored.push(update == ModelUpdate::Mirror);
        log::debug!(
            "{}: added row {} ({:?})",
            self.name,
            self.mirrored.len() - 1,
            update
        );
        Ok(())
    }

    /// Append several rows. Nothing is added if one of them is invalid.
    pub fn add_constraints<'a, I>(&mut self, constraints: I, update: ModelUpdate) -> Result<(), SolverError>
    where
        I: IntoIterator<Item = &'a Constraint>,
    {
        let constraints: Vec<&Constraint> = constraints.into_iter().collect();
        for constraint in &constraints {
            constraint.check_columns(self.num_cols())?;
        }
        for constraint in constraints {
            self.add_constraint(constraint, update)?;
        }
        Ok(())
    }

    /// Append `x[first] <sense> x[second]`.
    /// Returns `false`, and adds nothing, when `first == second`.
    pub fn add_comparison_constraint(
        &mut self,
        first: usize,
        sense: Sense,
        second: usize,
        update: ModelUpdate,
    ) -> Result<bool, SolverError> {
        match Constraint::comparison(first, sense, second) {
            Some(constraint) => self.add_constraint(&constraint, update).map(|()| true),
            None => Ok(false),
        }
    }

    /// Append `x[index] <sense> value`
    pub fn add_bound_constraint(
        &mut self,
        index: usize,
        sense: Sense,
        value: f64,
        update: ModelUpdate,
    ) -> Result<(), SolverError> {
        self.add_constraint(&Constraint::bound(index, sense, value), update)
    }

    /// Remove the last row from the session, and from the problem if it was mirrored
    pub fn remove_last_constraint(&mut self) -> Result<(), SolverError> {
        self.remove_last_constraints(1)
    }

    /// Remove the last `n` rows from the session, and the mirrored ones among them from the problem
    pub fn remove_last_constraints(&mut self, n: usize) -> Result<(), SolverError> {
        let total = self.mirrored.len();
        if n > total {
            return Err(ProblemError::RowUnderflow {
                requested: n,
                available: total,
            }
            .into());
        }
        let start = total - n;
        let model_rows = self.mirrored[start..].iter().filter(|&&m| m).count();
        self.problem.remove_last_constraints(model_rows)?;
        self.session.delete_rows(start..total);
        self.mirrored.truncate(start);
        log::debug!("{}: removed the last {} rows", self.name, n);
        Ok(())
    }

    /// Add a row to the session only, solve, then remove the row.
    /// The row is removed even if the solve fails.
    pub fn test_constraint(
        &mut self,
        constraint: &Constraint,
        objective: Option<&[f64]>,
    ) -> Result<Solution, SolverError> {
        self.add_constraint(constraint, ModelUpdate::SessionOnly)?;
        let solution = self.solve_maybe_with(objective);
        self.remove_last_constraint()?;
        solution
    }

    /// [test_constraint](SolverAdapter::test_constraint) with `x[index] <sense> value`
    pub fn test_bound_constraint(
        &mut self,
        index: usize,
        sense: Sense,
        value: f64,
        objective: Option<&[f64]>,
    ) -> Result<Solution, SolverError> {
        self.test_constraint(&Constraint::bound(index, sense, value), objective)
    }

    /// [test_constraint](SolverAdapter::test_constraint) with `x[first] <sense> x[second]`.
    /// When `first == second` the problem is solved as is.
    pub fn test_comparison_constraint(
        &mut self,
        first: usize,
        sense: Sense,
        second: usize,
        objective: Option<&[f64]>,
    ) -> Result<Solution, SolverError> {
        match Constraint::comparison(first, sense, second) {
            Some(constraint) => self.test_constraint(&constraint, objective),
            None => self.solve_maybe_with(objective),
        }
    }

    /// Whether `x` satisfies every row and column bound of the session.
    ///
    /// Every column is fixed to its value in `x` for the duration of one solve.
    /// The bounds of the problem are written back before returning, whatever the outcome.
    pub fn is_feasible(&mut self, x: &[f64]) -> Result<bool, SolverError> {
        self.check_columns_len("point", x.len())?;
        let lower = self.problem.lower_bounds().to_vec();
        let upper = self.problem.upper_bounds().to_vec();
        // fixing the columns replaces their bounds, so these are checked here
        if let Some(column) = (0..x.len()).find(|&i| !(lower[i] <= x[i] && x[i] <= upper[i])) {
            log::trace!("{}: column {} is out of its bounds", self.name, column);
            return Ok(false);
        }
        let mut guard = Restore {
            session: &mut self.session,
            undo: move |session: &mut S| {
                for (column, (&l, &u)) in lower.iter().zip(&upper).enumerate() {
                    session.set_column_bounds(column, l, u);
                }
            },
        };
        for (column, &value) in x.iter().enumerate() {
            guard.session.set_column_bounds(column, value, value);
        }
        let code = guard.session.optimize()?;
        log::trace!("{}: fixed point solved with status {:?}", self.name, code);
        Ok(S::reports_feasible(code))
    }

    /// Overwrite matrix coefficients, given as `(row, column, value)` with session row numbers.
    /// Rows that are mirrored are changed in the problem too.
    /// Nothing is changed if one of the positions is invalid.
    pub fn change_coefficients(&mut self, changes: &[(usize, usize, f64)]) -> Result<(), SolverError> {
        let num_cols = self.num_cols();
        for &(row, col, _) in changes {
            if row >= self.mirrored.len() || col >= num_cols {
                return Err(ProblemError::EntryOutOfRange {
                    row,
                    col,
                    rows: self.mirrored.len(),
                    cols: num_cols,
                }
                .into());
            }
        }
        for &(row, col, value) in changes {
            if let Some(model_row) = self.model_row(row) {
                self.problem.set_coefficient(model_row, col, value)?;
            }
        }
        self.session.change_coefficients(changes);
        Ok(())
    }

    /// Overwrite right-hand sides, given as `(row, value)` with session row numbers.
    /// Nothing is changed if one of the rows does not exist.
    pub fn change_rhs(&mut self, changes: &[(usize, f64)]) -> Result<(), SolverError> {
        if let Some(&(row, _)) = changes.iter().find(|&&(row, _)| row >= self.mirrored.len()) {
            return Err(ProblemError::EntryOutOfRange {
                row,
                col: 0,
                rows: self.mirrored.len(),
                cols: 1,
            }
            .into());
        }
        for &(row, value) in changes {
            if let Some(model_row) = self.model_row(row) {
                self.problem.set_row_rhs(model_row, value)?;
            }
        }
        self.session.change_rhs(changes);
        Ok(())
    }

    /// Write the problem in the LP file format, preceded by the name of the adapter
    pub fn write_lp<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(writer, "\\ {}", self.name)?;
        self.problem.write_lp(writer)
    }

    /// Release the session. Calling it again does nothing.
    pub fn close(&mut self) {
        if !self.session.is_closed() {
            self.session.close();
            log::debug!("{}: session closed", self.name);
        }
    }

    /// Whether [close](SolverAdapter::close) was called
    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    fn model_row(&self, row: usize) -> Option<usize> {
        if !self.mirrored[row] {
            return None;
        }
        if self.problem.num_rows() == self.mirrored.len() {
            return Some(row);
        }
        Some(self.mirrored[..row].iter().filter(|&&m| m).count())
    }

    fn check_columns_len(&self, what: &'static str, found: usize) -> Result<(), ProblemError> {
        if found != self.num_cols() {
            return Err(ProblemError::ShapeMismatch {
                what,
                expected: self.num_cols(),
                found,
            });
        }
        Ok(())
    }
}

/// Runs `undo` on the session when dropped, so that temporary changes are reverted
/// on every exit path
struct Restore<'a, S: SolverSession, F: FnMut(&mut S)> {
    session: &'a mut S,
    undo: F,
}

impl<S: SolverSession, F: FnMut(&mut S)> Drop for Restore<'_, S, F> {
    fn drop(&mut self) {
        (self.undo)(&mut *self.session)
    }
}

fn collect_solution<S: SolverSession>(session: &S, code: S::StatusCode) -> Solution {
    let values = session
        .solution_vector()
        .map(<[f64]>::to_vec)
        .unwrap_or_else(|| vec![f64::NAN; session.num_cols()]);
    let objective_value = session.objective_value().unwrap_or(f64::NAN);
    let feasible = S::reports_feasible(code) && session.solution_vector().is_some();
    Solution::new(values, objective_value, S::classify(code), feasible)
}

#[cfg(test)]
#[cfg(feature = "microlp")]
mod tests {
    use float_eq::assert_float_eq;

    use super::{ModelUpdate, SolverAdapter};
    use crate::constraint::{Constraint, Sense};
    use crate::error::{ProblemError, SolverError};
    use crate::problem::{MatrixData, Problem, ProblemKind};
    use crate::solvers::microlp::{MicroLp, MicroLpSession};
    use crate::solvers::{SolutionStatus, SolverSession};
    use crate::variable::VariableKind;

    /// maximise x + y, x + 2y <= 4, 0 <= x, y <= 3
    fn adapter() -> SolverAdapter<MicroLpSession> {
        let mut p = Problem::new(0, 2).unwrap();
        p.set_objective(vec![1., 1.]);
        p.set_lower_bounds(vec![0., 0.]);
        p.set_upper_bounds(vec![3., 3.]);
        p.set_matrix(MatrixData::Dense(vec![vec![1., 2.]])).unwrap();
        p.set_rhs(vec![4.]);
        p.set_senses(vec![Sense::LessEq]);
        SolverAdapter::bind(&MicroLp, p).unwrap()
    }

    #[test]
    fn objective_override_is_temporary() {
        let mut a = adapter();
        let s = a.solve_with_objective(&[-1., -1.]).unwrap();
        assert_float_eq!(s.objective_value(), 0., abs <= 1e-9);
        assert_eq!(a.as_inner().objective(), &[1., 1.]);
        assert_float_eq!(a.solve().unwrap().objective_value(), 3.5, abs <= 1e-9);
    }

    #[test]
    fn objective_override_is_restored_on_error() {
        let mut a = adapter();
        a.close();
        assert_eq!(
            a.solve_with_objective(&[-1., 0.]),
            Err(SolverError::Closed)
        );
        assert_eq!(a.as_inner().objective(), &[1., 1.]);
    }

    #[test]
    fn session_only_rows_are_tracked() {
        let mut a = adapter();
        a.add_bound_constraint(0, Sense::LessEq, 1., ModelUpdate::SessionOnly)
            .unwrap();
        a.add_bound_constraint(1, Sense::LessEq, 1., ModelUpdate::Mirror)
            .unwrap();
        assert_eq!(a.num_rows(), 3);
        assert_eq!(a.problem().num_rows(), 2);
        assert_float_eq!(a.solve().unwrap().objective_value(), 2., abs <= 1e-9);

        // row 2 of the session is row 1 of the problem
        a.change_rhs(&[(2, 0.5)]).unwrap();
        assert_eq!(a.problem().rhs(), &[4., 0.5]);
        assert_float_eq!(a.solve().unwrap().objective_value(), 1.5, abs <= 1e-9);

        a.remove_last_constraints(2).unwrap();
        assert_eq!(a.num_rows(), 1);
        assert_eq!(a.problem().num_rows(), 1);
        assert_float_eq!(a.solve().unwrap().objective_value(), 3.5, abs <= 1e-9);
    }

    #[test]
    fn removing_too_many_rows_fails() {
        let mut a = adapter();
        assert_eq!(
            a.remove_last_constraints(2),
            Err(SolverError::Problem(ProblemError::RowUnderflow {
                requested: 2,
                available: 1
            }))
        );
        assert_eq!(a.num_rows(), 1);
    }

    #[test]
    fn invalid_rows_are_not_added() {
        let mut a = adapter();
        let bad = Constraint::bound(2, Sense::LessEq, 1.);
        let good = Constraint::bound(0, Sense::LessEq, 1.);
        assert!(a.add_constraints([&good, &bad], ModelUpdate::Mirror).is_err());
        assert_eq!(a.num_rows(), 1);
        assert_eq!(a.as_inner().num_rows(), 1);
    }

    #[test]
    fn probes_leave_no_rows_behind() {
        let mut a = adapter();
        let s = a.test_bound_constraint(1, Sense::Equal, 0., None).unwrap();
        assert_float_eq!(s.objective_value(), 3., abs <= 1e-9);
        let s = a
            .test_comparison_constraint(0, Sense::LessEq, 1, Some(&[1., 0.]))
            .unwrap();
        assert_float_eq!(s.value(0), 4. / 3., abs <= 1e-9);
        assert_eq!(a.num_rows(), 1);
        assert_eq!(a.as_inner().objective(), &[1., 1.]);
    }

    #[test]
    fn feasibility_of_points() {
        let mut a = adapter();
        assert!(a.is_feasible(&[1., 1.]).unwrap());
        assert!(!a.is_feasible(&[3., 3.]).unwrap());
        assert_eq!(a.as_inner().num_cols(), 2);
        assert_float_eq!(a.solve().unwrap().objective_value(), 3.5, abs <= 1e-9);
        assert!(a.is_feasible(&[1.]).is_err());
    }

    #[test]
    fn non_optimal_solutions_carry_nan() {
        let mut a = adapter();
        a.add_bound_constraint(0, Sense::GreaterEq, 5., ModelUpdate::Mirror)
            .unwrap();
        let s = a.solve().unwrap();
        assert_eq!(s.status(), SolutionStatus::Infeasible);
        assert!(!s.is_feasible());
        assert!(s.values().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn integer_kinds_promote_the_problem() {
        let mut a = adapter();
        a.change_variable_kinds(vec![VariableKind::Integer, VariableKind::Continuous])
            .unwrap();
        assert_eq!(a.problem().kind(), ProblemKind::Milp);
        assert!(a.problem().validate().is_ok());
        let s = a.solve().unwrap();
        assert_float_eq!(s.objective_value(), 3.5, abs <= 1e-9);
    }

    #[test]
    fn close_is_idempotent() {
        let mut a = adapter();
        a.close();
        a.close();
        assert!(a.is_closed());
        assert_eq!(a.solve(), Err(SolverError::Closed));
    }
}
