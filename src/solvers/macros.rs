/// Implements [SolverSession](crate::solvers::SolverSession) for a backend session built on a
/// [StagedModel](crate::solvers::staged::StagedModel).
///
/// The session type must have a `staged: StagedModel` field, a `last: Option<RunOutcome<$code>>`
/// field, and the inherent functions `run(&mut self)`, `classify_code($code)` and
/// `feasible_code($code)`. A generic session type takes a single bounded parameter:
/// `staged_session!(impl<T: Bound> Session<T>, Code)`.
macro_rules! staged_session {
    (@impl [$($generics:tt)*] $session:ty, $code:ty) => {
        impl<$($generics)*> $crate::solvers::SolverSession for $session {
            type StatusCode = $code;

            fn optimize(&mut self) -> Result<$code, $crate::error::SolverError> {
                if self.staged.is_closed() {
                    return Err($crate::error::SolverError::Closed);
                }
                let outcome = self.run()?;
                let code = outcome.code;
                log::trace!("{} finished with status {:?}", stringify!($session), code);
                self.last = Some(outcome);
                Ok(code)
            }

            fn classify(code: $code) -> $crate::solvers::SolutionStatus {
                Self::classify_code(code)
            }

            fn reports_feasible(code: $code) -> bool {
                Self::feasible_code(code)
            }

            fn status_code(&self) -> Option<$code> {
                self.last.as_ref().map(|outcome| outcome.code)
            }

            fn solution_vector(&self) -> Option<&[f64]> {
                self.last.as_ref().and_then(|outcome| outcome.values.as_deref())
            }

            fn objective_value(&self) -> Option<f64> {
                self.last.as_ref().and_then(|outcome| outcome.objective)
            }

            fn objective(&self) -> &[f64] {
                &self.staged.objective
            }

            fn change_objective(&mut self, objective: &[f64]) {
                self.last = None;
                self.staged.change_objective(objective);
            }

            fn change_variable_kinds(&mut self, kinds: &[$crate::variable::VariableKind]) {
                self.last = None;
                self.staged.change_variable_kinds(kinds);
            }

            fn add_row(&mut self, constraint: &$crate::constraint::Constraint) {
                self.last = None;
                self.staged.add_row(constraint);
            }

            fn delete_rows(&mut self, rows: std::ops::Range<usize>) {
                self.last = None;
                self.staged.delete_rows(rows);
            }

            fn set_column_bounds(&mut self, column: usize, lower: f64, upper: f64) {
                self.last = None;
                self.staged.set_column_bounds(column, lower, upper);
            }

            fn change_coefficients(&mut self, changes: &[(usize, usize, f64)]) {
                self.last = None;
                self.staged.change_coefficients(changes);
            }

            fn change_rhs(&mut self, changes: &[(usize, f64)]) {
                self.last = None;
                self.staged.change_rhs(changes);
            }

            fn num_rows(&self) -> usize {
                self.staged.num_rows()
            }

            fn num_cols(&self) -> usize {
                self.staged.num_cols()
            }

            fn close(&mut self) {
                self.last = None;
                self.staged.close();
            }

            fn is_closed(&self) -> bool {
                self.staged.is_closed()
            }
        }
    };
    (impl<$g:ident: $bound:path> $session:ty, $code:ty) => {
        staged_session!(@impl [$g: $bound] $session, $code);
    };
    ($session:ty, $code:ty) => {
        staged_session!(@impl [] $session, $code);
    };
}
