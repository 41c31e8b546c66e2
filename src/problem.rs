//! The solver-agnostic representation of a linear or mixed-integer program.
//!
//! A [Problem] is pure data: objective, column bounds and kinds, a sparse constraint matrix,
//! and the right-hand side and sense of every row. It never solves anything itself.
//! Bind it to a backend with [SolverAdapter::bind](crate::SolverAdapter::bind).
use std::fmt::{Display, Formatter};
use std::io;

use crate::constraint::{Constraint, Sense};
use crate::error::ProblemError;
use crate::solvers::ObjectiveDirection;
use crate::sparse::SparseMatrix;
use crate::variable::{VariableDefinition, VariableKind};

/// The class of a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProblemKind {
    /// Linear program: every column is continuous
    #[default]
    Lp,
    /// Quadratic program
    Qp,
    /// Mixed-integer linear program
    Milp,
    /// Mixed-integer quadratic program
    Miqp,
}

impl ProblemKind {
    /// Whether columns may be integer or binary
    pub fn allows_integers(self) -> bool {
        matches!(self, ProblemKind::Milp | ProblemKind::Miqp)
    }

    /// Whether the objective has a quadratic part
    pub fn is_quadratic(self) -> bool {
        matches!(self, ProblemKind::Qp | ProblemKind::Miqp)
    }
}

impl Display for ProblemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ProblemKind::Lp => "LP",
            ProblemKind::Qp => "QP",
            ProblemKind::Milp => "MILP",
            ProblemKind::Miqp => "MIQP",
        })
    }
}

/// Constraint matrix data given to [Problem::set_matrix]
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixData {
    /// One dense vector per row
    Dense(Vec<Vec<f64>>),
    /// `(row, column, value)` triples of a `num_rows` x `num_cols` matrix
    Coordinate {
        /// Number of rows
        num_rows: usize,
        /// Number of columns, must match the problem
        num_cols: usize,
        /// The non-zero entries
        entries: Vec<(usize, usize, f64)>,
    },
}

/// A mathematical programming problem.
///
/// ```
/// use polylp::{MatrixData, Problem, Sense};
///
/// // maximise x + y subject to x + 2y <= 4, with 0 <= x, y <= 3
/// let mut problem = Problem::new(0, 2)?;
/// problem.set_objective(vec![1., 1.]);
/// problem.set_lower_bounds(vec![0., 0.]);
/// problem.set_upper_bounds(vec![3., 3.]);
/// problem.set_matrix(MatrixData::Dense(vec![vec![1., 2.]]))?;
/// problem.set_rhs(vec![4.]);
/// problem.set_senses(vec![Sense::LessEq]);
/// problem.validate()?;
/// assert_eq!(problem.num_rows(), 1);
/// # Ok::<_, polylp::ProblemError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    num_cols: usize,
    kind: ProblemKind,
    direction: ObjectiveDirection,
    objective: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    kinds: Vec<VariableKind>,
    matrix: SparseMatrix,
    rhs: Vec<f64>,
    senses: Vec<Sense>,
    range_values: Option<Vec<f64>>,
}

impl Problem {
    /// Creates a problem with `num_rows` empty equality rows and `num_cols` columns.
    ///
    /// The objective is null and maximised, every column is continuous and unbounded.
    pub fn new(num_rows: usize, num_cols: usize) -> Result<Self, ProblemError> {
        if num_cols == 0 {
            return Err(ProblemError::EmptyProblem);
        }
        Ok(Problem {
            num_cols,
            kind: ProblemKind::Lp,
            direction: ObjectiveDirection::Maximisation,
            objective: vec![0.; num_cols],
            lower: vec![f64::NEG_INFINITY; num_cols],
            upper: vec![f64::INFINITY; num_cols],
            kinds: vec![VariableKind::Continuous; num_cols],
            matrix: SparseMatrix::new(num_rows, num_cols),
            rhs: vec![0.; num_rows],
            senses: vec![Sense::Equal; num_rows],
            range_values: None,
        })
    }

    /// Number of columns (variables)
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Number of rows (constraints)
    pub fn num_rows(&self) -> usize {
        self.matrix.num_rows()
    }

    /// The problem class
    pub fn kind(&self) -> ProblemKind {
        self.kind
    }

    /// Whether the objective is maximised or minimised
    pub fn direction(&self) -> ObjectiveDirection {
        self.direction
    }

    /// Whether the objective is maximised
    pub fn maximize(&self) -> bool {
        self.direction == ObjectiveDirection::Maximisation
    }

    /// Objective coefficients, one per column
    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    /// Lower bounds, one per column
    pub fn lower_bounds(&self) -> &[f64] {
        &self.lower
    }

    /// Upper bounds, one per column
    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper
    }

    /// Column kinds
    pub fn variable_kinds(&self) -> &[VariableKind] {
        &self.kinds
    }

    /// The constraint matrix
    pub fn matrix(&self) -> &SparseMatrix {
        &self.matrix
    }

    /// Right-hand sides, one per row
    pub fn rhs(&self) -> &[f64] {
        &self.rhs
    }

    /// Senses, one per row
    pub fn senses(&self) -> &[Sense] {
        &self.senses
    }

    /// Range values, one per row, used by [Sense::Range] rows
    pub fn range_values(&self) -> Option<&[f64]> {
        self.range_values.as_deref()
    }

    /// The interval row `row` must lie in
    pub fn row_interval(&self, row: usize) -> (f64, f64) {
        let range = self
            .range_values
            .as_ref()
            .and_then(|r| r.get(row).copied())
            .unwrap_or(0.);
        self.senses[row].interval(self.rhs[row], range)
    }

    /// Set the problem class
    pub fn set_kind(&mut self, kind: ProblemKind) {
        self.kind = kind;
    }

    /// Set the optimization direction
    pub fn set_direction(&mut self, direction: ObjectiveDirection) {
        self.direction = direction;
    }

    /// Maximise when `true`, minimise otherwise
    pub fn set_maximize(&mut self, maximize: bool) {
        self.set_direction(if maximize {
            ObjectiveDirection::Maximisation
        } else {
            ObjectiveDirection::Minimisation
        });
    }

    /// Replace the objective coefficients. The length is checked by [Problem::validate].
    pub fn set_objective(&mut self, objective: Vec<f64>) {
        self.objective = objective;
    }

    /// Replace all the lower bounds. `f64::NEG_INFINITY` means unbounded.
    pub fn set_lower_bounds(&mut self, lower: Vec<f64>) {
        self.lower = lower;
    }

    /// Replace all the upper bounds. `f64::INFINITY` means unbounded.
    pub fn set_upper_bounds(&mut self, upper: Vec<f64>) {
        self.upper = upper;
    }

    /// Set the bounds of a single column
    pub fn set_bounds(&mut self, column: usize, lower: f64, upper: f64) -> Result<(), ProblemError> {
        self.check_column(column)?;
        self.lower[column] = lower;
        self.upper[column] = upper;
        Ok(())
    }

    /// Replace the column kinds
    pub fn set_variable_kinds(&mut self, kinds: Vec<VariableKind>) {
        self.kinds = kinds;
    }

    /// Set bounds, kind and objective coefficient of a column at once
    ///
    /// ```
    /// # use polylp::{variable, Problem};
    /// let mut problem = Problem::new(0, 3)?;
    /// problem.define_column(1, variable().clamp(-1, 1).objective(4))?;
    /// assert_eq!(problem.lower_bounds()[1], -1.);
    /// assert_eq!(problem.objective(), &[0., 4., 0.]);
    /// # Ok::<_, polylp::ProblemError>(())
    /// ```
    pub fn define_column(
        &mut self,
        column: usize,
        definition: VariableDefinition,
    ) -> Result<(), ProblemError> {
        self.check_column(column)?;
        let VariableDefinition {
            min,
            max,
            kind,
            objective,
        } = definition;
        self.lower[column] = min;
        self.upper[column] = max;
        self.kinds[column] = kind;
        self.objective[column] = objective;
        Ok(())
    }

    /// Rebuild the constraint matrix. The number of rows becomes the number of rows of `data`.
    ///
    /// Fails if the column count of `data` differs from [Problem::num_cols].
    pub fn set_matrix(&mut self, data: MatrixData) -> Result<(), ProblemError> {
        self.matrix = match data {
            MatrixData::Dense(rows) => SparseMatrix::from_dense(self.num_cols, &rows)?,
            MatrixData::Coordinate {
                num_rows,
                num_cols,
                entries,
            } => {
                if num_cols != self.num_cols {
                    return Err(ProblemError::ShapeMismatch {
                        what: "matrix columns",
                        expected: self.num_cols,
                        found: num_cols,
                    });
                }
                SparseMatrix::from_triples(num_rows, num_cols, entries)?
            }
        };
        Ok(())
    }

    /// Replace the right-hand sides
    pub fn set_rhs(&mut self, rhs: Vec<f64>) {
        self.rhs = rhs;
    }

    /// Replace the row senses
    pub fn set_senses(&mut self, senses: Vec<Sense>) {
        self.senses = senses;
    }

    /// Replace the row range values
    pub fn set_range_values(&mut self, range_values: Option<Vec<f64>>) {
        self.range_values = range_values;
    }

    /// Change one coefficient of the constraint matrix
    pub fn set_coefficient(&mut self, row: usize, col: usize, value: f64) -> Result<(), ProblemError> {
        self.matrix.set(row, col, value)
    }

    /// Change the right-hand side of one row
    pub fn set_row_rhs(&mut self, row: usize, value: f64) -> Result<(), ProblemError> {
        let rows = self.num_rows();
        match self.rhs.get_mut(row) {
            Some(rhs) => {
                *rhs = value;
                Ok(())
            }
            None => Err(ProblemError::EntryOutOfRange {
                row,
                col: 0,
                rows,
                cols: 1,
            }),
        }
    }

    /// Append one row
    pub fn add_constraint(&mut self, constraint: &Constraint) -> Result<(), ProblemError> {
        constraint.check_columns(self.num_cols)?;
        self.matrix.push_sparse_row(constraint.terms())?;
        self.push_row_data(constraint.rhs(), constraint.sense(), constraint.range());
        log::trace!("added row {} {:?}", self.num_rows() - 1, constraint);
        Ok(())
    }

    /// Append several rows. Nothing is added if one of them is invalid.
    pub fn add_constraints<'a, I>(&mut self, constraints: I) -> Result<(), ProblemError>
    where
        I: IntoIterator<Item = &'a Constraint>,
    {
        let constraints: Vec<&Constraint> = constraints.into_iter().collect();
        for c in &constraints {
            c.check_columns(self.num_cols)?;
        }
        for c in constraints {
            self.add_constraint(c)?;
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
    ) -> Result<bool, ProblemError> {
        match Constraint::comparison(first, sense, second) {
            Some(c) => self.add_constraint(&c).map(|()| true),
            None => Ok(false),
        }
    }

    /// Append `x[index] <sense> value`
    pub fn add_bound_constraint(
        &mut self,
        index: usize,
        sense: Sense,
        value: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(&Constraint::bound(index, sense, value))
    }

    /// Append dense rows, together with their right-hand sides and senses
    pub fn add_constraint_rows(
        &mut self,
        rows: &[Vec<f64>],
        rhs: &[f64],
        senses: &[Sense],
    ) -> Result<(), ProblemError> {
        if rhs.len() != rows.len() || senses.len() != rows.len() {
            return Err(ProblemError::ShapeMismatch {
                what: "row data",
                expected: rows.len(),
                found: rhs.len().min(senses.len()),
            });
        }
        if let Some(bad) = rows.iter().find(|r| r.len() != self.num_cols) {
            return Err(ProblemError::ShapeMismatch {
                what: "matrix row",
                expected: self.num_cols,
                found: bad.len(),
            });
        }
        for ((row, &b), &sense) in rows.iter().zip(rhs).zip(senses) {
            self.matrix.push_dense_row(row)?;
            self.push_row_data(b, sense, None);
        }
        Ok(())
    }

    /// Drop the last row
    pub fn remove_last_constraint(&mut self) -> Result<(), ProblemError> {
        self.remove_last_constraints(1)
    }

    /// Drop the last `n` rows
    pub fn remove_last_constraints(&mut self, n: usize) -> Result<(), ProblemError> {
        self.matrix.remove_last_rows(n)?;
        let rows = self.matrix.num_rows();
        self.rhs.truncate(rows);
        self.senses.truncate(rows);
        if let Some(range_values) = &mut self.range_values {
            range_values.truncate(rows);
        }
        Ok(())
    }

    fn push_row_data(&mut self, rhs: f64, sense: Sense, range: Option<f64>) {
        self.rhs.push(rhs);
        self.senses.push(sense);
        match (&mut self.range_values, range) {
            (Some(values), range) => values.push(range.unwrap_or(0.)),
            (None, Some(range)) => {
                let mut values = vec![0.; self.rhs.len() - 1];
                values.push(range);
                self.range_values = Some(values);
            }
            (None, None) => {}
        }
    }

    fn check_column(&self, column: usize) -> Result<(), ProblemError> {
        if column >= self.num_cols {
            return Err(ProblemError::IndexOutOfRange {
                index: column,
                num_cols: self.num_cols,
            });
        }
        Ok(())
    }

    /// Check that every array matches the declared shape of the problem.
    ///
    /// Must hold before a problem is bound to a solver.
    pub fn validate(&self) -> Result<(), ProblemError> {
        let rows = self.num_rows();
        let cols = self.num_cols;
        let check = |what, expected, found| {
            if expected == found {
                Ok(())
            } else {
                Err(ProblemError::ShapeMismatch {
                    what,
                    expected,
                    found,
                })
            }
        };
        check("matrix columns", cols, self.matrix.num_cols())?;
        check("objective", cols, self.objective.len())?;
        check("lower bounds", cols, self.lower.len())?;
        check("upper bounds", cols, self.upper.len())?;
        check("variable kinds", cols, self.kinds.len())?;
        check("rhs", rows, self.rhs.len())?;
        check("senses", rows, self.senses.len())?;
        if let Some(range_values) = &self.range_values {
            check("range values", rows, range_values.len())?;
        } else if let Some(row) = self.senses.iter().position(|&s| s == Sense::Range) {
            return Err(ProblemError::InvalidSense(format!(
                "row {} is a range row but the problem has no range values",
                row
            )));
        }
        for (column, (&lower, &upper)) in self.lower.iter().zip(&self.upper).enumerate() {
            if lower.is_nan() || upper.is_nan() || lower > upper {
                return Err(ProblemError::BoundsMismatch {
                    column,
                    lower,
                    upper,
                });
            }
        }
        if !self.kind.allows_integers() {
            if let Some(column) = self.kinds.iter().position(|k| k.is_integer()) {
                return Err(ProblemError::InvalidKind(format!(
                    "column {} is {:?} in a {} problem",
                    column, self.kinds[column], self.kind
                )));
            }
        }
        Ok(())
    }

    /// Value of the objective at `x`
    pub fn eval_objective(&self, x: &[f64]) -> f64 {
        self.objective.iter().zip(x).map(|(c, v)| c * v).sum()
    }

    /// The largest amount by which `x` violates a bound or a row, 0 if `x` is feasible.
    /// A NaN coordinate or row activity counts as an infinite violation.
    /// Integrality is not checked.
    pub fn max_violation(&self, x: &[f64]) -> Result<f64, ProblemError> {
        if x.len() != self.num_cols {
            return Err(ProblemError::ShapeMismatch {
                what: "point",
                expected: self.num_cols,
                found: x.len(),
            });
        }
        let bounds = x
            .iter()
            .zip(self.lower.iter().zip(&self.upper))
            .map(|(&v, (&l, &u))| (v, (l - v).max(v - u)));
        let rows = self.matrix.rows().enumerate().map(|(i, row)| {
            let activity: f64 = row.iter().map(|&(j, a)| a * x[j]).sum();
            let (lo, hi) = self.row_interval(i);
            (activity, (lo - activity).max(activity - hi))
        });
        Ok(bounds.chain(rows).fold(0., |worst, (value, violation)| {
            if value.is_nan() {
                f64::INFINITY
            } else {
                worst.max(violation)
            }
        }))
    }

    /// Whether `x` has one value per column and satisfies every bound and row within `tolerance`
    pub fn is_satisfied_by(&self, x: &[f64], tolerance: f64) -> bool {
        matches!(self.max_violation(x), Ok(violation) if violation <= tolerance)
    }

    /// Write the problem in LP format, for inspection.
    pub fn write_lp<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        write!(writer, "{}", self)
    }
}

fn write_terms<I>(f: &mut Formatter<'_>, terms: I) -> std::fmt::Result
where
    I: IntoIterator<Item = (usize, f64)>,
{
    let mut empty = true;
    for (col, coeff) in terms {
        if coeff != 0. {
            write!(f, " {:+} x{}", coeff, col)?;
            empty = false;
        }
    }
    if empty {
        write!(f, " 0 x0")?;
    }
    Ok(())
}

/// LP format. Only meant to be read by humans: names are generated (`x0`, `c0`, ...)
/// and nothing guarantees the output can be parsed back into the same problem.
impl Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\\ {} problem", self.kind)?;
        writeln!(f, "{}", if self.maximize() { "Maximize" } else { "Minimize" })?;
        write!(f, " obj:")?;
        write_terms(f, self.objective.iter().copied().enumerate())?;
        writeln!(f)?;
        writeln!(f, "Subject To")?;
        for (i, row) in self.matrix.rows().enumerate() {
            write!(f, " c{}:", i)?;
            match self.senses[i] {
                Sense::Range => {
                    let (lo, hi) = self.row_interval(i);
                    write!(f, " {} <=", lo)?;
                    write_terms(f, row.iter().copied())?;
                    writeln!(f, " <= {}", hi)?;
                }
                sense => {
                    write_terms(f, row.iter().copied())?;
                    writeln!(f, " {} {}", sense, self.rhs[i])?;
                }
            }
        }
        writeln!(f, "Bounds")?;
        for (col, (&lower, &upper)) in self.lower.iter().zip(&self.upper).enumerate() {
            match (lower.is_finite(), upper.is_finite()) {
                (false, false) => writeln!(f, " x{} free", col)?,
                (true, false) => writeln!(f, " x{} >= {}", col, lower)?,
                (false, true) => writeln!(f, " -inf <= x{} <= {}", col, upper)?,
                (true, true) => writeln!(f, " {} <= x{} <= {}", lower, col, upper)?,
            }
        }
        for (title, kind) in [
            ("General", VariableKind::Integer),
            ("Binary", VariableKind::Binary),
        ] {
            let columns: Vec<String> = (0..self.num_cols)
                .filter(|&c| self.kinds[c] == kind)
                .map(|c| format!("x{}", c))
                .collect();
            if !columns.is_empty() {
                writeln!(f, "{}", title)?;
                writeln!(f, " {}", columns.join(" "))?;
            }
        }
        writeln!(f, "End")
    }
}
