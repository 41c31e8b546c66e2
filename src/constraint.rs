//! Constraints define the (in)equalities that must hold in the solution.
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::ProblemError;

/// The relational operator of a constraint row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    /// `row <= rhs`
    LessEq,
    /// `row >= rhs`
    GreaterEq,
    /// `row = rhs`
    Equal,
    /// `rhs <= row <= rhs + range` (or `rhs + range <= row <= rhs` for a negative range)
    Range,
}

impl Sense {
    /// The single letter code of the sense: `L`, `G`, `E` or `R`
    pub fn code(self) -> char {
        match self {
            Sense::LessEq => 'L',
            Sense::GreaterEq => 'G',
            Sense::Equal => 'E',
            Sense::Range => 'R',
        }
    }

    /// The interval `[lower, upper]` a row with this sense must lie in
    ///
    /// ```
    /// # use polylp::Sense;
    /// assert_eq!(Sense::GreaterEq.interval(8., 0.), (8., f64::INFINITY));
    /// assert_eq!(Sense::Range.interval(2., 3.), (2., 5.));
    /// assert_eq!(Sense::Range.interval(2., -3.), (-1., 2.));
    /// ```
    pub fn interval(self, rhs: f64, range: f64) -> (f64, f64) {
        match self {
            Sense::LessEq => (f64::NEG_INFINITY, rhs),
            Sense::GreaterEq => (rhs, f64::INFINITY),
            Sense::Equal => (rhs, rhs),
            Sense::Range if range >= 0. => (rhs, rhs + range),
            Sense::Range => (rhs + range, rhs),
        }
    }
}

impl TryFrom<char> for Sense {
    type Error = ProblemError;

    fn try_from(code: char) -> Result<Self, Self::Error> {
        match code {
            'L' => Ok(Sense::LessEq),
            'G' => Ok(Sense::GreaterEq),
            'E' => Ok(Sense::Equal),
            'R' => Ok(Sense::Range),
            other => Err(ProblemError::InvalidSense(other.to_string())),
        }
    }
}

/// Accepts the letter codes (`L`, `G`, `E`, `R`) and the operators `<=`, `>=`, `=` and `==`
impl FromStr for Sense {
    type Err = ProblemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<=" => Ok(Sense::LessEq),
            ">=" => Ok(Sense::GreaterEq),
            "=" | "==" => Ok(Sense::Equal),
            code => {
                let mut chars = code.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Sense::try_from(c),
                    _ => Err(ProblemError::InvalidSense(s.to_string())),
                }
            }
        }
    }
}

impl Display for Sense {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Sense::LessEq => "<=",
            Sense::GreaterEq => ">=",
            Sense::Equal => "=",
            Sense::Range => "in",
        })
    }
}

/// A single constraint row: `sum(coeffs[k] * x[indices[k]]) <sense> rhs`.
///
/// A constraint is a transient value: adding it to a [Problem](crate::Problem)
/// or to a [SolverAdapter](crate::SolverAdapter) copies it into the row storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    indices: Vec<usize>,
    coeffs: Vec<f64>,
    sense: Sense,
    rhs: f64,
    range: Option<f64>,
}

impl Constraint {
    /// Creates a constraint from parallel index and coefficient lists
    ///
    /// ```
    /// # use polylp::{Constraint, Sense};
    /// // z - y >= 8
    /// let c = Constraint::new(vec![1, 2], vec![-1., 1.], Sense::GreaterEq, 8.).unwrap();
    /// assert_eq!(c.terms().collect::<Vec<_>>(), vec![(1, -1.), (2, 1.)]);
    /// assert!(Constraint::new(vec![1, 2], vec![1.], Sense::Equal, 0.).is_err());
    /// ```
    pub fn new(
        indices: impl Into<Vec<usize>>,
        coeffs: impl Into<Vec<f64>>,
        sense: Sense,
        rhs: f64,
    ) -> Result<Self, ProblemError> {
        let indices = indices.into();
        let coeffs = coeffs.into();
        if indices.len() != coeffs.len() {
            return Err(ProblemError::ShapeMismatch {
                what: "constraint coefficients",
                expected: indices.len(),
                found: coeffs.len(),
            });
        }
        Ok(Constraint {
            indices,
            coeffs,
            sense,
            rhs,
            range: None,
        })
    }

    /// `x[first] <sense> x[second]`, encoded as `x[first] - x[second] <sense> 0`.
    /// Comparing a variable with itself gives no constraint at all.
    pub fn comparison(first: usize, sense: Sense, second: usize) -> Option<Self> {
        (first != second).then(|| Constraint {
            indices: vec![first, second],
            coeffs: vec![1., -1.],
            sense,
            rhs: 0.,
            range: None,
        })
    }

    /// `x[index] <sense> value`
    pub fn bound(index: usize, sense: Sense, value: f64) -> Self {
        Constraint {
            indices: vec![index],
            coeffs: vec![1.],
            sense,
            rhs: value,
            range: None,
        }
    }

    /// Sets the range value, used when the sense is [Sense::Range]
    pub fn with_range(mut self, range: f64) -> Self {
        self.range = Some(range);
        self
    }

    /// The column indices
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The coefficients, parallel to [Constraint::indices]
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// The relational operator
    pub fn sense(&self) -> Sense {
        self.sense
    }

    /// The right-hand side
    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// The range value, if one was set
    pub fn range(&self) -> Option<f64> {
        self.range
    }

    /// `(index, coefficient)` pairs
    pub fn terms(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.coeffs.iter().copied())
    }

    /// The interval the left-hand side must lie in
    pub fn interval(&self) -> (f64, f64) {
        self.sense.interval(self.rhs, self.range.unwrap_or(0.))
    }

    pub(crate) fn check_columns(&self, num_cols: usize) -> Result<(), ProblemError> {
        match self.indices.iter().find(|&&i| i >= num_cols) {
            Some(&index) => Err(ProblemError::IndexOutOfRange { index, num_cols }),
            None => Ok(()),
        }
    }
}
