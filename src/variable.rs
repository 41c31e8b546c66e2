//! Column types and definitions.
//!
//! A problem stores its columns as parallel arrays (objective, bounds, kinds).
//! A [VariableDefinition] groups the settings of one column so that it can be
//! written in one go with [Problem::define_column](crate::Problem::define_column).
use std::collections::Bound;
use std::fmt::{Display, Formatter};
use std::ops::RangeBounds;
use std::str::FromStr;

use crate::error::ProblemError;

/// The domain of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VariableKind {
    /// A real number
    #[default]
    Continuous,
    /// 0 or 1
    Binary,
    /// An integer
    Integer,
}

impl VariableKind {
    /// The single letter code of the kind: `C`, `B` or `I`
    pub fn code(self) -> char {
        match self {
            VariableKind::Continuous => 'C',
            VariableKind::Binary => 'B',
            VariableKind::Integer => 'I',
        }
    }

    /// Whether the kind restricts the column to integer values
    pub fn is_integer(self) -> bool {
        self != VariableKind::Continuous
    }
}

impl TryFrom<char> for VariableKind {
    type Error = ProblemError;

    fn try_from(code: char) -> Result<Self, Self::Error> {
        match code {
            'C' => Ok(VariableKind::Continuous),
            'B' => Ok(VariableKind::Binary),
            'I' => Ok(VariableKind::Integer),
            other => Err(ProblemError::InvalidKind(format!("unknown kind code {:?}", other))),
        }
    }
}

impl FromStr for VariableKind {
    type Err = ProblemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => VariableKind::try_from(c),
            _ => Err(ProblemError::InvalidKind(format!("unknown kind code {:?}", s))),
        }
    }
}

impl Display for VariableKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Defines the properties of a column: its bounds, its kind and its objective coefficient.
#[derive(Clone, PartialEq, Debug)]
pub struct VariableDefinition {
    pub(crate) min: f64,
    pub(crate) max: f64,
    pub(crate) kind: VariableKind,
    pub(crate) objective: f64,
}

impl VariableDefinition {
    /// Creates an unbounded continuous column with a null objective coefficient
    pub fn new() -> Self {
        VariableDefinition {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            kind: VariableKind::Continuous,
            objective: 0.,
        }
    }

    /// Set the lower and/or higher bounds of the column
    ///
    /// ## Examples
    /// ```
    /// # use polylp::variable;
    /// assert_eq!(
    ///     variable().bounds(1..2),
    ///     variable().min(1).max(2)
    /// );
    ///
    /// assert_eq!(
    ///     variable().bounds(..=2),
    ///     variable().max(2)
    /// );
    ///
    /// # assert_eq!(variable().bounds::<f64, _>(..), variable());
    /// ```
    pub fn bounds<N: Into<f64> + Copy, B: RangeBounds<N>>(self, bounds: B) -> Self {
        self.min(match bounds.start_bound() {
            Bound::Included(&x) => x.into(),
            Bound::Excluded(&x) => x.into(),
            Bound::Unbounded => f64::NEG_INFINITY,
        })
        .max(match bounds.end_bound() {
            Bound::Included(&x) => x.into(),
            Bound::Excluded(&x) => x.into(),
            Bound::Unbounded => f64::INFINITY,
        })
    }

    /// Set the lower bound of the column
    pub fn min<N: Into<f64>>(mut self, min: N) -> Self {
        self.min = min.into();
        self
    }

    /// Set the higher bound of the column
    pub fn max<N: Into<f64>>(mut self, max: N) -> Self {
        self.max = max.into();
        self
    }

    /// Set both the lower and higher bounds of the column
    pub fn clamp<N1: Into<f64>, N2: Into<f64>>(self, min: N1, max: N2) -> Self {
        self.min(min).max(max)
    }

    /// Set the kind of the column
    pub fn kind(mut self, kind: VariableKind) -> Self {
        self.kind = kind;
        self
    }

    /// Restrict the column to integer values
    pub fn integer(self) -> Self {
        self.kind(VariableKind::Integer)
    }

    /// Restrict the column to 0 or 1
    pub fn binary(self) -> Self {
        self.kind(VariableKind::Binary).clamp(0, 1)
    }

    /// Set the objective coefficient of the column
    pub fn objective<N: Into<f64>>(mut self, coefficient: N) -> Self {
        self.objective = coefficient.into();
        self
    }
}

/// Creates an unbounded continuous column
impl Default for VariableDefinition {
    fn default() -> Self {
        VariableDefinition::new()
    }
}

/// Returns an unbounded continuous column definition
pub fn variable() -> VariableDefinition {
    VariableDefinition::default()
}

#[cfg(test)]
mod tests {
    use super::{variable, VariableKind};

    #[test]
    fn kind_codes() {
        assert_eq!("C".parse::<VariableKind>(), Ok(VariableKind::Continuous));
        assert_eq!(VariableKind::try_from('B'), Ok(VariableKind::Binary));
        assert_eq!(VariableKind::Integer.to_string(), "I");
        assert!("Z".parse::<VariableKind>().is_err());
    }

    #[test]
    fn binary_sets_bounds() {
        let def = variable().binary();
        assert_eq!((def.min, def.max), (0., 1.));
        assert_eq!(def.kind, VariableKind::Binary);
    }
}
