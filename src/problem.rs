use crate::error::ProblemParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum Operator {
    #[serde(rename = "+")]
    #[strum(serialize = "+")]
    Add,
    #[serde(rename = "-")]
    #[strum(serialize = "-")]
    Subtract,
    #[serde(rename = "*")]
    #[strum(serialize = "*")]
    Multiply,
    #[serde(rename = "/")]
    #[strum(serialize = "/")]
    Divide,
}

impl Operator {
    pub const ALL: [Operator; 4] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
    ];

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == c)
    }

    /// Applies the operator with checked arithmetic. Division truncates
    /// toward zero; `None` on overflow or a zero divisor.
    pub fn apply(self, left: i64, right: i64) -> Option<i64> {
        match self {
            Operator::Add => left.checked_add(right),
            Operator::Subtract => left.checked_sub(right),
            Operator::Multiply => left.checked_mul(right),
            Operator::Divide => left.checked_div(right),
        }
    }
}

impl FromStr for Operator {
    type Err = ProblemParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                Self::from_symbol(c).ok_or_else(|| ProblemParseError::Operator(s.to_string()))
            }
            _ => Err(ProblemParseError::Operator(s.to_string())),
        }
    }
}

/// One arithmetic question, e.g. `12 * 7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Problem {
    pub left: i64,
    pub operator: Operator,
    pub right: i64,
}

impl Problem {
    pub fn new(left: i64, operator: Operator, right: i64) -> Self {
        Self {
            left,
            operator,
            right,
        }
    }

    pub fn answer(&self) -> Option<i64> {
        self.operator.apply(self.left, self.right)
    }

    /// The exact string a player must type to solve this problem.
    pub fn answer_text(&self) -> Option<String> {
        self.answer().map(|a| a.to_string())
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.operator, self.right)
    }
}

impl FromStr for Problem {
    type Err = ProblemParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(' ').collect();
        match fields.as_slice() {
            [left, op, right] => Problem::from_fields(left, op, right),
            other => Err(ProblemParseError::FieldCount(other.len())),
        }
    }
}

impl Problem {
    pub(crate) fn from_fields(
        left: &str,
        op: &str,
        right: &str,
    ) -> Result<Self, ProblemParseError> {
        let left = left
            .parse()
            .map_err(|_| ProblemParseError::Operand(left.to_string()))?;
        let operator = op.parse()?;
        let right = right
            .parse()
            .map_err(|_| ProblemParseError::Operand(right.to_string()))?;
        Ok(Problem::new(left, operator, right))
    }
}
