//! Error types shared across the crate.
//!
//! Every fallible operation returns one of these; nothing in the library
//! falls back to a default when its input is malformed.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to read a problem from its `"<a> <op> <b>"` text form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProblemParseError {
    #[error("expected 3 fields, found {0}")]
    FieldCount(usize),

    #[error("invalid operand `{0}`")]
    Operand(String),

    #[error("unknown operator `{0}`")]
    Operator(String),
}

/// Failure to decode one line of the score history.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogParseError {
    #[error("invalid timestamp `{0}`")]
    Timestamp(String),

    #[error("invalid game length `{0}`")]
    GameLength(String),

    #[error("{0} trailing fields do not form a whole entry")]
    Misaligned(usize),

    #[error("record has no entries")]
    Empty,

    #[error("entry {index}: {source}")]
    Problem {
        index: usize,
        #[source]
        source: ProblemParseError,
    },

    #[error("entry {index}: invalid solve time `{value}`")]
    SolveTime { index: usize, value: String },

    #[error("entry {index}: unsolved marker before the final entry")]
    EarlySentinel { index: usize },
}

/// A single violation found while validating a session config.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("non-positive game duration ({0}s)")]
    NonPositiveDuration(i64),

    #[error("no operations enabled")]
    NoOperations,

    #[error("negative {0} operands")]
    NegativeOperands(&'static str),

    #[error("non-positive {0} operands")]
    NonPositiveOperands(&'static str),

    #[error("no possible {0} operands (max below min)")]
    EmptyRange(&'static str),

    #[error("addition operands must stay below half of the maximum integer")]
    AdditionOverflow,

    #[error("multiplication operands must stay below the square root of the maximum integer")]
    MultiplicationOverflow,

    #[error("no possible non-negative differences")]
    NoNonNegativeDifference,

    #[error("no possible non-zero quotients")]
    NoNonZeroQuotient,

    #[error("clean division quotients are too rare in the division operand ranges")]
    RareCleanQuotients,
}

/// Failure while producing a problem.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("no operations to choose from")]
    NoOperations,

    #[error("gave up on {operator} after {attempts} attempts; the operand ranges cannot satisfy the constraints")]
    Exhausted { operator: char, attempts: usize },

    #[error("{0} overflows")]
    Overflow(String),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StatsError {
    #[error("insufficient data: need at least {required} samples, have {actual}")]
    InsufficientData { required: usize, actual: usize },
}

/// Failure while reading or appending the score history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("score history {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("score history line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: LogParseError,
    },
}

/// Failure while loading or saving a named config.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("config `{0}` does not exist")]
    NotFound(String),

    #[error("config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Fatal failure of a running session. Cleanup has already run when one of
/// these is returned.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("terminal: {0}")]
    Terminal(#[from] io::Error),

    #[error("input reader failed: {0}")]
    Input(String),

    #[error("input reader disconnected")]
    Disconnected,
}
