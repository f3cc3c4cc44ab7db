//! Compact one-line format for a finished session.
//!
//! ```text
//! <unix ts> <game secs> <a> <op> <b> <ms> ... <a> <op> <b> -1
//! ```
//!
//! The trailing `-1` marks the problem that was on screen when the session
//! ended.

use crate::error::LogParseError;
use crate::problem::Problem;
use itertools::Itertools;
use std::fmt;
use std::str::FromStr;

const UNSOLVED: &str = "-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry {
    pub problem: Problem,
    /// `None` for the unsolved final problem.
    pub solve_ms: Option<u64>,
}

impl LogEntry {
    pub fn solved(problem: Problem, solve_ms: u64) -> Self {
        Self {
            problem,
            solve_ms: Some(solve_ms),
        }
    }

    pub fn unsolved(problem: Problem) -> Self {
        Self {
            problem,
            solve_ms: None,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.solve_ms {
            Some(ms) => write!(f, "{} {}", self.problem, ms),
            None => write!(f, "{} {}", self.problem, UNSOLVED),
        }
    }
}

/// All problems shown during one session and how long each took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: i64,
    pub game_length_secs: i64,
    entries: Vec<LogEntry>,
}

impl LogRecord {
    /// Builds a record from a session's problem list and the solve times of
    /// all but the last problem, stamped with the current time.
    ///
    /// Returns `None` unless `problems` has exactly one more element than
    /// `solve_times`.
    pub fn from_session(
        problems: &[Problem],
        solve_times: &[u64],
        game_length_secs: i64,
    ) -> Option<Self> {
        Self::from_session_at(
            chrono::Utc::now().timestamp(),
            problems,
            solve_times,
            game_length_secs,
        )
    }

    pub fn from_session_at(
        timestamp: i64,
        problems: &[Problem],
        solve_times: &[u64],
        game_length_secs: i64,
    ) -> Option<Self> {
        let (last, solved) = problems.split_last()?;
        if solved.len() != solve_times.len() {
            return None;
        }
        let entries = solved
            .iter()
            .zip(solve_times)
            .map(|(p, ms)| LogEntry::solved(*p, *ms))
            .chain(std::iter::once(LogEntry::unsolved(*last)))
            .collect();
        Some(Self {
            timestamp,
            game_length_secs,
            entries,
        })
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of problems answered correctly.
    pub fn score(&self) -> usize {
        self.solve_times().count()
    }

    pub fn solve_times(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().filter_map(|e| e.solve_ms)
    }

    pub fn played_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.timestamp, 0)
    }

    /// Encodes the record as a single newline-terminated line.
    pub fn encode(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.timestamp,
            self.game_length_secs,
            self.entries.iter().join(" ")
        )
    }
}

impl FromStr for LogRecord {
    type Err = LogParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.trim().split(' ');

        let timestamp = fields.next().unwrap_or_default();
        let timestamp = timestamp
            .parse()
            .map_err(|_| LogParseError::Timestamp(timestamp.to_string()))?;
        let game_length = fields.next().unwrap_or_default();
        let game_length_secs = game_length
            .parse()
            .map_err(|_| LogParseError::GameLength(game_length.to_string()))?;

        let rest: Vec<&str> = fields.collect();
        if rest.len() % 4 != 0 {
            return Err(LogParseError::Misaligned(rest.len() % 4));
        }
        if rest.is_empty() {
            return Err(LogParseError::Empty);
        }

        let count = rest.len() / 4;
        let mut entries = Vec::with_capacity(count);
        for (index, group) in rest.chunks_exact(4).enumerate() {
            let problem = Problem::from_fields(group[0], group[1], group[2])
                .map_err(|source| LogParseError::Problem { index, source })?;
            let solve_ms = match group[3] {
                UNSOLVED if index + 1 == count => None,
                UNSOLVED => return Err(LogParseError::EarlySentinel { index }),
                value => Some(value.parse().map_err(|_| LogParseError::SolveTime {
                    index,
                    value: value.to_string(),
                })?),
            };
            entries.push(LogEntry { problem, solve_ms });
        }

        Ok(Self {
            timestamp,
            game_length_secs,
            entries,
        })
    }
}
