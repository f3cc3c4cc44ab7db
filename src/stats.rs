//! Robust summary statistics over solve times, pooled across every session
//! in the history.
//!
//! All figures are integer milliseconds computed with truncating division.

use crate::error::StatsError;
use crate::log::LogRecord;
use std::fmt;

fn require(samples: &[u64], required: usize) -> Result<(), StatsError> {
    if samples.len() < required {
        Err(StatsError::InsufficientData {
            required,
            actual: samples.len(),
        })
    } else {
        Ok(())
    }
}

fn median_of_sorted(sorted: &[u64]) -> u64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        let (a, b) = (sorted[mid - 1], sorted[mid]);
        a / 2 + b / 2 + (a % 2 + b % 2) / 2
    } else {
        sorted[mid]
    }
}

/// Sorts `samples` in place and returns the middle value, averaging the two
/// middle values for an even count.
pub fn median(samples: &mut [u64]) -> Result<u64, StatsError> {
    require(samples, 1)?;
    samples.sort_unstable();
    Ok(median_of_sorted(samples))
}

/// Sorts `samples` in place and returns the spread between the medians of
/// the upper and lower halves. For an odd count the middle sample belongs to
/// neither half.
pub fn iqr(samples: &mut [u64]) -> Result<u64, StatsError> {
    require(samples, 2)?;
    samples.sort_unstable();
    let half = samples.len() / 2;
    let lower = median_of_sorted(&samples[..half]);
    let upper = median_of_sorted(&samples[samples.len() - half..]);
    Ok(upper - lower)
}

pub fn mean(samples: &[u64]) -> Result<u64, StatsError> {
    require(samples, 1)?;
    let sum: u128 = samples.iter().map(|&s| s as u128).sum();
    Ok((sum / samples.len() as u128) as u64)
}

/// Sample standard deviation (Bessel's correction) around the truncated
/// integer mean, itself truncated to an integer.
pub fn stdev(samples: &[u64]) -> Result<u64, StatsError> {
    require(samples, 2)?;
    let mean = mean(samples)? as i128;
    let squares = samples
        .iter()
        .map(|&s| {
            let diff = s as i128 - mean;
            (diff * diff) as u128
        })
        .fold(0u128, u128::saturating_add);
    let variance = squares / (samples.len() as u128 - 1);
    Ok(isqrt(variance) as u64)
}

fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = n / 2 + n % 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

/// Headline figures for a score history.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub sessions: usize,
    pub best_score: Option<usize>,
    pub last_played: Option<chrono::DateTime<chrono::Utc>>,
    pub samples: usize,
    pub median: Result<u64, StatsError>,
    pub iqr: Result<u64, StatsError>,
    pub mean: Result<u64, StatsError>,
    pub stdev: Result<u64, StatsError>,
}

impl Summary {
    pub fn from_records(records: &[LogRecord]) -> Self {
        let mut times: Vec<u64> = records.iter().flat_map(LogRecord::solve_times).collect();
        let mean = mean(&times);
        let stdev = stdev(&times);
        Self {
            sessions: records.len(),
            best_score: records.iter().map(LogRecord::score).max(),
            last_played: records.last().and_then(LogRecord::played_at),
            samples: times.len(),
            median: median(&mut times),
            iqr: iqr(&mut times),
            mean,
            stdev,
        }
    }
}

struct Figure<'a>(&'a Result<u64, StatsError>);

impl fmt::Display for Figure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Ok(v) => write!(f, "{v} ms"),
            Err(StatsError::InsufficientData { .. }) => write!(f, "insufficient data"),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sessions: {}", self.sessions)?;
        if let Some(best) = self.best_score {
            writeln!(f, "Best score: {best}")?;
        }
        if let Some(last) = self.last_played {
            writeln!(
                f,
                "Last played: {}",
                last.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
            )?;
        }
        writeln!(f, "Solved problems: {}", self.samples)?;
        writeln!(f, "Median: {}", Figure(&self.median))?;
        writeln!(f, "IQR: {}", Figure(&self.iqr))?;
        writeln!(f, "Mean: {}", Figure(&self.mean))?;
        write!(f, "STDev: {}", Figure(&self.stdev))
    }
}
