use crate::error::HistoryError;
use crate::log::LogRecord;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only score history, one [`LogRecord`] per line.
#[derive(Debug, Clone)]
pub struct ScoreLog {
    path: PathBuf,
}

impl ScoreLog {
    pub const DEFAULT_FILE: &'static str = "scores.txt";

    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &LogRecord) -> Result<(), HistoryError> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        file.write_all(record.encode().as_bytes())
            .map_err(|source| self.io_error(source))?;
        tracing::debug!(path = %self.path.display(), score = record.score(), "appended session");
        Ok(())
    }

    /// Reads every record in file order. Blank lines are skipped; the first
    /// undecodable line fails the whole load.
    pub fn load(&self) -> Result<Vec<LogRecord>, HistoryError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;
        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                line.parse().map_err(|source| HistoryError::Parse {
                    line: idx + 1,
                    source,
                })
            })
            .collect()
    }

    fn io_error(&self, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for ScoreLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LogParseError;
    use crate::problem::{Operator, Problem};
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn record(ts: i64, solved: usize) -> LogRecord {
        let problems = vec![Problem::new(3, Operator::Add, 4); solved + 1];
        let times: Vec<u64> = (1..=solved as u64).map(|i| i * 100).collect();
        LogRecord::from_session_at(ts, &problems, &times, 120).unwrap()
    }

    #[test]
    fn append_then_load_preserves_order() {
        let dir = tempdir().unwrap();
        let log = ScoreLog::new(dir.path().join("scores.txt"));
        assert_eq!(log.path(), dir.path().join("scores.txt").as_path());
        log.append(&record(1, 2)).unwrap();
        log.append(&record(2, 0)).unwrap();
        log.append(&record(3, 5)).unwrap();

        let records = log.load().unwrap();
        assert_eq!(records, vec![record(1, 2), record(2, 0), record(3, 5)]);
    }

    #[test]
    fn skips_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.txt");
        fs::write(&path, "1 60 2 + 2 300 5 * 5 -1\r\n\n   \n2 60 1 + 1 -1\n\n").unwrap();
        let records = ScoreLog::new(&path).load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].score(), 1);
    }

    #[test]
    fn bad_line_fails_whole_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.txt");
        fs::write(&path, "1 60 2 + 2 -1\n\nnope 60 2 + 2 -1\n").unwrap();
        assert_matches!(
            ScoreLog::new(&path).load(),
            Err(HistoryError::Parse {
                line: 3,
                source: LogParseError::Timestamp(_)
            })
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let log = ScoreLog::new(dir.path().join("missing.txt"));
        assert_matches!(log.load(), Err(HistoryError::Io { .. }));
    }
}
