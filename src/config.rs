use crate::app_dirs::AppDirs;
use crate::error::{ConfigError, StoreError};
use crate::generator::MAX_ATTEMPTS;
use crate::problem::Operator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Addition operands must stay below this so any sum fits in an `i64`.
pub const ADDITION_LIMIT: i64 = i64::MAX / 2;

/// Largest integer whose square fits in an `i64`.
pub const MULTIPLICATION_LIMIT: i64 = 3_037_000_499;

/// Clean division needs at least this many expected hits within
/// [`MAX_ATTEMPTS`] draws.
const MIN_EXPECTED_CLEAN_DRAWS: u128 = 20;

/// Right ranges at least this wide are not counted for clean division.
const CLEAN_COUNT_LIMIT: i64 = 1_000_000;

/// Inclusive operand ranges for the left and right side of a problem.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperandBounds {
    pub min_left: i64,
    pub max_left: i64,
    pub min_right: i64,
    pub max_right: i64,
}

impl OperandBounds {
    pub const fn new(min_left: i64, max_left: i64, min_right: i64, max_right: i64) -> Self {
        Self {
            min_left,
            max_left,
            min_right,
            max_right,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max_left < self.min_left || self.max_right < self.min_right
    }

    fn min(&self) -> i64 {
        self.min_left.min(self.min_right)
    }

    fn max(&self) -> i64 {
        self.max_left.max(self.max_right)
    }

    fn pair_count(&self) -> u128 {
        (self.max_left - self.min_left + 1) as u128 * (self.max_right - self.min_right + 1) as u128
    }

    /// Pairs whose left operand is a multiple of the right one. Expects
    /// positive, non-empty ranges. `None` when the right range is too wide to
    /// count.
    fn clean_quotient_pairs(&self) -> Option<u128> {
        if self.max_right - self.min_right >= CLEAN_COUNT_LIMIT {
            return None;
        }
        let pairs = (self.min_right..=self.max_right)
            .map(|r| (self.max_left / r - (self.min_left - 1) / r) as u128)
            .sum();
        Some(pairs)
    }
}

impl fmt::Display for OperandBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{}:{}",
            self.min_left, self.max_left, self.min_right, self.max_right
        )
    }
}

/// Parses `MIN:MAX,MIN:MAX` (left range, then right range).
impl FromStr for OperandBounds {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn range(part: &str) -> Result<(i64, i64), String> {
            let (min, max) = part
                .split_once(':')
                .ok_or_else(|| format!("expected MIN:MAX, got `{part}`"))?;
            let min = min.trim().parse().map_err(|_| format!("invalid number `{min}`"))?;
            let max = max.trim().parse().map_err(|_| format!("invalid number `{max}`"))?;
            Ok((min, max))
        }

        let (left, right) = s
            .split_once(',')
            .ok_or_else(|| format!("expected MIN:MAX,MIN:MAX, got `{s}`"))?;
        let (min_left, max_left) = range(left)?;
        let (min_right, max_right) = range(right)?;
        Ok(Self::new(min_left, max_left, min_right, max_right))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdditionConfig {
    #[serde(flatten)]
    pub bounds: OperandBounds,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubtractionConfig {
    #[serde(flatten)]
    pub bounds: OperandBounds,
    #[serde(default)]
    pub force_non_negative_difference: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MultiplicationConfig {
    #[serde(flatten)]
    pub bounds: OperandBounds,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DivisionConfig {
    #[serde(flatten)]
    pub bounds: OperandBounds,
    #[serde(default)]
    pub force_clean_division: bool,
}

/// Everything needed to run one drill session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    pub name: String,
    pub addition: AdditionConfig,
    pub subtraction: SubtractionConfig,
    pub multiplication: MultiplicationConfig,
    pub division: DivisionConfig,
    /// Generate subtraction as reversed addition.
    pub override_subtraction: bool,
    /// Generate division as reversed multiplication.
    pub override_division: bool,
    pub duration_secs: i64,
    pub operations: Vec<Operator>,
}

impl Default for SessionConfig {
    /// The classic zetamac settings.
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            addition: AdditionConfig {
                bounds: OperandBounds::new(2, 100, 2, 100),
            },
            subtraction: SubtractionConfig {
                bounds: OperandBounds::new(2, 100, 2, 100),
                force_non_negative_difference: true,
            },
            multiplication: MultiplicationConfig {
                bounds: OperandBounds::new(2, 12, 2, 100),
            },
            division: DivisionConfig {
                bounds: OperandBounds::new(2, 1200, 2, 100),
                force_clean_division: true,
            },
            override_subtraction: true,
            override_division: true,
            duration_secs: 120,
            operations: Operator::ALL.to_vec(),
        }
    }
}

impl SessionConfig {
    /// Checks every rule and reports all violations at once.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        if self.duration_secs <= 0 {
            errors.push(ConfigError::NonPositiveDuration(self.duration_secs));
        }
        if self.operations.is_empty() {
            errors.push(ConfigError::NoOperations);
        }

        let add = &self.addition.bounds;
        if add.min() < 0 {
            errors.push(ConfigError::NegativeOperands("addition"));
        }
        if add.max() >= ADDITION_LIMIT {
            errors.push(ConfigError::AdditionOverflow);
        }
        if add.is_empty() {
            errors.push(ConfigError::EmptyRange("addition"));
        }

        let sub = &self.subtraction.bounds;
        if sub.min() <= 0 {
            errors.push(ConfigError::NonPositiveOperands("subtraction"));
        }
        if self.subtraction.force_non_negative_difference && sub.max_left < sub.min_right {
            errors.push(ConfigError::NoNonNegativeDifference);
        }
        if sub.is_empty() {
            errors.push(ConfigError::EmptyRange("subtraction"));
        }

        let mul = &self.multiplication.bounds;
        if mul.min() <= 0 {
            errors.push(ConfigError::NonPositiveOperands("multiplication"));
        }
        if mul.max() >= MULTIPLICATION_LIMIT {
            errors.push(ConfigError::MultiplicationOverflow);
        }
        if mul.is_empty() {
            errors.push(ConfigError::EmptyRange("multiplication"));
        }

        let div = &self.division.bounds;
        if div.min() <= 0 {
            errors.push(ConfigError::NonPositiveOperands("division"));
        }
        if div.max_left < div.min_right {
            errors.push(ConfigError::NoNonZeroQuotient);
        }
        if div.is_empty() {
            errors.push(ConfigError::EmptyRange("division"));
        } else if div.min() > 0
            && div.max_left >= div.min_right
            && self.division.force_clean_division
            && !self.override_division
        {
            if let Some(clean) = div.clean_quotient_pairs() {
                if clean * (MAX_ATTEMPTS as u128) < MIN_EXPECTED_CLEAN_DRAWS * div.pair_count() {
                    errors.push(ConfigError::RareCleanQuotients);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

pub trait ConfigStore {
    fn load(&self, name: &str) -> Result<SessionConfig, StoreError>;
    fn save(&self, cfg: &SessionConfig) -> Result<(), StoreError>;
}

/// Named configs stored as `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    dir: PathBuf,
}

impl FileConfigStore {
    pub const DEFAULT_NAME: &'static str = "default";

    pub fn new() -> Self {
        Self {
            dir: AppDirs::config_dir(),
        }
    }

    pub fn with_dir<P: AsRef<Path>>(p: P) -> Self {
        Self {
            dir: p.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing `default` resolves to the zetamac preset; any other missing
    /// name is an error.
    fn load(&self, name: &str) -> Result<SessionConfig, StoreError> {
        let path = self.path_for(name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if name == Self::DEFAULT_NAME {
                    tracing::debug!(
                        path = %path.display(),
                        "no saved default config, using preset"
                    );
                    return Ok(SessionConfig::default());
                }
                return Err(StoreError::NotFound(name.to_string()));
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse { path, source })
    }

    fn save(&self, cfg: &SessionConfig) -> Result<(), StoreError> {
        let path = self.path_for(&cfg.name);
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let data = serde_json::to_vec_pretty(cfg).map_err(|source| StoreError::Parse {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, data).map_err(|source| StoreError::Io { path, source })?;
        tracing::debug!(name = %cfg.name, "saved config");
        Ok(())
    }
}
