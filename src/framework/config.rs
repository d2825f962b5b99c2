//! Framework configuration.

use super::select::{FirstSelector, RandomSelector, Selector};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a [`FrameworkConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How ties among enabled transitions are broken.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SelectionConfig {
    /// Uniformly random; reproducible when seeded.
    Random {
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Always the first enabled candidate.
    First,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        SelectionConfig::Random { seed: None }
    }
}

impl SelectionConfig {
    pub fn selector(&self) -> Box<dyn Selector> {
        match self {
            SelectionConfig::Random { seed: Some(seed) } => Box::new(RandomSelector::seeded(*seed)),
            SelectionConfig::Random { seed: None } => Box::new(RandomSelector::new()),
            SelectionConfig::First => Box::new(FirstSelector),
        }
    }
}

/// Settings of a coordinating framework. Every field has a default, so
/// `{}` is a valid configuration.
///
/// # Example
///
/// ```rust
/// use refinery::framework::{FrameworkConfig, SelectionConfig};
///
/// let config = FrameworkConfig::from_json(
///     r#"{ "name": "items", "selection": { "strategy": "random", "seed": 42 } }"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.selection, SelectionConfig::Random { seed: Some(42) });
/// assert_eq!(config.step_limit, Some(10_000));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Name used in log spans and snapshots
    pub name: String,
    pub selection: SelectionConfig,
    /// Most transitions a single scheduling run may execute. The run fails
    /// when one more would fire. `None` disables the check
    pub step_limit: Option<usize>,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            name: "refinement".to_string(),
            selection: SelectionConfig::default(),
            step_limit: Some(10_000),
        }
    }
}

impl FrameworkConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_step_limit(mut self, step_limit: Option<usize>) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
