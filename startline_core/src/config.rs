//! Launch configuration
//!
//! [`RunConfig`] says how many workers to start and where to place them.
//! [`LaunchOptions`] carries the per-thread knobs that do not affect
//! placement. Both can be read from a launch file:
//!
//! ```toml
//! threads = 4
//!
//! [placement]
//! mode = "sequential"
//! start = 2
//!
//! [options]
//! thread_name_prefix = "bench"
//! raise_priority = true
//! ```
//!
//! or the same structure in YAML:
//!
//! ```yaml
//! placement:
//!   mode: explicit
//!   units: [0, 2, 4]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StartlineError, StartlineResult};
use crate::placement::PinningMode;

/// How many workers to launch and where to put them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Requested worker count. May be left out only with explicit pinning,
    /// where the list length is used.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Placement policy
    #[serde(default)]
    pub placement: PinningMode,
}

impl RunConfig {
    pub fn new(threads: Option<usize>, placement: PinningMode) -> Self {
        Self { threads, placement }
    }

    /// `threads` unbound workers.
    pub fn unpinned(threads: usize) -> Self {
        Self::new(Some(threads), PinningMode::NoPinning)
    }

    /// Effective number of workers.
    ///
    /// - explicit pinning without `threads`: the list length
    /// - explicit pinning with `threads`: the smaller of the two
    /// - otherwise: `threads`, which must be given
    ///
    /// Zero workers and empty explicit lists are configuration errors.
    pub fn worker_count(&self) -> StartlineResult<usize> {
        let count = match (&self.placement, self.threads) {
            (PinningMode::Explicit { units }, _) if units.is_empty() => {
                return Err(StartlineError::Configuration(
                    "explicit pinning needs at least one unit".to_string(),
                ));
            }
            (PinningMode::Explicit { units }, Some(threads)) => threads.min(units.len()),
            (PinningMode::Explicit { units }, None) => units.len(),
            (_, Some(threads)) => threads,
            (_, None) => {
                return Err(StartlineError::Configuration(
                    "thread count has to be specified unless units are listed explicitly"
                        .to_string(),
                ));
            }
        };

        if count == 0 {
            return Err(StartlineError::Configuration(
                "thread count can't be 0".to_string(),
            ));
        }
        Ok(count)
    }

    /// Check the configuration without launching anything.
    pub fn validate(&self) -> StartlineResult<()> {
        self.worker_count().map(|_| ())
    }
}

/// Per-launch knobs for worker threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchOptions {
    /// Worker threads are named `<prefix>-<index>`
    pub thread_name_prefix: String,
    /// Worker stack size in bytes (`None` = platform default)
    pub stack_size: Option<usize>,
    /// Try to raise each worker's scheduling priority before it reaches
    /// the starting line. Failure is logged, never fatal.
    pub raise_priority: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            thread_name_prefix: "startline-worker".to_string(),
            stack_size: None,
            raise_priority: false,
        }
    }
}

/// Contents of a launch file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LaunchConfig {
    #[serde(flatten)]
    pub run: RunConfig,
    #[serde(default)]
    pub options: LaunchOptions,
}

impl LaunchConfig {
    pub fn from_toml_str(s: &str) -> StartlineResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.run.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(s: &str) -> StartlineResult<Self> {
        let config: Self = serde_yaml::from_str(s)?;
        config.run.validate()?;
        Ok(config)
    }

    /// Load and validate a `.toml`, `.yaml` or `.yml` launch file.
    pub fn load(path: impl AsRef<Path>) -> StartlineResult<Self> {
        let config = Self::read(path)?;
        config.run.validate()?;
        Ok(config)
    }

    /// Parse a launch file without validating it, for callers that fill
    /// in missing fields (such as the thread count) afterwards.
    pub fn read(path: impl AsRef<Path>) -> StartlineResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&contents)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
            other => {
                return Err(StartlineError::Configuration(format!(
                    "unsupported launch file extension {:?} for {}",
                    other.unwrap_or(""),
                    path.display()
                )))
            }
        };

        log::debug!("loaded launch config from {}", path.display());
        Ok(config)
    }
}
