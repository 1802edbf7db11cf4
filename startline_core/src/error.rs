//! Unified error handling for startline
//!
//! Every fallible operation in the crate returns [`StartlineResult`]. Errors
//! raised during setup (configuration, topology queries, selector exhaustion,
//! thread creation) abort a launch as a whole. Placement and workload errors
//! are local to one worker and end up in that worker's
//! [`WorkerOutcome`](crate::launch::WorkerOutcome) instead.

use thiserror::Error;

/// Main error type for startline operations
#[derive(Debug, Error)]
pub enum StartlineError {
    /// Run configuration is invalid (zero workers, empty explicit list, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A worker could not be placed on its execution unit, or the topology
    /// ran out of units
    #[error("Placement error: {0}")]
    Placement(String),

    /// The platform could not report its processor groups
    #[error("Topology query error: {0}")]
    TopologyQuery(String),

    /// The workload failed (or panicked) inside its timed region
    #[error("Workload error: {0}")]
    Workload(String),

    /// The OS refused to create a worker thread
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// No worker produced a duration
    #[error("All {workers} worker(s) failed, first failure: {first}")]
    AllWorkersFailed {
        workers: usize,
        #[source]
        first: Box<StartlineError>,
    },

    /// Textual unit or pinning description could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StartlineError {
    /// Whether this error is confined to a single worker rather than the
    /// launch as a whole.
    pub fn is_worker_local(&self) -> bool {
        matches!(
            self,
            StartlineError::Placement(_) | StartlineError::Workload(_)
        )
    }
}

/// Convenience type alias for Results using StartlineError
pub type StartlineResult<T> = std::result::Result<T, StartlineError>;

/// Short alias for [`StartlineResult`]
pub type Result<T> = StartlineResult<T>;

// ============================================
// From implementations for common error types
// ============================================

impl From<std::num::ParseIntError> for StartlineError {
    fn from(err: std::num::ParseIntError) -> Self {
        StartlineError::Parse(format!("Integer parse error: {}", err))
    }
}

impl From<toml::de::Error> for StartlineError {
    fn from(err: toml::de::Error) -> Self {
        StartlineError::Configuration(format!("TOML parse error: {}", err))
    }
}

impl From<serde_yaml::Error> for StartlineError {
    fn from(err: serde_yaml::Error) -> Self {
        StartlineError::Configuration(format!("YAML parse error: {}", err))
    }
}
