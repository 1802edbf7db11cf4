//! Synthetic CPU-bound workload used by the CLI.

use std::fmt;
use std::hint::black_box;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use startline_core::{StartlineError, StartlineResult, Workload};

/// Default number of counting steps per worker.
pub const DEFAULT_ITERATIONS: u64 = 1_000_000_000;

/// Arithmetic used for the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    Int,
    Double,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "int"),
            ValueType::Double => write!(f, "double"),
        }
    }
}

impl FromStr for ValueType {
    type Err = StartlineError;

    fn from_str(s: &str) -> StartlineResult<Self> {
        match s {
            "int" => Ok(ValueType::Int),
            "double" => Ok(ValueType::Double),
            other => Err(StartlineError::Parse(format!(
                "unknown value type `{}` (expected int or double)",
                other
            ))),
        }
    }
}

/// Counts a variable from zero up to `iterations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountingWorkload {
    pub iterations: u64,
    pub kind: ValueType,
}

impl CountingWorkload {
    pub fn new(iterations: u64, kind: ValueType) -> Self {
        Self { iterations, kind }
    }

    /// Run the count and return the final counter value.
    pub fn count(&self) -> f64 {
        match self.kind {
            ValueType::Int => {
                let mut value = 0u64;
                while black_box(value) < self.iterations {
                    value += 1;
                }
                value as f64
            }
            ValueType::Double => {
                let limit = self.iterations as f64;
                let mut value = 0.0f64;
                while black_box(value) < limit {
                    value += 1.0;
                }
                value
            }
        }
    }
}

impl Default for CountingWorkload {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS, ValueType::Int)
    }
}

impl Workload for CountingWorkload {
    fn run(&self) -> StartlineResult<()> {
        black_box(self.count());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_to_limit() {
        assert_eq!(CountingWorkload::new(1000, ValueType::Int).count(), 1000.0);
        assert_eq!(CountingWorkload::new(1000, ValueType::Double).count(), 1000.0);
        assert_eq!(CountingWorkload::new(0, ValueType::Int).count(), 0.0);
    }

    #[test]
    fn test_value_type_parse() {
        assert_eq!("int".parse::<ValueType>().unwrap(), ValueType::Int);
        assert_eq!("double".parse::<ValueType>().unwrap(), ValueType::Double);
        assert!("float".parse::<ValueType>().is_err());
        assert_eq!(ValueType::Double.to_string(), "double");
    }

    #[test]
    fn test_runs_as_workload() {
        let workload = CountingWorkload::new(10, ValueType::Double);
        assert!(workload.run().is_ok());
    }
}
