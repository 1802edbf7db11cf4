//! Pinning descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::unit::ExecutionUnit;

/// How worker threads are placed on execution units.
///
/// Exactly one policy is active per launch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PinningMode {
    /// Workers run unbound
    #[default]
    NoPinning,
    /// Workers are bound to consecutive units in launch order, starting at
    /// `start`. A grouped start walks the processor groups of the platform.
    Sequential {
        #[serde(default = "first_unit")]
        start: ExecutionUnit,
    },
    /// Worker `i` is bound to `units[i]`
    Explicit { units: Vec<ExecutionUnit> },
}

fn first_unit() -> ExecutionUnit {
    ExecutionUnit::Flat(0)
}

impl PinningMode {
    /// Sequential pinning from logical CPU 0.
    pub fn sequential() -> Self {
        PinningMode::Sequential {
            start: ExecutionUnit::Flat(0),
        }
    }

    /// Sequential pinning over processor groups from group 0, processor 0.
    pub fn sequential_grouped() -> Self {
        PinningMode::Sequential {
            start: ExecutionUnit::grouped(0, 0),
        }
    }

    pub fn explicit(units: impl Into<Vec<ExecutionUnit>>) -> Self {
        PinningMode::Explicit {
            units: units.into(),
        }
    }

    /// Units listed by an explicit policy, if that is the active one.
    pub fn explicit_units(&self) -> Option<&[ExecutionUnit]> {
        match self {
            PinningMode::Explicit { units } => Some(units),
            _ => None,
        }
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        !matches!(self, PinningMode::NoPinning)
    }
}

impl fmt::Display for PinningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinningMode::NoPinning => write!(f, "no pinning"),
            PinningMode::Sequential { start } => {
                write!(f, "sequential pinning starting from {}", start)
            }
            PinningMode::Explicit { units } => {
                write!(f, "pinning to selected units [")?;
                for (i, unit) in units.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", unit)?;
                }
                write!(f, "]")
            }
        }
    }
}
