//! Execution unit identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{StartlineError, StartlineResult};

/// Processor group id on grouped topologies.
pub type GroupId = u16;

/// Index of a logical processor inside its group.
pub type GroupIndex = u16;

/// Hardware execution unit a worker can be bound to.
///
/// Flat units are plain logical CPU indices. Grouped units address a
/// processor inside a processor group (a NUMA node on Linux hosts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecutionUnit {
    /// Logical CPU index
    Flat(usize),
    /// Processor `index` inside processor group `group`
    Grouped { group: GroupId, index: GroupIndex },
}

impl ExecutionUnit {
    /// Shorthand for a grouped unit.
    pub const fn grouped(group: GroupId, index: GroupIndex) -> Self {
        ExecutionUnit::Grouped { group, index }
    }

    #[inline]
    pub fn is_grouped(&self) -> bool {
        matches!(self, ExecutionUnit::Grouped { .. })
    }
}

impl fmt::Display for ExecutionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionUnit::Flat(index) => write!(f, "{}", index),
            ExecutionUnit::Grouped { group, index } => write!(f, "{}-{}", group, index),
        }
    }
}

impl FromStr for ExecutionUnit {
    type Err = StartlineError;

    /// Parses `"7"` as a flat unit and `"1-3"` as group 1, processor 3.
    fn from_str(s: &str) -> StartlineResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(StartlineError::Parse("empty execution unit".to_string()));
        }

        match s.split_once('-') {
            Some((group, index)) => {
                let group = group.trim().parse::<GroupId>().map_err(|e| {
                    StartlineError::Parse(format!("invalid group id in `{}`: {}", s, e))
                })?;
                let index = index.trim().parse::<GroupIndex>().map_err(|e| {
                    StartlineError::Parse(format!("invalid processor index in `{}`: {}", s, e))
                })?;
                Ok(ExecutionUnit::Grouped { group, index })
            }
            None => s
                .parse::<usize>()
                .map(ExecutionUnit::Flat)
                .map_err(|e| StartlineError::Parse(format!("invalid unit `{}`: {}", s, e))),
        }
    }
}

/// Parse a comma separated unit list such as `"0-1,0-2,1-3"` or `"2,4,6"`.
///
/// A single trailing comma is tolerated; empty items elsewhere are rejected.
pub fn parse_unit_list(s: &str) -> StartlineResult<Vec<ExecutionUnit>> {
    let s = s.trim();
    let s = s.strip_suffix(',').unwrap_or(s);
    if s.is_empty() {
        return Err(StartlineError::Parse("empty unit list".to_string()));
    }

    s.split(',')
        .map(|item| {
            if item.trim().is_empty() {
                Err(StartlineError::Parse(format!(
                    "unable to parse unit list, empty item in `{}`",
                    s
                )))
            } else {
                item.parse()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flat_and_grouped() {
        assert_eq!("7".parse::<ExecutionUnit>().unwrap(), ExecutionUnit::Flat(7));
        assert_eq!(
            " 1-3 ".parse::<ExecutionUnit>().unwrap(),
            ExecutionUnit::grouped(1, 3)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<ExecutionUnit>().is_err());
        assert!("a".parse::<ExecutionUnit>().is_err());
        assert!("1-".parse::<ExecutionUnit>().is_err());
        assert!("-1".parse::<ExecutionUnit>().is_err());
        assert!("70000-1".parse::<ExecutionUnit>().is_err());
    }

    #[test]
    fn test_display_matches_parse_syntax() {
        assert_eq!(ExecutionUnit::Flat(12).to_string(), "12");
        assert_eq!(ExecutionUnit::grouped(0, 5).to_string(), "0-5");
    }

    #[test]
    fn test_unit_list() {
        let units = parse_unit_list("0-1,0-2,1-3").unwrap();
        assert_eq!(
            units,
            vec![
                ExecutionUnit::grouped(0, 1),
                ExecutionUnit::grouped(0, 2),
                ExecutionUnit::grouped(1, 3)
            ]
        );

        assert_eq!(parse_unit_list("4,").unwrap(), vec![ExecutionUnit::Flat(4)]);
        assert!(parse_unit_list("").is_err());
        assert!(parse_unit_list("1,,2").is_err());
    }

    #[test]
    fn test_ordering_is_group_major() {
        let mut units = vec![
            ExecutionUnit::grouped(1, 0),
            ExecutionUnit::grouped(0, 2),
            ExecutionUnit::grouped(0, 1),
        ];
        units.sort();
        assert_eq!(
            units,
            vec![
                ExecutionUnit::grouped(0, 1),
                ExecutionUnit::grouped(0, 2),
                ExecutionUnit::grouped(1, 0)
            ]
        );
    }
}
