//! Platform capabilities used by the launcher: binding the calling thread to
//! an execution unit, and describing the processor group layout.
//!
//! [`HostPlatform`] is the implementation for the machine we run on. On
//! Linux processor groups are the NUMA nodes listed under
//! `/sys/devices/system/node`; everywhere else (and on Linux without NUMA
//! information) there is a single group holding every logical CPU.

use crate::error::{StartlineError, StartlineResult};
use crate::placement::ExecutionUnit;

/// Hardware-facing operations the launcher depends on.
///
/// Implementations must be shareable between worker threads, since every
/// worker binds itself through the same platform reference.
pub trait Platform: Sync {
    /// Bind the calling thread to `unit`.
    fn bind_current_thread(&self, unit: ExecutionUnit) -> StartlineResult<()>;

    /// Number of processor groups.
    fn group_count(&self) -> StartlineResult<usize>;

    /// Number of logical processors in `group`.
    fn group_capacity(&self, group: usize) -> StartlineResult<usize>;

    /// Ask the OS to schedule the calling thread ahead of normal threads.
    ///
    /// Platforms without such a notion leave the thread as it is.
    fn raise_current_thread_priority(&self) -> StartlineResult<()> {
        Ok(())
    }
}

impl<P: Platform + ?Sized> Platform for &P {
    fn bind_current_thread(&self, unit: ExecutionUnit) -> StartlineResult<()> {
        (**self).bind_current_thread(unit)
    }

    fn group_count(&self) -> StartlineResult<usize> {
        (**self).group_count()
    }

    fn group_capacity(&self, group: usize) -> StartlineResult<usize> {
        (**self).group_capacity(group)
    }

    fn raise_current_thread_priority(&self) -> StartlineResult<()> {
        (**self).raise_current_thread_priority()
    }
}

// ============================================================================
// Host platform
// ============================================================================

/// The machine the process runs on.
#[derive(Debug, Clone)]
pub struct HostPlatform {
    core_ids: Vec<core_affinity::CoreId>,
    groups: Vec<Vec<usize>>,
}

impl HostPlatform {
    /// Snapshot the host's cores and processor groups.
    pub fn detect() -> Self {
        let core_ids = core_affinity::get_core_ids().unwrap_or_default();
        let groups = detect_processor_groups(&core_ids);

        log::debug!(
            "host platform: {} core id(s), {} processor group(s)",
            core_ids.len(),
            groups.len()
        );

        Self { core_ids, groups }
    }

    /// Logical CPUs of each processor group.
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// Number of logical CPUs this process may run on.
    pub fn logical_cpus(&self) -> usize {
        self.core_ids.len()
    }

    /// Resolve a unit to the logical CPU index it names.
    pub fn resolve_cpu(&self, unit: ExecutionUnit) -> StartlineResult<usize> {
        match unit {
            ExecutionUnit::Flat(cpu) => Ok(cpu),
            ExecutionUnit::Grouped { group, index } => self
                .groups
                .get(group as usize)
                .and_then(|cpus| cpus.get(index as usize))
                .copied()
                .ok_or_else(|| {
                    StartlineError::Placement(format!(
                        "unit {} does not exist (total groups: {})",
                        unit,
                        self.groups.len()
                    ))
                }),
        }
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::detect()
    }
}

impl Platform for HostPlatform {
    fn bind_current_thread(&self, unit: ExecutionUnit) -> StartlineResult<()> {
        let cpu = self.resolve_cpu(unit)?;

        let core_id = self
            .core_ids
            .iter()
            .copied()
            .find(|id| id.id == cpu)
            .ok_or_else(|| {
                StartlineError::Placement(format!(
                    "logical processor {} is not available to this process",
                    cpu
                ))
            })?;

        if core_affinity::set_for_current(core_id) {
            Ok(())
        } else {
            Err(StartlineError::Placement(format!(
                "failed to set thread affinity to {} (logical processor {})",
                unit, cpu
            )))
        }
    }

    fn group_count(&self) -> StartlineResult<usize> {
        if self.groups.is_empty() {
            return Err(StartlineError::TopologyQuery(
                "unable to detect processor group count".to_string(),
            ));
        }
        Ok(self.groups.len())
    }

    fn group_capacity(&self, group: usize) -> StartlineResult<usize> {
        self.groups.get(group).map(Vec::len).ok_or_else(|| {
            StartlineError::TopologyQuery(format!(
                "unable to detect processor count for group {} (total groups: {})",
                group,
                self.groups.len()
            ))
        })
    }

    #[cfg(unix)]
    fn raise_current_thread_priority(&self) -> StartlineResult<()> {
        raise_thread_priority_unix()
    }
}

/// Nice value requested for workers that ask for a priority boost.
#[cfg(unix)]
const RAISED_NICE: libc::c_int = -5;

#[cfg(unix)]
fn raise_thread_priority_unix() -> StartlineResult<()> {
    // SAFETY: who = 0 targets the calling thread on Linux and the calling
    // process elsewhere; both are valid targets for setpriority.
    let result = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, RAISED_NICE) };
    if result == 0 {
        Ok(())
    } else {
        let err = std::io::Error::last_os_error();
        Err(StartlineError::Placement(format!(
            "setpriority({}) failed: {}",
            RAISED_NICE, err
        )))
    }
}

// ============================================================================
// Topology detection
// ============================================================================

fn detect_processor_groups(core_ids: &[core_affinity::CoreId]) -> Vec<Vec<usize>> {
    #[cfg(target_os = "linux")]
    {
        let numa = read_numa_groups(std::path::Path::new("/sys/devices/system/node"));
        if !numa.is_empty() {
            return numa;
        }
    }

    let cpus: Vec<usize> = if core_ids.is_empty() {
        (0..num_cpus::get()).collect()
    } else {
        core_ids.iter().map(|id| id.id).collect()
    };
    vec![cpus]
}

/// Read `node<N>/cpulist` entries below `base`, ordered by node id.
///
/// Nodes are renumbered densely, so a machine exposing `node0` and `node2`
/// has groups 0 and 1. Nodes without CPUs are kept as empty groups.
#[cfg(target_os = "linux")]
fn read_numa_groups(base: &std::path::Path) -> Vec<Vec<usize>> {
    let Ok(entries) = std::fs::read_dir(base) else {
        return Vec::new();
    };

    let mut nodes: Vec<(usize, Vec<usize>)> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let node_id = name.to_string_lossy().strip_prefix("node")?.parse::<usize>().ok()?;
            let cpulist = std::fs::read_to_string(entry.path().join("cpulist")).ok()?;
            Some((node_id, parse_cpu_list(cpulist.trim())))
        })
        .collect();

    nodes.sort_by_key(|(id, _)| *id);
    nodes.into_iter().map(|(_, cpus)| cpus).collect()
}

/// Parse a CPU list string like "0-3,7,9-11" into individual CPU indices.
pub fn parse_cpu_list(s: &str) -> Vec<usize> {
    let mut cpus = Vec::new();

    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            if let (Ok(start), Ok(end)) = (start.parse::<usize>(), end.parse::<usize>()) {
                cpus.extend(start..=end);
            }
        } else if let Ok(cpu) = part.parse::<usize>() {
            cpus.push(cpu);
        }
    }

    cpus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpu_list() {
        assert_eq!(parse_cpu_list("0-3"), vec![0, 1, 2, 3]);
        assert_eq!(parse_cpu_list("0,2,4"), vec![0, 2, 4]);
        assert_eq!(parse_cpu_list("0-2,5,7-8"), vec![0, 1, 2, 5, 7, 8]);
        assert_eq!(parse_cpu_list(""), Vec::<usize>::new());
    }

    #[test]
    fn test_host_topology_is_never_empty() {
        let host = HostPlatform::detect();
        let groups = host.group_count().unwrap();
        assert!(groups >= 1);
        let total: usize = (0..groups).map(|g| host.group_capacity(g).unwrap()).sum();
        assert!(total >= 1);
    }

    #[test]
    fn test_capacity_of_missing_group_is_a_query_error() {
        let host = HostPlatform::detect();
        let missing = host.group_count().unwrap();
        assert!(matches!(
            host.group_capacity(missing),
            Err(StartlineError::TopologyQuery(_))
        ));
    }

    #[test]
    fn test_bind_to_nonexistent_unit_fails() {
        let host = HostPlatform::detect();
        assert!(matches!(
            host.bind_current_thread(ExecutionUnit::Flat(usize::MAX)),
            Err(StartlineError::Placement(_))
        ));
        assert!(matches!(
            host.bind_current_thread(ExecutionUnit::grouped(u16::MAX, 0)),
            Err(StartlineError::Placement(_))
        ));
    }

    #[test]
    fn test_resolve_grouped_unit() {
        let host = HostPlatform {
            core_ids: Vec::new(),
            groups: vec![vec![0, 1], vec![8, 9, 10]],
        };
        assert_eq!(host.resolve_cpu(ExecutionUnit::grouped(1, 2)).unwrap(), 10);
        assert_eq!(host.resolve_cpu(ExecutionUnit::Flat(3)).unwrap(), 3);
        assert!(host.resolve_cpu(ExecutionUnit::grouped(0, 2)).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_read_numa_groups_from_sysfs_layout() {
        let dir = tempfile::tempdir().unwrap();
        for (node, list) in [("node0", "0-1"), ("node2", "4,6"), ("possible", "0-2")] {
            let path = dir.path().join(node);
            std::fs::create_dir(&path).unwrap();
            std::fs::write(path.join("cpulist"), format!("{}\n", list)).unwrap();
        }

        let groups = read_numa_groups(dir.path());
        assert_eq!(groups, vec![vec![0, 1], vec![4, 6]]);
    }
}
