//! Human and JSON renderings of the host layout and of a launch report.

use serde::Serialize;
use startline_core::{HostPlatform, LaunchReport, RunConfig, StartlineResult, WorkerOutcome};

use crate::cli_output;
use crate::workload::CountingWorkload;

/// Processor counts as seen by the different host APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    pub logical_cpus: usize,
    pub physical_cpus: usize,
    pub available_parallelism: Option<usize>,
    pub affinity_cpus: usize,
    /// Logical CPUs in each processor group
    pub groups: Vec<Vec<usize>>,
}

impl SystemInfo {
    pub fn collect(platform: &HostPlatform) -> Self {
        Self {
            logical_cpus: num_cpus::get(),
            physical_cpus: num_cpus::get_physical(),
            available_parallelism: std::thread::available_parallelism()
                .ok()
                .map(|n| n.get()),
            affinity_cpus: platform.logical_cpus(),
            groups: platform.groups().to_vec(),
        }
    }

    pub fn print(&self) {
        cli_output::header("some system related information:");
        cli_output::field("logical cpus", self.logical_cpus);
        cli_output::field("physical cpus", self.physical_cpus);
        match self.available_parallelism {
            Some(n) => cli_output::field("available parallelism", n),
            None => cli_output::field("available parallelism", "unknown"),
        }
        cli_output::field("cpus in process affinity", self.affinity_cpus);
        cli_output::field("processor groups", self.groups.len());
        for (group, cpus) in self.groups.iter().enumerate() {
            cli_output::field(
                &format!("  group {}", group),
                format!("{} processor(s): {}", cpus.len(), format_cpu_list(cpus)),
            );
        }
    }
}

/// One worker's line in the JSON report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerRecord {
    pub index: usize,
    pub unit: Option<String>,
    pub elapsed_secs: Option<f64>,
    pub status: &'static str,
    pub error: Option<String>,
}

impl WorkerRecord {
    pub fn from_outcome(index: usize, outcome: &WorkerOutcome) -> Self {
        let status = match outcome {
            WorkerOutcome::Completed { .. } => "completed",
            WorkerOutcome::PlacementFailed { .. } => "placement_failed",
            WorkerOutcome::WorkloadFailed { .. } => "workload_failed",
            WorkerOutcome::Aborted { .. } => "aborted",
        };
        Self {
            index,
            unit: outcome.unit().map(|u| u.to_string()),
            elapsed_secs: outcome.elapsed().map(|d| d.as_secs_f64()),
            status,
            error: outcome.error().map(|e| e.to_string()),
        }
    }
}

/// Everything `--json` prints.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub system: SystemInfo,
    pub placement: String,
    pub value_type: String,
    pub iterations: u64,
    pub workers: Vec<WorkerRecord>,
}

impl RunSummary {
    pub fn new(
        system: SystemInfo,
        config: &RunConfig,
        workload: &CountingWorkload,
        report: &LaunchReport,
    ) -> Self {
        Self {
            system,
            placement: config.placement.to_string(),
            value_type: workload.kind.to_string(),
            iterations: workload.iterations,
            workers: report
                .iter()
                .enumerate()
                .map(|(index, outcome)| WorkerRecord::from_outcome(index, outcome))
                .collect(),
        }
    }

    pub fn to_json(&self) -> StartlineResult<String> {
        Ok(serde_json::to_string_pretty(self).map_err(std::io::Error::from)?)
    }
}

/// Elapsed seconds with millisecond precision, or why there is no time.
pub fn describe_outcome(outcome: &WorkerOutcome) -> String {
    let unit = outcome
        .unit()
        .map(|u| format!(" (unit {})", u))
        .unwrap_or_default();
    match outcome {
        WorkerOutcome::Completed { elapsed, .. } => {
            format!("{:.3}s{}", elapsed.as_secs_f64(), unit)
        }
        WorkerOutcome::PlacementFailed { error, .. } => format!("not placed{}: {}", unit, error),
        WorkerOutcome::WorkloadFailed { error, .. } => format!("failed{}: {}", unit, error),
        WorkerOutcome::Aborted { .. } => format!("aborted before start{}", unit),
    }
}

pub fn print_report(report: &LaunchReport) {
    cli_output::header("results:");
    for (index, outcome) in report.iter().enumerate() {
        let line = format!("worker #{}: {}", index + 1, describe_outcome(outcome));
        match outcome {
            WorkerOutcome::Completed { .. } => cli_output::success(&line),
            WorkerOutcome::Aborted { .. } => cli_output::warn(&line),
            _ => cli_output::failure(&line),
        }
    }
    if let Some(slowest) = report.max_elapsed() {
        cli_output::field("slowest worker", format!("{:.3}s", slowest.as_secs_f64()));
    }
}

/// Render `[0, 1, 2, 3, 8]` as `0-3,8`.
pub fn format_cpu_list(cpus: &[usize]) -> String {
    let mut parts = Vec::new();
    let mut iter = cpus.iter().copied().peekable();
    while let Some(first) = iter.next() {
        let mut last = first;
        while iter.peek() == Some(&(last + 1)) {
            last += 1;
            iter.next();
        }
        if first == last {
            parts.push(first.to_string());
        } else {
            parts.push(format!("{}-{}", first, last));
        }
    }
    parts.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use startline_core::{ExecutionUnit, StartlineError};
    use std::time::Duration;

    #[test]
    fn test_format_cpu_list() {
        assert_eq!(format_cpu_list(&[0, 1, 2, 3, 8]), "0-3,8");
        assert_eq!(format_cpu_list(&[5]), "5");
        assert_eq!(format_cpu_list(&[]), "");
        assert_eq!(format_cpu_list(&[1, 3, 4]), "1,3-4");
    }

    #[test]
    fn test_describe_completed_uses_milliseconds() {
        let outcome = WorkerOutcome::Completed {
            unit: Some(ExecutionUnit::grouped(1, 2)),
            elapsed: Duration::from_millis(1234),
        };
        assert_eq!(describe_outcome(&outcome), "1.234s (unit 1-2)");
    }

    #[test]
    fn test_describe_failures() {
        let outcome = WorkerOutcome::PlacementFailed {
            unit: ExecutionUnit::Flat(9),
            error: StartlineError::Placement("cpu 9 offline".into()),
        };
        let text = describe_outcome(&outcome);
        assert!(text.starts_with("not placed (unit 9)"));
        assert!(text.contains("cpu 9 offline"));

        let outcome = WorkerOutcome::Aborted { unit: None };
        assert_eq!(describe_outcome(&outcome), "aborted before start");
    }

    #[test]
    fn test_worker_record_json() {
        let outcome = WorkerOutcome::Completed {
            unit: Some(ExecutionUnit::Flat(3)),
            elapsed: Duration::from_millis(500),
        };
        let record = WorkerRecord::from_outcome(0, &outcome);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["unit"], "3");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["elapsed_secs"], 0.5);
        assert!(json["error"].is_null());
    }
}
