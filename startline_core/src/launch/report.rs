//! Per-worker results of a launch.

use std::time::Duration;

use crate::error::StartlineError;
use crate::placement::ExecutionUnit;

/// What happened to one worker.
#[derive(Debug)]
pub enum WorkerOutcome {
    /// Ran the workload to completion
    Completed {
        unit: Option<ExecutionUnit>,
        elapsed: Duration,
    },
    /// Could not bind to its unit and never reached the starting line
    PlacementFailed {
        unit: ExecutionUnit,
        error: StartlineError,
    },
    /// The workload returned an error or panicked
    WorkloadFailed {
        unit: Option<ExecutionUnit>,
        error: StartlineError,
    },
    /// Released with an abort signal before running anything
    Aborted { unit: Option<ExecutionUnit> },
}

impl WorkerOutcome {
    /// Unit the worker was assigned, if any.
    pub fn unit(&self) -> Option<ExecutionUnit> {
        match self {
            WorkerOutcome::Completed { unit, .. }
            | WorkerOutcome::WorkloadFailed { unit, .. }
            | WorkerOutcome::Aborted { unit } => *unit,
            WorkerOutcome::PlacementFailed { unit, .. } => Some(*unit),
        }
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            WorkerOutcome::Completed { elapsed, .. } => Some(*elapsed),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&StartlineError> {
        match self {
            WorkerOutcome::PlacementFailed { error, .. }
            | WorkerOutcome::WorkloadFailed { error, .. } => Some(error),
            _ => None,
        }
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        matches!(self, WorkerOutcome::Completed { .. })
    }

    fn into_error(self) -> Option<StartlineError> {
        match self {
            WorkerOutcome::PlacementFailed { error, .. }
            | WorkerOutcome::WorkloadFailed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Result cell owned by the launcher and written by exactly one worker.
#[derive(Debug, Default)]
pub struct WorkerSlot(Option<WorkerOutcome>);

impl WorkerSlot {
    pub(crate) fn record(&mut self, outcome: WorkerOutcome) {
        debug_assert!(self.0.is_none(), "worker slot written twice");
        self.0 = Some(outcome);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub(crate) fn take(&mut self) -> Option<WorkerOutcome> {
        self.0.take()
    }
}

/// Outcomes of every worker of a launch, in launch order.
#[derive(Debug)]
pub struct LaunchReport {
    outcomes: Vec<WorkerOutcome>,
}

impl LaunchReport {
    pub(crate) fn new(outcomes: Vec<WorkerOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcomes(&self) -> &[WorkerOutcome] {
        &self.outcomes
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkerOutcome> {
        self.outcomes.iter()
    }

    /// Elapsed time per worker, `None` where the worker did not complete.
    pub fn durations(&self) -> Vec<Option<Duration>> {
        self.outcomes.iter().map(WorkerOutcome::elapsed).collect()
    }

    pub fn completed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_completed()).count()
    }

    /// Workers that failed placement or their workload, with the error.
    pub fn failed_workers(&self) -> Vec<(usize, &StartlineError)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(index, outcome)| outcome.error().map(|e| (index, e)))
            .collect()
    }

    pub fn is_partial_failure(&self) -> bool {
        !self.failed_workers().is_empty()
    }

    /// Longest completed duration.
    pub fn max_elapsed(&self) -> Option<Duration> {
        self.outcomes.iter().filter_map(WorkerOutcome::elapsed).max()
    }

    /// Error to report when no worker completed.
    pub(crate) fn into_total_failure(self) -> StartlineError {
        let workers = self.outcomes.len();
        let first = self
            .outcomes
            .into_iter()
            .find_map(WorkerOutcome::into_error)
            .unwrap_or_else(|| StartlineError::Workload("no worker ran its workload".to_string()));
        StartlineError::AllWorkersFailed {
            workers,
            first: Box::new(first),
        }
    }
}

impl<'a> IntoIterator for &'a LaunchReport {
    type Item = &'a WorkerOutcome;
    type IntoIter = std::slice::Iter<'a, WorkerOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LaunchReport {
        LaunchReport::new(vec![
            WorkerOutcome::Completed {
                unit: Some(ExecutionUnit::Flat(0)),
                elapsed: Duration::from_millis(30),
            },
            WorkerOutcome::PlacementFailed {
                unit: ExecutionUnit::Flat(1),
                error: StartlineError::Placement("busy".into()),
            },
            WorkerOutcome::Completed {
                unit: Some(ExecutionUnit::Flat(2)),
                elapsed: Duration::from_millis(40),
            },
        ])
    }

    #[test]
    fn test_durations_in_launch_order() {
        let report = sample();
        assert_eq!(
            report.durations(),
            vec![
                Some(Duration::from_millis(30)),
                None,
                Some(Duration::from_millis(40))
            ]
        );
        assert_eq!(report.completed_count(), 2);
        assert_eq!(report.max_elapsed(), Some(Duration::from_millis(40)));
    }

    #[test]
    fn test_failed_workers() {
        let report = sample();
        let failed = report.failed_workers();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, 1);
        assert!(report.is_partial_failure());
        assert_eq!(report.outcomes()[1].unit(), Some(ExecutionUnit::Flat(1)));
    }

    #[test]
    fn test_total_failure_keeps_first_error() {
        let report = LaunchReport::new(vec![
            WorkerOutcome::Aborted { unit: None },
            WorkerOutcome::WorkloadFailed {
                unit: None,
                error: StartlineError::Workload("first".into()),
            },
            WorkerOutcome::WorkloadFailed {
                unit: None,
                error: StartlineError::Workload("second".into()),
            },
        ]);
        match report.into_total_failure() {
            StartlineError::AllWorkersFailed { workers, first } => {
                assert_eq!(workers, 3);
                assert_eq!(first.to_string(), "Workload error: first");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_slot_starts_empty() {
        let mut slot = WorkerSlot::default();
        assert!(slot.is_empty());
        slot.record(WorkerOutcome::Aborted { unit: None });
        assert!(!slot.is_empty());
        assert!(matches!(slot.take(), Some(WorkerOutcome::Aborted { .. })));
    }
}
