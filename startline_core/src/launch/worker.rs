//! Body of a launched worker thread.

use std::time::Instant;

use crate::placement::ExecutionUnit;
use crate::platform::Platform;
use crate::sync::{StartSignal, StartupBarrier};
use crate::workload::Workload;

use super::report::{WorkerOutcome, WorkerSlot};

/// Everything a worker borrows from the launcher.
pub(crate) struct Worker<'a, P: ?Sized, W: ?Sized> {
    pub index: usize,
    pub unit: Option<ExecutionUnit>,
    pub barrier: &'a StartupBarrier,
    pub platform: &'a P,
    pub workload: &'a W,
    pub raise_priority: bool,
}

impl<P, W> Worker<'_, P, W>
where
    P: Platform + ?Sized,
    W: Workload + ?Sized,
{
    /// Bind, wait at the starting line, then time the workload.
    ///
    /// A worker that cannot bind never touches the barrier.
    pub fn run(self, slot: &mut WorkerSlot) {
        let number = self.index + 1;

        if let Some(unit) = self.unit {
            if let Err(error) = self.platform.bind_current_thread(unit) {
                log::error!("worker #{}: unable to bind to {}: {}", number, unit, error);
                slot.record(WorkerOutcome::PlacementFailed { unit, error });
                return;
            }
            log::debug!("worker #{}: bound to {}", number, unit);
        }

        if self.raise_priority {
            if let Err(e) = self.platform.raise_current_thread_priority() {
                log::warn!("worker #{}: priority left unchanged: {}", number, e);
            }
        }

        if self.barrier.wait() == StartSignal::Abort {
            log::debug!("worker #{}: shutdown requested before start", number);
            slot.record(WorkerOutcome::Aborted { unit: self.unit });
            return;
        }

        let started_at = Instant::now();
        let result = self.workload.run();
        let elapsed = started_at.elapsed();

        slot.record(match result {
            Ok(()) => WorkerOutcome::Completed {
                unit: self.unit,
                elapsed,
            },
            Err(error) => {
                log::error!("worker #{}: workload failed: {}", number, error);
                WorkerOutcome::WorkloadFailed {
                    unit: self.unit,
                    error,
                }
            }
        });
    }
}
