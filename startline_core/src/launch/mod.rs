//! Launching workers from a common starting line.
//!
//! # Usage
//!
//! ```rust,no_run
//! use startline_core::{Launcher, RunConfig, StartlineResult};
//!
//! let config = RunConfig::unpinned(4);
//! let report = Launcher::host()
//!     .run(&config, &|| -> StartlineResult<()> {
//!         std::thread::sleep(std::time::Duration::from_millis(10));
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! for elapsed in report.durations() {
//!     println!("{:?}", elapsed);
//! }
//! ```
//!
//! Setup either succeeds for every worker or is abandoned as a whole: if the
//! selector or the OS fails while workers are being spawned, the start guard
//! is dropped, the already-spawned workers are released with an abort
//! signal, joined, and the error is returned.

mod report;
mod worker;

use std::any::Any;
use std::thread;

use crate::config::{LaunchOptions, RunConfig};
use crate::error::{StartlineError, StartlineResult};
use crate::placement::{selector_for, ExecutionUnit};
use crate::platform::{HostPlatform, Platform};
use crate::sync::StartupBarrier;
use crate::workload::Workload;

pub use report::{LaunchReport, WorkerOutcome, WorkerSlot};
use worker::Worker;

/// Workers whose thread panicked: index, assigned unit, panic message.
type PanickedWorkers = Vec<(usize, Option<ExecutionUnit>, String)>;

/// Number of workers `config` asks for.
pub fn detect_worker_count(config: &RunConfig) -> StartlineResult<usize> {
    let count = config.worker_count()?;
    if let (Some(units), Some(threads)) = (config.placement.explicit_units(), config.threads) {
        if threads > units.len() {
            log::debug!(
                "thread count {} capped to {} explicitly listed unit(s)",
                threads,
                units.len()
            );
        }
    }
    Ok(count)
}

/// Run `config` on the host platform with default options.
pub fn run<W>(config: &RunConfig, workload: &W) -> StartlineResult<LaunchReport>
where
    W: Workload + ?Sized,
{
    Launcher::host().run(config, workload)
}

/// Spawns, releases and joins one batch of workers.
#[derive(Debug, Clone)]
pub struct Launcher<P: Platform> {
    platform: P,
    options: LaunchOptions,
}

impl Launcher<HostPlatform> {
    /// Launcher for the machine we are running on.
    pub fn host() -> Self {
        Self::new(HostPlatform::detect())
    }
}

impl<P: Platform> Launcher<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            options: LaunchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LaunchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }

    /// Launch the workers described by `config`, each running `workload`
    /// once, and wait for all of them.
    ///
    /// Returns `Err` when setup could not complete, or when no worker
    /// completed its workload. Individual placement and workload failures
    /// are reported per worker in the [`LaunchReport`].
    pub fn run<W>(&self, config: &RunConfig, workload: &W) -> StartlineResult<LaunchReport>
    where
        W: Workload + ?Sized,
    {
        let workers = detect_worker_count(config)?;
        log::info!("thread(s) to be used: {}", workers);

        let mut selector = selector_for(&config.placement, &self.platform)?;
        let barrier = StartupBarrier::new(workers);

        let mut slots: Vec<WorkerSlot> = (0..workers).map(|_| WorkerSlot::default()).collect();
        let slot_refs: Vec<&mut WorkerSlot> = slots.iter_mut().collect();

        let panicked = thread::scope(|scope| -> StartlineResult<PanickedWorkers> {
            let guard = barrier.guard();
            let mut handles = Vec::with_capacity(workers);

            for (index, slot) in slot_refs.into_iter().enumerate() {
                let unit = selector.current()?;
                match unit {
                    Some(unit) => log::info!("starting worker #{} on {}", index + 1, unit),
                    None => log::debug!("starting worker #{}", index + 1),
                }

                let worker = Worker {
                    index,
                    unit,
                    barrier: &barrier,
                    platform: &self.platform,
                    workload,
                    raise_priority: self.options.raise_priority,
                };
                let handle = self
                    .thread_builder(index)
                    .spawn_scoped(scope, move || worker.run(slot))
                    .map_err(StartlineError::Spawn)?;
                handles.push((index, unit, handle));

                selector.advance()?;
            }

            log::info!("sending start signal to {} worker(s)", workers);
            guard.proceed();

            Ok(handles
                .into_iter()
                .filter_map(|(index, unit, handle)| {
                    handle
                        .join()
                        .err()
                        .map(|payload| (index, unit, panic_message(payload.as_ref())))
                })
                .collect())
        });

        let panicked = match panicked {
            Ok(panicked) => panicked,
            Err(e) => {
                log::error!("launch aborted during setup: {}", e);
                return Err(e);
            }
        };

        for (index, unit, message) in panicked {
            log::error!("worker #{} panicked: {}", index + 1, message);
            slots[index].record(WorkerOutcome::WorkloadFailed {
                unit,
                error: StartlineError::Workload(format!("worker panicked: {}", message)),
            });
        }

        let outcomes = slots
            .iter_mut()
            .map(|slot| slot.take().unwrap_or(WorkerOutcome::Aborted { unit: None }))
            .collect();
        let report = LaunchReport::new(outcomes);

        if report.completed_count() == 0 {
            return Err(report.into_total_failure());
        }
        for (index, error) in report.failed_workers() {
            log::warn!("worker #{} produced no result: {}", index + 1, error);
        }
        Ok(report)
    }

    fn thread_builder(&self, index: usize) -> thread::Builder {
        let builder =
            thread::Builder::new().name(format!("{}-{}", self.options.thread_name_prefix, index));
        match self.options.stack_size {
            Some(size) => builder.stack_size(size),
            None => builder,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
