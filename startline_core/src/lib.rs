//! # startline core
//!
//! Launches a fixed number of worker threads that bind themselves to
//! execution units, line up at a common starting line, and time one run of
//! a workload each.
//!
//! - **Placement**: [`PinningMode`] describes where workers go, a
//!   [`UnitSelector`] turns it into one unit per worker
//! - **Startup barrier**: [`StartupBarrier`] parks workers until a
//!   [`StartGuard`] says proceed, or aborts them when the guard is dropped
//! - **Launch**: [`Launcher`] ties it together and returns a [`LaunchReport`]
//! - **Platform**: [`Platform`] abstracts thread binding and the processor
//!   group layout, [`HostPlatform`] implements it for the running machine
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use startline_core::{run, ExecutionUnit, PinningMode, RunConfig, StartlineResult};
//!
//! let config = RunConfig::new(
//!     None,
//!     PinningMode::explicit(vec![ExecutionUnit::Flat(0), ExecutionUnit::Flat(2)]),
//! );
//! let report = run(&config, &|| -> StartlineResult<()> {
//!     let mut acc = 0u64;
//!     for i in 0..10_000_000u64 {
//!         acc = std::hint::black_box(acc.wrapping_add(i));
//!     }
//!     Ok(())
//! })
//! .unwrap();
//!
//! assert_eq!(report.len(), 2);
//! ```

pub mod config;
pub mod error;
pub mod launch;
pub mod placement;
pub mod platform;
pub mod sync;
pub mod workload;

pub use config::{LaunchConfig, LaunchOptions, RunConfig};
pub use error::{Result, StartlineError, StartlineResult};
pub use launch::{detect_worker_count, run, LaunchReport, Launcher, WorkerOutcome};
pub use placement::{selector_for, ExecutionUnit, PinningMode, UnitSelector};
pub use platform::{HostPlatform, Platform};
pub use sync::{BarrierState, StartGuard, StartSignal, StartupBarrier};
pub use workload::Workload;
