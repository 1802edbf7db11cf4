//! Synchronization primitives for worker startup.

pub mod barrier;

pub use barrier::{BarrierState, StartGuard, StartSignal, StartupBarrier};
