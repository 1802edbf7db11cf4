//! startline command line tool
//!
//! Parses run arguments, launches [`workload::CountingWorkload`] through
//! `startline_core`, and prints the host layout and per-worker timings.

pub mod args;
pub mod cli_output;
pub mod report;
pub mod workload;
