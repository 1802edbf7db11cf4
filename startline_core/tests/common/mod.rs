//! Shared test utilities for startline_core integration tests

#![allow(dead_code)]

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use startline_core::{ExecutionUnit, Platform, StartlineError, StartlineResult};

/// Platform double with a fixed group layout.
///
/// Records every successful bind and every capacity query with the instant
/// it happened, can refuse chosen units, and can make capacity queries slow.
/// Capacity queries run on the launching thread, so a slow query stretches
/// the spawn loop while already-spawned workers wait.
#[derive(Default)]
pub struct StubPlatform {
    pub capacities: Vec<usize>,
    pub refuse: Vec<ExecutionUnit>,
    pub query_delay: Duration,
    pub binds: Mutex<Vec<(ExecutionUnit, Instant)>>,
    pub capacity_queries: Mutex<Vec<(usize, Instant)>>,
}

impl StubPlatform {
    pub fn with_groups(capacities: &[usize]) -> Self {
        Self {
            capacities: capacities.to_vec(),
            ..Default::default()
        }
    }

    pub fn binds(&self) -> Vec<(ExecutionUnit, Instant)> {
        self.binds.lock().clone()
    }

    pub fn bound_units(&self) -> Vec<ExecutionUnit> {
        let mut units: Vec<_> = self.binds.lock().iter().map(|(u, _)| *u).collect();
        units.sort();
        units
    }

    pub fn capacity_queries(&self) -> Vec<usize> {
        self.capacity_queries.lock().iter().map(|(g, _)| *g).collect()
    }

    pub fn last_query_at(&self) -> Option<Instant> {
        self.capacity_queries.lock().iter().map(|(_, at)| *at).max()
    }
}

impl Platform for StubPlatform {
    fn bind_current_thread(&self, unit: ExecutionUnit) -> StartlineResult<()> {
        if self.refuse.contains(&unit) {
            return Err(StartlineError::Placement(format!("unit {} refused", unit)));
        }

        self.binds.lock().push((unit, Instant::now()));
        Ok(())
    }

    fn group_count(&self) -> StartlineResult<usize> {
        Ok(self.capacities.len())
    }

    fn group_capacity(&self, group: usize) -> StartlineResult<usize> {
        std::thread::sleep(self.query_delay);
        self.capacity_queries.lock().push((group, Instant::now()));
        self.capacities
            .get(group)
            .copied()
            .ok_or_else(|| StartlineError::TopologyQuery(format!("no group {}", group)))
    }
}
