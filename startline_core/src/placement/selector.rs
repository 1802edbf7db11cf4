//! Placement selectors: cursors yielding the unit for each launched worker.
//!
//! The launcher's spawn loop only ever calls [`UnitSelector::current`] and
//! [`UnitSelector::advance`], so it stays the same whichever policy is
//! active. [`selector_for`] picks the implementation from the run's
//! [`PinningMode`].

use crate::error::{StartlineError, StartlineResult};
use crate::platform::Platform;

use super::mode::PinningMode;
use super::unit::{ExecutionUnit, GroupId, GroupIndex};

/// Cursor over target execution units.
pub trait UnitSelector {
    /// Unit for the next worker, `None` when workers run unbound.
    fn current(&self) -> StartlineResult<Option<ExecutionUnit>>;

    /// Move on to the unit for the following worker.
    fn advance(&mut self) -> StartlineResult<()>;
}

/// Build the selector for `mode`.
///
/// Only grouped sequential pinning touches `platform` here; it reads the
/// group count and the start group's capacity up front.
pub fn selector_for<'p, P>(
    mode: &PinningMode,
    platform: &'p P,
) -> StartlineResult<Box<dyn UnitSelector + 'p>>
where
    P: Platform + ?Sized,
{
    let selector: Box<dyn UnitSelector + 'p> = match mode {
        PinningMode::NoPinning => {
            log::info!("no pinning will be used");
            Box::new(NoPinningSelector)
        }
        PinningMode::Sequential {
            start: ExecutionUnit::Flat(start),
        } => {
            log::info!("sequential pinning will be used (starting from {})", start);
            Box::new(SequentialSelector::new(*start))
        }
        PinningMode::Sequential {
            start: ExecutionUnit::Grouped { group, index },
        } => {
            log::info!(
                "sequential pinning over processor groups will be used (starting from {}-{})",
                group,
                index
            );
            Box::new(GroupedSequentialSelector::new(platform, *group, *index)?)
        }
        PinningMode::Explicit { units } => {
            log::info!("pinning to {} selected unit(s) will be used", units.len());
            Box::new(ExplicitSelector::new(units.clone()))
        }
    };
    Ok(selector)
}

// ============================================================================
// No pinning
// ============================================================================

/// Selector for unbound workers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPinningSelector;

impl UnitSelector for NoPinningSelector {
    fn current(&self) -> StartlineResult<Option<ExecutionUnit>> {
        Ok(None)
    }

    fn advance(&mut self) -> StartlineResult<()> {
        Ok(())
    }
}

// ============================================================================
// Flat sequential
// ============================================================================

/// Walks flat units `start, start + 1, ...`.
///
/// Unit existence is not checked here; binding to a missing unit fails in
/// the worker.
#[derive(Debug, Clone)]
pub struct SequentialSelector {
    cursor: usize,
}

impl SequentialSelector {
    pub fn new(start: usize) -> Self {
        Self { cursor: start }
    }
}

impl UnitSelector for SequentialSelector {
    fn current(&self) -> StartlineResult<Option<ExecutionUnit>> {
        Ok(Some(ExecutionUnit::Flat(self.cursor)))
    }

    fn advance(&mut self) -> StartlineResult<()> {
        self.cursor = self.cursor.checked_add(1).ok_or_else(|| {
            StartlineError::Placement("logical processor index overflow".to_string())
        })?;
        Ok(())
    }
}

// ============================================================================
// Explicit list
// ============================================================================

/// Hands out a fixed list of units in order.
#[derive(Debug, Clone)]
pub struct ExplicitSelector {
    units: Vec<ExecutionUnit>,
    cursor: usize,
}

impl ExplicitSelector {
    pub fn new(units: Vec<ExecutionUnit>) -> Self {
        Self { units, cursor: 0 }
    }
}

impl UnitSelector for ExplicitSelector {
    fn current(&self) -> StartlineResult<Option<ExecutionUnit>> {
        self.units.get(self.cursor).copied().map(Some).ok_or_else(|| {
            StartlineError::Placement(format!(
                "selected unit #{} requested, but only {} unit(s) were listed",
                self.cursor + 1,
                self.units.len()
            ))
        })
    }

    fn advance(&mut self) -> StartlineResult<()> {
        self.cursor = self.cursor.saturating_add(1);
        Ok(())
    }
}

// ============================================================================
// Grouped sequential
// ============================================================================

/// Walks processors group by group: `g-0, g-1, ...` until the group's
/// capacity is reached, then the first processor of the next non-empty
/// group.
///
/// Capacities are asked from the platform at most once per group and kept
/// for the selector's lifetime, even if the platform would report a
/// different value later.
pub struct GroupedSequentialSelector<'p, P: Platform + ?Sized> {
    platform: &'p P,
    total_groups: usize,
    capacities: Vec<Option<usize>>,
    /// `None` once every group has been used up.
    position: Option<(usize, usize)>,
}

impl<'p, P: Platform + ?Sized> GroupedSequentialSelector<'p, P> {
    /// Start at processor `index` of `group`.
    pub fn new(platform: &'p P, group: GroupId, index: GroupIndex) -> StartlineResult<Self> {
        let total_groups = platform.group_count()?;
        if total_groups == 0 {
            return Err(StartlineError::TopologyQuery(
                "platform reports no processor groups".to_string(),
            ));
        }

        let (group, index) = (group as usize, index as usize);
        if group >= total_groups {
            return Err(StartlineError::Placement(format!(
                "processor group {} does not exist (total groups: {})",
                group, total_groups
            )));
        }

        let mut selector = Self {
            platform,
            total_groups,
            capacities: vec![None; total_groups],
            position: Some((group, index)),
        };

        let capacity = selector.capacity(group)?;
        log::info!(
            "starting from group {} with {} processor(s)",
            group,
            capacity
        );
        if index >= capacity {
            return Err(StartlineError::Placement(format!(
                "processor {} does not exist in group {} ({} processor(s))",
                index, group, capacity
            )));
        }

        Ok(selector)
    }

    fn capacity(&mut self, group: usize) -> StartlineResult<usize> {
        if let Some(capacity) = self.capacities[group] {
            return Ok(capacity);
        }
        let capacity = self.platform.group_capacity(group)?;
        self.capacities[group] = Some(capacity);
        Ok(capacity)
    }

    fn exhausted_error(&self) -> StartlineError {
        StartlineError::Placement(format!(
            "no more processor groups available (total groups: {})",
            self.total_groups
        ))
    }
}

impl<P: Platform + ?Sized> UnitSelector for GroupedSequentialSelector<'_, P> {
    fn current(&self) -> StartlineResult<Option<ExecutionUnit>> {
        let (group, index) = self.position.ok_or_else(|| self.exhausted_error())?;
        Ok(Some(ExecutionUnit::Grouped {
            group: narrow(group, "group id")?,
            index: narrow(index, "processor index")?,
        }))
    }

    fn advance(&mut self) -> StartlineResult<()> {
        let Some((mut group, index)) = self.position else {
            return Err(self.exhausted_error());
        };

        let next = index + 1;
        if next < self.capacity(group)? {
            self.position = Some((group, next));
            return Ok(());
        }

        loop {
            group += 1;
            if group >= self.total_groups {
                self.position = None;
                return Ok(());
            }

            let capacity = self.capacity(group)?;
            log::info!(
                "switching to the next processor group ({} of {}), processors in this group: {}",
                group,
                self.total_groups,
                capacity
            );
            if capacity > 0 {
                self.position = Some((group, 0));
                return Ok(());
            }
        }
    }
}

fn narrow(value: usize, what: &str) -> StartlineResult<u16> {
    u16::try_from(value)
        .map_err(|_| StartlineError::Placement(format!("{} {} does not fit a unit id", what, value)))
}
