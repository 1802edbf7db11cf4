//! Worker placement: unit identifiers, pinning policies and the selectors
//! that turn a policy into a per-worker unit.

pub mod mode;
pub mod selector;
pub mod unit;

pub use mode::PinningMode;
pub use selector::{
    selector_for, ExplicitSelector, GroupedSequentialSelector, NoPinningSelector,
    SequentialSelector, UnitSelector,
};
pub use unit::{parse_unit_list, ExecutionUnit, GroupId, GroupIndex};
