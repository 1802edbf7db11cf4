//! The unit of work timed by each launched worker.

use crate::error::StartlineResult;

/// Work run by every worker once the starting line is released.
///
/// `run` blocks until the work is done. A returned error is recorded
/// against the worker that ran it and does not stop the other workers.
pub trait Workload: Sync {
    fn run(&self) -> StartlineResult<()>;
}

impl<F> Workload for F
where
    F: Fn() -> StartlineResult<()> + Sync,
{
    fn run(&self) -> StartlineResult<()> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StartlineError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_closure_workload() {
        let calls = AtomicUsize::new(0);
        let workload = || -> StartlineResult<()> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        workload.run().unwrap();
        Workload::run(&workload).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failing_workload_through_trait_object() {
        let workload = || -> StartlineResult<()> {
            Err(StartlineError::Workload("division by zero".into()))
        };
        let dynamic: &dyn Workload = &workload;
        assert!(matches!(dynamic.run(), Err(StartlineError::Workload(_))));
    }
}
