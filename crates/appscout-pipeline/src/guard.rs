//! Mutual exclusion for discovery runs.
//!
//! Exactly one run may be active per process. The permit releases the flag
//! on drop, so a panicking or erroring run never wedges the guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::PipelineError;

/// Process-wide running flag for discovery runs.
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl RunGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to claim the running flag.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::AlreadyRunning`] if another run holds the
    /// permit.
    pub fn try_acquire(&self) -> Result<RunPermit, PipelineError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PipelineError::AlreadyRunning);
        }
        Ok(RunPermit {
            running: Arc::clone(&self.running),
        })
    }

    /// True while a permit is outstanding.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Held for the duration of a run; releases the flag on drop.
#[derive(Debug)]
pub struct RunPermit {
    running: Arc<AtomicBool>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_sets_and_releases_flag() {
        let guard = RunGuard::new();
        assert!(!guard.is_running());

        let permit = guard.try_acquire().expect("first acquire should succeed");
        assert!(guard.is_running());

        drop(permit);
        assert!(!guard.is_running());
    }

    #[test]
    fn second_acquire_conflicts() {
        let guard = RunGuard::new();
        let _permit = guard.try_acquire().unwrap();

        let err = guard.try_acquire().unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyRunning));
    }

    #[test]
    fn released_on_panic() {
        let guard = RunGuard::new();
        let cloned = guard.clone();

        let result = std::panic::catch_unwind(move || {
            let _permit = cloned.try_acquire().unwrap();
            panic!("run blew up");
        });
        assert!(result.is_err());
        assert!(!guard.is_running(), "flag must clear when the permit drops");
    }

    #[test]
    fn reacquire_after_release() {
        let guard = RunGuard::new();
        drop(guard.try_acquire().unwrap());
        assert!(guard.try_acquire().is_ok());
    }
}
