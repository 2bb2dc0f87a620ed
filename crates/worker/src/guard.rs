//! Single-run guard for periodic jobs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Allows at most one run of a job at a time.
#[derive(Debug, Clone, Default)]
pub struct JobGuard {
    running: Arc<AtomicBool>,
}

impl JobGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the run slot, or `None` while another run holds it.
    pub fn try_acquire(&self) -> Option<JobPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| JobPermit {
                running: Arc::clone(&self.running),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Held for the duration of a run; releases the slot when dropped.
#[derive(Debug)]
pub struct JobPermit {
    running: Arc<AtomicBool>,
}

impl Drop for JobPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let guard = JobGuard::new();
        let permit = guard.try_acquire().unwrap();
        assert!(guard.is_running());
        assert!(guard.try_acquire().is_none());

        drop(permit);
        assert!(!guard.is_running());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn clones_share_the_slot() {
        let guard = JobGuard::new();
        let other = guard.clone();
        let _permit = guard.try_acquire().unwrap();
        assert!(other.try_acquire().is_none());
    }

    #[test]
    fn panic_releases_the_slot() {
        let guard = JobGuard::new();
        let inner = guard.clone();
        let result = std::panic::catch_unwind(move || {
            let _permit = inner.try_acquire().unwrap();
            panic!("job blew up");
        });
        assert!(result.is_err());
        assert!(!guard.is_running());
    }
}
