//!
//! One-Time Guard Operations
//!
//! A one-time guard ensures a callback runs at most once across all racing
//! callers sharing the handle. Guards expose no destroy operation (the
//! underlying control has no destructor); their slots are released at
//! teardown.
//!

use tether_core::{Handle, SyncError};

use crate::context::SyncContext;
use crate::sys::{HookFn, RawOnce};

impl SyncContext {
    pub fn once_init(&self) -> Result<Handle, SyncError> {
        self.once_guards.create(RawOnce::create)
    }

    /// Runs `routine` at most once for this guard; racing callers block
    /// until the first caller's routine completes.
    pub fn once_run(&self, guard: Handle, routine: HookFn) -> Result<(), SyncError> {
        self.once_guards.with(guard, |g| g.run(routine))?
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    static HITS: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn bump() {
        HITS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_once_runs_exactly_once_across_racers() {
        let ctx = SyncContext::init().unwrap();
        let guard = ctx.once_init().unwrap();
        HITS.store(0, Ordering::SeqCst);

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| ctx.once_run(guard, bump).unwrap());
            }
        });
        ctx.once_run(guard, bump).unwrap();

        assert_eq!(HITS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_once_invalid_handle() {
        let ctx = SyncContext::init().unwrap();
        assert_eq!(ctx.once_run(3, bump), Err(SyncError::InvalidHandle));
    }
}
