//!
//! Spinlock Operations
//!
//! Spinlocks take a process-shared flag at creation instead of an
//! attribute template.
//!

use libc::c_int;

use tether_core::{Handle, SyncError};

use crate::context::SyncContext;
use crate::sys::RawSpinlock;

impl SyncContext {
    /// Creates a spinlock. `pshared` is `PTHREAD_PROCESS_PRIVATE` or
    /// `PTHREAD_PROCESS_SHARED`, forwarded verbatim.
    pub fn spin_init(&self, pshared: c_int) -> Result<Handle, SyncError> {
        self.spinlocks.create(|| RawSpinlock::create(pshared))
    }

    pub fn spin_destroy(&self, spinlock: Handle) -> Result<(), SyncError> {
        self.spinlocks.destroy(spinlock, RawSpinlock::destroy)
    }

    pub fn spin_lock(&self, spinlock: Handle) -> Result<(), SyncError> {
        self.spinlocks.with(spinlock, RawSpinlock::lock)?
    }

    /// EBUSY passes through when the lock is already held.
    pub fn spin_trylock(&self, spinlock: Handle) -> Result<(), SyncError> {
        self.spinlocks.with(spinlock, RawSpinlock::try_lock)?
    }

    pub fn spin_unlock(&self, spinlock: Handle) -> Result<(), SyncError> {
        self.spinlocks.with(spinlock, RawSpinlock::unlock)?
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_spinlock_basic() {
        let ctx = SyncContext::init().unwrap();
        let s = ctx.spin_init(libc::PTHREAD_PROCESS_PRIVATE).unwrap();
        ctx.spin_lock(s).unwrap();
        assert_eq!(ctx.spin_trylock(s), Err(SyncError::Underlying(libc::EBUSY)));
        ctx.spin_unlock(s).unwrap();
        ctx.spin_trylock(s).unwrap();
        ctx.spin_unlock(s).unwrap();
        ctx.spin_destroy(s).unwrap();
        assert_eq!(ctx.spin_lock(s), Err(SyncError::InvalidHandle));
    }

    #[test]
    fn test_spinlock_guards_shared_counter() {
        let ctx = SyncContext::init().unwrap();
        let s = ctx.spin_init(libc::PTHREAD_PROCESS_PRIVATE).unwrap();
        let mut counter = 0u64;
        let counter_ptr = &raw mut counter as usize;

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..1000 {
                        ctx.spin_lock(s).unwrap();
                        unsafe { *(counter_ptr as *mut u64) += 1 };
                        ctx.spin_unlock(s).unwrap();
                    }
                });
            }
        });

        assert_eq!(counter, 4000);
        ctx.spin_destroy(s).unwrap();
    }
}
