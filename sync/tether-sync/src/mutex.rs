//!
//! Mutex Operations
//!
//! Create/destroy mutate the mutex registry under its lock; lock, trylock,
//! and unlock run against the primitive with no registry lock held.
//!

use tether_core::{DEFAULT_ATTR, Handle, SyncError};

use crate::context::SyncContext;
use crate::sys::RawMutex;

impl SyncContext {
    /// Creates a mutex, optionally configured by an attribute template
    /// handle; [`DEFAULT_ATTR`] selects the library defaults.
    pub fn mutex_init(&self, attr: Handle) -> Result<Handle, SyncError> {
        if attr == DEFAULT_ATTR {
            self.mutexes.create(|| RawMutex::create(None))
        } else {
            self.mutex_attrs
                .with(attr, |a| self.mutexes.create(|| RawMutex::create(Some(a))))?
        }
    }

    /// Destroys the mutex. On failure (e.g. EBUSY for a locked mutex) the
    /// handle stays valid and the destroy can be retried.
    pub fn mutex_destroy(&self, mutex: Handle) -> Result<(), SyncError> {
        self.mutexes.destroy(mutex, RawMutex::destroy)
    }

    pub fn mutex_lock(&self, mutex: Handle) -> Result<(), SyncError> {
        self.mutexes.with(mutex, RawMutex::lock)?
    }

    /// EBUSY passes through when the mutex is already held.
    pub fn mutex_trylock(&self, mutex: Handle) -> Result<(), SyncError> {
        self.mutexes.with(mutex, RawMutex::try_lock)?
    }

    pub fn mutex_unlock(&self, mutex: Handle) -> Result<(), SyncError> {
        self.mutexes.with(mutex, RawMutex::unlock)?
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_mutex_basic() {
        let ctx = SyncContext::init().unwrap();
        let m = ctx.mutex_init(DEFAULT_ATTR).unwrap();
        assert_eq!(m, 0);
        ctx.mutex_lock(m).unwrap();
        ctx.mutex_unlock(m).unwrap();
        ctx.mutex_destroy(m).unwrap();
        assert_eq!(ctx.mutex_lock(m), Err(SyncError::InvalidHandle));
    }

    #[test]
    fn test_mutex_invalid_handles() {
        let ctx = SyncContext::init().unwrap();
        assert_eq!(ctx.mutex_lock(-1), Err(SyncError::InvalidHandle));
        assert_eq!(ctx.mutex_lock(0), Err(SyncError::InvalidHandle));
        assert_eq!(ctx.mutex_destroy(99), Err(SyncError::InvalidHandle));
    }

    #[test]
    fn test_mutex_trylock_busy() {
        let ctx = SyncContext::init().unwrap();
        let m = ctx.mutex_init(DEFAULT_ATTR).unwrap();
        ctx.mutex_lock(m).unwrap();

        thread::scope(|scope| {
            scope.spawn(|| {
                assert_eq!(
                    ctx.mutex_trylock(m),
                    Err(SyncError::Underlying(libc::EBUSY))
                );
            });
        });

        ctx.mutex_unlock(m).unwrap();
        ctx.mutex_destroy(m).unwrap();
    }

    #[test]
    fn test_mutex_guards_shared_counter() {
        let ctx = SyncContext::init().unwrap();
        let m = ctx.mutex_init(DEFAULT_ATTR).unwrap();
        let mut counter = 0u64;
        let counter_ptr = &raw mut counter as usize;

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..1000 {
                        ctx.mutex_lock(m).unwrap();
                        unsafe { *(counter_ptr as *mut u64) += 1 };
                        ctx.mutex_unlock(m).unwrap();
                    }
                });
            }
        });

        assert_eq!(counter, 8000);
        ctx.mutex_destroy(m).unwrap();
    }

    #[test]
    fn test_recursive_mutex_via_attr() {
        let ctx = SyncContext::init().unwrap();
        let attr = ctx.mutex_attr_init().unwrap();
        ctx.mutex_attr_set_kind(attr, libc::PTHREAD_MUTEX_RECURSIVE)
            .unwrap();
        let m = ctx.mutex_init(attr).unwrap();

        ctx.mutex_lock(m).unwrap();
        ctx.mutex_lock(m).unwrap();
        ctx.mutex_unlock(m).unwrap();
        ctx.mutex_unlock(m).unwrap();

        ctx.mutex_destroy(m).unwrap();
        ctx.mutex_attr_destroy(attr).unwrap();
    }
}
