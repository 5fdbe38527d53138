//!
//! Condition Variable Operations
//!
//! Waits take both a condition handle and a mutex handle; both are
//! validated before the library is called, and the wait itself runs with
//! no registry lock held. Spurious wakeups are possible and remain the
//! caller's responsibility, exactly as with the underlying library.
//!

use tether_core::{DEFAULT_ATTR, Handle, SyncError};

use crate::context::SyncContext;
use crate::sys::RawCond;

impl SyncContext {
    pub fn cond_init(&self, attr: Handle) -> Result<Handle, SyncError> {
        if attr == DEFAULT_ATTR {
            self.conds.create(|| RawCond::create(None))
        } else {
            self.cond_attrs
                .with(attr, |a| self.conds.create(|| RawCond::create(Some(a))))?
        }
    }

    pub fn cond_destroy(&self, cond: Handle) -> Result<(), SyncError> {
        self.conds.destroy(cond, RawCond::destroy)
    }

    /// Caller must hold the mutex behind `mutex`.
    pub fn cond_wait(&self, cond: Handle, mutex: Handle) -> Result<(), SyncError> {
        self.conds
            .with(cond, |cv| self.mutexes.with(mutex, |mx| cv.wait(mx)))??
    }

    /// Waits at most `ns` nanoseconds from now; ETIMEDOUT passes through.
    /// The relative timeout is converted to an absolute deadline with the
    /// seconds and sub-second remainder split correctly for any magnitude.
    pub fn cond_timedwait(&self, cond: Handle, mutex: Handle, ns: i64) -> Result<(), SyncError> {
        self.conds
            .with(cond, |cv| self.mutexes.with(mutex, |mx| cv.timed_wait(mx, ns)))??
    }

    pub fn cond_signal(&self, cond: Handle) -> Result<(), SyncError> {
        self.conds.with(cond, RawCond::signal)?
    }

    pub fn cond_broadcast(&self, cond: Handle) -> Result<(), SyncError> {
        self.conds.with(cond, RawCond::broadcast)?
    }
}
