//!
//! Read-Write Lock Operations
//!
//! Read, write, try, and timed acquisition plus the shared unlock. Timed
//! variants take a relative nanosecond timeout converted to an absolute
//! deadline; ETIMEDOUT passes through.
//!

use tether_core::{DEFAULT_ATTR, Handle, SyncError};

use crate::context::SyncContext;
use crate::sys::RawRwLock;

impl SyncContext {
    pub fn rwlock_init(&self, attr: Handle) -> Result<Handle, SyncError> {
        if attr == DEFAULT_ATTR {
            self.rwlocks.create(|| RawRwLock::create(None))
        } else {
            self.rwlock_attrs
                .with(attr, |a| self.rwlocks.create(|| RawRwLock::create(Some(a))))?
        }
    }

    pub fn rwlock_destroy(&self, rwlock: Handle) -> Result<(), SyncError> {
        self.rwlocks.destroy(rwlock, RawRwLock::destroy)
    }

    pub fn rwlock_rdlock(&self, rwlock: Handle) -> Result<(), SyncError> {
        self.rwlocks.with(rwlock, RawRwLock::read_lock)?
    }

    pub fn rwlock_tryrdlock(&self, rwlock: Handle) -> Result<(), SyncError> {
        self.rwlocks.with(rwlock, RawRwLock::try_read_lock)?
    }

    pub fn rwlock_wrlock(&self, rwlock: Handle) -> Result<(), SyncError> {
        self.rwlocks.with(rwlock, RawRwLock::write_lock)?
    }

    pub fn rwlock_trywrlock(&self, rwlock: Handle) -> Result<(), SyncError> {
        self.rwlocks.with(rwlock, RawRwLock::try_write_lock)?
    }

    pub fn rwlock_timedrdlock(&self, rwlock: Handle, ns: i64) -> Result<(), SyncError> {
        self.rwlocks.with(rwlock, |rw| rw.timed_read_lock(ns))?
    }

    pub fn rwlock_timedwrlock(&self, rwlock: Handle, ns: i64) -> Result<(), SyncError> {
        self.rwlocks.with(rwlock, |rw| rw.timed_write_lock(ns))?
    }

    pub fn rwlock_unlock(&self, rwlock: Handle) -> Result<(), SyncError> {
        self.rwlocks.with(rwlock, RawRwLock::unlock)?
    }
}
