//!
//! Synchronization Context
//!
//! `SyncContext` owns one handle registry per primitive kind. Constructing
//! a context is initialization: every registry is built at its initial
//! capacity and the calling thread is pre-registered as the master thread
//! handle (handle 0). Contexts are plain values, so independent instances
//! coexist; the process-global lifecycle lives in the runtime crate.
//!
//! Teardown releases every still-occupied slot across every registry.
//! Threads are released record-only (never implicitly joined or
//! cancelled), and destructor failures are logged and ignored since no
//! retry is possible at that point.
//!

use tether_core::{Handle, MASTER_HANDLE, SyncError};

use crate::sys::{
    BarrierAttr, CondAttr, MutexAttr, RawBarrier, RawCond, RawMutex, RawOnce, RawRwLock,
    RawSpinlock, RawThread, RwlockAttr, ThreadAttr,
};
use crate::table::HandleTable;

pub struct SyncContext {
    pub(crate) threads: HandleTable<RawThread>,
    pub(crate) thread_attrs: HandleTable<ThreadAttr>,
    pub(crate) once_guards: HandleTable<RawOnce>,
    pub(crate) mutexes: HandleTable<RawMutex>,
    pub(crate) mutex_attrs: HandleTable<MutexAttr>,
    pub(crate) conds: HandleTable<RawCond>,
    pub(crate) cond_attrs: HandleTable<CondAttr>,
    pub(crate) barriers: HandleTable<RawBarrier>,
    pub(crate) barrier_attrs: HandleTable<BarrierAttr>,
    pub(crate) spinlocks: HandleTable<RawSpinlock>,
    pub(crate) rwlocks: HandleTable<RawRwLock>,
    pub(crate) rwlock_attrs: HandleTable<RwlockAttr>,
}

impl SyncContext {
    /// Builds every registry and registers the caller as the master thread
    /// handle.
    pub fn init() -> Result<Self, SyncError> {
        let ctx = Self {
            threads: HandleTable::new("thread"),
            thread_attrs: HandleTable::new("thread_attr"),
            once_guards: HandleTable::new("once"),
            mutexes: HandleTable::new("mutex"),
            mutex_attrs: HandleTable::new("mutex_attr"),
            conds: HandleTable::new("cond"),
            cond_attrs: HandleTable::new("cond_attr"),
            barriers: HandleTable::new("barrier"),
            barrier_attrs: HandleTable::new("barrier_attr"),
            spinlocks: HandleTable::new("spinlock"),
            rwlocks: HandleTable::new("rwlock"),
            rwlock_attrs: HandleTable::new("rwlock_attr"),
        };
        let master = ctx.threads.create(|| Ok(RawThread::current()))?;
        debug_assert_eq!(master, MASTER_HANDLE);
        tracing::debug!(master, "sync context initialized");
        Ok(ctx)
    }

    /// Handle of the master thread record created at initialization.
    pub fn master_handle(&self) -> Handle {
        MASTER_HANDLE
    }

    /// Explicit teardown; dropping the context does the same work.
    pub fn teardown(self) {}

    fn release_all(&self) {
        self.mutexes.drain(|m| {
            if let Err(err) = m.destroy() {
                tracing::debug!(%err, "mutex release failed during teardown");
            }
        });
        self.conds.drain(|c| {
            if let Err(err) = c.destroy() {
                tracing::debug!(%err, "cond release failed during teardown");
            }
        });
        self.barriers.drain(|b| {
            if let Err(err) = b.destroy() {
                tracing::debug!(%err, "barrier release failed during teardown");
            }
        });
        self.spinlocks.drain(|s| {
            if let Err(err) = s.destroy() {
                tracing::debug!(%err, "spinlock release failed during teardown");
            }
        });
        self.rwlocks.drain(|r| {
            if let Err(err) = r.destroy() {
                tracing::debug!(%err, "rwlock release failed during teardown");
            }
        });
        self.thread_attrs.drain(|a| {
            if let Err(err) = a.destroy() {
                tracing::debug!(%err, "thread attr release failed during teardown");
            }
        });
        self.mutex_attrs.drain(|a| {
            if let Err(err) = a.destroy() {
                tracing::debug!(%err, "mutex attr release failed during teardown");
            }
        });
        self.cond_attrs.drain(|a| {
            if let Err(err) = a.destroy() {
                tracing::debug!(%err, "cond attr release failed during teardown");
            }
        });
        self.barrier_attrs.drain(|a| {
            if let Err(err) = a.destroy() {
                tracing::debug!(%err, "barrier attr release failed during teardown");
            }
        });
        self.rwlock_attrs.drain(|a| {
            if let Err(err) = a.destroy() {
                tracing::debug!(%err, "rwlock attr release failed during teardown");
            }
        });
        // Thread records and once controls have no library destructor;
        // live threads keep running and are never joined implicitly.
        self.threads.drain(|_| {});
        self.once_guards.drain(|_| {});
        tracing::debug!("sync context released");
    }
}

impl Drop for SyncContext {
    fn drop(&mut self) {
        self.release_all();
    }
}
