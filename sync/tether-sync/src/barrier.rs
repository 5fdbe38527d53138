//!
//! Barrier Operations
//!
//! A barrier is created for a fixed participant count. `barrier_wait`
//! blocks until all participants arrive and designates exactly one of them
//! as the serial waiter.
//!

use tether_core::{DEFAULT_ATTR, Handle, SyncError};

use crate::context::SyncContext;
use crate::sys::RawBarrier;

impl SyncContext {
    /// Creates a barrier for `count` participants. A zero count is
    /// rejected by the library (EINVAL passthrough).
    pub fn barrier_init(&self, attr: Handle, count: u32) -> Result<Handle, SyncError> {
        if attr == DEFAULT_ATTR {
            self.barriers.create(|| RawBarrier::create(None, count))
        } else {
            self.barrier_attrs.with(attr, |a| {
                self.barriers.create(|| RawBarrier::create(Some(a), count))
            })?
        }
    }

    pub fn barrier_destroy(&self, barrier: Handle) -> Result<(), SyncError> {
        self.barriers.destroy(barrier, RawBarrier::destroy)
    }

    /// Returns `true` for exactly one participant per completed phase.
    pub fn barrier_wait(&self, barrier: Handle) -> Result<bool, SyncError> {
        self.barriers.with(barrier, RawBarrier::wait)?
    }
}
