//!
//! Thread Operations
//!
//! Threads are registered like every other kind, with two twists: the
//! initializing thread occupies handle 0 (the master handle), and a
//! successful join releases the slot since the thread can never be joined
//! again. The blocking `pthread_join` runs with no registry lock held, so
//! a long-running join never stalls creation of other threads.
//!

use libc::c_void;

use tether_core::{DEFAULT_ATTR, Handle, SyncError};

use crate::context::SyncContext;
use crate::sys::{HookFn, RawThread, StartFn};

impl SyncContext {
    /// Starts a thread running `entry(arg)`. The default attribute
    /// template produces a joinable thread.
    pub fn thread_create(
        &self,
        attr: Handle,
        entry: StartFn,
        arg: *mut c_void,
    ) -> Result<Handle, SyncError> {
        if attr == DEFAULT_ATTR {
            self.threads.create(|| RawThread::spawn(None, entry, arg))
        } else {
            self.thread_attrs.with(attr, |a| {
                self.threads.create(|| RawThread::spawn(Some(a), entry, arg))
            })?
        }
    }

    pub fn thread_detach(&self, thread: Handle) -> Result<(), SyncError> {
        self.threads.with(thread, RawThread::detach)?
    }

    /// Requests asynchronous cancellation; whether and when the thread
    /// honors it follows the library's cancellation-point model. The
    /// registry only forwards the request.
    pub fn thread_cancel(&self, thread: Handle) -> Result<(), SyncError> {
        self.threads.with(thread, RawThread::cancel)?
    }

    /// Blocks until the thread terminates, then releases its slot and
    /// returns the exit value. On failure the slot stays occupied and
    /// joinable.
    pub fn thread_join(&self, thread: Handle) -> Result<*mut c_void, SyncError> {
        let value = self.threads.with(thread, RawThread::join)??;
        self.threads.retire(thread)?;
        Ok(value)
    }

    pub fn thread_equal(&self, t1: Handle, t2: Handle) -> Result<bool, SyncError> {
        self.threads
            .with(t1, |a| self.threads.with(t2, |b| a.equal(b)))?
    }

    /// Handle of the calling thread.
    ///
    /// Linear scan of the thread registry; self-lookup is rare enough that
    /// the scan cost does not matter. Fails with `InvalidHandle` when the
    /// caller was never registered (e.g. a thread this context did not
    /// start).
    pub fn thread_self(&self) -> Result<Handle, SyncError> {
        self.threads
            .find(RawThread::is_current)
            .ok_or(SyncError::InvalidHandle)
    }
}

/// Terminates the calling thread, reporting `value` to a joiner.
pub fn thread_exit(value: *mut c_void) -> ! {
    unsafe { libc::pthread_exit(value) }
}

/// Registers fork hooks with the underlying library. Not handle-based;
/// forwarded verbatim.
pub fn thread_atfork(
    prepare: Option<HookFn>,
    parent: Option<HookFn>,
    child: Option<HookFn>,
) -> Result<(), SyncError> {
    crate::sys::check(unsafe {
        libc::pthread_atfork(
            prepare.map(|f| f as unsafe extern "C" fn()),
            parent.map(|f| f as unsafe extern "C" fn()),
            child.map(|f| f as unsafe extern "C" fn()),
        )
    })
}
