//!
//! tether-sync - Handle Registries over Native Concurrency Primitives
//!
//! Lets a caller that cannot hold native pointers create, use, and destroy
//! native concurrency primitives through small opaque integer handles.
//!
//! ## Registries
//!
//! Each primitive kind (threads, mutexes, condition variables, barriers,
//! spinlocks, read-write locks, one-time guards, and their attribute
//! templates) lives in its own [`HandleTable`]: a growable, lock-guarded
//! directory mapping a dense integer handle to an owned primitive. Handles
//! are assigned monotonically and never reused; destroyed slots stay
//! tombstoned for the life of the registry.
//!
//! ## Dispatch
//!
//! [`SyncContext`] owns one registry per kind and exposes the per-kind
//! operations. Create and destroy mutate registry metadata under the
//! registry lock; blocking operations (lock acquisition, waits, barrier
//! waits, joins, run-once) always execute with no registry lock held, so a
//! blocked handle never stalls creation or destruction of other handles.
//!
//! ## Platform Support
//!
//! Native POSIX platforms only. The underlying primitives are pthreads,
//! reached through `libc`.
//!

pub mod attr;
pub mod barrier;
pub mod cond;
pub mod context;
pub mod mutex;
pub mod once;
pub mod rwlock;
pub mod spinlock;
pub mod sys;
pub mod table;
pub mod thread;

pub use context::SyncContext;
pub use sys::{HookFn, StartFn};
pub use table::{HandleTable, INITIAL_CAPACITY};
pub use thread::{thread_atfork, thread_exit};
