//!
//! tether-runtime - C ABI Entry Points
//!
//! The process-facing surface of tether. A single process-global context
//! sits behind a read-write lock: `tether_init` and `tether_shutdown` take
//! the write side, every other entry point takes the read side, so blocking
//! operations on different handles never serialize one another.
//!
//! Conventions:
//! - every entry point returns a status code (`0` ok, negative tether
//!   codes, positive errno passthrough; see `tether-core::status`)
//! - results are written through out-pointers, which may be null when the
//!   caller does not want the value
//! - handles are plain `i32` values; `-1` as an attribute handle selects
//!   library defaults
//!

use std::sync::RwLock;

use libc::c_void;

use tether_core::{Handle, SyncError, status, status_code};
use tether_sync::{HookFn, StartFn, SyncContext};

static CONTEXT: RwLock<Option<SyncContext>> = RwLock::new(None);

/// Runs `op` against the global context, translating the missing-context
/// case and collapsing the result to a status code.
fn with_context(op: impl FnOnce(&SyncContext) -> Result<(), SyncError>) -> i32 {
    let guard = CONTEXT.read().unwrap();
    match guard.as_ref() {
        Some(ctx) => status_code(op(ctx)),
        None => status::NOT_INITIALIZED,
    }
}

/// Writes `value` through `out` unless the caller passed null.
unsafe fn store<T>(out: *mut T, value: T) {
    if !out.is_null() {
        unsafe { *out = value };
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Initializes the global context and registers the calling thread as
/// thread handle 0. Fails with `ALREADY_INITIALIZED` on a second call
/// before shutdown.
#[unsafe(no_mangle)]
pub extern "C" fn tether_init() -> i32 {
    let mut guard = CONTEXT.write().unwrap();
    if guard.is_some() {
        return status::ALREADY_INITIALIZED;
    }
    match SyncContext::init() {
        Ok(ctx) => {
            *guard = Some(ctx);
            status::OK
        }
        Err(err) => err.code(),
    }
}

/// Destroys every still-occupied slot in every registry and returns the
/// process to the uninitialized state; a later `tether_init` is legal.
/// No-op when already uninitialized.
#[unsafe(no_mangle)]
pub extern "C" fn tether_shutdown() -> i32 {
    let mut guard = CONTEXT.write().unwrap();
    if let Some(ctx) = guard.take() {
        ctx.teardown();
    }
    status::OK
}

// ---------------------------------------------------------------------------
// Threads
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_thread_create(
    attr: Handle,
    entry: StartFn,
    arg: *mut c_void,
    thread_id: *mut Handle,
) -> i32 {
    with_context(|ctx| {
        let h = ctx.thread_create(attr, entry, arg)?;
        unsafe { store(thread_id, h) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_thread_detach(thread_id: Handle) -> i32 {
    with_context(|ctx| ctx.thread_detach(thread_id))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_thread_join(thread_id: Handle, value: *mut *mut c_void) -> i32 {
    with_context(|ctx| {
        let v = ctx.thread_join(thread_id)?;
        unsafe { store(value, v) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_thread_cancel(thread_id: Handle) -> i32 {
    with_context(|ctx| ctx.thread_cancel(thread_id))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_thread_equal(t1: Handle, t2: Handle, equal: *mut i32) -> i32 {
    with_context(|ctx| {
        let same = ctx.thread_equal(t1, t2)?;
        unsafe { store(equal, same as i32) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_thread_self(thread_id: *mut Handle) -> i32 {
    with_context(|ctx| {
        let h = ctx.thread_self()?;
        unsafe { store(thread_id, h) };
        Ok(())
    })
}

/// Terminates the calling thread. Never returns.
#[unsafe(no_mangle)]
pub extern "C" fn tether_thread_exit(value: *mut c_void) -> ! {
    tether_sync::thread_exit(value)
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_atfork(
    prepare: Option<HookFn>,
    parent: Option<HookFn>,
    child: Option<HookFn>,
) -> i32 {
    status_code(tether_sync::thread_atfork(prepare, parent, child))
}

// ---------------------------------------------------------------------------
// One-time guards
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_once_init(once_id: *mut Handle) -> i32 {
    with_context(|ctx| {
        let h = ctx.once_init()?;
        unsafe { store(once_id, h) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_once_run(once_id: Handle, routine: HookFn) -> i32 {
    with_context(|ctx| ctx.once_run(once_id, routine))
}

// ---------------------------------------------------------------------------
// Mutexes
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_mutex_init(attr: Handle, mutex_id: *mut Handle) -> i32 {
    with_context(|ctx| {
        let h = ctx.mutex_init(attr)?;
        unsafe { store(mutex_id, h) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_mutex_destroy(mutex_id: Handle) -> i32 {
    with_context(|ctx| ctx.mutex_destroy(mutex_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_mutex_lock(mutex_id: Handle) -> i32 {
    with_context(|ctx| ctx.mutex_lock(mutex_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_mutex_trylock(mutex_id: Handle) -> i32 {
    with_context(|ctx| ctx.mutex_trylock(mutex_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_mutex_unlock(mutex_id: Handle) -> i32 {
    with_context(|ctx| ctx.mutex_unlock(mutex_id))
}

// ---------------------------------------------------------------------------
// Condition variables
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_cond_init(attr: Handle, cond_id: *mut Handle) -> i32 {
    with_context(|ctx| {
        let h = ctx.cond_init(attr)?;
        unsafe { store(cond_id, h) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_cond_destroy(cond_id: Handle) -> i32 {
    with_context(|ctx| ctx.cond_destroy(cond_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_cond_wait(cond_id: Handle, mutex_id: Handle) -> i32 {
    with_context(|ctx| ctx.cond_wait(cond_id, mutex_id))
}

/// `ns` is a relative timeout in nanoseconds; any magnitude is split
/// correctly into the deadline's seconds and sub-second parts.
#[unsafe(no_mangle)]
pub extern "C" fn tether_cond_timedwait(cond_id: Handle, mutex_id: Handle, ns: i64) -> i32 {
    with_context(|ctx| ctx.cond_timedwait(cond_id, mutex_id, ns))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_cond_signal(cond_id: Handle) -> i32 {
    with_context(|ctx| ctx.cond_signal(cond_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_cond_broadcast(cond_id: Handle) -> i32 {
    with_context(|ctx| ctx.cond_broadcast(cond_id))
}

// ---------------------------------------------------------------------------
// Barriers
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_barrier_init(
    attr: Handle,
    count: i32,
    barrier_id: *mut Handle,
) -> i32 {
    with_context(|ctx| {
        if count < 0 {
            return Err(SyncError::Underlying(libc::EINVAL));
        }
        let h = ctx.barrier_init(attr, count as u32)?;
        unsafe { store(barrier_id, h) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_barrier_destroy(barrier_id: Handle) -> i32 {
    with_context(|ctx| ctx.barrier_destroy(barrier_id))
}

/// `serial` receives 1 for exactly one participant per phase, 0 for the
/// rest.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_barrier_wait(barrier_id: Handle, serial: *mut i32) -> i32 {
    with_context(|ctx| {
        let was_serial = ctx.barrier_wait(barrier_id)?;
        unsafe { store(serial, was_serial as i32) };
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Spinlocks
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_spin_init(pshared: i32, spinlock_id: *mut Handle) -> i32 {
    with_context(|ctx| {
        let h = ctx.spin_init(pshared)?;
        unsafe { store(spinlock_id, h) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_spin_destroy(spinlock_id: Handle) -> i32 {
    with_context(|ctx| ctx.spin_destroy(spinlock_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_spin_lock(spinlock_id: Handle) -> i32 {
    with_context(|ctx| ctx.spin_lock(spinlock_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_spin_trylock(spinlock_id: Handle) -> i32 {
    with_context(|ctx| ctx.spin_trylock(spinlock_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_spin_unlock(spinlock_id: Handle) -> i32 {
    with_context(|ctx| ctx.spin_unlock(spinlock_id))
}

// ---------------------------------------------------------------------------
// Read-write locks
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_rwlock_init(attr: Handle, rwlock_id: *mut Handle) -> i32 {
    with_context(|ctx| {
        let h = ctx.rwlock_init(attr)?;
        unsafe { store(rwlock_id, h) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_rwlock_destroy(rwlock_id: Handle) -> i32 {
    with_context(|ctx| ctx.rwlock_destroy(rwlock_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_rwlock_rdlock(rwlock_id: Handle) -> i32 {
    with_context(|ctx| ctx.rwlock_rdlock(rwlock_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_rwlock_tryrdlock(rwlock_id: Handle) -> i32 {
    with_context(|ctx| ctx.rwlock_tryrdlock(rwlock_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_rwlock_wrlock(rwlock_id: Handle) -> i32 {
    with_context(|ctx| ctx.rwlock_wrlock(rwlock_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_rwlock_trywrlock(rwlock_id: Handle) -> i32 {
    with_context(|ctx| ctx.rwlock_trywrlock(rwlock_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_rwlock_timedrdlock(rwlock_id: Handle, ns: i64) -> i32 {
    with_context(|ctx| ctx.rwlock_timedrdlock(rwlock_id, ns))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_rwlock_timedwrlock(rwlock_id: Handle, ns: i64) -> i32 {
    with_context(|ctx| ctx.rwlock_timedwrlock(rwlock_id, ns))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_rwlock_unlock(rwlock_id: Handle) -> i32 {
    with_context(|ctx| ctx.rwlock_unlock(rwlock_id))
}

// ---------------------------------------------------------------------------
// Attribute templates
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_thread_attr_init(attr_id: *mut Handle) -> i32 {
    with_context(|ctx| {
        let h = ctx.thread_attr_init()?;
        unsafe { store(attr_id, h) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_thread_attr_destroy(attr_id: Handle) -> i32 {
    with_context(|ctx| ctx.thread_attr_destroy(attr_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_thread_attr_setdetachstate(attr_id: Handle, state: i32) -> i32 {
    with_context(|ctx| ctx.thread_attr_set_detach_state(attr_id, state))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_thread_attr_getdetachstate(attr_id: Handle, state: *mut i32) -> i32 {
    with_context(|ctx| {
        let s = ctx.thread_attr_detach_state(attr_id)?;
        unsafe { store(state, s) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_thread_attr_setstacksize(attr_id: Handle, size: u64) -> i32 {
    with_context(|ctx| ctx.thread_attr_set_stack_size(attr_id, size as usize))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_thread_attr_getstacksize(attr_id: Handle, size: *mut u64) -> i32 {
    with_context(|ctx| {
        let s = ctx.thread_attr_stack_size(attr_id)?;
        unsafe { store(size, s as u64) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_mutex_attr_init(attr_id: *mut Handle) -> i32 {
    with_context(|ctx| {
        let h = ctx.mutex_attr_init()?;
        unsafe { store(attr_id, h) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_mutex_attr_destroy(attr_id: Handle) -> i32 {
    with_context(|ctx| ctx.mutex_attr_destroy(attr_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_mutex_attr_settype(attr_id: Handle, kind: i32) -> i32 {
    with_context(|ctx| ctx.mutex_attr_set_kind(attr_id, kind))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_mutex_attr_gettype(attr_id: Handle, kind: *mut i32) -> i32 {
    with_context(|ctx| {
        let k = ctx.mutex_attr_kind(attr_id)?;
        unsafe { store(kind, k) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_mutex_attr_setpshared(attr_id: Handle, pshared: i32) -> i32 {
    with_context(|ctx| ctx.mutex_attr_set_pshared(attr_id, pshared))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_mutex_attr_getpshared(attr_id: Handle, pshared: *mut i32) -> i32 {
    with_context(|ctx| {
        let p = ctx.mutex_attr_pshared(attr_id)?;
        unsafe { store(pshared, p) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_cond_attr_init(attr_id: *mut Handle) -> i32 {
    with_context(|ctx| {
        let h = ctx.cond_attr_init()?;
        unsafe { store(attr_id, h) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_cond_attr_destroy(attr_id: Handle) -> i32 {
    with_context(|ctx| ctx.cond_attr_destroy(attr_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_cond_attr_setpshared(attr_id: Handle, pshared: i32) -> i32 {
    with_context(|ctx| ctx.cond_attr_set_pshared(attr_id, pshared))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_cond_attr_getpshared(attr_id: Handle, pshared: *mut i32) -> i32 {
    with_context(|ctx| {
        let p = ctx.cond_attr_pshared(attr_id)?;
        unsafe { store(pshared, p) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_barrier_attr_init(attr_id: *mut Handle) -> i32 {
    with_context(|ctx| {
        let h = ctx.barrier_attr_init()?;
        unsafe { store(attr_id, h) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_barrier_attr_destroy(attr_id: Handle) -> i32 {
    with_context(|ctx| ctx.barrier_attr_destroy(attr_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_barrier_attr_setpshared(attr_id: Handle, pshared: i32) -> i32 {
    with_context(|ctx| ctx.barrier_attr_set_pshared(attr_id, pshared))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_barrier_attr_getpshared(attr_id: Handle, pshared: *mut i32) -> i32 {
    with_context(|ctx| {
        let p = ctx.barrier_attr_pshared(attr_id)?;
        unsafe { store(pshared, p) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_rwlock_attr_init(attr_id: *mut Handle) -> i32 {
    with_context(|ctx| {
        let h = ctx.rwlock_attr_init()?;
        unsafe { store(attr_id, h) };
        Ok(())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_rwlock_attr_destroy(attr_id: Handle) -> i32 {
    with_context(|ctx| ctx.rwlock_attr_destroy(attr_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn tether_rwlock_attr_setpshared(attr_id: Handle, pshared: i32) -> i32 {
    with_context(|ctx| ctx.rwlock_attr_set_pshared(attr_id, pshared))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn tether_rwlock_attr_getpshared(attr_id: Handle, pshared: *mut i32) -> i32 {
    with_context(|ctx| {
        let p = ctx.rwlock_attr_pshared(attr_id)?;
        unsafe { store(pshared, p) };
        Ok(())
    })
}
