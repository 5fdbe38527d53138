//!
//! Raw pthread Layer
//!
//! Thin owned wrappers over the libc pthread calls. Every wrapper is built
//! through a constructor that boxes first, so the primitive is initialized
//! at its final heap address and never moves afterwards; the registries
//! rely on that stability to hand out unlocked references.
//!
//! Status codes from the library pass through verbatim as
//! `SyncError::Underlying`. Busy and timed-out are statuses, not failures
//! of this layer.
//!

use std::cell::UnsafeCell;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use libc::{c_int, c_void};

use tether_core::SyncError;

/// Thread entry point: receives the host's argument pointer, returns the
/// value later reported by join.
pub type StartFn = extern "C" fn(*mut c_void) -> *mut c_void;

/// Parameterless callback used by one-time guards and atfork hooks.
pub type HookFn = extern "C" fn();

/// Maps a pthread status to a result.
pub(crate) fn check(code: c_int) -> Result<(), SyncError> {
    if code == 0 {
        Ok(())
    } else {
        Err(SyncError::Underlying(code))
    }
}

/// Absolute CLOCK_REALTIME deadline `ns` nanoseconds from now.
///
/// Splits whole seconds from the sub-second remainder and normalizes the
/// carry, so the conversion is correct for any magnitude, not only values
/// under one second.
pub fn deadline_after(ns: i64) -> libc::timespec {
    let mut now = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    unsafe {
        libc::clock_gettime(libc::CLOCK_REALTIME, &mut now);
    }
    let ns = ns.max(0);
    let mut sec = now.tv_sec + (ns / 1_000_000_000) as libc::time_t;
    let mut nsec = now.tv_nsec + (ns % 1_000_000_000) as libc::c_long;
    if nsec >= 1_000_000_000 {
        sec += 1;
        nsec -= 1_000_000_000;
    }
    libc::timespec {
        tv_sec: sec,
        tv_nsec: nsec,
    }
}

// ---------------------------------------------------------------------------
// Mutex
// ---------------------------------------------------------------------------

pub struct RawMutex {
    inner: UnsafeCell<libc::pthread_mutex_t>,
}

unsafe impl Send for RawMutex {}
unsafe impl Sync for RawMutex {}

impl RawMutex {
    pub fn create(attr: Option<&MutexAttr>) -> Result<Box<Self>, SyncError> {
        let boxed = Box::new(Self {
            inner: UnsafeCell::new(unsafe { mem::zeroed() }),
        });
        let attr_ptr = attr.map_or(ptr::null(), MutexAttr::as_ptr);
        check(unsafe { libc::pthread_mutex_init(boxed.inner.get(), attr_ptr) })?;
        Ok(boxed)
    }

    pub fn destroy(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_mutex_destroy(self.inner.get()) })
    }

    pub fn lock(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_mutex_lock(self.inner.get()) })
    }

    pub fn try_lock(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_mutex_trylock(self.inner.get()) })
    }

    pub fn unlock(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_mutex_unlock(self.inner.get()) })
    }

    pub(crate) fn as_ptr(&self) -> *mut libc::pthread_mutex_t {
        self.inner.get()
    }
}

// ---------------------------------------------------------------------------
// Condition variable
// ---------------------------------------------------------------------------

pub struct RawCond {
    inner: UnsafeCell<libc::pthread_cond_t>,
}

unsafe impl Send for RawCond {}
unsafe impl Sync for RawCond {}

impl RawCond {
    pub fn create(attr: Option<&CondAttr>) -> Result<Box<Self>, SyncError> {
        let boxed = Box::new(Self {
            inner: UnsafeCell::new(unsafe { mem::zeroed() }),
        });
        let attr_ptr = attr.map_or(ptr::null(), CondAttr::as_ptr);
        check(unsafe { libc::pthread_cond_init(boxed.inner.get(), attr_ptr) })?;
        Ok(boxed)
    }

    pub fn destroy(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_cond_destroy(self.inner.get()) })
    }

    /// Caller must hold `mutex`. Spurious wakeups remain the caller's
    /// responsibility, exactly as with the library itself.
    pub fn wait(&self, mutex: &RawMutex) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_cond_wait(self.inner.get(), mutex.as_ptr()) })
    }

    /// Waits at most `ns` nanoseconds; ETIMEDOUT passes through.
    pub fn timed_wait(&self, mutex: &RawMutex, ns: i64) -> Result<(), SyncError> {
        let deadline = deadline_after(ns);
        check(unsafe { libc::pthread_cond_timedwait(self.inner.get(), mutex.as_ptr(), &deadline) })
    }

    pub fn signal(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_cond_signal(self.inner.get()) })
    }

    pub fn broadcast(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_cond_broadcast(self.inner.get()) })
    }
}

// ---------------------------------------------------------------------------
// Barrier
// ---------------------------------------------------------------------------

pub struct RawBarrier {
    inner: UnsafeCell<libc::pthread_barrier_t>,
}

unsafe impl Send for RawBarrier {}
unsafe impl Sync for RawBarrier {}

impl RawBarrier {
    pub fn create(attr: Option<&BarrierAttr>, count: u32) -> Result<Box<Self>, SyncError> {
        let boxed = Box::new(Self {
            inner: UnsafeCell::new(unsafe { mem::zeroed() }),
        });
        let attr_ptr = attr.map_or(ptr::null(), BarrierAttr::as_ptr);
        check(unsafe { libc::pthread_barrier_init(boxed.inner.get(), attr_ptr, count) })?;
        Ok(boxed)
    }

    pub fn destroy(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_barrier_destroy(self.inner.get()) })
    }

    /// Blocks until all participants arrive. Exactly one waiter per phase
    /// gets `true`, the serial designation.
    pub fn wait(&self) -> Result<bool, SyncError> {
        match unsafe { libc::pthread_barrier_wait(self.inner.get()) } {
            0 => Ok(false),
            libc::PTHREAD_BARRIER_SERIAL_THREAD => Ok(true),
            code => Err(SyncError::Underlying(code)),
        }
    }
}

// ---------------------------------------------------------------------------
// Spinlock
// ---------------------------------------------------------------------------

pub struct RawSpinlock {
    inner: UnsafeCell<libc::pthread_spinlock_t>,
}

unsafe impl Send for RawSpinlock {}
unsafe impl Sync for RawSpinlock {}

impl RawSpinlock {
    pub fn create(pshared: c_int) -> Result<Box<Self>, SyncError> {
        let boxed = Box::new(Self {
            inner: UnsafeCell::new(unsafe { mem::zeroed() }),
        });
        check(unsafe { libc::pthread_spin_init(boxed.inner.get(), pshared) })?;
        Ok(boxed)
    }

    pub fn destroy(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_spin_destroy(self.inner.get()) })
    }

    pub fn lock(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_spin_lock(self.inner.get()) })
    }

    pub fn try_lock(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_spin_trylock(self.inner.get()) })
    }

    pub fn unlock(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_spin_unlock(self.inner.get()) })
    }
}

// ---------------------------------------------------------------------------
// Read-write lock
// ---------------------------------------------------------------------------

// The libc crate does not export the timed rwlock entry points on Linux,
// so they are declared here directly (glibc provides them).
unsafe extern "C" {
    fn pthread_rwlock_timedrdlock(
        lock: *mut libc::pthread_rwlock_t,
        abstime: *const libc::timespec,
    ) -> c_int;
    fn pthread_rwlock_timedwrlock(
        lock: *mut libc::pthread_rwlock_t,
        abstime: *const libc::timespec,
    ) -> c_int;
}

pub struct RawRwLock {
    inner: UnsafeCell<libc::pthread_rwlock_t>,
}

unsafe impl Send for RawRwLock {}
unsafe impl Sync for RawRwLock {}

impl RawRwLock {
    pub fn create(attr: Option<&RwlockAttr>) -> Result<Box<Self>, SyncError> {
        let boxed = Box::new(Self {
            inner: UnsafeCell::new(unsafe { mem::zeroed() }),
        });
        let attr_ptr = attr.map_or(ptr::null(), RwlockAttr::as_ptr);
        check(unsafe { libc::pthread_rwlock_init(boxed.inner.get(), attr_ptr) })?;
        Ok(boxed)
    }

    pub fn destroy(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_rwlock_destroy(self.inner.get()) })
    }

    pub fn read_lock(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_rwlock_rdlock(self.inner.get()) })
    }

    pub fn try_read_lock(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_rwlock_tryrdlock(self.inner.get()) })
    }

    pub fn write_lock(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_rwlock_wrlock(self.inner.get()) })
    }

    pub fn try_write_lock(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_rwlock_trywrlock(self.inner.get()) })
    }

    pub fn timed_read_lock(&self, ns: i64) -> Result<(), SyncError> {
        let deadline = deadline_after(ns);
        check(unsafe { pthread_rwlock_timedrdlock(self.inner.get(), &deadline) })
    }

    pub fn timed_write_lock(&self, ns: i64) -> Result<(), SyncError> {
        let deadline = deadline_after(ns);
        check(unsafe { pthread_rwlock_timedwrlock(self.inner.get(), &deadline) })
    }

    pub fn unlock(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_rwlock_unlock(self.inner.get()) })
    }
}

// ---------------------------------------------------------------------------
// One-time guard
// ---------------------------------------------------------------------------

// glibc's pthread_once_t is a plain int initialized to zero; the libc crate
// does not export pthread_once, so it is declared here directly.
const PTHREAD_ONCE_INIT: c_int = 0;

unsafe extern "C" {
    fn pthread_once(control: *mut c_int, routine: HookFn) -> c_int;
}

pub struct RawOnce {
    control: UnsafeCell<c_int>,
}

unsafe impl Send for RawOnce {}
unsafe impl Sync for RawOnce {}

impl RawOnce {
    pub fn create() -> Result<Box<Self>, SyncError> {
        Ok(Box::new(Self {
            control: UnsafeCell::new(PTHREAD_ONCE_INIT),
        }))
    }

    /// Runs `routine` at most once across all racing callers sharing this
    /// guard; later callers return after the first completes.
    pub fn run(&self, routine: HookFn) -> Result<(), SyncError> {
        check(unsafe { pthread_once(self.control.get(), routine) })
    }
}

// ---------------------------------------------------------------------------
// Thread
// ---------------------------------------------------------------------------

pub struct RawThread {
    id: libc::pthread_t,
}

unsafe impl Send for RawThread {}
unsafe impl Sync for RawThread {}

impl RawThread {
    pub fn spawn(
        attr: Option<&ThreadAttr>,
        entry: StartFn,
        arg: *mut c_void,
    ) -> Result<Box<Self>, SyncError> {
        let mut boxed = Box::new(Self {
            id: unsafe { mem::zeroed() },
        });
        let attr_ptr = attr.map_or(ptr::null(), ThreadAttr::as_ptr);
        check(unsafe { libc::pthread_create(&mut boxed.id, attr_ptr, entry, arg) })?;
        Ok(boxed)
    }

    /// Record for the calling thread, used to register the master handle.
    pub fn current() -> Box<Self> {
        Box::new(Self {
            id: unsafe { libc::pthread_self() },
        })
    }

    pub fn detach(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_detach(self.id) })
    }

    pub fn cancel(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_cancel(self.id) })
    }

    /// Blocks until the thread terminates and returns its exit value.
    pub fn join(&self) -> Result<*mut c_void, SyncError> {
        let mut value: *mut c_void = ptr::null_mut();
        check(unsafe { libc::pthread_join(self.id, &mut value) })?;
        Ok(value)
    }

    pub fn equal(&self, other: &RawThread) -> bool {
        unsafe { libc::pthread_equal(self.id, other.id) != 0 }
    }

    pub fn is_current(&self) -> bool {
        unsafe { libc::pthread_equal(self.id, libc::pthread_self()) != 0 }
    }
}

// ---------------------------------------------------------------------------
// Attribute templates
// ---------------------------------------------------------------------------
//
// Each template owns the raw pthread attribute object and mirrors the host's
// settings so getters read the recorded template value instead of calling
// back into the library.

pub struct ThreadAttr {
    inner: UnsafeCell<libc::pthread_attr_t>,
    detach_state: AtomicI32,
    stack_size: AtomicUsize,
}

unsafe impl Send for ThreadAttr {}
unsafe impl Sync for ThreadAttr {}

impl ThreadAttr {
    pub fn create() -> Result<Box<Self>, SyncError> {
        let boxed = Box::new(Self {
            inner: UnsafeCell::new(unsafe { mem::zeroed() }),
            detach_state: AtomicI32::new(libc::PTHREAD_CREATE_JOINABLE),
            stack_size: AtomicUsize::new(0),
        });
        check(unsafe { libc::pthread_attr_init(boxed.inner.get()) })?;
        Ok(boxed)
    }

    pub fn destroy(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_attr_destroy(self.inner.get()) })
    }

    pub fn set_detach_state(&self, state: c_int) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_attr_setdetachstate(self.inner.get(), state) })?;
        self.detach_state.store(state, Ordering::Relaxed);
        Ok(())
    }

    pub fn detach_state(&self) -> c_int {
        self.detach_state.load(Ordering::Relaxed)
    }

    pub fn set_stack_size(&self, size: usize) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_attr_setstacksize(self.inner.get(), size) })?;
        self.stack_size.store(size, Ordering::Relaxed);
        Ok(())
    }

    /// Zero means the library default.
    pub fn stack_size(&self) -> usize {
        self.stack_size.load(Ordering::Relaxed)
    }

    pub(crate) fn as_ptr(&self) -> *const libc::pthread_attr_t {
        self.inner.get()
    }
}

pub struct MutexAttr {
    inner: UnsafeCell<libc::pthread_mutexattr_t>,
    kind: AtomicI32,
    pshared: AtomicI32,
}

unsafe impl Send for MutexAttr {}
unsafe impl Sync for MutexAttr {}

impl MutexAttr {
    pub fn create() -> Result<Box<Self>, SyncError> {
        let boxed = Box::new(Self {
            inner: UnsafeCell::new(unsafe { mem::zeroed() }),
            kind: AtomicI32::new(libc::PTHREAD_MUTEX_NORMAL),
            pshared: AtomicI32::new(libc::PTHREAD_PROCESS_PRIVATE),
        });
        check(unsafe { libc::pthread_mutexattr_init(boxed.inner.get()) })?;
        Ok(boxed)
    }

    pub fn destroy(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_mutexattr_destroy(self.inner.get()) })
    }

    /// `PTHREAD_MUTEX_NORMAL`, `PTHREAD_MUTEX_ERRORCHECK`, or
    /// `PTHREAD_MUTEX_RECURSIVE`.
    pub fn set_kind(&self, kind: c_int) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_mutexattr_settype(self.inner.get(), kind) })?;
        self.kind.store(kind, Ordering::Relaxed);
        Ok(())
    }

    pub fn kind(&self) -> c_int {
        self.kind.load(Ordering::Relaxed)
    }

    pub fn set_pshared(&self, pshared: c_int) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_mutexattr_setpshared(self.inner.get(), pshared) })?;
        self.pshared.store(pshared, Ordering::Relaxed);
        Ok(())
    }

    pub fn pshared(&self) -> c_int {
        self.pshared.load(Ordering::Relaxed)
    }

    pub(crate) fn as_ptr(&self) -> *const libc::pthread_mutexattr_t {
        self.inner.get()
    }
}

pub struct CondAttr {
    inner: UnsafeCell<libc::pthread_condattr_t>,
    pshared: AtomicI32,
}

unsafe impl Send for CondAttr {}
unsafe impl Sync for CondAttr {}

impl CondAttr {
    pub fn create() -> Result<Box<Self>, SyncError> {
        let boxed = Box::new(Self {
            inner: UnsafeCell::new(unsafe { mem::zeroed() }),
            pshared: AtomicI32::new(libc::PTHREAD_PROCESS_PRIVATE),
        });
        check(unsafe { libc::pthread_condattr_init(boxed.inner.get()) })?;
        Ok(boxed)
    }

    pub fn destroy(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_condattr_destroy(self.inner.get()) })
    }

    pub fn set_pshared(&self, pshared: c_int) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_condattr_setpshared(self.inner.get(), pshared) })?;
        self.pshared.store(pshared, Ordering::Relaxed);
        Ok(())
    }

    pub fn pshared(&self) -> c_int {
        self.pshared.load(Ordering::Relaxed)
    }

    pub(crate) fn as_ptr(&self) -> *const libc::pthread_condattr_t {
        self.inner.get()
    }
}

pub struct BarrierAttr {
    inner: UnsafeCell<libc::pthread_barrierattr_t>,
    pshared: AtomicI32,
}

unsafe impl Send for BarrierAttr {}
unsafe impl Sync for BarrierAttr {}

impl BarrierAttr {
    pub fn create() -> Result<Box<Self>, SyncError> {
        let boxed = Box::new(Self {
            inner: UnsafeCell::new(unsafe { mem::zeroed() }),
            pshared: AtomicI32::new(libc::PTHREAD_PROCESS_PRIVATE),
        });
        check(unsafe { libc::pthread_barrierattr_init(boxed.inner.get()) })?;
        Ok(boxed)
    }

    pub fn destroy(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_barrierattr_destroy(self.inner.get()) })
    }

    pub fn set_pshared(&self, pshared: c_int) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_barrierattr_setpshared(self.inner.get(), pshared) })?;
        self.pshared.store(pshared, Ordering::Relaxed);
        Ok(())
    }

    pub fn pshared(&self) -> c_int {
        self.pshared.load(Ordering::Relaxed)
    }

    pub(crate) fn as_ptr(&self) -> *const libc::pthread_barrierattr_t {
        self.inner.get()
    }
}

pub struct RwlockAttr {
    inner: UnsafeCell<libc::pthread_rwlockattr_t>,
    pshared: AtomicI32,
}

unsafe impl Send for RwlockAttr {}
unsafe impl Sync for RwlockAttr {}

impl RwlockAttr {
    pub fn create() -> Result<Box<Self>, SyncError> {
        let boxed = Box::new(Self {
            inner: UnsafeCell::new(unsafe { mem::zeroed() }),
            pshared: AtomicI32::new(libc::PTHREAD_PROCESS_PRIVATE),
        });
        check(unsafe { libc::pthread_rwlockattr_init(boxed.inner.get()) })?;
        Ok(boxed)
    }

    pub fn destroy(&self) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_rwlockattr_destroy(self.inner.get()) })
    }

    pub fn set_pshared(&self, pshared: c_int) -> Result<(), SyncError> {
        check(unsafe { libc::pthread_rwlockattr_setpshared(self.inner.get(), pshared) })?;
        self.pshared.store(pshared, Ordering::Relaxed);
        Ok(())
    }

    pub fn pshared(&self) -> c_int {
        self.pshared.load(Ordering::Relaxed)
    }

    pub(crate) fn as_ptr(&self) -> *const libc::pthread_rwlockattr_t {
        self.inner.get()
    }
}
