//!
//! Attribute Template Operations
//!
//! Attribute templates are registry-backed configuration objects a host
//! builds once and references by handle at creation time; `DEFAULT_ATTR`
//! (-1) means "library defaults". Getters report the recorded template
//! value.
//!

use libc::c_int;

use tether_core::{Handle, SyncError};

use crate::context::SyncContext;
use crate::sys::{BarrierAttr, CondAttr, MutexAttr, RwlockAttr, ThreadAttr};

impl SyncContext {
    // -- thread ------------------------------------------------------------

    pub fn thread_attr_init(&self) -> Result<Handle, SyncError> {
        self.thread_attrs.create(ThreadAttr::create)
    }

    pub fn thread_attr_destroy(&self, attr: Handle) -> Result<(), SyncError> {
        self.thread_attrs.destroy(attr, ThreadAttr::destroy)
    }

    /// `PTHREAD_CREATE_JOINABLE` or `PTHREAD_CREATE_DETACHED`.
    pub fn thread_attr_set_detach_state(&self, attr: Handle, state: c_int) -> Result<(), SyncError> {
        self.thread_attrs.with(attr, |a| a.set_detach_state(state))?
    }

    pub fn thread_attr_detach_state(&self, attr: Handle) -> Result<c_int, SyncError> {
        self.thread_attrs.with(attr, ThreadAttr::detach_state)
    }

    pub fn thread_attr_set_stack_size(&self, attr: Handle, size: usize) -> Result<(), SyncError> {
        self.thread_attrs.with(attr, |a| a.set_stack_size(size))?
    }

    pub fn thread_attr_stack_size(&self, attr: Handle) -> Result<usize, SyncError> {
        self.thread_attrs.with(attr, ThreadAttr::stack_size)
    }

    // -- mutex -------------------------------------------------------------

    pub fn mutex_attr_init(&self) -> Result<Handle, SyncError> {
        self.mutex_attrs.create(MutexAttr::create)
    }

    pub fn mutex_attr_destroy(&self, attr: Handle) -> Result<(), SyncError> {
        self.mutex_attrs.destroy(attr, MutexAttr::destroy)
    }

    /// `PTHREAD_MUTEX_NORMAL`, `PTHREAD_MUTEX_ERRORCHECK`, or
    /// `PTHREAD_MUTEX_RECURSIVE`.
    pub fn mutex_attr_set_kind(&self, attr: Handle, kind: c_int) -> Result<(), SyncError> {
        self.mutex_attrs.with(attr, |a| a.set_kind(kind))?
    }

    pub fn mutex_attr_kind(&self, attr: Handle) -> Result<c_int, SyncError> {
        self.mutex_attrs.with(attr, MutexAttr::kind)
    }

    pub fn mutex_attr_set_pshared(&self, attr: Handle, pshared: c_int) -> Result<(), SyncError> {
        self.mutex_attrs.with(attr, |a| a.set_pshared(pshared))?
    }

    pub fn mutex_attr_pshared(&self, attr: Handle) -> Result<c_int, SyncError> {
        self.mutex_attrs.with(attr, MutexAttr::pshared)
    }

    // -- condition variable ------------------------------------------------

    pub fn cond_attr_init(&self) -> Result<Handle, SyncError> {
        self.cond_attrs.create(CondAttr::create)
    }

    pub fn cond_attr_destroy(&self, attr: Handle) -> Result<(), SyncError> {
        self.cond_attrs.destroy(attr, CondAttr::destroy)
    }

    pub fn cond_attr_set_pshared(&self, attr: Handle, pshared: c_int) -> Result<(), SyncError> {
        self.cond_attrs.with(attr, |a| a.set_pshared(pshared))?
    }

    pub fn cond_attr_pshared(&self, attr: Handle) -> Result<c_int, SyncError> {
        self.cond_attrs.with(attr, CondAttr::pshared)
    }

    // -- barrier -----------------------------------------------------------

    pub fn barrier_attr_init(&self) -> Result<Handle, SyncError> {
        self.barrier_attrs.create(BarrierAttr::create)
    }

    pub fn barrier_attr_destroy(&self, attr: Handle) -> Result<(), SyncError> {
        self.barrier_attrs.destroy(attr, BarrierAttr::destroy)
    }

    pub fn barrier_attr_set_pshared(&self, attr: Handle, pshared: c_int) -> Result<(), SyncError> {
        self.barrier_attrs.with(attr, |a| a.set_pshared(pshared))?
    }

    pub fn barrier_attr_pshared(&self, attr: Handle) -> Result<c_int, SyncError> {
        self.barrier_attrs.with(attr, BarrierAttr::pshared)
    }

    // -- read-write lock ---------------------------------------------------

    pub fn rwlock_attr_init(&self) -> Result<Handle, SyncError> {
        self.rwlock_attrs.create(RwlockAttr::create)
    }

    pub fn rwlock_attr_destroy(&self, attr: Handle) -> Result<(), SyncError> {
        self.rwlock_attrs.destroy(attr, RwlockAttr::destroy)
    }

    pub fn rwlock_attr_set_pshared(&self, attr: Handle, pshared: c_int) -> Result<(), SyncError> {
        self.rwlock_attrs.with(attr, |a| a.set_pshared(pshared))?
    }

    pub fn rwlock_attr_pshared(&self, attr: Handle) -> Result<c_int, SyncError> {
        self.rwlock_attrs.with(attr, RwlockAttr::pshared)
    }
}

#[cfg(test)]
mod tests {
    use tether_core::DEFAULT_ATTR;

    use super::*;

    #[test]
    fn test_mutex_attr_roundtrip() {
        let ctx = SyncContext::init().unwrap();
        let attr = ctx.mutex_attr_init().unwrap();
        assert_eq!(ctx.mutex_attr_kind(attr).unwrap(), libc::PTHREAD_MUTEX_NORMAL);
        ctx.mutex_attr_set_kind(attr, libc::PTHREAD_MUTEX_ERRORCHECK)
            .unwrap();
        assert_eq!(
            ctx.mutex_attr_kind(attr).unwrap(),
            libc::PTHREAD_MUTEX_ERRORCHECK
        );
        ctx.mutex_attr_destroy(attr).unwrap();
        assert_eq!(ctx.mutex_attr_kind(attr), Err(SyncError::InvalidHandle));
    }

    #[test]
    fn test_errorcheck_mutex_reports_deadlock() {
        let ctx = SyncContext::init().unwrap();
        let attr = ctx.mutex_attr_init().unwrap();
        ctx.mutex_attr_set_kind(attr, libc::PTHREAD_MUTEX_ERRORCHECK)
            .unwrap();
        let m = ctx.mutex_init(attr).unwrap();
        ctx.mutex_lock(m).unwrap();
        assert_eq!(ctx.mutex_lock(m), Err(SyncError::Underlying(libc::EDEADLK)));
        ctx.mutex_unlock(m).unwrap();
        ctx.mutex_destroy(m).unwrap();
    }

    #[test]
    fn test_thread_attr_roundtrip() {
        let ctx = SyncContext::init().unwrap();
        let attr = ctx.thread_attr_init().unwrap();
        assert_eq!(
            ctx.thread_attr_detach_state(attr).unwrap(),
            libc::PTHREAD_CREATE_JOINABLE
        );
        ctx.thread_attr_set_detach_state(attr, libc::PTHREAD_CREATE_DETACHED)
            .unwrap();
        assert_eq!(
            ctx.thread_attr_detach_state(attr).unwrap(),
            libc::PTHREAD_CREATE_DETACHED
        );
        // 1 MiB satisfies PTHREAD_STACK_MIN everywhere we run.
        ctx.thread_attr_set_stack_size(attr, 1 << 20).unwrap();
        assert_eq!(ctx.thread_attr_stack_size(attr).unwrap(), 1 << 20);
        ctx.thread_attr_destroy(attr).unwrap();
    }

    #[test]
    fn test_pshared_attr_defaults() {
        let ctx = SyncContext::init().unwrap();
        let c = ctx.cond_attr_init().unwrap();
        let b = ctx.barrier_attr_init().unwrap();
        let r = ctx.rwlock_attr_init().unwrap();
        assert_eq!(ctx.cond_attr_pshared(c).unwrap(), libc::PTHREAD_PROCESS_PRIVATE);
        assert_eq!(ctx.barrier_attr_pshared(b).unwrap(), libc::PTHREAD_PROCESS_PRIVATE);
        assert_eq!(ctx.rwlock_attr_pshared(r).unwrap(), libc::PTHREAD_PROCESS_PRIVATE);
        ctx.cond_attr_set_pshared(c, libc::PTHREAD_PROCESS_SHARED)
            .unwrap();
        assert_eq!(ctx.cond_attr_pshared(c).unwrap(), libc::PTHREAD_PROCESS_SHARED);
        // Attributed creation still works after configuration.
        let cv = ctx.cond_init(c).unwrap();
        ctx.cond_destroy(cv).unwrap();
        ctx.cond_attr_destroy(c).unwrap();
        ctx.barrier_attr_destroy(b).unwrap();
        ctx.rwlock_attr_destroy(r).unwrap();
    }

    #[test]
    fn test_default_attr_sentinel_accepted_everywhere() {
        let ctx = SyncContext::init().unwrap();
        assert!(ctx.mutex_init(DEFAULT_ATTR).is_ok());
        assert!(ctx.cond_init(DEFAULT_ATTR).is_ok());
        assert!(ctx.barrier_init(DEFAULT_ATTR, 1).is_ok());
        assert!(ctx.rwlock_init(DEFAULT_ATTR).is_ok());
    }
}
