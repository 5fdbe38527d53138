//!
//! C ABI lifecycle tests.
//!
//! Every test here shares the one process-global context, so they take a
//! serialization lock and each runs a full init/shutdown cycle.
//!

use std::ptr;
use std::sync::Mutex;

use libc::c_void;

use tether_core::status;
use tether_runtime::*;

static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> std::sync::MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

extern "C" fn add_one(arg: *mut c_void) -> *mut c_void {
    ((arg as usize) + 1) as *mut c_void
}

#[test]
fn lifecycle_state_machine() {
    let _guard = serial();

    // Everything fails before init, and performs no registry mutation.
    assert_eq!(tether_mutex_lock(0), status::NOT_INITIALIZED);
    let mut h = -1;
    assert_eq!(
        unsafe { tether_mutex_init(-1, &mut h) },
        status::NOT_INITIALIZED
    );
    assert_eq!(h, -1);

    assert_eq!(tether_init(), status::OK);
    assert_eq!(tether_init(), status::ALREADY_INITIALIZED);

    // Shutdown is idempotent and re-init is legal.
    assert_eq!(tether_shutdown(), status::OK);
    assert_eq!(tether_shutdown(), status::OK);
    assert_eq!(tether_init(), status::OK);
    assert_eq!(tether_shutdown(), status::OK);
}

#[test]
fn mutex_scenario_over_the_abi() {
    let _guard = serial();
    assert_eq!(tether_init(), status::OK);

    let mut m = -1;
    assert_eq!(unsafe { tether_mutex_init(-1, &mut m) }, status::OK);
    assert_eq!(m, 0);
    assert_eq!(tether_mutex_lock(m), status::OK);
    assert_eq!(tether_mutex_unlock(m), status::OK);
    assert_eq!(tether_mutex_destroy(m), status::OK);
    assert_eq!(tether_mutex_lock(m), status::INVALID_HANDLE);

    assert_eq!(tether_shutdown(), status::OK);
}

#[test]
fn thread_round_trip_over_the_abi() {
    let _guard = serial();
    assert_eq!(tether_init(), status::OK);

    // The initializing thread is the master handle.
    let mut me = -1;
    assert_eq!(unsafe { tether_thread_self(&mut me) }, status::OK);
    assert_eq!(me, 0);

    let mut t = -1;
    assert_eq!(
        unsafe { tether_thread_create(-1, add_one, 41 as *mut c_void, &mut t) },
        status::OK
    );
    assert_eq!(t, 1);

    let mut value: *mut c_void = ptr::null_mut();
    assert_eq!(unsafe { tether_thread_join(t, &mut value) }, status::OK);
    assert_eq!(value as usize, 42);
    assert_eq!(
        unsafe { tether_thread_join(t, &mut value) },
        status::INVALID_HANDLE
    );

    assert_eq!(tether_shutdown(), status::OK);
}

#[test]
fn timedwait_and_trylock_statuses_pass_through() {
    let _guard = serial();
    assert_eq!(tether_init(), status::OK);

    let (mut m, mut c) = (-1, -1);
    assert_eq!(unsafe { tether_mutex_init(-1, &mut m) }, status::OK);
    assert_eq!(unsafe { tether_cond_init(-1, &mut c) }, status::OK);

    assert_eq!(tether_mutex_lock(m), status::OK);
    assert_eq!(tether_cond_timedwait(c, m, 0), libc::ETIMEDOUT);
    // 1.5s timeout exercises the seconds/subsecond split.
    assert_eq!(tether_cond_timedwait(c, m, 1_500_000_000), libc::ETIMEDOUT);
    assert_eq!(tether_mutex_unlock(m), status::OK);

    let mut rw = -1;
    assert_eq!(unsafe { tether_rwlock_init(-1, &mut rw) }, status::OK);
    assert_eq!(tether_rwlock_rdlock(rw), status::OK);
    std::thread::scope(|scope| {
        scope.spawn(|| {
            assert_eq!(tether_rwlock_trywrlock(rw), libc::EBUSY);
        });
    });
    assert_eq!(tether_rwlock_unlock(rw), status::OK);

    assert_eq!(tether_shutdown(), status::OK);
}

#[test]
fn barrier_and_attr_surface() {
    let _guard = serial();
    assert_eq!(tether_init(), status::OK);

    let mut attr = -1;
    assert_eq!(unsafe { tether_mutex_attr_init(&mut attr) }, status::OK);
    assert_eq!(
        tether_mutex_attr_settype(attr, libc::PTHREAD_MUTEX_RECURSIVE),
        status::OK
    );
    let mut kind = -1;
    assert_eq!(unsafe { tether_mutex_attr_gettype(attr, &mut kind) }, status::OK);
    assert_eq!(kind, libc::PTHREAD_MUTEX_RECURSIVE);

    let mut m = -1;
    assert_eq!(unsafe { tether_mutex_init(attr, &mut m) }, status::OK);
    assert_eq!(tether_mutex_lock(m), status::OK);
    assert_eq!(tether_mutex_lock(m), status::OK);
    assert_eq!(tether_mutex_unlock(m), status::OK);
    assert_eq!(tether_mutex_unlock(m), status::OK);

    let mut b = -1;
    assert_eq!(unsafe { tether_barrier_init(-1, 1, &mut b) }, status::OK);
    let mut serial_flag = 0;
    assert_eq!(unsafe { tether_barrier_wait(b, &mut serial_flag) }, status::OK);
    assert_eq!(serial_flag, 1);
    assert_eq!(unsafe { tether_barrier_init(-1, -3, &mut b) }, libc::EINVAL);

    assert_eq!(tether_shutdown(), status::OK);
}
