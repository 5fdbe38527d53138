//!
//! Cross-kind integration tests for the synchronization context.
//!

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use tether_core::{DEFAULT_ATTR, SyncError};
use tether_sync::SyncContext;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

#[test]
fn mutex_handle_lifecycle_scenario() {
    init_logging();
    let ctx = SyncContext::init().unwrap();
    let m = ctx.mutex_init(DEFAULT_ATTR).unwrap();
    assert_eq!(m, 0);
    ctx.mutex_lock(m).unwrap();
    ctx.mutex_unlock(m).unwrap();
    ctx.mutex_destroy(m).unwrap();
    assert_eq!(ctx.mutex_lock(m), Err(SyncError::InvalidHandle));
}

#[test]
fn handles_stay_dead_across_later_creates() {
    let ctx = SyncContext::init().unwrap();
    let first = ctx.mutex_init(DEFAULT_ATTR).unwrap();
    ctx.mutex_destroy(first).unwrap();
    for _ in 0..50 {
        let h = ctx.mutex_init(DEFAULT_ATTR).unwrap();
        assert_ne!(h, first);
    }
    assert_eq!(ctx.mutex_lock(first), Err(SyncError::InvalidHandle));
}

#[test]
fn producer_consumer_over_cond_and_mutex() {
    let ctx = SyncContext::init().unwrap();
    let m = ctx.mutex_init(DEFAULT_ATTR).unwrap();
    let c = ctx.cond_init(DEFAULT_ATTR).unwrap();
    let produced = AtomicU64::new(0);
    let consumed = AtomicU64::new(0);
    let total = 100u64;

    thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..total {
                ctx.mutex_lock(m).unwrap();
                while produced.load(Ordering::Relaxed) == consumed.load(Ordering::Relaxed) {
                    ctx.cond_wait(c, m).unwrap();
                }
                consumed.fetch_add(1, Ordering::Relaxed);
                ctx.mutex_unlock(m).unwrap();
            }
        });

        for _ in 0..total {
            ctx.mutex_lock(m).unwrap();
            produced.fetch_add(1, Ordering::Relaxed);
            ctx.cond_signal(c).unwrap();
            ctx.mutex_unlock(m).unwrap();
        }
    });

    assert_eq!(consumed.load(Ordering::Relaxed), total);
}

#[test]
fn one_slow_handle_never_blocks_other_creates() {
    let ctx = SyncContext::init().unwrap();
    let m = ctx.mutex_init(DEFAULT_ATTR).unwrap();
    ctx.mutex_lock(m).unwrap();

    // While this thread keeps the mutex handle busy from another thread's
    // point of view, creations in the same registry must still complete.
    thread::scope(|scope| {
        let blocked = scope.spawn(|| {
            // Blocks until the main thread unlocks.
            ctx.mutex_lock(m).unwrap();
            ctx.mutex_unlock(m).unwrap();
        });

        for _ in 0..100 {
            ctx.mutex_init(DEFAULT_ATTR).unwrap();
        }
        ctx.mutex_unlock(m).unwrap();
        blocked.join().unwrap();
    });
}

#[test]
fn teardown_then_fresh_context() {
    let ctx = SyncContext::init().unwrap();
    for _ in 0..10 {
        ctx.mutex_init(DEFAULT_ATTR).unwrap();
        ctx.rwlock_init(DEFAULT_ATTR).unwrap();
    }
    ctx.teardown();

    let ctx = SyncContext::init().unwrap();
    assert_eq!(ctx.mutex_init(DEFAULT_ATTR).unwrap(), 0);
    assert_eq!(ctx.thread_self().unwrap(), 0);
}
