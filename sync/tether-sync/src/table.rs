//!
//! Generic Handle Registry
//!
//! `HandleTable<T>` maps dense integer handles to owned primitives of one
//! kind. The table is a directory of slots behind a metadata lock:
//!
//! - `Occupied` slots own their primitive through a `Box`, so growth of the
//!   directory never relocates a live primitive. An unlocked reference
//!   obtained through [`HandleTable::with`] stays valid across concurrent
//!   growth of the same table.
//! - `Tombstone` slots are permanently dead. Handles are never reused; a
//!   registry only ever grows. Primitive churn is low relative to process
//!   lifetime, so the unreclaimed tail stays small.
//! - Indices at or beyond `len` have never been allocated.
//!
//! The lock guards metadata mutation only (growth, count advancement,
//! slot-state transitions) and the fast constructor/destructor calls. It is
//! never held across a blocking operation on a primitive.
//!

use std::sync::Mutex;

use tether_core::{Handle, SyncError};

/// Slot count every registry starts with.
pub const INITIAL_CAPACITY: usize = 16;

enum Slot<T> {
    Occupied(Box<T>),
    Tombstone,
}

pub struct HandleTable<T> {
    /// Kind tag for log events.
    kind: &'static str,
    slots: Mutex<Vec<Slot<T>>>,
}

impl<T: Send + Sync> HandleTable<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            slots: Mutex::new(Vec::with_capacity(INITIAL_CAPACITY)),
        }
    }

    /// Allocates the next handle for a primitive built by `ctor`.
    ///
    /// Runs under the registry lock. If the table is full its capacity is
    /// doubled first; growth is all-or-nothing and reported as
    /// `AllocationFailed` on heap exhaustion. If the constructor fails no
    /// slot is consumed and the count does not advance.
    ///
    /// The constructor boxes the primitive itself so it is initialized at
    /// its final, stable address.
    pub fn create(
        &self,
        ctor: impl FnOnce() -> Result<Box<T>, SyncError>,
    ) -> Result<Handle, SyncError> {
        let mut slots = self.slots.lock().unwrap();
        if slots.len() >= Handle::MAX as usize {
            return Err(SyncError::AllocationFailed);
        }
        if slots.len() == slots.capacity() {
            let doubled = slots.capacity().max(INITIAL_CAPACITY);
            slots
                .try_reserve_exact(doubled)
                .map_err(|_| SyncError::AllocationFailed)?;
        }
        let primitive = ctor()?;
        let handle = slots.len() as Handle;
        slots.push(Slot::Occupied(primitive));
        tracing::trace!(kind = self.kind, handle, "created");
        Ok(handle)
    }

    /// Destroys the primitive behind `handle` and tombstones its slot.
    ///
    /// Runs under the registry lock. If the destructor fails the slot
    /// remains `Occupied` and the table stays consistent for a retry.
    pub fn destroy(
        &self,
        handle: Handle,
        dtor: impl FnOnce(&T) -> Result<(), SyncError>,
    ) -> Result<(), SyncError> {
        let mut slots = self.slots.lock().unwrap();
        let index = index_of(handle, slots.len())?;
        match &slots[index] {
            Slot::Occupied(primitive) => {
                dtor(primitive)?;
                slots[index] = Slot::Tombstone;
                tracing::trace!(kind = self.kind, handle, "destroyed");
                Ok(())
            }
            Slot::Tombstone => Err(SyncError::InvalidHandle),
        }
    }

    /// Runs `op` against the primitive behind `handle` with no registry
    /// lock held, so `op` may block arbitrarily long.
    ///
    /// The handle is validated and the primitive's address captured under
    /// the lock, then the lock is released before `op` runs. Destroying a
    /// handle while another thread is operating on it is undefined by
    /// contract; the caller must serialize destruction after all users have
    /// released the handle.
    pub fn with<R>(&self, handle: Handle, op: impl FnOnce(&T) -> R) -> Result<R, SyncError> {
        let ptr = {
            let slots = self.slots.lock().unwrap();
            let index = index_of(handle, slots.len())?;
            match &slots[index] {
                Slot::Occupied(primitive) => &**primitive as *const T,
                Slot::Tombstone => return Err(SyncError::InvalidHandle),
            }
        };
        // The box never moves; only the slot directory relocates on growth.
        Ok(op(unsafe { &*ptr }))
    }

    /// Tombstones a slot whose backing resource was already released
    /// outside the lock (the thread-join path).
    pub fn retire(&self, handle: Handle) -> Result<(), SyncError> {
        let mut slots = self.slots.lock().unwrap();
        let index = index_of(handle, slots.len())?;
        match &slots[index] {
            Slot::Occupied(_) => {
                slots[index] = Slot::Tombstone;
                tracing::trace!(kind = self.kind, handle, "retired");
                Ok(())
            }
            Slot::Tombstone => Err(SyncError::InvalidHandle),
        }
    }

    /// Linear scan over occupied slots, first match wins.
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<Handle> {
        let slots = self.slots.lock().unwrap();
        for (index, slot) in slots.iter().enumerate() {
            if let Slot::Occupied(primitive) = slot {
                if pred(primitive) {
                    return Some(index as Handle);
                }
            }
        }
        None
    }

    /// Count of ever-allocated slots, tombstones included.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.lock().unwrap().capacity()
    }

    /// Runs `each` on every still-occupied primitive, then releases all
    /// storage. Used by teardown; the table is empty afterwards.
    pub fn drain(&self, mut each: impl FnMut(&T)) {
        let mut slots = self.slots.lock().unwrap();
        let mut released = 0usize;
        for slot in slots.iter() {
            if let Slot::Occupied(primitive) = slot {
                each(primitive);
                released += 1;
            }
        }
        if released > 0 {
            tracing::debug!(kind = self.kind, released, "drained registry");
        }
        slots.clear();
        slots.shrink_to_fit();
    }
}

fn index_of(handle: Handle, len: usize) -> Result<usize, SyncError> {
    if handle < 0 {
        return Err(SyncError::InvalidHandle);
    }
    let index = handle as usize;
    if index >= len {
        return Err(SyncError::InvalidHandle);
    }
    Ok(index)
}
