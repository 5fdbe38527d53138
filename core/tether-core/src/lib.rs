//!
//! tether-core - Core Handle and Status Types
//!
//! This crate provides the fundamental types shared across all tether crates:
//!
//! - `Handle` for opaque integer identification of registry slots
//! - `SyncError` taxonomy covering registry and pthread failures
//! - C ABI status codes for the runtime surface
//!
//! Handles are plain `i32` values so a host language that cannot hold
//! native pointers can store and pass them as ordinary integers.
//!

pub mod error;
pub mod handle;
pub mod status;

pub use error::*;
pub use handle::*;
pub use status::*;
