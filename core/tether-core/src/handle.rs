//!
//! Handle Type
//!
//! A handle is a dense, non-negative integer assigned monotonically within
//! one registry. Handles are never reused: once a slot is destroyed its
//! index stays dead for the life of the registry.
//!

/// Opaque identifier for a registry slot.
///
/// Valid handles are non-negative. Negative values are rejected by every
/// operation except where [`DEFAULT_ATTR`] is accepted as an attribute
/// argument.
pub type Handle = i32;

/// Sentinel attribute handle meaning "use default configuration".
pub const DEFAULT_ATTR: Handle = -1;

/// Handle of the execution context that initialized the registry set.
///
/// The initializing thread is pre-registered in the thread registry so the
/// host can name it like any spawned thread.
pub const MASTER_HANDLE: Handle = 0;
