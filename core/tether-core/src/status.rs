//!
//! C ABI Status Codes
//!
//! Every runtime entry point returns one of these codes. Zero is success,
//! negative codes are produced by this layer, and positive codes are errno
//! values forwarded verbatim from the synchronization library.
//!

/// Operation completed.
pub const OK: i32 = 0;

/// The runtime has not been initialized.
pub const NOT_INITIALIZED: i32 = -1;

/// The runtime is already initialized.
pub const ALREADY_INITIALIZED: i32 = -2;

/// Handle is negative, out of range, or destroyed.
pub const INVALID_HANDLE: i32 = -3;

/// Heap exhaustion during registry growth.
pub const ALLOC_FAILED: i32 = -4;
