//! Exit code constants for hook wrappers.

/// Payload may proceed (possibly masked)
pub const SUCCESS: i32 = 0;

/// Payload must not proceed
pub const BLOCKED: i32 = 2;
