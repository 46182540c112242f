//! Foundation utilities shared across the credgate workspace: the error
//! taxonomy, JCS canonicalization and BLAKE3 hashing, per-user paths, and
//! tracing setup.

pub mod canonicalization;
pub mod error;
pub mod logging;
pub mod paths;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
