//! Secret detection for credgate: pattern registry and scan engine.
//!
//! This crate implements configurable secret pattern detection so that
//! credentials never leave the process unmasked. The canonical pattern
//! table lives in [`patterns`], the compiled registry in [`registry`], the
//! heuristic detectors in [`entropy`] and [`envvar`], and the combined scan
//! engine in [`scan`].

pub mod entropy;
pub mod envvar;
pub mod patterns;
pub mod registry;
pub mod scan;
pub mod validators;

pub use patterns::{DEFAULT_SECRET_PATTERNS, RiskLevel, SecretPatternDef, default_pattern_defs};
pub use registry::{DetectionConfigProvider, PatternRegistry};
pub use scan::{PatternFailure, ScanReport, Scanner, SecretMatch};
