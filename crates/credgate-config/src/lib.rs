//! Configuration for credgate: TOML model, discovery, and validation.
//!
//! Precedence is explicit path > discovered file > built-in defaults. All
//! fields have code-level defaults, so an absent or empty config file yields
//! a fully working gate.

pub mod config;

pub use config::{
    AuditConfig, Config, ConfigBuilder, DetectionConfig, MaskingConfig, OnDetection, OnError,
    PolicyConfig,
};
