//! Tracing setup for credgate.
//!
//! The hook wrapper calls [`init_tracing`] once at startup; library code
//! only uses `tracing` macros. Diagnostic output goes to stderr so it never
//! mixes with the sanitized payload the wrapper writes to stdout.

use tracing_subscriber::{
    EnvFilter,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initialize the tracing subscriber for structured logging.
///
/// Honors `RUST_LOG` when set; otherwise defaults to `credgate=debug,info`
/// in verbose mode and `credgate=info,warn` otherwise.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("credgate=debug,info")
            } else {
                EnvFilter::try_new("credgate=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()?;

    Ok(())
}
