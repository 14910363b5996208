//! Logging seam for the optimizer.
//!
//! The optimizer never reaches for a global logger. It is handed an
//! `Arc<dyn Logger>` at construction; production code passes
//! [`TracingLogger`], tests pass a stub that records entries.

use std::fmt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Structured log sink. `context` is a list of `(key, value)` pairs; empty means none.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, context: &[(&str, String)]);
}

/// Renders context pairs as `key=value key=value`.
struct ContextDisplay<'a>(&'a [(&'a str, String)]);

impl fmt::Display for ContextDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Forwards to the `tracing` macros under the `recipe_images` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, context: &[(&str, String)]) {
        let context = ContextDisplay(context);
        match level {
            LogLevel::Info => tracing::info!(target: "recipe_images", %context, "{message}"),
            LogLevel::Warn => tracing::warn!(target: "recipe_images", %context, "{message}"),
            LogLevel::Error => tracing::error!(target: "recipe_images", %context, "{message}"),
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _level: LogLevel, _message: &str, _context: &[(&str, String)]) {}
}

/// Install the global `tracing` subscriber for the CLI.
///
/// `RUST_LOG` takes precedence; otherwise `info`, or `debug` when verbose.
/// Calling it twice is harmless.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
