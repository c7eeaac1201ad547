//! Logging surface for the allocation core
//!
//! The core emits `tracing` events under the `bundlecast` target; the two
//! macros below are the only logging hooks the library itself uses. [`init`]
//! is an optional convenience for hosts: it scopes filtering to this crate
//! and can mirror one agent's events into that agent's own log file, since
//! every agent owns exactly one core instance.

use crate::types::AgentId;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[macro_export]
macro_rules! auction_info {
    ($($arg:tt)+) => {
        tracing::info!(target: "bundlecast", $($arg)+)
    }
}

#[macro_export]
macro_rules! auction_debug {
    ($($arg:tt)+) => {
        tracing::debug!(target: "bundlecast", $($arg)+)
    }
}

/// Bare levels get scoped to this crate's target; anything that already
/// looks like a filter directive passes through untouched.
fn directive(level: &str) -> String {
    if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("bundlecast={}", level)
    }
}

/// Install a global subscriber for one agent's host process.
///
/// Events go to stdout; with `log_dir` set they are also mirrored to
/// `<log_dir>/<agent_id>.log` through a non-blocking writer, and the
/// returned guard must stay alive for the file to keep flushing. `level`
/// is either a bare level like `"debug"` (applied to this crate only) or a
/// full `EnvFilter` directive string.
pub fn init(
    agent_id: &AgentId,
    log_dir: Option<&Path>,
    level: &str,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(EnvFilter::new(directive(level)));

    match log_dir {
        Some(dir) => {
            let file = std::fs::File::create(dir.join(format!("{}.log", agent_id)))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(directive(level)));
            tracing_subscriber::registry()
                .with(stdout_layer)
                .with(file_layer)
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(stdout_layer)
                .try_init()?;
            Ok(None)
        }
    }
}
