#![warn(missing_docs)]

//! Shared logging helpers and CLI argument definitions for the reporting-hub
//! workspace.
//!
//! Binaries flatten [`LogArgs`] into their clap parser, turn it into a filter
//! spec with [`compute_spec`], and install a subscriber with [`init`].

use std::{env, io};

use clap::Args;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry};

/// Logging controls for CLI apps.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Set global log level to trace (our crates only)
    #[arg(long, global = true, conflicts_with_all = ["debug", "log_level", "log_filter"])]
    pub trace: bool,

    /// Set global log level to debug (our crates only)
    #[arg(long, global = true, conflicts_with_all = ["trace", "log_level", "log_filter"])]
    pub debug: bool,

    /// Set a single global log level for our crates (error|warn|info|debug|trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Set an explicit tracing filter directive (overrides other flags)
    /// e.g. "xl_engine=trace,reporting_hub=debug"
    #[arg(long, global = true)]
    pub log_filter: Option<String>,
}

impl LogArgs {
    /// Final filter spec for these flags.
    pub fn spec(&self) -> String {
        compute_spec(
            self.trace,
            self.debug,
            self.log_level.as_deref(),
            self.log_filter.as_deref(),
        )
    }
}

/// List of crate targets that constitute "our" logs.
pub fn our_crates() -> &'static [&'static str] {
    &[
        // App
        "reporting_hub",
        // Automation
        "xl_engine",
        "xl_com",
        "winops",
        // Utilities
        "config",
        "logging",
    ]
}

/// Build a filter directive string that sets the same `level` for all of our crates.
pub fn level_spec_for(level: &str) -> String {
    let lvl = level.to_ascii_lowercase();
    our_crates()
        .iter()
        .map(|t| format!("{}={}", t, lvl))
        .collect::<Vec<_>>()
        .join(",")
}

/// Compute the final filter spec string with precedence:
/// - `log_filter`
/// - `trace`/`debug`/`log_level` (crate-scoped)
/// - `RUST_LOG` env
/// - default to crate-scoped `info`
pub fn compute_spec(
    trace: bool,
    debug: bool,
    log_level: Option<&str>,
    log_filter: Option<&str>,
) -> String {
    if let Some(spec) = log_filter {
        return spec.to_string();
    }
    if trace {
        return level_spec_for("trace");
    }
    if debug {
        return level_spec_for("debug");
    }
    if let Some(lvl) = log_level {
        return level_spec_for(lvl);
    }
    match env::var("RUST_LOG") {
        Ok(spec) if !spec.trim().is_empty() => spec,
        _ => level_spec_for("info"),
    }
}

/// Create an `EnvFilter` from a spec string.
pub fn env_filter_from_spec(spec: &str) -> EnvFilter {
    EnvFilter::new(spec)
}

/// Install the global subscriber: `EnvFilter` plus a compact stderr fmt
/// layer. Returns the spec in effect. A subscriber that is already installed
/// is left in place.
pub fn init(args: &LogArgs) -> String {
    let spec = args.spec();
    registry()
        .with(env_filter_from_spec(&spec))
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .try_init()
        .ok();
    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        let spec = compute_spec(true, false, Some("warn"), Some("xl_engine=trace"));
        assert_eq!(spec, "xl_engine=trace");
    }

    #[test]
    fn flags_scope_to_our_crates() {
        let spec = compute_spec(false, true, None, None);
        for c in our_crates() {
            assert!(spec.contains(&format!("{c}=debug")), "{spec}");
        }
        assert_eq!(compute_spec(false, false, Some("WARN"), None), level_spec_for("warn"));
    }

    #[test]
    fn trace_beats_level() {
        assert_eq!(compute_spec(true, false, Some("warn"), None), level_spec_for("trace"));
    }

    #[test]
    fn spec_parses_as_filter() {
        let spec = level_spec_for("info");
        let f = env_filter_from_spec(&spec);
        assert!(f.to_string().contains("xl_engine=info"));
    }
}
