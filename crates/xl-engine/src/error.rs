//! Error type for the controller and worker.

use std::{error::Error as StdError, path::PathBuf, result::Result as StdResult};

use thiserror::Error;
use xl_com::BridgeError;

/// Failures surfaced by the controller and the worker.
#[derive(Error, Debug)]
pub enum Error {
    /// The automation bridge cannot be used on this host.
    #[error("Excel automation unavailable: {0}")]
    Environment(String),

    /// A launched/not-launched precondition was violated.
    #[error("{0}")]
    IllegalState(String),

    /// The workbook path does not exist.
    #[error("workbook not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The workbook exists but could not be opened or activated.
    #[error("failed to open workbook {}: {source}", .path.display())]
    Io {
        /// Absolute path that was being opened.
        path: PathBuf,
        /// Last bridge error.
        source: BridgeError,
    },

    /// Invalid caller input.
    #[error("{0}")]
    Argument(String),

    /// Every invocation attempt of a macro failed.
    #[error("macro failed (tried {}): {source}", .attempts.join(", "))]
    MacroExecution {
        /// Names tried, in order.
        attempts: Vec<String>,
        /// Error from the last attempt.
        source: BridgeError,
    },

    /// Any other object-model call failure.
    #[error("automation call failed: {0}")]
    Automation(#[from] BridgeError),

    /// The worker no longer accepts tasks.
    #[error("Excel worker has been stopped")]
    WorkerStopped,

    /// A task panicked while being dispatched.
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl Error {
    pub(crate) fn not_running() -> Self {
        Self::IllegalState("Excel is not running".to_string())
    }

    /// The error followed by its full `source` chain, one cause per line.
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        let mut cur = self.source();
        while let Some(e) = cur {
            out.push_str("\n  caused by: ");
            out.push_str(&e.to_string());
            cur = e.source();
        }
        out
    }
}

/// Result alias over [`Error`].
pub type Result<T> = StdResult<T, Error>;
