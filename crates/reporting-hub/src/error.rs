//! Error handling for the reporting-hub binary.

use std::{io, result};

use thiserror::Error;

/// Convenient result type for reporting-hub operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that end a reporting-hub invocation.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrapper for standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Settings could not be loaded or the run could not be resolved.
    #[error("{}", .0.pretty())]
    Config(#[from] config::Error),
    /// The worker refused a task.
    #[error("Excel worker error: {0}")]
    Engine(#[from] xl_engine::Error),
    /// One or more queued tasks failed; details were already reported.
    #[error("{0} task(s) failed")]
    TasksFailed(usize),
}

impl Error {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(
                config::Error::UnknownMacroId(_)
                | config::Error::MissingWorkbook
                | config::Error::MissingMacro,
            ) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolvable_requests_exit_with_two() {
        assert_eq!(Error::Config(config::Error::MissingWorkbook).exit_code(), 2);
        assert_eq!(Error::TasksFailed(1).exit_code(), 1);
        assert_eq!(Error::Engine(xl_engine::Error::WorkerStopped).exit_code(), 1);
    }
}
