//! Error types for settings loading and run resolution.

use std::{
    cmp::{max, min},
    fmt::Write as _,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors produced while loading, saving, or resolving settings.
pub enum Error {
    #[error("{message}")]
    /// I/O or filesystem read error.
    Read {
        /// Path associated with the read error.
        path: PathBuf,
        /// Human-readable error message.
        message: String,
    },
    #[error("{message}")]
    /// JSON syntax or shape error with a concrete line/column location.
    Parse {
        /// Path of the settings file.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// 1-based column number.
        col: usize,
        /// Human-readable error message.
        message: String,
        /// Rendered excerpt including a caret at the error location.
        excerpt: String,
    },
    #[error("{message}")]
    /// Serialisation or filesystem write error.
    Write {
        /// Destination path.
        path: PathBuf,
        /// Human-readable error message.
        message: String,
    },
    #[error("unknown macro id: {0}")]
    /// `--macro` named an id that is not in the registry.
    UnknownMacroId(String),
    #[error("no workbook path configured")]
    /// Neither the registry entry, the pilot settings, nor an override gave a workbook.
    MissingWorkbook,
    #[error("no macro name configured")]
    /// No macro name could be resolved.
    MissingMacro,
}

impl Error {
    /// Render a human-friendly message including location and an excerpt when available.
    pub fn pretty(&self) -> String {
        match self {
            Self::Read { path, message } => format!("Read error at {}: {}", path.display(), message),
            Self::Parse {
                path,
                line,
                col,
                message,
                excerpt,
            } => format!(
                "Settings parse error at {}:{}:{}\n{}\n{}",
                path.display(),
                line,
                col,
                message,
                excerpt
            ),
            Self::Write { path, message } => {
                format!("Write error at {}: {}", path.display(), message)
            }
            other => other.to_string(),
        }
    }

    /// Access the settings path attached to this error, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Write { path, .. } => {
                Some(path)
            }
            Self::UnknownMacroId(_) | Self::MissingWorkbook | Self::MissingMacro => None,
        }
    }
}

/// Build a small 2-3 line excerpt with a caret at `(line_no, col_no)`.
pub fn excerpt_at(source: &str, line_no: usize, col_no: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let total = lines.len();
    let start = max(1usize, line_no.saturating_sub(2));
    let end = min(total, line_no + 1);

    let mut out = String::new();
    for n in start..=end {
        let text = lines.get(n - 1).copied().unwrap_or("");
        let _ignored = writeln!(out, " {:>4} | {}", n, text);
        if n == line_no {
            let prefix = format!(" {:>4} | ", n);
            let _ignored = writeln!(
                out,
                "{}{}^",
                " ".repeat(prefix.len()),
                " ".repeat(col_no.saturating_sub(1))
            );
        }
    }
    out
}
