use std::result::Result as StdResult;

use thiserror::Error;

use crate::Hwnd;

/// Window operation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The Win32 windowing API is not available on this host.
    #[error("Win32 windowing API unavailable on this platform")]
    Unavailable,

    /// The window handle no longer refers to a live window.
    #[error("window {0:#x} is gone")]
    WindowGone(Hwnd),

    /// A user32 call failed with the given HRESULT.
    #[error("{op} failed: HRESULT {code:#010x}")]
    Os {
        /// Name of the failing call.
        op: &'static str,
        /// Raw HRESULT value.
        code: i32,
    },

    /// The call returned without taking effect.
    #[error("{0} had no effect")]
    NoEffect(&'static str),
}

/// Result alias over [`Error`].
pub type Result<T> = StdResult<T, Error>;
