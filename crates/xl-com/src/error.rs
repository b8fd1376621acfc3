use std::result::Result as StdResult;

use thiserror::Error;

/// Errors raised by the automation bridge.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The automation mechanism cannot be used on this host.
    #[error("automation bridge unavailable: {0}")]
    Unavailable(String),

    /// A COM call failed.
    #[error("{op} failed ({code:#010x}): {message}")]
    Com {
        /// Member or API that failed.
        op: String,
        /// HRESULT (or `scode` from the exception info).
        code: i32,
        /// Description reported by the server, if any.
        message: String,
    },

    /// The call returned something the bridge could not interpret.
    #[error("{0}")]
    Other(String),
}

impl BridgeError {
    /// Free-form failure.
    pub fn other<M: Into<String>>(msg: M) -> Self {
        Self::Other(msg.into())
    }
}

/// Result alias over [`BridgeError`].
pub type Result<T> = StdResult<T, BridgeError>;
