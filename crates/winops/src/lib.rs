//! winops: Win32 window operations for the Excel automation harness.
//!
//! Provides a small, testable surface over the handful of user32 calls the
//! harness needs: enumerating the top-level windows owned by a process,
//! reading their class and show state, and nudging them (show/hide/minimize,
//! foreground, topmost pulse).
//!
//! None of these calls touch the Excel object model, so they are safe to
//! issue from any thread. On non-Windows hosts [`RealWinOps`] reports itself
//! unavailable and every operation fails with [`Error::Unavailable`].

mod error;
pub mod ops;
mod sys;
mod window;

pub use error::{Error, Result};
pub use ops::{RealWinOps, WinOps};
pub use window::{Hwnd, ShowCmd, WindowInfo};
