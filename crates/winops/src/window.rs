use std::fmt::{Display, Formatter, Result as FmtResult};

/// Raw window handle value (`HWND` as an integer).
pub type Hwnd = isize;

/// A top-level window owned by some process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Window handle.
    pub hwnd: Hwnd,
    /// Owning process id.
    pub pid: u32,
    /// Registered window class name, empty if it could not be read.
    pub class: String,
}

impl WindowInfo {
    /// Build a record; mostly useful for fakes.
    pub fn new(hwnd: Hwnd, pid: u32, class: impl Into<String>) -> Self {
        Self {
            hwnd,
            pid,
            class: class.into(),
        }
    }
}

/// Subset of `ShowWindow` commands used by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShowCmd {
    /// `SW_HIDE`
    Hide,
    /// `SW_MINIMIZE`
    Minimize,
    /// `SW_RESTORE`
    Restore,
    /// `SW_SHOW`
    Show,
}

impl Display for ShowCmd {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::Hide => "hide",
            Self::Minimize => "minimize",
            Self::Restore => "restore",
            Self::Show => "show",
        };
        f.write_str(s)
    }
}
