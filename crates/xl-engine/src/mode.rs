//! Visibility mode of the main Excel window.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

/// How the main application window should be presented.
///
/// In every mode the instance stays visible at the object-model level so that
/// dialogs and userforms raised by macros can still render; only the OS
/// window state differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// OS window hidden.
    Hidden,
    /// OS window minimized.
    #[default]
    Minimized,
    /// OS window restored.
    Visible,
}

impl Mode {
    /// Parse user input. Anything that is not exactly one of the three mode
    /// names (ignoring case and surrounding whitespace) becomes `Minimized`.
    pub fn coerce(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "hidden" => Self::Hidden,
            "visible" => Self::Visible,
            _ => Self::Minimized,
        }
    }

    /// Lower-case name, as accepted by [`Mode::coerce`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Minimized => "minimized",
            Self::Visible => "visible",
        }
    }

    /// Mode applied while a macro runs: the workbook stays out of sight
    /// unless the user asked to see it.
    pub fn during_macro(self) -> Self {
        match self {
            Self::Visible => Self::Visible,
            Self::Hidden | Self::Minimized => Self::Hidden,
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Hidden => 0,
            Self::Minimized => 1,
            Self::Visible => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Hidden,
            2 => Self::Visible,
            _ => Self::Minimized,
        }
    }
}

impl From<&str> for Mode {
    fn from(s: &str) -> Self {
        Self::coerce(s)
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Single-writer, many-reader mode cell shared with the enforcer thread.
///
/// Readers may observe a stale value for one poll cycle; enforcement is
/// idempotent so that is harmless.
#[derive(Debug, Clone)]
pub struct SharedMode(Arc<AtomicU8>);

impl SharedMode {
    /// A new cell holding `mode`.
    pub fn new(mode: Mode) -> Self {
        Self(Arc::new(AtomicU8::new(mode.to_u8())))
    }

    /// Current value.
    pub fn load(&self) -> Mode {
        Mode::from_u8(self.0.load(Ordering::Relaxed))
    }

    /// Replace the value.
    pub fn store(&self, mode: Mode) {
        self.0.store(mode.to_u8(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_known_names() {
        assert_eq!(Mode::coerce("hidden"), Mode::Hidden);
        assert_eq!(Mode::coerce("  Visible "), Mode::Visible);
        assert_eq!(Mode::coerce("MINIMIZED"), Mode::Minimized);
    }

    #[test]
    fn coerce_anything_else_to_minimized() {
        for s in ["", "max", "hide", "visible!", "0", "invisible"] {
            assert_eq!(Mode::coerce(s), Mode::Minimized, "input {s:?}");
        }
    }

    #[test]
    fn macro_runs_hide_unless_visible() {
        assert_eq!(Mode::Minimized.during_macro(), Mode::Hidden);
        assert_eq!(Mode::Hidden.during_macro(), Mode::Hidden);
        assert_eq!(Mode::Visible.during_macro(), Mode::Visible);
    }

    #[test]
    fn shared_mode_is_shared() {
        let a = SharedMode::new(Mode::Hidden);
        let b = a.clone();
        a.store(Mode::Visible);
        assert_eq!(b.load(), Mode::Visible);
    }
}
