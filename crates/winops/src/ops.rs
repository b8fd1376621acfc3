//! Window operations behind a trait, so the enforcer can run against a fake.

use crate::{Hwnd, Result as WinResult, ShowCmd, WindowInfo, sys};

/// Trait abstraction over window operations to improve testability.
pub trait WinOps: Send + Sync {
    /// Whether the OS windowing API is usable on this host.
    fn available(&self) -> bool;
    /// All live top-level windows owned by `pid`.
    fn windows_for_pid(&self, pid: u32) -> WinResult<Vec<WindowInfo>>;
    /// Process id owning `hwnd`.
    fn window_pid(&self, hwnd: Hwnd) -> WinResult<u32>;
    fn is_visible(&self, hwnd: Hwnd) -> bool;
    fn is_minimized(&self, hwnd: Hwnd) -> bool;
    fn show(&self, hwnd: Hwnd, cmd: ShowCmd) -> WinResult<()>;
    fn set_foreground(&self, hwnd: Hwnd) -> WinResult<()>;
    fn foreground(&self) -> Option<Hwnd>;
    /// Pin (`true`) or unpin (`false`) the window in the topmost band.
    fn set_topmost(&self, hwnd: Hwnd, topmost: bool) -> WinResult<()>;
}

/// Production implementation of WinOps delegating to user32.
pub struct RealWinOps;

impl WinOps for RealWinOps {
    fn available(&self) -> bool {
        sys::AVAILABLE
    }
    fn windows_for_pid(&self, pid: u32) -> WinResult<Vec<WindowInfo>> {
        sys::windows_for_pid(pid)
    }
    fn window_pid(&self, hwnd: Hwnd) -> WinResult<u32> {
        sys::window_pid(hwnd)
    }
    fn is_visible(&self, hwnd: Hwnd) -> bool {
        sys::is_visible(hwnd)
    }
    fn is_minimized(&self, hwnd: Hwnd) -> bool {
        sys::is_minimized(hwnd)
    }
    fn show(&self, hwnd: Hwnd, cmd: ShowCmd) -> WinResult<()> {
        sys::show(hwnd, cmd)
    }
    fn set_foreground(&self, hwnd: Hwnd) -> WinResult<()> {
        sys::set_foreground(hwnd)
    }
    fn foreground(&self) -> Option<Hwnd> {
        sys::foreground()
    }
    fn set_topmost(&self, hwnd: Hwnd, topmost: bool) -> WinResult<()> {
        sys::set_topmost(hwnd, topmost)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockWinOps;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use std::{
        collections::HashSet,
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
    };

    use parking_lot::Mutex;

    use super::WinOps;
    use crate::{Error, Hwnd, Result as WinResult, ShowCmd, WindowInfo};

    /// In-memory window table for tests (enabled with `test-utils` feature).
    ///
    /// Show commands update the simulated visible/minimized state so that
    /// "only if needed" logic can be observed. Every mutating call is recorded
    /// as a string such as `show:7:hide`, `foreground:7` or `topmost:7:true`.
    #[derive(Clone)]
    pub struct MockWinOps {
        calls: Arc<Mutex<Vec<String>>>,
        windows: Arc<Mutex<Vec<WindowInfo>>>,
        hidden: Arc<Mutex<HashSet<Hwnd>>>,
        minimized: Arc<Mutex<HashSet<Hwnd>>>,
        front: Arc<Mutex<Option<Hwnd>>>,
        available: Arc<AtomicBool>,
        accept_foreground: Arc<AtomicBool>,
        fail_enum: Arc<AtomicBool>,
        fail_show: Arc<AtomicBool>,
    }

    impl Default for MockWinOps {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockWinOps {
        /// Empty window list, everything available and succeeding.
        pub fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                windows: Arc::new(Mutex::new(Vec::new())),
                hidden: Arc::new(Mutex::new(HashSet::new())),
                minimized: Arc::new(Mutex::new(HashSet::new())),
                front: Arc::new(Mutex::new(None)),
                available: Arc::new(AtomicBool::new(true)),
                accept_foreground: Arc::new(AtomicBool::new(true)),
                fail_enum: Arc::new(AtomicBool::new(false)),
                fail_show: Arc::new(AtomicBool::new(false)),
            }
        }
        /// Replace the enumerated windows.
        pub fn set_windows(&self, wins: Vec<WindowInfo>) {
            *self.windows.lock() = wins;
        }
        /// Toggle [`WinOps::available`].
        pub fn set_available(&self, v: bool) {
            self.available.store(v, Ordering::SeqCst);
        }
        /// When false, `set_foreground` is recorded but the foreground window does not change.
        pub fn set_accept_foreground(&self, v: bool) {
            self.accept_foreground.store(v, Ordering::SeqCst);
        }
        /// Make enumeration fail.
        pub fn set_fail_enum(&self, v: bool) {
            self.fail_enum.store(v, Ordering::SeqCst);
        }
        /// Make `show` fail.
        pub fn set_fail_show(&self, v: bool) {
            self.fail_show.store(v, Ordering::SeqCst);
        }
        /// Mark `hwnd` minimized or not.
        pub fn set_minimized(&self, hwnd: Hwnd, v: bool) {
            let mut g = self.minimized.lock();
            if v {
                g.insert(hwnd);
            } else {
                g.remove(&hwnd);
            }
        }
        /// Mark `hwnd` hidden or not.
        pub fn set_hidden(&self, hwnd: Hwnd, v: bool) {
            let mut g = self.hidden.lock();
            if v {
                g.insert(hwnd);
            } else {
                g.remove(&hwnd);
            }
        }
        /// Every recorded call, in order.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
        /// Forget recorded calls.
        pub fn clear_calls(&self) {
            self.calls.lock().clear();
        }
        /// Whether exactly `s` was recorded.
        pub fn calls_contains(&self, s: &str) -> bool {
            self.calls.lock().iter().any(|x| x == s)
        }
        /// Number of recorded calls starting with `prefix`.
        pub fn count(&self, prefix: &str) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|c| c.starts_with(prefix))
                .count()
        }
        fn note(&self, s: String) {
            self.calls.lock().push(s);
        }
    }

    impl WinOps for MockWinOps {
        fn available(&self) -> bool {
            self.available.load(Ordering::SeqCst)
        }
        fn windows_for_pid(&self, pid: u32) -> WinResult<Vec<WindowInfo>> {
            if self.fail_enum.load(Ordering::SeqCst) {
                return Err(Error::Os {
                    op: "EnumWindows",
                    code: -1,
                });
            }
            Ok(self
                .windows
                .lock()
                .iter()
                .filter(|w| w.pid == pid)
                .cloned()
                .collect())
        }
        fn window_pid(&self, hwnd: Hwnd) -> WinResult<u32> {
            self.windows
                .lock()
                .iter()
                .find(|w| w.hwnd == hwnd)
                .map(|w| w.pid)
                .ok_or(Error::WindowGone(hwnd))
        }
        fn is_visible(&self, hwnd: Hwnd) -> bool {
            !self.hidden.lock().contains(&hwnd)
        }
        fn is_minimized(&self, hwnd: Hwnd) -> bool {
            self.minimized.lock().contains(&hwnd)
        }
        fn show(&self, hwnd: Hwnd, cmd: ShowCmd) -> WinResult<()> {
            self.note(format!("show:{hwnd}:{cmd}"));
            if self.fail_show.load(Ordering::SeqCst) {
                return Err(Error::WindowGone(hwnd));
            }
            match cmd {
                ShowCmd::Hide => self.set_hidden(hwnd, true),
                ShowCmd::Minimize => self.set_minimized(hwnd, true),
                ShowCmd::Restore => {
                    self.set_minimized(hwnd, false);
                    self.set_hidden(hwnd, false);
                }
                ShowCmd::Show => self.set_hidden(hwnd, false),
            }
            Ok(())
        }
        fn set_foreground(&self, hwnd: Hwnd) -> WinResult<()> {
            self.note(format!("foreground:{hwnd}"));
            if self.accept_foreground.load(Ordering::SeqCst) {
                *self.front.lock() = Some(hwnd);
                Ok(())
            } else {
                Err(Error::NoEffect("SetForegroundWindow"))
            }
        }
        fn foreground(&self) -> Option<Hwnd> {
            *self.front.lock()
        }
        fn set_topmost(&self, hwnd: Hwnd, topmost: bool) -> WinResult<()> {
            self.note(format!("topmost:{hwnd}:{topmost}"));
            Ok(())
        }
    }
}
