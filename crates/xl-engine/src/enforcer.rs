//! Background window enforcement for one Excel process.
//!
//! Goal: keep the main Excel window minimized/hidden while letting message
//! boxes and userforms raised by macros reach the user.
//!
//! Anti-flicker rules:
//! - a dialog is brought forward once per appearance, never repeatedly;
//! - the main window is enforced once when dialogs first appear, then left
//!   alone until every dialog is gone;
//! - with no dialogs, the main window is enforced at most once per period.
//!
//! [`EnforcerState`] is the pure state machine, driven one poll cycle at a
//! time; [`WindowEnforcer`] owns the polling thread. Neither touches the
//! Excel object model.

use std::{
    collections::HashSet,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use tracing::{debug, trace, warn};
use winops::{Hwnd, ShowCmd, WinOps};

use crate::{Mode, SharedMode};

/// Window classes of the Excel frame and its workbook client area.
pub const MAIN_CLASSES: &[&str] = &["XLMAIN", "EXCEL7"];
/// Standard Win32 dialog class (MsgBox, InputBox, alerts).
pub const DIALOG_CLASS: &str = "#32770";
/// Class prefix of VBA userforms.
pub const USERFORM_PREFIX: &str = "Thunder";

/// Role of a window owned by the tracked process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// Excel frame or workbook client window.
    Main,
    /// Message box or userform.
    Dialog,
    /// Anything else; ignored.
    Other,
}

/// Classify a window by its class name.
pub fn classify(class: &str) -> WindowKind {
    if MAIN_CLASSES.contains(&class) {
        WindowKind::Main
    } else if class == DIALOG_CLASS || class.starts_with(USERFORM_PREFIX) {
        WindowKind::Dialog
    } else {
        WindowKind::Other
    }
}

/// Enforcer timings.
#[derive(Debug, Clone)]
pub struct EnforcerCfg {
    /// Delay between poll cycles. Lower means more redraws.
    pub poll: Duration,
    /// Minimum spacing between main-window enforcements while idle.
    pub main_period: Duration,
}

impl Default for EnforcerCfg {
    fn default() -> Self {
        Self {
            poll: Duration::from_millis(450),
            main_period: Duration::from_millis(1500),
        }
    }
}

/// Enforcer state as of the last cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No dialog seen on the last cycle.
    Idle,
    /// At least one dialog was open on the last cycle.
    DialogsPresent,
}

/// What one cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Main-window enforcement was invoked this cycle.
    pub main_enforced: bool,
    /// Dialogs brought forward this cycle.
    pub raised: Vec<Hwnd>,
    /// Dialogs enumerated this cycle.
    pub dialogs: usize,
}

/// Anti-flicker state machine for one process.
#[derive(Debug)]
pub struct EnforcerState {
    pid: u32,
    mode: SharedMode,
    seen: HashSet<Hwnd>,
    had_dialogs: bool,
    last_main: Option<Instant>,
    main_period: Duration,
}

impl EnforcerState {
    /// Fresh state in [`Phase::Idle`]; the first idle cycle enforces.
    pub fn new(pid: u32, mode: SharedMode, cfg: &EnforcerCfg) -> Self {
        Self {
            pid,
            mode,
            seen: HashSet::new(),
            had_dialogs: false,
            last_main: None,
            main_period: cfg.main_period,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        if self.had_dialogs {
            Phase::DialogsPresent
        } else {
            Phase::Idle
        }
    }

    /// Dialog handles already brought forward during the current appearance.
    pub fn seen(&self) -> &HashSet<Hwnd> {
        &self.seen
    }

    /// Run one poll cycle at time `now`.
    ///
    /// Only enumeration failures are returned; failures acting on individual
    /// windows are logged and skipped.
    pub fn cycle(&mut self, ops: &dyn WinOps, now: Instant) -> winops::Result<CycleReport> {
        let windows = ops.windows_for_pid(self.pid)?;
        let mut mains = Vec::new();
        let mut dialogs = Vec::new();
        for w in &windows {
            match classify(&w.class) {
                WindowKind::Main => mains.push(w.hwnd),
                WindowKind::Dialog => dialogs.push(w.hwnd),
                WindowKind::Other => {}
            }
        }

        let mode = self.mode.load();
        let mut report = CycleReport {
            dialogs: dialogs.len(),
            ..CycleReport::default()
        };

        if dialogs.is_empty() {
            let due = self
                .last_main
                .is_none_or(|t| now.saturating_duration_since(t) >= self.main_period);
            if due {
                for &h in &mains {
                    enforce_main(ops, h, mode);
                }
                self.last_main = Some(now);
                report.main_enforced = true;
            }
            if self.had_dialogs {
                debug!(pid = self.pid, "dialogs closed");
            }
            self.had_dialogs = false;
            self.seen.clear();
            return Ok(report);
        }

        if !self.had_dialogs {
            debug!(pid = self.pid, count = dialogs.len(), "dialogs appeared");
            for &h in &mains {
                enforce_main(ops, h, mode);
            }
            report.main_enforced = true;
            self.had_dialogs = true;
            self.seen.clear();
        }

        for h in dialogs {
            if self.seen.insert(h) {
                bring_forward(ops, h);
                report.raised.push(h);
            }
        }
        Ok(report)
    }
}

/// Nudge the main window toward `mode`, only if it is not there already.
fn enforce_main(ops: &dyn WinOps, hwnd: Hwnd, mode: Mode) {
    let cmd = match mode {
        Mode::Visible => return,
        Mode::Hidden if ops.is_visible(hwnd) => ShowCmd::Hide,
        Mode::Minimized if !ops.is_minimized(hwnd) => ShowCmd::Minimize,
        Mode::Hidden | Mode::Minimized => return,
    };
    trace!(hwnd, %cmd, "enforce main window");
    if let Err(e) = ops.show(hwnd, cmd) {
        debug!(hwnd, error = %e, "main window enforcement failed");
    }
}

/// Bring a dialog to the front once: restore/show it if needed, ask for the
/// foreground, and only if that did not stick, pulse it through the topmost
/// band without leaving it pinned.
fn bring_forward(ops: &dyn WinOps, hwnd: Hwnd) {
    debug!(hwnd, "bringing dialog forward");
    let restore = if ops.is_minimized(hwnd) {
        Some(ShowCmd::Restore)
    } else if !ops.is_visible(hwnd) {
        Some(ShowCmd::Show)
    } else {
        None
    };
    if let Some(cmd) = restore
        && let Err(e) = ops.show(hwnd, cmd)
    {
        debug!(hwnd, error = %e, "dialog show failed");
    }

    if let Err(e) = ops.set_foreground(hwnd) {
        trace!(hwnd, error = %e, "foreground request refused");
    }
    if ops.foreground() == Some(hwnd) {
        return;
    }

    let pulse = ops
        .set_topmost(hwnd, true)
        .and_then(|()| ops.set_topmost(hwnd, false));
    if let Err(e) = pulse {
        debug!(hwnd, error = %e, "topmost pulse failed");
    }
    if let Err(e) = ops.set_foreground(hwnd) {
        trace!(hwnd, error = %e, "foreground retry refused");
    }
}

/// Owns the polling thread for one process.
pub struct WindowEnforcer {
    pid: u32,
    mode: SharedMode,
    ops: Arc<dyn WinOps>,
    cfg: EnforcerCfg,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl WindowEnforcer {
    /// A stopped enforcer for `pid`. Call [`WindowEnforcer::start`] to poll.
    pub fn new(pid: u32, mode: Mode, ops: Arc<dyn WinOps>, cfg: EnforcerCfg) -> Self {
        Self {
            pid,
            mode: SharedMode::new(mode),
            ops,
            cfg,
            stop_tx: None,
            handle: None,
        }
    }

    /// Tracked process id.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Current target mode.
    pub fn mode(&self) -> Mode {
        self.mode.load()
    }

    /// Change the target for future cycles.
    pub fn set_mode(&self, mode: Mode) {
        self.mode.store(mode);
    }

    /// Whether the poll thread is alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start polling. Idempotent; a silent no-op when the windowing API is
    /// unavailable.
    pub fn start(&mut self) {
        if !self.ops.available() {
            debug!(pid = self.pid, "window ops unavailable; enforcement disabled");
            return;
        }
        if self.is_running() {
            return;
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let mut state = EnforcerState::new(self.pid, self.mode.clone(), &self.cfg);
        let ops = self.ops.clone();
        let poll = self.cfg.poll;
        let spawned = thread::Builder::new()
            .name(format!("xl-enforcer-{}", self.pid))
            .spawn(move || {
                debug!(pid = state.pid, "enforcer thread started");
                loop {
                    if let Err(e) = state.cycle(ops.as_ref(), Instant::now()) {
                        debug!(error = %e, "enforcer cycle failed");
                    }
                    match stop_rx.recv_timeout(poll) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!(pid = state.pid, "enforcer thread stopped");
            });
        match spawned {
            Ok(handle) => {
                self.stop_tx = Some(stop_tx);
                self.handle = Some(handle);
            }
            Err(e) => warn!(pid = self.pid, error = %e, "failed to spawn enforcer thread"),
        }
    }

    /// Stop polling and wait for the current cycle to finish.
    pub fn stop(&mut self) {
        drop(self.stop_tx.take());
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!(pid = self.pid, "enforcer thread panicked");
        }
    }
}

impl Drop for WindowEnforcer {
    fn drop(&mut self) {
        self.stop();
    }
}
