//! The automation controller: one application instance and its enforcer.
//!
//! A `Controller` is constructed on, and never leaves, the worker thread. It
//! holds the thread-affine application value so nothing else can reach it.

use std::{
    path::{self, Path, PathBuf},
    result::Result as StdResult,
    sync::Arc,
    thread,
    time::Duration,
};

use tracing::{debug, info, warn};
use winops::{Hwnd, ShowCmd, WinOps};
use xl_com::{Application, Bridge, BridgeError};

use crate::{EnforcerCfg, Error, Mode, Result, UiClosed, WindowEnforcer};

/// Status sink. Failures are swallowed by the controller.
pub type Logger = Box<dyn Fn(&str) -> StdResult<(), UiClosed>>;

/// Settle time after forcing the window visible.
const SHOW_SETTLE: Duration = Duration::from_millis(50);

/// Owns at most one launched instance, its window handle and pid, the
/// target mode, and the enforcer scoped to that pid.
pub struct Controller<B: Bridge> {
    bridge: B,
    winops: Arc<dyn WinOps>,
    enforcer_cfg: EnforcerCfg,
    logger: Logger,
    app: Option<B::App>,
    hwnd: Option<Hwnd>,
    pid: Option<u32>,
    mode: Mode,
    enforcer: Option<WindowEnforcer>,
}

impl<B: Bridge> Controller<B> {
    /// A controller with nothing launched and the default mode.
    pub fn new(bridge: B, winops: Arc<dyn WinOps>, enforcer_cfg: EnforcerCfg, logger: Logger) -> Self {
        Self {
            bridge,
            winops,
            enforcer_cfg,
            logger,
            app: None,
            hwnd: None,
            pid: None,
            mode: Mode::default(),
            enforcer: None,
        }
    }

    /// Whether an instance is running.
    pub fn is_launched(&self) -> bool {
        self.app.is_some()
    }

    /// Target window mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Process id of the launched instance, when it could be resolved.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// The running instance's enforcer.
    pub fn enforcer(&self) -> Option<&WindowEnforcer> {
        self.enforcer.as_ref()
    }

    /// Record the mode to use for the next launch without touching any
    /// window.
    pub fn set_preferred_mode(&mut self, mode: Mode) {
        self.mode = mode;
        if let Some(e) = &self.enforcer {
            e.set_mode(mode);
        }
    }

    fn status(&self, line: &str) {
        info!("{line}");
        if (self.logger)(line).is_err() {
            debug!("status sink closed");
        }
    }

    fn app(&self) -> Result<&B::App> {
        self.app.as_ref().ok_or_else(Error::not_running)
    }

    /// Start a dedicated instance and apply the current mode to it.
    pub fn launch_new_instance(&mut self) -> Result<()> {
        if self.app.is_some() {
            return Err(Error::IllegalState("Excel is already running".into()));
        }
        let app = self.bridge.launch().map_err(|e| match e {
            BridgeError::Unavailable(msg) => Error::Environment(msg),
            other => Error::Automation(other),
        })?;
        self.status("Excel: dedicated instance launched.");

        if let Err(e) = app.set_display_alerts(false) {
            debug!(error = %e, "DisplayAlerts not set");
        }
        if let Err(e) = app.set_ask_to_update_links(false) {
            debug!(error = %e, "AskToUpdateLinks not set");
        }

        match app.hwnd() {
            Ok(hwnd) => self.hwnd = Some(hwnd),
            Err(e) => warn!(error = %e, "main window handle unavailable"),
        }
        self.app = Some(app);
        self.start_enforcer();
        self.apply_mode(self.mode);
        Ok(())
    }

    fn start_enforcer(&mut self) {
        let pid = self.hwnd.map(|h| self.winops.window_pid(h));
        match pid {
            Some(Ok(pid)) => {
                let mut enforcer =
                    WindowEnforcer::new(pid, self.mode, self.winops.clone(), self.enforcer_cfg.clone());
                enforcer.start();
                self.pid = Some(pid);
                self.enforcer = Some(enforcer);
                self.status(&format!("Excel: window enforcer active (pid {pid})."));
            }
            Some(Err(e)) => {
                debug!(error = %e, "owning process not resolved");
                self.status("Excel: window enforcer not started (non-fatal).");
            }
            None => self.status("Excel: window enforcer not started (non-fatal)."),
        }
    }

    /// Quit the instance. State is cleared even when the quit call fails.
    pub fn quit_instance(&mut self) -> Result<()> {
        let app = self.app.take().ok_or_else(Error::not_running)?;
        if let Some(mut enforcer) = self.enforcer.take() {
            enforcer.stop();
        }
        self.hwnd = None;
        self.pid = None;

        if let Err(e) = app.set_display_alerts(false) {
            debug!(error = %e, "DisplayAlerts not set before quit");
        }
        let res = app.quit();
        drop(app);
        res?;
        self.status("Excel: closed.");
        Ok(())
    }

    /// Change the window mode and apply it immediately.
    pub fn set_mode(&mut self, mode: Mode) -> Result<Mode> {
        self.app()?;
        self.set_preferred_mode(mode);
        self.apply_mode(mode);
        Ok(mode)
    }

    /// Keep the instance visible at the object-model level and put its OS
    /// window into the requested state. Failures are logged only.
    fn apply_mode(&self, mode: Mode) {
        let Some(app) = &self.app else { return };
        if let Err(e) = app.set_visible(true) {
            warn!(error = %e, "Application.Visible not set");
        }
        let Some(hwnd) = self.hwnd else { return };
        if !self.winops.available() {
            debug!(%mode, "window ops unavailable; OS window state unchanged");
            return;
        }
        let cmd = match mode {
            Mode::Hidden => ShowCmd::Hide,
            Mode::Minimized => ShowCmd::Minimize,
            Mode::Visible => ShowCmd::Restore,
        };
        if let Err(e) = self.winops.show(hwnd, cmd) {
            warn!(hwnd, %cmd, error = %e, "failed to apply window mode");
        }
    }

    /// Make the window visible. Reverting is up to the caller.
    pub fn show_for_seconds(&mut self, secs: u64) -> Result<()> {
        self.set_mode(Mode::Visible)?;
        debug!(secs, "window shown");
        thread::sleep(SHOW_SETTLE);
        Ok(())
    }

    /// Activate the workbook at `path` if it is already open, otherwise open
    /// it. Returns the workbook name.
    pub fn open_or_activate(&self, path: &Path) -> Result<String> {
        let app = self.app()?;
        let abs = absolute(path);
        if !abs.exists() {
            return Err(Error::NotFound(abs));
        }

        if let Ok(name) = app.find_workbook(&abs) {
            if let Err(e) = app.activate_workbook(&name) {
                debug!(workbook = %name, error = %e, "activate failed; using it anyway");
            }
            return Ok(name);
        }

        let opened = app.open_workbook(&abs, true).or_else(|e| {
            debug!(error = %e, "open with UpdateLinks:=0 failed; retrying plain open");
            app.open_workbook(&abs, false)
        });
        match opened {
            Ok(name) => {
                self.status(&format!("Workbook opened: {name}"));
                Ok(name)
            }
            Err(source) => Err(Error::Io { path: abs, source }),
        }
    }

    /// Run `macro_name` with `args`. Unqualified names are retried as
    /// `workbook!macro` when the bare call fails.
    pub fn run_macro(&self, workbook: &str, macro_name: &str, args: &[String]) -> Result<()> {
        let app = self.app()?;
        let name = macro_name.trim();
        if name.is_empty() {
            return Err(Error::Argument("macro name is empty".into()));
        }

        let mut attempts = vec![name.to_string()];
        if !name.contains('!') {
            attempts.push(format!("{workbook}!{name}"));
        }

        let mut last = None;
        for m in &attempts {
            match app.run(m, args) {
                Ok(()) => {
                    self.status(&format!("Macro OK: {m}"));
                    return Ok(());
                }
                Err(e) => {
                    debug!(macro_name = %m, error = %e, "macro attempt failed");
                    last = Some(e);
                }
            }
        }
        Err(Error::MacroExecution {
            attempts,
            source: last.unwrap_or_else(|| BridgeError::other("no attempt made")),
        })
    }

    /// Give back the bridge once the instance is gone.
    pub fn into_bridge(mut self) -> B {
        self.enforcer.take();
        self.app.take();
        self.bridge
    }
}

fn absolute(p: &Path) -> PathBuf {
    path::absolute(p).unwrap_or_else(|_| p.to_path_buf())
}
