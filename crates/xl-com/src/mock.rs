//! Recording bridge for tests (enabled with the `test-utils` feature).
//!
//! Every object-model call is appended to a shared log together with the
//! thread that issued it, so tests can assert both ordering and thread
//! affinity.

use std::{
    cell::Cell,
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
    thread::{self, ThreadId},
    time::Duration,
};

use parking_lot::Mutex;

use crate::{Application, Bridge, BridgeError, Result};

#[derive(Default)]
struct State {
    calls: Vec<(ThreadId, String)>,
    live: usize,
    launches: usize,
    hwnd: isize,
    unavailable: bool,
    fail_enter: bool,
    fail_quit: bool,
    fail_open: bool,
    fail_suppressed_open: bool,
    open: HashMap<PathBuf, String>,
    good_macros: HashSet<String>,
    run_delay: Option<Duration>,
    panic_run: bool,
}

/// Shared-state mock; clones observe the same log.
#[derive(Clone)]
pub struct MockBridge {
    state: Arc<Mutex<State>>,
}

impl Default for MockBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBridge {
    /// A bridge whose instances report hwnd `0x1000` and accept no macros.
    pub fn new() -> Self {
        let state = State {
            hwnd: 0x1000,
            ..State::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Main window handle reported by launched instances.
    pub fn set_hwnd(&self, hwnd: isize) {
        self.state.lock().hwnd = hwnd;
    }
    /// Make `launch` fail as if automation were missing.
    pub fn set_unavailable(&self, v: bool) {
        self.state.lock().unavailable = v;
    }
    /// Make `enter_thread` fail.
    pub fn set_fail_enter(&self, v: bool) {
        self.state.lock().fail_enter = v;
    }
    /// Make `quit` fail without releasing the instance.
    pub fn set_fail_quit(&self, v: bool) {
        self.state.lock().fail_quit = v;
    }
    /// Make every `open_workbook` call fail.
    pub fn set_fail_open(&self, v: bool) {
        self.state.lock().fail_open = v;
    }
    /// Make only the `UpdateLinks:=0` variant of `open_workbook` fail.
    pub fn set_fail_suppressed_open(&self, v: bool) {
        self.state.lock().fail_suppressed_open = v;
    }
    /// Pretend `path` is already open under `name`.
    pub fn add_open_workbook(&self, path: impl Into<PathBuf>, name: &str) {
        self.state.lock().open.insert(path.into(), name.to_string());
    }
    /// Macro names `run` accepts; anything else fails.
    pub fn accept_macro(&self, name: &str) {
        self.state.lock().good_macros.insert(name.to_string());
    }
    /// Make `run` block for `d` before returning.
    pub fn set_run_delay(&self, d: Duration) {
        self.state.lock().run_delay = Some(d);
    }
    /// Make `run` panic instead of returning.
    pub fn set_panic_run(&self, v: bool) {
        self.state.lock().panic_run = v;
    }

    /// Every recorded call, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.iter().map(|(_, c)| c.clone()).collect()
    }
    /// Recorded calls starting with `prefix`.
    pub fn calls_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }
    /// Distinct threads that touched the object model.
    pub fn threads(&self) -> HashSet<ThreadId> {
        self.state.lock().calls.iter().map(|(t, _)| *t).collect()
    }
    /// Instances launched and not yet quit (or dropped).
    pub fn live_instances(&self) -> usize {
        self.state.lock().live
    }
    /// Total successful launches.
    pub fn launches(&self) -> usize {
        self.state.lock().launches
    }

    fn note(&self, call: String) {
        self.state.lock().calls.push((thread::current().id(), call));
    }
}

impl Bridge for MockBridge {
    type App = MockApp;

    fn enter_thread(&self) -> Result<()> {
        self.note("enter_thread".into());
        if self.state.lock().fail_enter {
            return Err(BridgeError::Unavailable("apartment init failed".into()));
        }
        Ok(())
    }

    fn leave_thread(&self) {
        self.note("leave_thread".into());
    }

    fn launch(&self) -> Result<MockApp> {
        self.note("launch".into());
        let mut st = self.state.lock();
        if st.unavailable {
            return Err(BridgeError::Unavailable("mock bridge disabled".into()));
        }
        st.live += 1;
        st.launches += 1;
        Ok(MockApp {
            bridge: self.clone(),
            quit: Cell::new(false),
        })
    }
}

/// Instance handed out by [`MockBridge`].
pub struct MockApp {
    bridge: MockBridge,
    quit: Cell<bool>,
}

impl MockApp {
    fn note(&self, call: String) {
        self.bridge.note(call);
    }
}

impl Drop for MockApp {
    fn drop(&mut self) {
        if !self.quit.get() {
            self.bridge.state.lock().live -= 1;
        }
    }
}

impl Application for MockApp {
    fn hwnd(&self) -> Result<isize> {
        self.note("hwnd".into());
        Ok(self.bridge.state.lock().hwnd)
    }

    fn set_display_alerts(&self, on: bool) -> Result<()> {
        self.note(format!("display_alerts:{on}"));
        Ok(())
    }

    fn set_ask_to_update_links(&self, on: bool) -> Result<()> {
        self.note(format!("ask_links:{on}"));
        Ok(())
    }

    fn set_visible(&self, on: bool) -> Result<()> {
        self.note(format!("visible:{on}"));
        Ok(())
    }

    fn find_workbook(&self, path: &Path) -> Result<String> {
        self.note(format!("find:{}", path.display()));
        self.bridge
            .state
            .lock()
            .open
            .get(path)
            .cloned()
            .ok_or_else(|| BridgeError::other("not open"))
    }

    fn activate_workbook(&self, name: &str) -> Result<()> {
        self.note(format!("activate:{name}"));
        Ok(())
    }

    fn open_workbook(&self, path: &Path, suppress_links: bool) -> Result<String> {
        self.note(format!("open:{}:{suppress_links}", path.display()));
        let mut st = self.bridge.state.lock();
        if st.fail_open || (suppress_links && st.fail_suppressed_open) {
            return Err(BridgeError::Com {
                op: "Open".into(),
                code: 0x800A_03ECu32 as i32,
                message: "cannot open".into(),
            });
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        st.open.insert(path.to_path_buf(), name.clone());
        Ok(name)
    }

    fn run(&self, macro_name: &str, args: &[String]) -> Result<()> {
        self.note(format!("run:{macro_name}:{}", args.join(",")));
        let (delay, ok, panic_run) = {
            let st = self.bridge.state.lock();
            (st.run_delay, st.good_macros.contains(macro_name), st.panic_run)
        };
        if let Some(d) = delay {
            thread::sleep(d);
        }
        if panic_run {
            panic!("mock run of '{macro_name}' panicked");
        }
        if ok {
            Ok(())
        } else {
            Err(BridgeError::Com {
                op: "Run".into(),
                code: 0x800A_03ECu32 as i32,
                message: format!("cannot run the macro '{macro_name}'"),
            })
        }
    }

    fn quit(&self) -> Result<()> {
        self.note("quit".into());
        let mut st = self.bridge.state.lock();
        if st.fail_quit {
            return Err(BridgeError::Com {
                op: "Quit".into(),
                code: 0x8001_0108u32 as i32,
                message: "object disconnected".into(),
            });
        }
        if !self.quit.replace(true) {
            st.live -= 1;
        }
        Ok(())
    }
}
