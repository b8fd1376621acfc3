//! Requests producers send to the worker.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::PathBuf,
};

use crate::{Error, Mode};

/// Arguments of a `run_pilot` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PilotRequest {
    /// Workbook to open or activate.
    pub workbook: PathBuf,
    /// Macro to run; retried as `workbook!macro` when unqualified.
    pub macro_name: String,
    /// Macro arguments, passed in order.
    pub args: Vec<String>,
    /// Requested window mode; `None` keeps the controller's current mode.
    pub mode: Option<String>,
}

impl PilotRequest {
    /// A request with no arguments that keeps the current mode.
    pub fn new(workbook: impl Into<PathBuf>, macro_name: impl Into<String>) -> Self {
        Self {
            workbook: workbook.into(),
            macro_name: macro_name.into(),
            args: Vec::new(),
            mode: None,
        }
    }

    /// Replace the macro arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Request a window mode for the duration of the run.
    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }
}

/// Worker request vocabulary. Mode strings are coerced with [`Mode::coerce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Start a dedicated instance.
    Launch {
        /// Mode applied once the instance is up.
        mode: String,
    },
    /// Quit the running instance.
    Quit,
    /// Change the window mode (applied immediately when running).
    SetMode {
        /// Requested mode.
        mode: String,
    },
    /// Show the window for a fixed hold, then restore the previous mode.
    /// Occupies the worker for the whole hold.
    Show10s,
    /// Open a workbook and run a macro in it.
    RunPilot(PilotRequest),
}

impl Action {
    /// Short snake_case name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Launch { .. } => "launch",
            Self::Quit => "quit",
            Self::SetMode { .. } => "set_mode",
            Self::Show10s => "show_10s",
            Self::RunPilot(_) => "run_pilot",
        }
    }
}

/// Successful task result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskValue {
    /// The action completed.
    Done,
    /// Resolved mode of a `set_mode` request.
    Mode(Mode),
}

/// Success continuation.
pub type OnOk = Box<dyn FnOnce(TaskValue) + Send + 'static>;
/// Error continuation.
pub type OnErr = Box<dyn FnOnce(Error) + Send + 'static>;

/// An action plus optional continuations. Continuations run on the producer
/// thread, never on the worker.
pub struct Task {
    pub(crate) action: Action,
    pub(crate) on_ok: Option<OnOk>,
    pub(crate) on_err: Option<OnErr>,
}

impl Task {
    /// A task with no continuations.
    pub fn new(action: Action) -> Self {
        Self {
            action,
            on_ok: None,
            on_err: None,
        }
    }

    /// Run `f` on the producer thread with the result.
    pub fn on_ok<F>(mut self, f: F) -> Self
    where
        F: FnOnce(TaskValue) + Send + 'static,
    {
        self.on_ok = Some(Box::new(f));
        self
    }

    /// Run `f` on the producer thread with the error. Without one, a
    /// failure becomes a generic notification.
    pub fn on_err<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Error) + Send + 'static,
    {
        self.on_err = Some(Box::new(f));
        self
    }

    /// The requested action.
    pub fn action(&self) -> &Action {
        &self.action
    }
}

impl From<Action> for Task {
    fn from(action: Action) -> Self {
        Self::new(action)
    }
}

impl Debug for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Task")
            .field("action", &self.action)
            .field("on_ok", &self.on_ok.is_some())
            .field("on_err", &self.on_err.is_some())
            .finish()
    }
}
