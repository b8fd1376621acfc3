//! xl-engine: drive a dedicated Excel instance from a single thread.
//!
//! The Excel object model is thread-affine, so every call into it is made by
//! one long-lived [`Worker`] thread that owns a [`Controller`]. Producers
//! queue [`Task`]s from any thread and receive continuations, status lines
//! and notifications back on their own thread through a [`UiReceiver`].
//!
//! While an instance is up, a [`WindowEnforcer`] polls its top-level windows
//! on a second thread. It keeps the main window in the requested [`Mode`]
//! and brings dialogs and userforms raised by macros to the front, once each.
//! The enforcer never touches the object model; the only value shared
//! between the two threads is the desired mode.

mod controller;
pub mod enforcer;
mod error;
mod mode;
mod task;
mod ui;
mod worker;

pub use controller::{Controller, Logger};
pub use enforcer::{EnforcerCfg, WindowEnforcer};
pub use error::{Error, Result};
pub use mode::{Mode, SharedMode};
pub use task::{Action, OnErr, OnOk, PilotRequest, Task, TaskValue};
pub use ui::{Continuation, UiClosed, UiHandle, UiMsg, UiReceiver, UiSurface, ui_channel};
pub use worker::{GENERIC_FAILURE, Worker, WorkerCfg};
