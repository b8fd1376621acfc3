//! Marshalling from the automation thread back to the producer thread.
//!
//! The worker never calls producer code directly. Status lines,
//! notifications and task continuations are posted to a channel that the
//! producer drains on its own thread, so producer-side state never has to be
//! shared with the automation thread.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use crossbeam_channel::{Receiver, Sender, unbounded};
use thiserror::Error;

/// A closure to run on the producer thread.
pub type Continuation = Box<dyn FnOnce() + Send + 'static>;

/// Messages posted to the producer.
pub enum UiMsg {
    /// Human-readable status line.
    Log(String),
    /// Short user-facing notification (toast).
    Notify(String),
    /// Task continuation to run in place.
    Call(Continuation),
}

impl Debug for UiMsg {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Log(s) => f.debug_tuple("Log").field(s).finish(),
            Self::Notify(s) => f.debug_tuple("Notify").field(s).finish(),
            Self::Call(_) => f.write_str("Call(..)"),
        }
    }
}

/// The producer has gone away; the message was dropped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("UI receiver dropped")]
pub struct UiClosed;

/// Sending side, held by the automation thread.
#[derive(Clone, Debug)]
pub struct UiHandle {
    tx: Sender<UiMsg>,
}

impl UiHandle {
    /// Post a status line.
    pub fn log(&self, line: impl Into<String>) -> Result<(), UiClosed> {
        self.tx.send(UiMsg::Log(line.into())).map_err(|_| UiClosed)
    }

    /// Post a notification.
    pub fn notify(&self, text: impl Into<String>) -> Result<(), UiClosed> {
        self.tx.send(UiMsg::Notify(text.into())).map_err(|_| UiClosed)
    }

    /// Schedule `f` to run on the producer thread.
    pub fn post<F>(&self, f: F) -> Result<(), UiClosed>
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx.send(UiMsg::Call(Box::new(f))).map_err(|_| UiClosed)
    }
}

/// Where the producer renders text it receives.
pub trait UiSurface {
    /// Append a status line.
    fn log(&mut self, line: &str);
    /// Show a short notification.
    fn notify(&mut self, text: &str);
}

/// Receiving side, owned by the producer thread.
#[derive(Debug)]
pub struct UiReceiver {
    rx: Receiver<UiMsg>,
}

impl UiReceiver {
    /// Handle messages until every [`UiHandle`] has been dropped, i.e. until
    /// the worker thread has exited.
    pub fn run(self, surface: &mut dyn UiSurface) {
        for msg in self.rx.iter() {
            handle(msg, surface);
        }
    }
}

fn handle(msg: UiMsg, surface: &mut dyn UiSurface) {
    match msg {
        UiMsg::Log(line) => surface.log(&line),
        UiMsg::Notify(text) => surface.notify(&text),
        UiMsg::Call(f) => f(),
    }
}

/// Create a connected handle/receiver pair.
pub fn ui_channel() -> (UiHandle, UiReceiver) {
    let (tx, rx) = unbounded();
    (UiHandle { tx }, UiReceiver { rx })
}
