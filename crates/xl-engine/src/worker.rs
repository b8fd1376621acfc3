//! The dedicated automation thread.
//!
//! Every object-model call happens on the one thread spawned here. Producers
//! submit [`Task`]s from any thread; tasks run strictly in submission order,
//! one at a time, and their outcomes travel back through a [`UiHandle`].

use std::{
    any::Any,
    io,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use tracing::{debug, error, info, warn};
use winops::WinOps;
use xl_com::Bridge;

use crate::{
    Action, Controller, EnforcerCfg, Error, Logger, Mode, OnErr, OnOk, PilotRequest, Result, Task,
    TaskValue, UiHandle,
};

/// Toast shown when a failed task has no error continuation.
pub const GENERIC_FAILURE: &str = "Excel error (see logs).";

/// Worker timings.
#[derive(Debug, Clone)]
pub struct WorkerCfg {
    /// Timed wait on the queue between tasks.
    pub queue_wait: Duration,
    /// How long `Show10s` keeps the window visible.
    pub show_hold: Duration,
    /// Timings for each launched instance's enforcer.
    pub enforcer: EnforcerCfg,
}

impl Default for WorkerCfg {
    fn default() -> Self {
        Self {
            queue_wait: Duration::from_millis(250),
            show_hold: Duration::from_secs(10),
            enforcer: EnforcerCfg::default(),
        }
    }
}

enum Envelope {
    Task(Task),
    Stop,
}

/// Handle to the automation thread.
pub struct Worker {
    tx: Sender<Envelope>,
    stopped: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn the automation thread. `bridge` is moved onto it; nothing else
    /// ever calls into the object model.
    pub fn spawn<B: Bridge>(
        bridge: B,
        winops: Arc<dyn WinOps>,
        ui: UiHandle,
        cfg: WorkerCfg,
    ) -> io::Result<Self> {
        let (tx, rx) = unbounded();
        let handle = thread::Builder::new()
            .name("xl-worker".into())
            .spawn(move || run(bridge, winops, ui, rx, cfg))?;
        Ok(Self {
            tx,
            stopped: Arc::new(AtomicBool::new(false)),
            handle: Some(handle),
        })
    }

    /// Queue a task. Never blocks.
    pub fn submit(&self, task: impl Into<Task>) -> Result<()> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(Error::WorkerStopped);
        }
        self.tx
            .send(Envelope::Task(task.into()))
            .map_err(|_| Error::WorkerStopped)
    }

    /// Stop accepting tasks. Already-queued tasks still run; the thread exits
    /// when it reaches the stop marker.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            // The thread may already be gone; nothing to stop then.
            self.tx.send(Envelope::Stop).ok();
        }
    }

    /// Whether [`Worker::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Stop and wait for the thread to finish its queue and clean up.
    pub fn join(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            error!("xl-worker thread panicked");
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<B: Bridge>(
    bridge: B,
    winops: Arc<dyn WinOps>,
    ui: UiHandle,
    rx: Receiver<Envelope>,
    cfg: WorkerCfg,
) {
    let unavailable = match bridge.enter_thread() {
        Ok(()) => None,
        Err(e) => {
            warn!(error = %e, "automation thread init failed; every task will fail");
            ui.log(format!("Excel: {e}")).ok();
            Some(e.to_string())
        }
    };

    let log_ui = ui.clone();
    let logger: Logger = Box::new(move |line| log_ui.log(line));
    let mut ctl = Controller::new(bridge, winops, cfg.enforcer.clone(), logger);
    info!("xl-worker started");

    loop {
        let task = match rx.recv_timeout(cfg.queue_wait) {
            Ok(Envelope::Task(task)) => task,
            Ok(Envelope::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => continue,
        };
        let Task {
            action,
            on_ok,
            on_err,
        } = task;
        let name = action.name();
        debug!(task = name, "dispatch");

        let result = match &unavailable {
            Some(msg) => Err(Error::Environment(msg.clone())),
            None => catch_unwind(AssertUnwindSafe(|| dispatch(&mut ctl, action, &cfg)))
                .unwrap_or_else(|p| Err(Error::Panicked(panic_message(p.as_ref())))),
        };
        deliver(&ui, name, result, on_ok, on_err);
    }

    if ctl.is_launched()
        && let Err(e) = ctl.quit_instance()
    {
        warn!(error = %e, "quit on shutdown failed");
    }
    let bridge = ctl.into_bridge();
    if unavailable.is_none() {
        bridge.leave_thread();
    }
    info!("xl-worker stopped");
}

fn dispatch<B: Bridge>(ctl: &mut Controller<B>, action: Action, cfg: &WorkerCfg) -> Result<TaskValue> {
    match action {
        Action::Launch { mode } => {
            ctl.set_preferred_mode(Mode::coerce(&mode));
            ctl.launch_new_instance()?;
            Ok(TaskValue::Done)
        }
        Action::Quit => {
            ctl.quit_instance()?;
            Ok(TaskValue::Done)
        }
        Action::SetMode { mode } => {
            let mode = Mode::coerce(&mode);
            if ctl.is_launched() {
                ctl.set_mode(mode)?;
            } else {
                ctl.set_preferred_mode(mode);
            }
            Ok(TaskValue::Mode(mode))
        }
        Action::Show10s => {
            if !ctl.is_launched() {
                ctl.launch_new_instance()?;
            }
            let prev = ctl.mode();
            ctl.show_for_seconds(cfg.show_hold.as_secs())?;
            // Holds the worker for the whole window on purpose: nothing else
            // may touch the instance while it is on screen.
            thread::sleep(cfg.show_hold);
            if let Err(e) = ctl.set_mode(prev) {
                warn!(error = %e, "restoring mode after show failed");
            }
            Ok(TaskValue::Done)
        }
        Action::RunPilot(req) => {
            run_pilot(ctl, req)?;
            Ok(TaskValue::Done)
        }
    }
}

fn run_pilot<B: Bridge>(ctl: &mut Controller<B>, req: PilotRequest) -> Result<()> {
    if !ctl.is_launched() {
        ctl.launch_new_instance()?;
    }
    let desired = req
        .mode
        .as_deref()
        .map_or_else(|| ctl.mode(), Mode::coerce);
    ctl.set_mode(desired.during_macro())?;

    let outcome = ctl
        .open_or_activate(&req.workbook)
        .and_then(|wb| ctl.run_macro(&wb, &req.macro_name, &req.args));

    if let Err(e) = ctl.set_mode(desired) {
        warn!(error = %e, "restoring mode after macro failed");
    }
    outcome
}

fn deliver(
    ui: &UiHandle,
    name: &'static str,
    result: Result<TaskValue>,
    on_ok: Option<OnOk>,
    on_err: Option<OnErr>,
) {
    // Send failures mean the producer is gone; there is nobody to tell.
    match result {
        Ok(value) => {
            debug!(task = name, ?value, "task ok");
            if let Some(f) = on_ok {
                ui.post(move || f(value)).ok();
            }
        }
        Err(e) => {
            error!(task = name, "task failed: {}", e.report());
            let sent = match on_err {
                Some(f) => ui.post(move || f(e)),
                None => ui.notify(GENERIC_FAILURE),
            };
            sent.ok();
        }
    }
}

fn panic_message(p: &(dyn Any + Send)) -> String {
    if let Some(s) = p.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = p.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_readable() {
        let p = catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(p.as_ref()), "boom");
        let p = catch_unwind(|| panic!("{}", String::from("owned"))).unwrap_err();
        assert_eq!(panic_message(p.as_ref()), "owned");
    }

    #[test]
    fn default_timings() {
        let cfg = WorkerCfg::default();
        assert_eq!(cfg.queue_wait, Duration::from_millis(250));
        assert_eq!(cfg.show_hold, Duration::from_secs(10));
    }
}
