//! Producer side of the CLI: queue tasks on the Excel worker and pump its
//! messages on the main thread until it exits.

use std::{io::Write, sync::Arc};

use config::{RunRequest, Settings};
use parking_lot::Mutex;
use tracing::{error, info};
use winops::WinOps;
use xl_com::Bridge;
use xl_engine::{
    Action, PilotRequest, Task, TaskValue, UiReceiver, UiSurface, Worker, WorkerCfg, ui_channel,
};

use crate::error::{Error, Result};

/// Prints worker output to the terminal.
pub struct Console;

impl UiSurface for Console {
    fn log(&mut self, line: &str) {
        println!("{line}");
    }

    fn notify(&mut self, text: &str) {
        eprintln!("! {text}");
    }
}

/// One worker plus the receiving end of its message channel.
struct Producer {
    worker: Worker,
    rx: UiReceiver,
    failures: Arc<Mutex<Vec<String>>>,
}

impl Producer {
    fn spawn<B: Bridge>(bridge: B, winops: Arc<dyn WinOps>, cfg: WorkerCfg) -> Result<Self> {
        let (ui, rx) = ui_channel();
        let worker = Worker::spawn(bridge, winops, ui, cfg)?;
        Ok(Self {
            worker,
            rx,
            failures: Arc::new(Mutex::new(Vec::new())),
        })
    }

    fn submit(&self, action: Action) -> Result<()> {
        let name = action.name();
        let failures = self.failures.clone();
        let task = Task::new(action)
            .on_ok(move |v| match v {
                TaskValue::Done => info!(task = name, "done"),
                TaskValue::Mode(m) => info!(task = name, mode = %m, "done"),
            })
            .on_err(move |e| failures.lock().push(format!("{name} failed: {}", e.report())));
        self.worker.submit(task)?;
        Ok(())
    }

    /// Stop the worker and handle its messages until it has exited.
    fn finish(self, surface: &mut dyn UiSurface) -> Result<()> {
        let Self {
            worker,
            rx,
            failures,
        } = self;
        worker.stop();
        rx.run(surface);
        worker.join();

        let failures = failures.lock();
        for f in failures.iter() {
            error!("{f}");
            surface.log(f);
        }
        match failures.len() {
            0 => Ok(()),
            n => Err(Error::TasksFailed(n)),
        }
    }
}

/// Run a resolved request: set the idle mode, run the pilot macro, then
/// optionally quit Excel.
pub fn pilot<B: Bridge>(
    bridge: B,
    winops: Arc<dyn WinOps>,
    cfg: WorkerCfg,
    req: &RunRequest,
    quit_excel: bool,
    surface: &mut dyn UiSurface,
) -> Result<()> {
    let producer = Producer::spawn(bridge, winops, cfg)?;
    surface.log(&format!(
        "Running {} in {}",
        req.macro_name,
        req.workbook.display()
    ));
    producer.submit(Action::SetMode {
        mode: req.excel_mode.clone(),
    })?;
    let pilot = PilotRequest::new(&req.workbook, &req.macro_name)
        .args(req.args.iter().cloned())
        .mode(&req.excel_mode);
    producer.submit(Action::RunPilot(pilot))?;
    if quit_excel {
        producer.submit(Action::Quit)?;
    }
    producer.finish(surface)
}

/// Launch Excel, show it for the hold, then quit.
pub fn show<B: Bridge>(
    bridge: B,
    winops: Arc<dyn WinOps>,
    cfg: WorkerCfg,
    mode: &str,
    surface: &mut dyn UiSurface,
) -> Result<()> {
    let producer = Producer::spawn(bridge, winops, cfg)?;
    producer.submit(Action::Launch { mode: mode.into() })?;
    producer.submit(Action::Show10s)?;
    producer.submit(Action::Quit)?;
    producer.finish(surface)
}

/// Print the registry, one `id: label -> macro` line per entry.
pub fn list(settings: &Settings, out: &mut dyn Write) -> Result<()> {
    if settings.macros.is_empty() {
        writeln!(out, "No macros declared in settings.")?;
        return Ok(());
    }
    for (id, m) in &settings.macros {
        writeln!(out, "{id}: {} -> {}", m.label, m.macro_name)?;
    }
    Ok(())
}
