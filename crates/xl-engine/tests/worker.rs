use std::{fs, path::PathBuf, sync::Arc, thread, time::Duration};

use parking_lot::Mutex;
use tempfile::TempDir;
use winops::{WindowInfo, ops::MockWinOps};
use xl_com::mock::MockBridge;
use xl_engine::{
    Action, EnforcerCfg, Error, GENERIC_FAILURE, PilotRequest, Task, TaskValue, UiReceiver,
    UiSurface, Worker, WorkerCfg, ui_channel,
};

const HWND: isize = 0x1000;
const PID: u32 = 777;

#[derive(Default)]
struct Surface {
    lines: Vec<String>,
    toasts: Vec<String>,
}

impl UiSurface for Surface {
    fn log(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
    fn notify(&mut self, text: &str) {
        self.toasts.push(text.to_string());
    }
}

struct Harness {
    worker: Worker,
    rx: UiReceiver,
    bridge: MockBridge,
    ops: Arc<MockWinOps>,
    outcomes: Arc<Mutex<Vec<String>>>,
}

fn fast_cfg() -> WorkerCfg {
    WorkerCfg {
        queue_wait: Duration::from_millis(10),
        show_hold: Duration::from_millis(30),
        enforcer: EnforcerCfg {
            poll: Duration::from_millis(5),
            main_period: Duration::from_millis(20),
        },
    }
}

fn harness_with(bridge: MockBridge) -> Harness {
    let ops = Arc::new(MockWinOps::new());
    ops.set_windows(vec![WindowInfo::new(HWND, PID, "XLMAIN")]);
    let (ui, rx) = ui_channel();
    let worker = Worker::spawn(bridge.clone(), ops.clone(), ui, fast_cfg()).unwrap();
    Harness {
        worker,
        rx,
        bridge,
        ops,
        outcomes: Arc::new(Mutex::new(Vec::new())),
    }
}

fn harness() -> Harness {
    harness_with(MockBridge::new())
}

impl Harness {
    /// Submit `action`, recording `tag:ok[:value]` or `tag:err:<message>`.
    fn submit(&self, tag: &str, action: Action) {
        let ok = self.outcomes.clone();
        let err = self.outcomes.clone();
        let (t1, t2) = (tag.to_string(), tag.to_string());
        let task = Task::new(action)
            .on_ok(move |v| {
                let s = match v {
                    TaskValue::Done => format!("{t1}:ok"),
                    TaskValue::Mode(m) => format!("{t1}:ok:{m}"),
                };
                ok.lock().push(s);
            })
            .on_err(move |e| err.lock().push(format!("{t2}:err:{e}")));
        self.worker.submit(task).unwrap();
    }

    /// Stop the worker, wait for it and run every marshalled message.
    fn finish(self) -> (Vec<String>, Surface, MockBridge, Arc<MockWinOps>) {
        self.worker.join();
        let mut surface = Surface::default();
        self.rx.run(&mut surface);
        let outcomes = self.outcomes.lock().clone();
        (outcomes, surface, self.bridge, self.ops)
    }
}

fn pilot_file() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Book1.xlsm");
    fs::write(&path, b"").unwrap();
    (dir, path)
}

fn launch(mode: &str) -> Action {
    Action::Launch { mode: mode.into() }
}

#[test]
fn tasks_complete_in_submission_order() {
    let h = harness();
    let (_dir, path) = pilot_file();
    h.bridge.accept_macro("Foo");
    h.bridge.set_run_delay(Duration::from_millis(50));

    h.submit("launch", launch("minimized"));
    h.submit("pilot", Action::RunPilot(PilotRequest::new(&path, "Foo")));
    h.submit("mode", Action::SetMode { mode: "visible".into() });
    h.submit("quit", Action::Quit);
    let (outcomes, _, bridge, _) = h.finish();

    assert_eq!(outcomes, vec!["launch:ok", "pilot:ok", "mode:ok:visible", "quit:ok"]);
    let calls = bridge.calls();
    let run = calls.iter().position(|c| c.starts_with("run:")).unwrap();
    let quit = calls.iter().position(|c| c == "quit").unwrap();
    assert!(run < quit);
}

#[test]
fn set_mode_coerces_unknown_values() {
    let h = harness();
    h.submit("a", Action::SetMode { mode: "fullscreen".into() });
    h.submit("b", Action::SetMode { mode: " HIDDEN ".into() });
    h.submit("c", Action::SetMode { mode: "".into() });
    let (outcomes, ..) = h.finish();
    assert_eq!(outcomes, vec!["a:ok:minimized", "b:ok:hidden", "c:ok:minimized"]);
}

#[test]
fn every_bridge_call_runs_on_one_worker_thread() {
    let h = harness();
    let (_dir, path) = pilot_file();
    h.bridge.accept_macro("Foo");
    h.submit("launch", launch("hidden"));
    h.submit("pilot", Action::RunPilot(PilotRequest::new(&path, "Foo")));
    h.submit("mode", Action::SetMode { mode: "visible".into() });
    let (_, _, bridge, _) = h.finish();

    let threads = bridge.threads();
    assert_eq!(threads.len(), 1);
    assert!(!threads.contains(&thread::current().id()));
}

#[test]
fn run_pilot_hides_during_macro_and_restores_after_success() {
    let h = harness();
    let (_dir, path) = pilot_file();
    h.bridge.accept_macro("Foo");
    let req = PilotRequest::new(&path, "Foo").args(["2024", "Q1"]).mode("minimized");
    h.submit("pilot", Action::RunPilot(req));
    let (outcomes, surface, bridge, ops) = h.finish();

    assert_eq!(outcomes, vec!["pilot:ok"]);
    assert_eq!(bridge.calls_with_prefix("run:"), vec!["run:Foo:2024,Q1"]);
    assert!(ops.calls_contains("show:4096:hide"));
    let shows: Vec<_> = ops
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("show:4096:"))
        .collect();
    assert_eq!(shows.last().map(String::as_str), Some("show:4096:minimize"));
    assert!(surface.lines.iter().any(|l| l == "Macro OK: Foo"));
}

#[test]
fn run_pilot_restores_mode_after_macro_failure() {
    let h = harness();
    let (_dir, path) = pilot_file();
    h.submit("launch", launch("visible"));
    let req = PilotRequest::new(&path, "Missing").mode("visible");
    h.submit("pilot", Action::RunPilot(req));
    let (outcomes, _, bridge, ops) = h.finish();

    assert_eq!(outcomes[0], "launch:ok");
    assert!(outcomes[1].starts_with("pilot:err:macro failed"));
    assert_eq!(bridge.calls_with_prefix("run:").len(), 2);
    assert_eq!(ops.count("show:4096:hide"), 0);
    let shows: Vec<_> = ops
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("show:4096:"))
        .collect();
    assert_eq!(shows.last().map(String::as_str), Some("show:4096:restore"));
}

#[test]
fn run_pilot_with_missing_workbook_never_runs_a_macro() {
    let h = harness();
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = errors.clone();
    let req = PilotRequest::new("/no/such/dir/missing.xlsm", "M").mode("minimized");
    let task = Task::new(Action::RunPilot(req)).on_err(move |e| sink.lock().push(e));
    h.worker.submit(task).unwrap();
    let (_, _, bridge, ops) = h.finish();

    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], Error::NotFound(_)));
    assert!(bridge.calls_with_prefix("run:").is_empty());
    let shows: Vec<_> = ops
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("show:4096:"))
        .collect();
    assert_eq!(shows.last().map(String::as_str), Some("show:4096:minimize"));
}

#[test]
fn failure_without_error_continuation_notifies() {
    let h = harness();
    h.worker.submit(Action::Quit).unwrap();
    let (_, surface, ..) = h.finish();
    assert_eq!(surface.toasts, vec![GENERIC_FAILURE]);
}

#[test]
fn failed_task_does_not_stop_the_loop() {
    let h = harness();
    h.submit("quit", Action::Quit);
    h.submit("launch", launch("minimized"));
    h.submit("again", launch("minimized"));
    h.submit("quit2", Action::Quit);
    let (outcomes, ..) = h.finish();
    assert!(outcomes[0].starts_with("quit:err:"));
    assert_eq!(outcomes[1], "launch:ok");
    assert!(outcomes[2].starts_with("again:err:"));
    assert_eq!(outcomes[3], "quit2:ok");
}

#[test]
fn launch_leaves_one_instance_and_quit_clears_it_even_on_failure() {
    let h = harness();
    h.submit("launch", launch("minimized"));
    h.bridge.set_fail_quit(true);
    h.submit("quit", Action::Quit);
    h.submit("launch2", launch("minimized"));
    let (outcomes, _, bridge, _) = h.finish();

    assert_eq!(outcomes[0], "launch:ok");
    assert!(outcomes[1].starts_with("quit:err:"));
    // State was cleared, so a fresh launch is allowed.
    assert_eq!(outcomes[2], "launch2:ok");
    assert_eq!(bridge.launches(), 2);
    // Shutdown quit also fails, but dropping the handle releases the instance.
    assert_eq!(bridge.live_instances(), 0);
}

#[test]
fn shutdown_quits_and_leaves_the_apartment() {
    let h = harness();
    h.submit("launch", launch("minimized"));
    let (_, _, bridge, _) = h.finish();
    let calls = bridge.calls();
    assert_eq!(calls.first().map(String::as_str), Some("enter_thread"));
    assert_eq!(
        calls[calls.len() - 2..].to_vec(),
        vec!["quit".to_string(), "leave_thread".to_string()]
    );
    assert_eq!(bridge.live_instances(), 0);
}

#[test]
fn thread_init_failure_fails_every_task() {
    let bridge = MockBridge::new();
    bridge.set_fail_enter(true);
    let h = harness_with(bridge);
    h.submit("launch", launch("minimized"));
    h.submit("mode", Action::SetMode { mode: "hidden".into() });
    let (outcomes, surface, bridge, _) = h.finish();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.contains(":err:Excel automation unavailable")));
    assert_eq!(bridge.launches(), 0);
    assert!(bridge.calls_with_prefix("leave_thread").is_empty());
    assert!(!surface.lines.is_empty());
}

#[test]
fn show_holds_visible_then_restores() {
    let h = harness();
    h.submit("launch", launch("hidden"));
    h.submit("show", Action::Show10s);
    let (outcomes, _, _, ops) = h.finish();

    assert_eq!(outcomes, vec!["launch:ok", "show:ok"]);
    let shows: Vec<_> = ops
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("show:4096:"))
        .collect();
    let restore = shows.iter().position(|c| c == "show:4096:restore").unwrap();
    assert!(shows[restore + 1..].iter().any(|c| c == "show:4096:hide"));
    assert_eq!(shows.last().map(String::as_str), Some("show:4096:hide"));
}

#[test]
fn submit_after_stop_is_rejected() {
    let h = harness();
    h.worker.stop();
    assert!(h.worker.is_stopped());
    assert!(matches!(h.worker.submit(Action::Quit), Err(Error::WorkerStopped)));
    let (outcomes, ..) = h.finish();
    assert!(outcomes.is_empty());
}

#[test]
fn mode_set_before_launch_is_used_at_launch() {
    let h = harness();
    h.submit("mode", Action::SetMode { mode: "visible".into() });
    let (_dir, path) = pilot_file();
    h.bridge.accept_macro("Foo");
    h.submit("pilot", Action::RunPilot(PilotRequest::new(&path, "Foo")));
    let (outcomes, _, _, ops) = h.finish();
    assert_eq!(outcomes, vec!["mode:ok:visible", "pilot:ok"]);
    assert_eq!(ops.count("show:4096:hide"), 0);
}

#[test]
fn panicking_task_is_reported_and_loop_continues() {
    let h = harness();
    let (_dir, path) = pilot_file();
    h.bridge.accept_macro("Foo");
    h.bridge.set_panic_run(true);

    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = errors.clone();
    let req = PilotRequest::new(&path, "Foo").mode("minimized");
    let task = Task::new(Action::RunPilot(req)).on_err(move |e| sink.lock().push(e));
    h.worker.submit(task).unwrap();
    h.submit("mode", Action::SetMode { mode: "hidden".into() });
    let (outcomes, surface, bridge, _) = h.finish();

    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        Error::Panicked(msg) => assert!(msg.contains("mock run of 'Foo' panicked"), "{msg}"),
        other => panic!("expected Panicked, got {other:?}"),
    }
    assert_eq!(outcomes, vec!["mode:ok:hidden"]);
    assert!(surface.toasts.is_empty());
    assert_eq!(bridge.calls_with_prefix("quit"), vec!["quit"]);
    assert_eq!(bridge.live_instances(), 0);
}
