//! Shared helpers for behavioral specs

use machina_core::{Model, ProcessingError};
use machina_engine::{Defaults, Engine, ExceptionHandler, ThreadScheme};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Side-effect log appended to by state actions.
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn push(log: &Log, entry: &str) {
    log.lock().unwrap().push(entry.to_string());
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Poll `cond` until it holds or roughly a second has passed.
pub async fn eventually(what: &str, cond: impl Fn() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}

/// Exception handler that keeps every reported error's message.
#[derive(Default)]
pub struct RecordingExceptions(Mutex<Vec<String>>);

impl RecordingExceptions {
    pub fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl ExceptionHandler for RecordingExceptions {
    fn handle_exception(&self, error: &ProcessingError) {
        self.0.lock().unwrap().push(error.to_string());
    }
}

/// The classic two-state lamp. Each executed action appends the state
/// name to `log`.
pub fn lamp_model(log: &Log) -> Model<()> {
    let mut model = Model::new("lamp");
    model.add_event_spec("turnOn", vec![]).unwrap();
    model.add_event_spec("turnOff", vec![]).unwrap();
    let entries = Arc::clone(log);
    model
        .add_state("off", vec![], move |_, _, _| {
            push(&entries, "off");
            Ok(())
        })
        .unwrap();
    let entries = Arc::clone(log);
    model
        .add_state("on", vec![], move |_, _, _| {
            push(&entries, "on");
            Ok(())
        })
        .unwrap();
    model.add_normal_transition("off", "turnOn", "on").unwrap();
    model.add_normal_transition("on", "turnOff", "off").unwrap();
    model.set_initial_state("off").unwrap();
    model
}

/// A stopped engine with the requested threading scheme.
pub fn engine_with(scheme: ThreadScheme) -> Engine {
    let engine = Engine::new("specs", &Defaults::default());
    engine.set_thread_scheme(scheme).unwrap();
    engine
}
