//! Shared test utilities.

#![allow(dead_code, unused_imports)]

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Collects every value a subscriber receives.
pub struct Recorder<T> {
    values: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            values: Arc::clone(&self.values),
        }
    }
}

impl<T: Clone + Send + 'static> Recorder<T> {
    pub fn new() -> Self {
        Self {
            values: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A callback to pass to `subscribe`.
    pub fn sink(&self) -> impl Fn(T) + Send + Sync + 'static {
        let values = Arc::clone(&self.values);
        move |value| values.lock().push(value)
    }

    pub fn values(&self) -> Vec<T> {
        self.values.lock().clone()
    }

    /// Polls until at least `count` values arrived or `timeout` elapsed.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> Vec<T> {
        let deadline = Instant::now() + timeout;
        loop {
            let values = self.values();
            if values.len() >= count || Instant::now() >= deadline {
                return values;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

/// Event log shared by several subscribers, to check interleaving.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Callback that appends `"<label>:<value:?>"` to `log`.
pub fn log_to<T: std::fmt::Debug + 'static>(log: &EventLog, label: &'static str) -> impl Fn(T) + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |value| log.lock().push(format!("{label}:{value:?}"))
}

/// Create a temporary config file with the given content.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}
