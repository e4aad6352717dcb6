use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Scheduler running state transitions and subscription registration.
    #[serde(default)]
    pub update: SchedulerConfig,
    /// Scheduler delivering values to subscribers.
    #[serde(default)]
    pub notification: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which execution substrate a scheduler runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerKind {
    /// Work runs on the caller's thread before `schedule` returns.
    #[default]
    Immediate,
    /// Work runs in order on one dedicated thread.
    Thread,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub kind: SchedulerKind,
    /// Worker thread name for `kind = "thread"` (default: `lenstore-<role>`).
    #[serde(default)]
    pub thread_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (default: "info").
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
