use std::sync::Mutex;

use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming an extra log file.
pub const LOG_FILE_ENV: &str = "LENSTORE_LOG";

/// Initialize tracing for a binary.
///
/// Events go to stderr, filtered by `RUST_LOG` or else `default_level`. When
/// `LENSTORE_LOG` names a path, the same events are also written there without
/// colors. The library itself never installs a subscriber.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_timer(UtcTime::rfc_3339());

    let file_layer = std::env::var(LOG_FILE_ENV).ok().and_then(|path| {
        match std::fs::File::create(&path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_level(true)
                    .with_timer(UtcTime::rfc_3339()),
            ),
            Err(err) => {
                eprintln!("Warning: Failed to create log file {path}: {err}");
                None
            }
        }
    });

    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Warning: tracing already initialized: {err}");
    }
}
