//! Drowsiness Monitor Runner
//!
//! Wires the detection session to concrete collaborators: a recorded
//! landmark trace in place of camera and model, and a logging alarm.

pub mod alarm;
pub mod replay;
pub mod settings;

pub use alarm::LogAlarm;
pub use replay::{run_replay, ReplaySummary, TraceRecording};
pub use settings::Settings;

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging to stderr; `RUST_LOG` overrides the `info` default
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.expect("Failed to set tracing subscriber");
}
