//! Structured JSONL logging plus human-readable stderr output.
//!
//! This module provides dual-output logging:
//! - **JSONL to file** (`<data_local_dir>/modext/logs/modext.jsonl`) - structured, one event per line
//! - **Compact to stderr** - human-readable for developers
//!
//! # Usage
//!
//! ```rust,ignore
//! use modext::logging;
//!
//! // Initialize logging - MUST keep guard alive for duration of program
//! let _guard = logging::init(None);
//!
//! // Use tracing macros directly, tag with a category
//! tracing::info!(category = "TOGGLE", feature_id = "godmode", "Feature enabled");
//! ```
//!
//! # JSONL Output Format
//!
//! ```json
//! {"timestamp":"2026-01-05T10:30:45.123Z","level":"WARN","target":"modext::hotkeys::registration","fields":{"category":"HOTKEY","chord":"Ctrl+G","message":"Duplicate chord skipped"}}
//! ```

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use parking_lot::Mutex;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_NAME: &str = "modext.jsonl";

// In-memory tail of categorized log lines, served by the `status` command.
static LOG_BUFFER: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();
const MAX_LOG_LINES: usize = 50;

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the dual-output logging system.
///
/// `log_dir` overrides the default log directory. When the log file cannot be
/// opened, only the stderr layer is installed.
pub fn init(log_dir: Option<&Path>) -> LoggingGuard {
    let _ = LOG_BUFFER.set(Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES)));

    let log_dir = log_dir.map(Path::to_path_buf).unwrap_or_else(get_log_dir);
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }
    let log_path = log_dir.join(LOG_FILE_NAME);

    // Environment filter - default to info, allow override via RUST_LOG
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,global_hotkey=warn"));

    let file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            None
        }
    };

    let Some(file) = file else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(pretty_layer())
            .init();
        return LoggingGuard { _file_guard: None };
    };

    // Non-blocking writer so file IO never stalls the controller loop
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file);

    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer())
        .init();

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %log_path.display(),
        "Application logging initialized"
    );

    LoggingGuard {
        _file_guard: Some(file_guard),
    }
}

/// Compact human-readable stderr layer
fn pretty_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact()
}

/// Get the log directory path
fn get_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("modext").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("modext-logs"))
}

/// Get the path to the JSONL log file
pub fn log_path() -> PathBuf {
    get_log_dir().join(LOG_FILE_NAME)
}

/// Categorized info log that also lands in the in-memory tail.
///
/// Prefer tracing macros directly when there are structured fields to attach.
pub fn log(category: &str, message: &str) {
    add_to_buffer(category, message);
    tracing::info!(category = category, "{}", message);
}

fn add_to_buffer(category: &str, message: &str) {
    if let Some(buffer) = LOG_BUFFER.get() {
        let mut buf = buffer.lock();
        if buf.len() >= MAX_LOG_LINES {
            buf.pop_front();
        }
        buf.push_back(format!("[{}] {}", category, message));
    }
}

/// Get the last N categorized log lines, newest first
pub fn get_last_logs(n: usize) -> Vec<String> {
    LOG_BUFFER
        .get()
        .map(|buffer| buffer.lock().iter().rev().take(n).cloned().collect())
        .unwrap_or_default()
}

/// Log a feature toggle outcome with structured fields
pub fn log_toggle_event(feature_id: &str, desired: bool, outcome: &str) {
    add_to_buffer(
        "TOGGLE",
        &format!("{} -> {} ({})", feature_id, desired, outcome),
    );
    tracing::info!(
        event_type = "toggle_event",
        category = "TOGGLE",
        feature_id = feature_id,
        desired = desired,
        outcome = outcome,
        "Feature {} -> {} ({})",
        feature_id,
        desired,
        outcome
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_keeps_newest_lines_first() {
        let _ = LOG_BUFFER.set(Mutex::new(VecDeque::new()));
        add_to_buffer("TEST", "first");
        add_to_buffer("TEST", "second");
        let lines = get_last_logs(MAX_LOG_LINES);
        let first = lines.iter().position(|l| l == "[TEST] first");
        let second = lines.iter().position(|l| l == "[TEST] second");
        assert!(second.is_some() && second < first);
    }

    #[test]
    fn log_path_uses_jsonl_file_name() {
        assert!(log_path().ends_with(LOG_FILE_NAME));
    }
}
