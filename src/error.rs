use thiserror::Error;
use tracing::{error, warn};

/// Error severity for notification display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Warning, // recoverable, logged only
    Error,   // operation failed, surfaced as a toast
}

/// A privileged memory operation was rejected by the executor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Process not attached")]
    NotAttached,

    #[error("Failed to write process memory at {address:#x} ({len} bytes)")]
    Write { address: usize, len: usize },
}

/// Attach, detach or foreground-window query failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("{0} not found")]
    ProcessNotFound(String),

    #[error("No foreground window")]
    NoForegroundWindow,
}

/// A single hook registration (or the bulk teardown) was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("Hotkey '{0}' could not be parsed")]
    Unparsable(String),

    #[error("Hotkey '{0}' is already registered by another application")]
    AlreadyRegistered(String),

    #[error("System rejected hotkey '{chord}': {reason}")]
    Rejected { chord: String, reason: String },

    #[error("Failed to unregister hotkeys: {0}")]
    Teardown(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to resolve app config directory")]
    NoConfigDir,

    #[error("Failed to read settings file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write settings file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Domain-level error for everything the controller talks to.
#[derive(Error, Debug)]
pub enum ModextError {
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ModextError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Executor(_) => ErrorSeverity::Error,
            Self::Session(_) => ErrorSeverity::Error,
            // A missing hotkey is the only visible symptom; never toasted.
            Self::Hook(_) => ErrorSeverity::Warning,
            Self::Config(_) => ErrorSeverity::Warning,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Executor(ExecutorError::NotAttached) => {
                "Process not attached. Attach and try again.".to_string()
            }
            Self::Executor(e) => format!("{}. Reattach and try again.", e),
            Self::Session(e) => e.to_string(),
            Self::Hook(e) => e.to_string(),
            Self::Config(e) => format!("Configuration issue: {}", e),
        }
    }
}

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// ```ignore
/// use modext::error::ResultExt;
///
/// // Saving settings is best-effort
/// settings.save(&path).warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executor_failures_are_toasted_hook_failures_are_not() {
        let exec: ModextError = ExecutorError::Write {
            address: 0x10,
            len: 1,
        }
        .into();
        assert_eq!(exec.severity(), ErrorSeverity::Error);

        let hook: ModextError = HookError::AlreadyRegistered("Ctrl+G".into()).into();
        assert_eq!(hook.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn user_message_suggests_reattach_for_write_failures() {
        let err: ModextError = ExecutorError::Write {
            address: 0x2ff40e2,
            len: 1,
        }
        .into();
        let msg = err.user_message();
        assert!(msg.contains("0x2ff40e2"));
        assert!(msg.ends_with("Reattach and try again."));
    }

    #[test]
    fn log_err_passes_through_ok() {
        let ok: std::result::Result<u8, String> = Ok(3);
        assert_eq!(ok.log_err(), Some(3));
        let err: std::result::Result<u8, String> = Err("nope".into());
        assert_eq!(err.warn_on_err(), None);
    }
}
