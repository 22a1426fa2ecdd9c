//! Error taxonomy for analysis, sessions and storage.
//!
//! A fingerprint mismatch is deliberately absent: `check_fingerprint` reports it as
//! `false` and the caller takes the archive path.

use std::path::PathBuf;
use thiserror::Error;

pub type BenchResult<T> = std::result::Result<T, BenchmarkError>;

#[derive(Error, Debug)]
pub enum BenchmarkError {
    /// Malformed or too-short trace. Fails one analysis, never a session.
    #[error("Invalid trace: {0}")]
    InvalidTrace(String),

    /// The capture file never appeared or never stopped growing.
    #[error("Incomplete capture for run {run}{}", path_suffix(.path))]
    IncompleteCapture { run: u32, path: Option<PathBuf> },

    #[error("Timed out after {timeout_secs}s waiting for '{game}' to start")]
    LaunchTimeout { game: String, timeout_secs: u64 },

    #[error("Failed to launch '{game}': {reason}")]
    Launch { game: String, reason: String },

    #[error("Cancelled by user")]
    UserCancelled,

    #[error("Storage I/O error ({context}): {source}")]
    StorageIo {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unreadable record at {}: {source}", .path.display())]
    StorageFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No hardware fingerprint saved for '{game}'")]
    MissingFingerprint { game: String },
}

impl BenchmarkError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        BenchmarkError::StorageIo {
            context: context.into(),
            source,
        }
    }

    /// Per-run failures are recorded in the session summary instead of ending it.
    pub fn is_per_run(&self) -> bool {
        matches!(
            self,
            BenchmarkError::InvalidTrace(_) | BenchmarkError::IncompleteCapture { .. }
        )
    }
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" ({})", path.display()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_capture_message_names_run_and_file() {
        let err = BenchmarkError::IncompleteCapture {
            run: 2,
            path: Some(PathBuf::from("/tmp/game_2024.csv")),
        };
        assert_eq!(
            err.to_string(),
            "Incomplete capture for run 2 (/tmp/game_2024.csv)"
        );
        assert!(err.is_per_run());
    }

    #[test]
    fn storage_errors_are_not_per_run() {
        let err = BenchmarkError::io(
            "writing run",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_per_run());
        assert!(!BenchmarkError::UserCancelled.is_per_run());
    }
}
