//! Trace finalization
//!
//! MangoHud flushes its log in chunks, so a file that merely exists may still be
//! half-written. A trace counts as finished once its size stops changing between two
//! polls and it is larger than a sanity floor.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

use super::CancelToken;
use crate::error::{BenchResult, BenchmarkError};
use crate::import::mangohud;

/// Decides when a capture file is safe to analyze.
pub trait CompletionStrategy {
    /// Blocks until `path` is complete. `IncompleteCapture` fails this run only.
    fn wait_for_completion(&self, path: &Path, run: u32, cancel: &CancelToken)
        -> BenchResult<()>;
}

/// Fixed-interval size comparison.
#[derive(Debug, Clone)]
pub struct PollingCompletion {
    pub interval: Duration,
    pub min_bytes: u64,
    pub timeout: Duration,
}

impl Default for PollingCompletion {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            min_bytes: 1000,
            timeout: Duration::from_secs(60),
        }
    }
}

impl CompletionStrategy for PollingCompletion {
    fn wait_for_completion(
        &self,
        path: &Path,
        run: u32,
        cancel: &CancelToken,
    ) -> BenchResult<()> {
        let deadline = Instant::now() + self.timeout;
        let mut previous: Option<u64> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(BenchmarkError::UserCancelled);
            }

            let size = fs::metadata(path).ok().map(|meta| meta.len());
            if let Some(size) = size {
                if previous == Some(size) && size >= self.min_bytes {
                    debug!("Trace {} settled at {} bytes", path.display(), size);
                    return Ok(());
                }
            }
            previous = size;

            if Instant::now() >= deadline {
                return Err(BenchmarkError::IncompleteCapture {
                    run,
                    path: Some(path.to_path_buf()),
                });
            }
            thread::sleep(self.interval);
        }
    }
}

/// Trace files present in the capture folder before an iteration started.
#[derive(Debug)]
pub struct TraceSnapshot {
    dir: PathBuf,
    known: HashSet<PathBuf>,
}

impl TraceSnapshot {
    pub fn take(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            known: mangohud::list_trace_files(dir).into_iter().collect(),
        }
    }

    /// Traces written since the snapshot, oldest first.
    pub fn new_traces(&self) -> Vec<PathBuf> {
        mangohud::list_trace_files(&self.dir)
            .into_iter()
            .filter(|path| !self.known.contains(path))
            .collect()
    }

    /// Wait for the first new trace to appear.
    pub fn wait_for_new(
        &self,
        run: u32,
        interval: Duration,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> BenchResult<PathBuf> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(path) = self.new_traces().into_iter().next() {
                return Ok(path);
            }
            if cancel.is_cancelled() {
                return Err(BenchmarkError::UserCancelled);
            }
            if Instant::now() >= deadline {
                return Err(BenchmarkError::IncompleteCapture { run, path: None });
            }
            thread::sleep(interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quick(min_bytes: u64) -> PollingCompletion {
        PollingCompletion {
            interval: Duration::from_millis(5),
            min_bytes,
            timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn stable_file_above_floor_is_complete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Game_2024-01-15_12-30-00.csv");
        fs::write(&path, "frametime\n".repeat(20)).unwrap();

        quick(100)
            .wait_for_completion(&path, 1, &CancelToken::new())
            .unwrap();
    }

    #[test]
    fn small_file_never_completes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Game_2024-01-15_12-30-00.csv");
        fs::write(&path, "frametime\n").unwrap();

        let err = quick(1000)
            .wait_for_completion(&path, 3, &CancelToken::new())
            .unwrap_err();
        match err {
            BenchmarkError::IncompleteCapture { run, path: Some(p) } => {
                assert_eq!(run, 3);
                assert_eq!(p, path);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_incomplete() {
        let dir = TempDir::new().unwrap();
        let err = quick(1)
            .wait_for_completion(&dir.path().join("absent.csv"), 1, &CancelToken::new())
            .unwrap_err();
        assert!(err.is_per_run());
    }

    #[test]
    fn cancellation_is_checked_between_polls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trace.csv");
        fs::write(&path, "x").unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = quick(1000)
            .wait_for_completion(&path, 1, &cancel)
            .unwrap_err();
        assert!(matches!(err, BenchmarkError::UserCancelled));
    }

    #[test]
    fn snapshot_reports_only_new_traces() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Old_2024-01-01_10-00-00.csv"), "old").unwrap();
        let snapshot = TraceSnapshot::take(dir.path());
        assert!(snapshot.new_traces().is_empty());

        fs::write(dir.path().join("New_2024-01-02_10-00-00_summary.csv"), "s").unwrap();
        fs::write(dir.path().join("New_2024-01-02_10-00-00.csv"), "new").unwrap();

        let found = snapshot
            .wait_for_new(1, Duration::from_millis(5), Duration::from_millis(100), &CancelToken::new())
            .unwrap();
        assert!(found.ends_with("New_2024-01-02_10-00-00.csv"));
    }

    #[test]
    fn no_new_trace_times_out_for_that_run() {
        let dir = TempDir::new().unwrap();
        let snapshot = TraceSnapshot::take(dir.path());
        let err = snapshot
            .wait_for_new(2, Duration::from_millis(5), Duration::from_millis(30), &CancelToken::new())
            .unwrap_err();
        assert!(matches!(
            err,
            BenchmarkError::IncompleteCapture { run: 2, path: None }
        ));
    }
}
