//! Per-game writer lock
//!
//! A `.lock` file holding `pid=<pid> at=<rfc3339>`. Locks left by crashed processes,
//! by a pid that has since been reused, or older than six hours are recovered.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::warn;

use super::open_private_file_new;

const STALE_LOCK_SECS: u64 = 6 * 60 * 60;

/// Held while a caller runs a check -> archive -> save sequence for one game.
#[derive(Debug)]
pub struct GameLock {
    path: PathBuf,
    file: Option<fs::File>,
}

impl GameLock {
    /// `Ok(None)` when another live process holds the lock.
    pub(crate) fn try_acquire(path: &Path) -> std::io::Result<Option<Self>> {
        match create_lock(path) {
            Ok(lock) => Ok(Some(lock)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                if !lock_is_stale(path) {
                    return Ok(None);
                }
                warn!("Recovering stale lock {}", path.display());
                let _ = fs::remove_file(path);
                match create_lock(path) {
                    Ok(lock) => Ok(Some(lock)),
                    Err(retry_err) if retry_err.kind() == ErrorKind::AlreadyExists => Ok(None),
                    Err(retry_err) => Err(retry_err),
                }
            }
            Err(err) => Err(err),
        }
    }
}

impl Drop for GameLock {
    fn drop(&mut self) {
        drop(self.file.take());
        let _ = fs::remove_file(&self.path);
    }
}

fn create_lock(path: &Path) -> std::io::Result<GameLock> {
    let mut file = open_private_file_new(path)?;
    writeln!(
        file,
        "pid={} at={}",
        std::process::id(),
        Utc::now().to_rfc3339()
    )?;
    Ok(GameLock {
        path: path.to_path_buf(),
        file: Some(file),
    })
}

fn lock_is_stale(path: &Path) -> bool {
    let contents = fs::read_to_string(path).unwrap_or_default();
    let locked_at = read_timestamp(&contents);

    if lock_age_secs(path, locked_at) > STALE_LOCK_SECS {
        return true;
    }

    match read_pid(&contents) {
        Some(pid) => match process_start(pid) {
            None => true,
            // Same pid, different process.
            Some(started_at) => locked_at
                .is_some_and(|locked_at| started_at > locked_at + ChronoDuration::seconds(5)),
        },
        None => false,
    }
}

fn read_pid(contents: &str) -> Option<u32> {
    contents
        .split_whitespace()
        .find_map(|part| part.strip_prefix("pid="))?
        .parse()
        .ok()
}

fn read_timestamp(contents: &str) -> Option<DateTime<Utc>> {
    let at = contents
        .split_whitespace()
        .find_map(|part| part.strip_prefix("at="))?;
    DateTime::parse_from_rfc3339(at)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn lock_age_secs(path: &Path, locked_at: Option<DateTime<Utc>>) -> u64 {
    if let Some(locked_at) = locked_at {
        return Utc::now()
            .signed_duration_since(locked_at)
            .to_std()
            .map(|age| age.as_secs())
            .unwrap_or(0);
    }

    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Start time of a running process, `None` when it is gone.
fn process_start(pid: u32) -> Option<DateTime<Utc>> {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    let process = system.process(pid)?;

    // Some platforms report boot-relative seconds.
    let raw_start = process.start_time();
    let boot_time = System::boot_time();
    let start_epoch_secs = if raw_start < boot_time {
        boot_time.saturating_add(raw_start)
    } else {
        raw_start
    };
    Some(
        DateTime::<Utc>::from_timestamp(start_epoch_secs as i64, 0)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn only_one_holder_at_a_time() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".lock");

        let lock = GameLock::try_acquire(&path).unwrap().expect("first acquire");
        assert!(GameLock::try_acquire(&path).unwrap().is_none());

        drop(lock);
        assert!(!path.exists());
        assert!(GameLock::try_acquire(&path).unwrap().is_some());
    }

    #[test]
    fn old_lock_of_running_process_is_stale() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".lock");
        let old = Utc::now() - chrono::Duration::hours(8);
        fs::write(
            &path,
            format!("pid={} at={}", std::process::id(), old.to_rfc3339()),
        )
        .unwrap();

        assert!(lock_is_stale(&path));
        assert!(GameLock::try_acquire(&path).unwrap().is_some());
    }

    #[test]
    fn fresh_lock_of_running_process_is_held() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".lock");
        fs::write(
            &path,
            format!("pid={} at={}", std::process::id(), Utc::now().to_rfc3339()),
        )
        .unwrap();
        assert!(!lock_is_stale(&path));
    }
}
