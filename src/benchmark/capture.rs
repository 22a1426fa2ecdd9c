//! MangoHud capture control
//!
//! MangoHud reads one per-user config file, so a session rewrites it and puts the
//! user's version back afterwards. Only the logging keys are replaced; the rest of
//! the user's overlay setup is kept.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{BenchResult, BenchmarkError};

/// Default MangoHud hotkey for toggling a log.
pub const DEFAULT_TOGGLE_KEY: &str = "Shift_L+F2";

const SESSION_KEYS: &[&str] = &[
    "output_folder",
    "log_duration",
    "autostart_log",
    "log_interval",
    "toggle_logging",
    "no_display",
];

/// Starts and stops one capture.
pub trait CaptureTrigger {
    fn start(&mut self, iteration: u32) -> BenchResult<()>;
    fn stop(&mut self, iteration: u32) -> BenchResult<()>;
}

/// MangoHud starts logging by itself (`autostart_log`), nothing to do.
#[derive(Debug, Default)]
pub struct AutostartCapture;

impl CaptureTrigger for AutostartCapture {
    fn start(&mut self, _iteration: u32) -> BenchResult<()> {
        Ok(())
    }

    fn stop(&mut self, _iteration: u32) -> BenchResult<()> {
        Ok(())
    }
}

/// Asks the player to press MangoHud's logging hotkey.
#[derive(Debug)]
pub struct HotkeyPrompt {
    pub key: String,
}

impl CaptureTrigger for HotkeyPrompt {
    fn start(&mut self, iteration: u32) -> BenchResult<()> {
        println!("  Press {} in game to start capture #{}", self.key, iteration);
        Ok(())
    }

    fn stop(&mut self, _iteration: u32) -> BenchResult<()> {
        Ok(())
    }
}

/// What MangoHud is told for the duration of a session.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub output_folder: PathBuf,
    /// Seconds per log; `None` logs until toggled off.
    pub log_duration_secs: Option<u64>,
    pub autostart: bool,
    pub toggle_key: String,
    pub show_hud: bool,
}

impl CaptureSettings {
    fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("output_folder={}", self.output_folder.display()),
            format!("log_duration={}", self.log_duration_secs.unwrap_or(0)),
            "log_interval=0".to_string(),
            format!("toggle_logging={}", self.toggle_key),
        ];
        if self.autostart {
            lines.push("autostart_log=1".to_string());
        }
        if !self.show_hud {
            lines.push("no_display".to_string());
        }
        lines
    }
}

/// Holds MangoHud's config in its session state until restored or dropped.
#[derive(Debug)]
pub struct CaptureConfigGuard {
    path: PathBuf,
    original: Option<String>,
    restored: bool,
}

impl CaptureConfigGuard {
    pub fn apply(path: &Path, settings: &CaptureSettings) -> BenchResult<Self> {
        let original = match fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                return Err(BenchmarkError::io(
                    format!("reading {}", path.display()),
                    err,
                ))
            }
        };

        fs::create_dir_all(&settings.output_folder).map_err(|err| {
            BenchmarkError::io(
                format!("creating {}", settings.output_folder.display()),
                err,
            )
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                BenchmarkError::io(format!("creating {}", parent.display()), err)
            })?;
        }

        let mut lines: Vec<String> = original
            .as_deref()
            .unwrap_or_default()
            .lines()
            .filter(|line| !SESSION_KEYS.contains(&config_key(line)))
            .map(str::to_string)
            .collect();
        lines.extend(settings.lines());

        // Guard exists before the write so a failed write still restores.
        let guard = Self {
            path: path.to_path_buf(),
            original,
            restored: false,
        };
        fs::write(path, lines.join("\n") + "\n")
            .map_err(|err| BenchmarkError::io(format!("writing {}", path.display()), err))?;
        debug!("MangoHud config {} set for session", path.display());
        Ok(guard)
    }

    /// Put the user's config back (or remove ours if there was none).
    pub fn restore(&mut self) -> BenchResult<()> {
        if self.restored {
            return Ok(());
        }
        let result = match &self.original {
            Some(content) => fs::write(&self.path, content),
            None => match fs::remove_file(&self.path) {
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        result.map_err(|err| {
            BenchmarkError::io(format!("restoring {}", self.path.display()), err)
        })?;
        self.restored = true;
        debug!("MangoHud config {} restored", self.path.display());
        Ok(())
    }
}

impl Drop for CaptureConfigGuard {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            warn!("{err}");
        }
    }
}

fn config_key(line: &str) -> &str {
    line.split('=').next().unwrap_or_default().trim()
}
