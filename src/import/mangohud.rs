//! MangoHud log files
//!
//! MangoHud is the most popular Linux FPS overlay. With logging enabled it writes
//! one CSV per recording into its `output_folder`, named like
//! `Game_2024-01-15_12-30-00.csv`, plus a `*_summary.csv` we never treat as a trace.
//!
//! To enable logging in MangoHud:
//!   MANGOHUD=1 MANGOHUD_LOG=1 game
//! Or in ~/.config/MangoHud/MangoHud.conf:
//!   output_folder=/path/to/logs
//!   log_duration=60

use std::fs;
use std::path::{Path, PathBuf};

/// Whether `path` looks like a MangoHud frame log (and not its summary companion).
pub fn is_trace_file(path: &Path) -> bool {
    let is_log = path
        .extension()
        .map(|ext| ext == "csv" || ext == "log")
        .unwrap_or(false);
    is_log && !is_summary_file(path)
}

pub fn is_summary_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.contains("_summary"))
        .unwrap_or(false)
}

/// Game name embedded in a MangoHud log file name, if any.
pub fn application_from_file_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| {
            s.split('_')
                .take_while(|part| !part.chars().all(|c| c.is_numeric() || c == '-'))
                .collect::<Vec<_>>()
                .join("_")
        })
        .filter(|s| !s.is_empty())
}

/// Trace files currently present in `dir`, oldest first.
pub fn list_trace_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|path| path.is_file() && is_trace_file(path))
        .collect();

    files.sort_by_key(|path| path.metadata().and_then(|m| m.modified()).ok());
    files
}

/// Most recently modified trace in `dir`.
pub fn find_latest_trace(dir: &Path) -> Option<PathBuf> {
    list_trace_files(dir).pop()
}

/// MangoHud's default log folder when no `output_folder` is configured.
pub fn default_log_dir() -> Option<PathBuf> {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        if !data_home.trim().is_empty() {
            return Some(PathBuf::from(data_home).join("MangoHud"));
        }
    }
    directories::BaseDirs::new().map(|d| d.home_dir().join(".local/share/MangoHud"))
}

/// MangoHud's per-user config file.
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !config_home.trim().is_empty() {
            return Some(PathBuf::from(config_home).join("MangoHud/MangoHud.conf"));
        }
    }
    directories::BaseDirs::new().map(|d| d.home_dir().join(".config/MangoHud/MangoHud.conf"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn summary_files_are_not_traces() {
        assert!(is_trace_file(Path::new("/logs/Game_2024-01-15_12-30-00.csv")));
        assert!(!is_trace_file(Path::new(
            "/logs/Game_2024-01-15_12-30-00_summary.csv"
        )));
        assert!(!is_trace_file(Path::new("/logs/notes.txt")));
    }

    #[test]
    fn application_name_stops_at_timestamp() {
        assert_eq!(
            application_from_file_name(Path::new("Elden_Ring_2024-01-15_12-30-00.csv")),
            Some("Elden_Ring".to_string())
        );
        assert_eq!(
            application_from_file_name(Path::new("2024-01-15_12-30-00.csv")),
            None
        );
    }

    #[test]
    fn latest_trace_ignores_summaries() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Game_2024-01-15_12-30-00.csv"), "fps,frametime\n").unwrap();
        fs::write(
            dir.path().join("Game_2024-01-15_12-30-00_summary.csv"),
            "summary\n",
        )
        .unwrap();

        let latest = find_latest_trace(dir.path()).unwrap();
        assert!(latest.ends_with("Game_2024-01-15_12-30-00.csv"));
        assert_eq!(list_trace_files(dir.path()).len(), 1);
    }
}
