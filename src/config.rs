//! Configuration management for lgb
//!
//! Config file location:
//! - Linux: ~/.config/linux-game-bench/config.toml
//! - macOS: ~/Library/Application Support/com.lgb.linux-game-bench/config.toml
//!
//! You can override the config location by setting `LGB_CONFIG_PATH`.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analysis::{AnalyzerConfig, RollingMedianPolicy};
use crate::benchmark::{SessionMode, SessionPlan};
use crate::import::mangohud;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where results are stored
    #[serde(default)]
    pub storage: StorageConfig,

    /// Trace validation and stutter detection
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Benchmark session defaults
    #[serde(default)]
    pub session: SessionConfig,

    /// MangoHud capture settings
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl Config {
    /// Load configuration from file or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, toml)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("LGB_CONFIG_PATH") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Create default config file if it doesn't exist
    pub fn init() -> Result<Self> {
        let config = Self::load()?;

        let config_path = Self::config_path()?;
        if !config_path.exists() {
            config.save()?;
        }

        Ok(config)
    }

    pub fn results_dir(&self) -> Result<PathBuf> {
        match &self.storage.results_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().join("benchmark_results")),
        }
    }

    /// Folder MangoHud is told to write session logs into.
    pub fn capture_output_dir(&self) -> Result<PathBuf> {
        match &self.capture.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().join("captures")),
        }
    }

    /// MangoHud's per-user config file, rewritten for the duration of a session.
    pub fn mangohud_config_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.capture.mangohud_config {
            return Ok(path.clone());
        }
        mangohud::default_config_path().context("Could not determine MangoHud config location")
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "lgb", "linux-game-bench")
        .context("Could not determine project directories")
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Results directory (default: `<data dir>/benchmark_results`)
    pub results_dir: Option<PathBuf>,
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Share of invalid frame intervals dropped before a trace is rejected
    #[serde(default)]
    pub outlier_tolerance: f64,

    /// Frames forming the rolling stutter baseline
    #[serde(default = "default_stutter_window")]
    pub stutter_window: usize,

    /// A frame slower than this multiple of the baseline may be a stutter
    #[serde(default = "default_stutter_multiplier")]
    pub stutter_multiplier: f64,

    /// ...and must also exceed the baseline by this many milliseconds
    #[serde(default = "default_stutter_min_excess_ms")]
    pub stutter_min_excess_ms: f64,

    /// ...and pacing must recover within this many frames
    #[serde(default = "default_stutter_recovery_frames")]
    pub stutter_recovery_frames: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            outlier_tolerance: 0.0,
            stutter_window: default_stutter_window(),
            stutter_multiplier: default_stutter_multiplier(),
            stutter_min_excess_ms: default_stutter_min_excess_ms(),
            stutter_recovery_frames: default_stutter_recovery_frames(),
        }
    }
}

impl AnalysisConfig {
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            outlier_tolerance: self.outlier_tolerance,
            stutter: RollingMedianPolicy {
                window: self.stutter_window,
                multiplier: self.stutter_multiplier,
                min_excess_ms: self.stutter_min_excess_ms,
                recovery_frames: self.stutter_recovery_frames,
            },
        }
    }
}

fn default_stutter_window() -> usize {
    60
}

fn default_stutter_multiplier() -> f64 {
    2.0
}

fn default_stutter_min_excess_ms() -> f64 {
    8.0
}

fn default_stutter_recovery_frames() -> usize {
    3
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub mode: SessionMode,

    /// Measured runs per session
    #[serde(default = "default_runs")]
    pub runs: u32,

    /// Discarded runs before measuring
    #[serde(default = "default_warmup_runs")]
    pub warmup_runs: u32,

    /// Capture length in timed mode
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,

    /// Idle time between measured runs
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// How long to wait for the game process to appear
    #[serde(default = "default_launch_timeout_secs")]
    pub launch_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: SessionMode::default(),
            runs: default_runs(),
            warmup_runs: default_warmup_runs(),
            duration_secs: default_duration_secs(),
            cooldown_secs: default_cooldown_secs(),
            launch_timeout_secs: default_launch_timeout_secs(),
        }
    }
}

impl SessionConfig {
    pub fn plan(&self) -> SessionPlan {
        SessionPlan {
            mode: self.mode,
            runs: self.runs,
            warmup_runs: self.warmup_runs,
            duration: Duration::from_secs(self.duration_secs),
            cooldown: Duration::from_secs(self.cooldown_secs),
            launch_timeout: Duration::from_secs(self.launch_timeout_secs),
        }
    }
}

fn default_runs() -> u32 {
    3
}

fn default_warmup_runs() -> u32 {
    1
}

fn default_duration_secs() -> u64 {
    60
}

fn default_cooldown_secs() -> u64 {
    10
}

fn default_launch_timeout_secs() -> u64 {
    120
}

/// MangoHud capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// MangoHud config file to rewrite (default: `~/.config/MangoHud/MangoHud.conf`)
    pub mangohud_config: Option<PathBuf>,

    /// Folder for session logs (default: `<data dir>/captures`)
    pub output_dir: Option<PathBuf>,

    /// Trace completion polling interval in milliseconds
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,

    /// Smallest trace file accepted as complete
    #[serde(default = "default_min_trace_bytes")]
    pub min_trace_bytes: u64,

    /// Give up on a trace that has not appeared and settled after this long
    #[serde(default = "default_stabilize_timeout_secs")]
    pub stabilize_timeout_secs: u64,

    /// Keep the MangoHud overlay visible while capturing
    #[serde(default = "default_true")]
    pub show_hud: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            mangohud_config: None,
            output_dir: None,
            poll_ms: default_poll_ms(),
            min_trace_bytes: default_min_trace_bytes(),
            stabilize_timeout_secs: default_stabilize_timeout_secs(),
            show_hud: true,
        }
    }
}

fn default_poll_ms() -> u64 {
    500
}

fn default_min_trace_bytes() -> u64 {
    1000
}

fn default_stabilize_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

/// Get configuration file path for display purposes
pub fn get_config_path() -> Result<String> {
    let path = Config::config_path()?;
    Ok(path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analysis.outlier_tolerance, 0.0);
        assert_eq!(config.analysis.stutter_window, 60);
        assert_eq!(config.session.mode, SessionMode::Timed);
        assert_eq!(config.session.runs, 3);
        assert_eq!(config.session.warmup_runs, 1);
        assert_eq!(config.session.duration_secs, 60);
        assert_eq!(config.session.cooldown_secs, 10);
        assert_eq!(config.session.launch_timeout_secs, 120);
        assert_eq!(config.capture.poll_ms, 500);
        assert_eq!(config.capture.min_trace_bytes, 1000);
        assert!(config.capture.show_hud);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();

        assert!(toml.contains("[analysis]"));
        assert!(toml.contains("[session]"));
        assert!(toml.contains("mode = \"timed\""));
        assert!(toml.contains("stabilize_timeout_secs"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[session]\nmode = \"builtin\"\nruns = 5\n\n[storage]\nresults_dir = \"/tmp/results\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.session.mode, SessionMode::Builtin);
        assert_eq!(config.session.runs, 5);
        assert_eq!(config.session.cooldown_secs, 10);
        assert_eq!(config.results_dir().unwrap(), PathBuf::from("/tmp/results"));
        assert_eq!(config.analysis.stutter_multiplier, 2.0);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.session.runs, 3);
    }

    #[test]
    fn test_analyzer_and_plan_conversion() {
        let config = Config::default();
        let analyzer = config.analysis.analyzer_config();
        assert_eq!(analyzer.stutter, RollingMedianPolicy::default());

        let plan = config.session.plan();
        assert_eq!(plan.duration, Duration::from_secs(60));
        assert_eq!(plan.runs, 3);
    }
}
