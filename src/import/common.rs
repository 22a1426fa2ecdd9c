//! In-memory frame trace shared by every capture format

use serde::{Deserialize, Serialize};

/// Ordered inter-frame intervals from one capture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameTrace {
    /// Milliseconds between consecutive presented frames, as read from the log.
    /// Values are not validated here; the analyzer owns that policy.
    pub frame_times_ms: Vec<f64>,
    /// Application/game name (if detected)
    pub application: Option<String>,
    /// Source tool name
    pub source: String,
}

impl FrameTrace {
    pub fn from_intervals(frame_times_ms: Vec<f64>, source: impl Into<String>) -> Self {
        Self {
            frame_times_ms,
            application: None,
            source: source.into(),
        }
    }

    /// Build a trace from absolute frame timestamps in milliseconds.
    pub fn from_timestamps(timestamps_ms: &[f64], source: impl Into<String>) -> Self {
        let frame_times_ms = timestamps_ms
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect();
        Self::from_intervals(frame_times_ms, source)
    }

    pub fn with_application(mut self, application: Option<String>) -> Self {
        self.application = application;
        self
    }

    pub fn len(&self) -> usize {
        self.frame_times_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_times_ms.is_empty()
    }

    /// Sum of finite positive intervals, in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frame_times_ms
            .iter()
            .filter(|ft| ft.is_finite() && **ft > 0.0)
            .sum::<f64>()
            / 1000.0
    }
}
