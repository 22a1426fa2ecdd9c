//! Metrics record produced by one trace analysis
//!
//! Field names match the persisted run schema, so a record serializes straight into
//! `run_NNN.json` and older files stay readable.

use serde::{Deserialize, Serialize};

use super::rating::Rating;
use super::stutter::RollingMedianPolicy;
use super::targets::{self, FpsTarget};

/// Immutable result of analyzing one trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub fps: FpsStats,
    pub stutter: StutterStats,
    pub frame_pacing: FramePacing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FpsStats {
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub median: f64,
    #[serde(rename = "1_percent_low")]
    pub one_percent_low: f64,
    #[serde(rename = "0.1_percent_low")]
    pub point_one_percent_low: f64,
    pub std_dev: f64,
    pub frame_count: usize,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StutterStats {
    #[serde(rename = "stutter_rating")]
    pub rating: Rating,
    #[serde(rename = "stutter_index")]
    pub index: f64,
    pub event_count: usize,
    /// Detector parameters, present only when they differ from the rating contract's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<RollingMedianPolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePacing {
    #[serde(rename = "consistency_rating")]
    pub rating: Rating,
    pub consistency_score: f64,
    pub cv_percent: f64,
    #[serde(rename = "fps_stability")]
    pub stability_percent: f64,
}

impl MetricsRecord {
    /// Smooth/playable verdicts against the common refresh-rate targets.
    pub fn fps_targets(&self) -> Vec<FpsTarget> {
        targets::evaluate_all(self.fps.average, self.fps.one_percent_low)
    }

    /// Highest refresh rate this run sustains smoothly.
    pub fn recommended_target(&self) -> Option<u32> {
        targets::recommended(&self.fps_targets())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_field_names_are_stable() {
        let json = r#"{
            "fps": {"average": 60.0, "minimum": 40.0, "maximum": 70.0, "median": 61.0,
                    "1_percent_low": 45.0, "0.1_percent_low": 41.0, "std_dev": 3.5,
                    "frame_count": 3600, "duration_seconds": 60.0},
            "stutter": {"stutter_rating": "Good", "stutter_index": 2.1, "event_count": 4},
            "frame_pacing": {"consistency_rating": "excellent", "consistency_score": 94.0,
                             "cv_percent": 3.0, "fps_stability": 96.5, "extra": true}
        }"#;

        let record: MetricsRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.fps.one_percent_low, 45.0);
        assert_eq!(record.stutter.rating, Rating::Good);
        assert_eq!(record.frame_pacing.stability_percent, 96.5);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["fps"]["0.1_percent_low"], 41.0);
        assert_eq!(value["stutter"]["stutter_rating"], "good");
        assert!(value["stutter"].get("policy").is_none());
    }
}
