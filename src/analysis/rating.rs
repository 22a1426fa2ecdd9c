//! Four-level quality scale shared by stutter and frame-pacing metrics.
//!
//! Thresholds are part of the stored-data contract: changing them reclassifies
//! historical runs, so any change must bump [`RATING_CONTRACT_VERSION`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the threshold set below. Stored with every run.
pub const RATING_CONTRACT_VERSION: u32 = 1;

/// Stutter index upper bounds (exclusive) for excellent, good, moderate.
pub const STUTTER_INDEX_THRESHOLDS: [f64; 3] = [1.0, 5.0, 15.0];

/// Frame-interval CV% upper bounds (exclusive) for excellent, good, moderate.
pub const PACING_CV_THRESHOLDS: [f64; 3] = [5.0, 10.0, 20.0];

/// Ordered from best to worst, so `max()` over ratings is the most severe one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    #[serde(alias = "Excellent", alias = "EXCELLENT")]
    Excellent,
    #[serde(alias = "Good", alias = "GOOD")]
    Good,
    #[serde(alias = "Moderate", alias = "MODERATE")]
    Moderate,
    #[serde(alias = "Poor", alias = "POOR")]
    Poor,
}

impl Rating {
    pub fn from_stutter_index(index: f64) -> Self {
        Self::bucket(index, &STUTTER_INDEX_THRESHOLDS)
    }

    pub fn from_cv_percent(cv_percent: f64) -> Self {
        Self::bucket(cv_percent, &PACING_CV_THRESHOLDS)
    }

    fn bucket(value: f64, thresholds: &[f64; 3]) -> Self {
        if value < thresholds[0] {
            Rating::Excellent
        } else if value < thresholds[1] {
            Rating::Good
        } else if value < thresholds[2] {
            Rating::Moderate
        } else {
            // NaN lands here too.
            Rating::Poor
        }
    }

    /// Most severe rating in `ratings`, or `None` when empty.
    pub fn worst<I: IntoIterator<Item = Rating>>(ratings: I) -> Option<Rating> {
        ratings.into_iter().max()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Excellent => "excellent",
            Rating::Good => "good",
            Rating::Moderate => "moderate",
            Rating::Poor => "poor",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
