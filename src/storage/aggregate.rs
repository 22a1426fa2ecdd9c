//! Cross-run summary of a benchmark group
//!
//! Always recomputed from the run records; never written to disk.

use serde::Serialize;

use super::records::RunRecord;
use crate::analysis::{stats, FpsTarget, Rating};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRecord {
    pub run_count: usize,
    /// Median of the per-run averages
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    /// Median of the per-run 1%-lows
    pub one_percent_low: f64,
    /// Median of the per-run 0.1%-lows
    pub point_one_percent_low: f64,
    /// Population CV% of the per-run averages
    pub run_variation_percent: f64,
    /// Most severe stutter rating among the runs
    pub stutter_rating: Rating,
    /// Most severe pacing rating among the runs
    pub consistency_rating: Rating,
    pub total_frames: usize,
    pub total_duration_seconds: f64,
}

impl AggregateRecord {
    pub fn fps_targets(&self) -> Vec<FpsTarget> {
        crate::analysis::evaluate_targets(self.average, self.one_percent_low)
    }

    pub fn recommended_target(&self) -> Option<u32> {
        crate::analysis::recommended_target(&self.fps_targets())
    }
}

/// `None` for an empty group.
pub fn aggregate_runs(runs: &[RunRecord]) -> Option<AggregateRecord> {
    let stutter_rating = Rating::worst(runs.iter().map(|r| r.metrics.stutter.rating))?;
    let consistency_rating = Rating::worst(runs.iter().map(|r| r.metrics.frame_pacing.rating))?;

    let averages: Vec<f64> = runs.iter().map(|r| r.metrics.fps.average).collect();
    let lows: Vec<f64> = runs.iter().map(|r| r.metrics.fps.one_percent_low).collect();
    let point_one_lows: Vec<f64> = runs
        .iter()
        .map(|r| r.metrics.fps.point_one_percent_low)
        .collect();

    let minimum = runs
        .iter()
        .map(|r| r.metrics.fps.minimum)
        .fold(f64::INFINITY, f64::min);
    let maximum = runs
        .iter()
        .map(|r| r.metrics.fps.maximum)
        .fold(f64::NEG_INFINITY, f64::max);

    Some(AggregateRecord {
        run_count: runs.len(),
        average: stats::median(&averages),
        minimum,
        maximum,
        one_percent_low: stats::median(&lows),
        point_one_percent_low: stats::median(&point_one_lows),
        run_variation_percent: stats::cv_percent(&averages),
        stutter_rating,
        consistency_rating,
        total_frames: runs.iter().map(|r| r.metrics.fps.frame_count).sum(),
        total_duration_seconds: runs.iter().map(|r| r.metrics.fps.duration_seconds).sum(),
    })
}
