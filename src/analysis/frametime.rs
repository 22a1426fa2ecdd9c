//! Frametime analyzer
//!
//! Turns a trace of inter-frame intervals into a [`MetricsRecord`]: FPS distribution,
//! stutter classification and frame-pacing consistency.

use tracing::{debug, warn};

use super::metrics::{FpsStats, FramePacing, MetricsRecord, StutterStats};
use super::rating::Rating;
use super::stats;
use super::stutter::{self, RollingMedianPolicy, StutterPolicy};
use crate::error::{BenchResult, BenchmarkError};
use crate::import::FrameTrace;

/// Analyzer settings
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Fraction of invalid intervals (non-finite, zero, negative) that may be dropped
    /// before the trace is rejected. `0.0` rejects any invalid value.
    pub outlier_tolerance: f64,
    pub stutter: RollingMedianPolicy,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            outlier_tolerance: 0.0,
            stutter: RollingMedianPolicy::default(),
        }
    }
}

pub struct FrametimeAnalyzer {
    outlier_tolerance: f64,
    policy: Box<dyn StutterPolicy + Send + Sync>,
    /// Set when the stutter parameters differ from the rating contract defaults.
    tuning: Option<RollingMedianPolicy>,
}

impl Default for FrametimeAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl FrametimeAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let tuning = (config.stutter != RollingMedianPolicy::default()).then_some(config.stutter);
        if let Some(policy) = &tuning {
            warn!(
                ?policy,
                "Custom stutter parameters; stutter ratings are recorded with them and are not \
                 comparable to default runs"
            );
        }
        Self {
            outlier_tolerance: config.outlier_tolerance,
            policy: Box::new(config.stutter),
            tuning,
        }
    }

    /// Swap the stutter detection strategy. Meant for experiments: results from it are
    /// not tagged with the strategy and should not be stored.
    #[allow(dead_code)]
    pub fn with_policy<P>(mut self, policy: P) -> Self
    where
        P: StutterPolicy + Send + Sync + 'static,
    {
        self.policy = Box::new(policy);
        self
    }

    pub fn analyze(&self, trace: &FrameTrace) -> BenchResult<MetricsRecord> {
        self.analyze_intervals(&trace.frame_times_ms)
    }

    /// Analyze and hand back the intervals the metrics were computed from, with any
    /// tolerated invalid values removed. This is the sequence to store with the run.
    pub fn analyze_with_intervals(
        &self,
        trace: &FrameTrace,
    ) -> BenchResult<(MetricsRecord, Vec<f64>)> {
        let intervals = self.validate(&trace.frame_times_ms)?;
        let metrics = self.metrics(&intervals);
        Ok((metrics, intervals))
    }

    pub fn analyze_intervals(&self, intervals: &[f64]) -> BenchResult<MetricsRecord> {
        let intervals = self.validate(intervals)?;
        Ok(self.metrics(&intervals))
    }

    fn metrics(&self, intervals: &[f64]) -> MetricsRecord {

        let fps_samples: Vec<f64> = intervals.iter().map(|ms| 1000.0 / ms).collect();
        let duration_seconds = intervals.iter().sum::<f64>() / 1000.0;

        let fps = fps_stats(&fps_samples, duration_seconds);
        let stutter = self.stutter_stats(intervals, duration_seconds);
        let frame_pacing = frame_pacing(intervals, &fps_samples);

        debug!(
            frames = fps.frame_count,
            avg_fps = fps.average,
            stutter_events = stutter.event_count,
            cv_percent = frame_pacing.cv_percent,
            "Trace analyzed"
        );

        MetricsRecord {
            fps,
            stutter,
            frame_pacing,
        }
    }

    fn validate(&self, intervals: &[f64]) -> BenchResult<Vec<f64>> {
        let valid: Vec<f64> = intervals
            .iter()
            .copied()
            .filter(|ms| ms.is_finite() && *ms > 0.0)
            .collect();

        let invalid = intervals.len() - valid.len();
        if invalid > 0 {
            let allowed = (self.outlier_tolerance.clamp(0.0, 1.0) * intervals.len() as f64).floor()
                as usize;
            if invalid > allowed {
                return Err(BenchmarkError::InvalidTrace(format!(
                    "{invalid} of {} frame intervals are non-finite or non-positive",
                    intervals.len()
                )));
            }
            warn!(
                dropped = invalid,
                total = intervals.len(),
                "Dropping invalid frame intervals within outlier tolerance"
            );
        }

        if valid.len() < 2 {
            return Err(BenchmarkError::InvalidTrace(format!(
                "need at least 2 frame intervals, got {}",
                valid.len()
            )));
        }
        Ok(valid)
    }

    fn stutter_stats(&self, intervals: &[f64], duration_secs: f64) -> StutterStats {
        let events = stutter::scan(intervals, self.policy.as_ref());
        let index = stutter::stutter_index(&events, duration_secs);
        StutterStats {
            rating: Rating::from_stutter_index(index),
            index,
            event_count: events.len(),
            policy: self.tuning,
        }
    }
}

fn fps_stats(fps_samples: &[f64], duration_seconds: f64) -> FpsStats {
    let mut sorted = fps_samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let median = stats::median_of_sorted(&sorted);
    let one_percent_low = stats::lowest_share_mean(&sorted, 100).min(median);
    let point_one_percent_low = stats::lowest_share_mean(&sorted, 1000).min(one_percent_low);

    FpsStats {
        average: stats::mean(fps_samples),
        minimum: sorted.first().copied().unwrap_or_default(),
        maximum: sorted.last().copied().unwrap_or_default(),
        median,
        one_percent_low,
        point_one_percent_low,
        std_dev: stats::population_std_dev(fps_samples),
        frame_count: fps_samples.len(),
        duration_seconds,
    }
}

fn frame_pacing(intervals: &[f64], fps_samples: &[f64]) -> FramePacing {
    let cv_percent = stats::cv_percent(intervals);
    let avg_fps = stats::mean(fps_samples);
    let stability_percent = if avg_fps > 0.0 {
        100.0 - stats::mean_absolute_deviation(fps_samples) / avg_fps * 100.0
    } else {
        0.0
    };

    FramePacing {
        rating: Rating::from_cv_percent(cv_percent),
        consistency_score: (100.0 - 2.0 * cv_percent).clamp(0.0, 100.0),
        cv_percent,
        stability_percent: stability_percent.clamp(0.0, 100.0),
    }
}
