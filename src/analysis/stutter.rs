//! Stutter detection against a rolling local baseline
//!
//! A frame only counts as a stutter when it is slow relative to the frames just before
//! it and pacing recovers right after, so a drop to a lower frame rate is not reported
//! as a run of stutters.

use serde::{Deserialize, Serialize};

use super::stats;

/// Decides whether the frame at `index` is a stutter.
///
/// Returns the baseline interval the frame was judged against when it is one.
pub trait StutterPolicy {
    fn detect(&self, intervals: &[f64], index: usize) -> Option<f64>;
}

impl<F> StutterPolicy for F
where
    F: Fn(&[f64], usize) -> Option<f64>,
{
    fn detect(&self, intervals: &[f64], index: usize) -> Option<f64> {
        self(intervals, index)
    }
}

/// Median of the trailing window, with a relative and an absolute excess requirement.
/// The slow frame must be isolated: one of the next `recovery_frames` frames has to be
/// back under the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingMedianPolicy {
    /// Number of preceding frames forming the baseline
    pub window: usize,
    /// Interval must exceed `multiplier * baseline`
    pub multiplier: f64,
    /// Interval must exceed the baseline by at least this many milliseconds
    pub min_excess_ms: f64,
    /// Frames after a slow frame in which pacing must recover
    pub recovery_frames: usize,
}

impl Default for RollingMedianPolicy {
    fn default() -> Self {
        Self {
            window: 60,
            multiplier: 2.0,
            min_excess_ms: 8.0,
            recovery_frames: 3,
        }
    }
}

impl RollingMedianPolicy {
    fn baseline(&self, intervals: &[f64], index: usize) -> Option<f64> {
        if index == 0 || index > intervals.len() {
            return None;
        }
        let start = index.saturating_sub(self.window.max(1));
        let baseline = stats::median(&intervals[start..index]);
        (baseline > 0.0).then_some(baseline)
    }

    fn is_slow(&self, interval: f64, baseline: f64) -> bool {
        interval > self.multiplier * baseline && interval - baseline >= self.min_excess_ms
    }
}

impl StutterPolicy for RollingMedianPolicy {
    fn detect(&self, intervals: &[f64], index: usize) -> Option<f64> {
        let interval = *intervals.get(index)?;
        let baseline = self.baseline(intervals, index)?;
        if !self.is_slow(interval, baseline) {
            return None;
        }
        // A trailing slow frame has nothing to recover into and is not counted.
        let end = (index + 1 + self.recovery_frames.max(1)).min(intervals.len());
        let recovered = intervals[index + 1..end]
            .iter()
            .any(|&next| !self.is_slow(next, baseline));
        recovered.then_some(baseline)
    }
}

/// One anomalously slow frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StutterEvent {
    pub frame_index: usize,
    pub interval_ms: f64,
    pub baseline_ms: f64,
}

impl StutterEvent {
    /// Excess over the baseline, relative to the baseline.
    pub fn severity(&self) -> f64 {
        (self.interval_ms - self.baseline_ms) / self.baseline_ms
    }
}

pub fn scan<P: StutterPolicy + ?Sized>(intervals: &[f64], policy: &P) -> Vec<StutterEvent> {
    (0..intervals.len())
        .filter_map(|index| {
            policy.detect(intervals, index).map(|baseline_ms| StutterEvent {
                frame_index: index,
                interval_ms: intervals[index],
                baseline_ms,
            })
        })
        .collect()
}

/// Events per minute of trace time, weighted by their mean severity.
pub fn stutter_index(events: &[StutterEvent], duration_secs: f64) -> f64 {
    if events.is_empty() || duration_secs <= 0.0 {
        return 0.0;
    }
    let per_minute = events.len() as f64 / (duration_secs / 60.0);
    let severities: Vec<f64> = events.iter().map(StutterEvent::severity).collect();
    per_minute * stats::mean(&severities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_has_no_baseline() {
        let policy = RollingMedianPolicy::default();
        assert_eq!(policy.detect(&[100.0, 16.0], 0), None);
    }

    #[test]
    fn spike_after_steady_frames_is_detected() {
        let mut intervals = vec![16.0; 20];
        intervals.push(50.0);
        intervals.extend([16.0; 5]);
        let events = scan(&intervals, &RollingMedianPolicy::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].frame_index, 20);
        assert_eq!(events[0].baseline_ms, 16.0);
    }

    #[test]
    fn sustained_slow_section_is_not_stutter() {
        let mut intervals = vec![16.0; 60];
        intervals.extend(vec![40.0; 200]);
        assert!(scan(&intervals, &RollingMedianPolicy::default()).is_empty());
    }

    #[test]
    fn short_hitch_counts_every_slow_frame() {
        let mut intervals = vec![16.0; 30];
        intervals.extend([60.0, 55.0]);
        intervals.extend([16.0; 10]);
        let events = scan(&intervals, &RollingMedianPolicy::default());
        let frames: Vec<usize> = events.iter().map(|e| e.frame_index).collect();
        assert_eq!(frames, vec![30, 31]);
    }

    #[test]
    fn slow_frame_at_end_of_trace_is_not_counted() {
        let mut intervals = vec![16.0; 30];
        intervals.push(80.0);
        assert!(scan(&intervals, &RollingMedianPolicy::default()).is_empty());
    }

    #[test]
    fn small_absolute_excess_is_ignored() {
        // 2.5x a 2ms baseline is only 3ms slower.
        let mut intervals = vec![2.0; 10];
        intervals.push(5.0);
        assert!(scan(&intervals, &RollingMedianPolicy::default()).is_empty());
    }

    #[test]
    fn closures_act_as_policies() {
        let every_long_frame = |intervals: &[f64], i: usize| (intervals[i] > 20.0).then_some(20.0);
        let events = scan(&[10.0, 30.0, 10.0, 25.0], &every_long_frame);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn index_weights_frequency_by_severity() {
        let events = [
            StutterEvent { frame_index: 1, interval_ms: 48.0, baseline_ms: 16.0 },
            StutterEvent { frame_index: 2, interval_ms: 32.0, baseline_ms: 16.0 },
        ];
        // 2 events in 60s, mean severity (2 + 1) / 2.
        assert!((stutter_index(&events, 60.0) - 3.0).abs() < 1e-12);
        assert_eq!(stutter_index(&[], 60.0), 0.0);
    }
}
