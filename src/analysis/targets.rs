//! FPS target evaluation against common display refresh rates

use serde::Serialize;
use std::fmt;

/// Refresh rates a result is judged against, ascending.
pub const TARGET_REFRESH_RATES: [u32; 5] = [30, 60, 120, 144, 165];

/// 1%-lows must reach this share of the target for a "smooth" verdict.
const SMOOTH_LOW_RATIO: f64 = 0.8;
/// Average must reach this share of the target to count as playable.
const PLAYABLE_AVG_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetVerdict {
    Smooth,
    Playable,
    Unplayable,
}

impl fmt::Display for TargetVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TargetVerdict::Smooth => "smooth",
            TargetVerdict::Playable => "playable",
            TargetVerdict::Unplayable => "unplayable",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FpsTarget {
    pub refresh_rate: u32,
    pub verdict: TargetVerdict,
}

pub fn evaluate(average: f64, one_percent_low: f64, refresh_rate: u32) -> TargetVerdict {
    let target = f64::from(refresh_rate);
    if average >= target && one_percent_low >= target * SMOOTH_LOW_RATIO {
        TargetVerdict::Smooth
    } else if average >= target * PLAYABLE_AVG_RATIO {
        TargetVerdict::Playable
    } else {
        TargetVerdict::Unplayable
    }
}

pub fn evaluate_all(average: f64, one_percent_low: f64) -> Vec<FpsTarget> {
    TARGET_REFRESH_RATES
        .iter()
        .map(|&refresh_rate| FpsTarget {
            refresh_rate,
            verdict: evaluate(average, one_percent_low, refresh_rate),
        })
        .collect()
}

pub fn recommended(targets: &[FpsTarget]) -> Option<u32> {
    targets
        .iter()
        .filter(|t| t.verdict == TargetVerdict::Smooth)
        .map(|t| t.refresh_rate)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smooth_requires_good_lows() {
        assert_eq!(evaluate(65.0, 50.0, 60), TargetVerdict::Smooth);
        assert_eq!(evaluate(65.0, 40.0, 60), TargetVerdict::Playable);
        assert_eq!(evaluate(54.0, 40.0, 60), TargetVerdict::Playable);
        assert_eq!(evaluate(53.9, 40.0, 60), TargetVerdict::Unplayable);
    }

    #[test]
    fn recommended_is_highest_smooth_target() {
        let targets = evaluate_all(130.0, 110.0);
        assert_eq!(recommended(&targets), Some(120));

        let targets = evaluate_all(20.0, 10.0);
        assert_eq!(recommended(&targets), None);
    }
}
