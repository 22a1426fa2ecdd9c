//! Frametime analysis
//!
//! Converts frame traces into metrics records and owns the rating contract every
//! other module reports with.

mod frametime;
mod metrics;
mod rating;
pub(crate) mod stats;
mod stutter;
mod targets;

pub use frametime::{AnalyzerConfig, FrametimeAnalyzer};
pub use metrics::MetricsRecord;
#[cfg(test)]
pub use metrics::{FpsStats, FramePacing, StutterStats};
pub use rating::{Rating, RATING_CONTRACT_VERSION};
pub use stutter::RollingMedianPolicy;
pub use targets::{
    evaluate as evaluate_target, evaluate_all as evaluate_targets,
    recommended as recommended_target, FpsTarget, TargetVerdict,
};
