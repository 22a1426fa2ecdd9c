//! Benchmark module
//!
//! Drives a benchmark session: launching the game, capturing MangoHud logs for each
//! warmup and measured run, and handing finished traces to the analyzer.

mod cancel;
mod capture;
mod completion;
mod launcher;
mod session;

pub use cancel::CancelToken;
pub use capture::{
    AutostartCapture, CaptureConfigGuard, CaptureSettings, CaptureTrigger, HotkeyPrompt,
    DEFAULT_TOGGLE_KEY,
};
pub use completion::{CompletionStrategy, PollingCompletion, TraceSnapshot};
pub use launcher::{CommandLauncher, Launcher, StdinSignal, UserSignal};
pub use session::{
    Collaborators, Orchestrator, RunOutcome, SessionMode, SessionPlan, SessionReport,
    SessionStatus,
};
