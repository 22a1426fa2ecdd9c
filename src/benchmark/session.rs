//! Benchmark session state machine
//!
//! `Idle -> Launch -> Warmup* -> Measure (-> Cooldown -> Measure)* -> Finalize`, ending
//! in `Done` or `Failed`. Per-run failures are recorded and the session moves on;
//! launch failures and cancellation end it. Finalize always runs, restoring the
//! MangoHud config and stopping the game.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    CancelToken, CaptureConfigGuard, CaptureTrigger, CompletionStrategy, Launcher,
    TraceSnapshot, UserSignal,
};
use crate::analysis::{FrametimeAnalyzer, MetricsRecord};
use crate::error::{BenchResult, BenchmarkError};
use crate::import::read_trace;

/// How a capture is ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Fixed capture length
    #[default]
    Timed,
    /// Player presses Enter
    Manual,
    /// Game runs its own benchmark and exits
    Builtin,
}

#[derive(Debug, Clone)]
pub struct SessionPlan {
    pub mode: SessionMode,
    pub runs: u32,
    pub warmup_runs: u32,
    pub duration: Duration,
    pub cooldown: Duration,
    pub launch_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Launch,
    Warmup,
    Measure,
    Cooldown,
    Finalize,
    Done,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Launch => "launch",
            SessionState::Warmup => "warmup",
            SessionState::Measure => "measure",
            SessionState::Cooldown => "cooldown",
            SessionState::Finalize => "finalize",
            SessionState::Done => "done",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of one warmup or measured iteration.
#[derive(Debug)]
pub enum RunOutcome {
    /// Warmups are never analyzed.
    Discarded { warmup: u32, trace: Option<PathBuf> },
    Measured {
        run: u32,
        trace: PathBuf,
        metrics: MetricsRecord,
        frame_times: Vec<f64>,
    },
    Failed { run: u32, error: BenchmarkError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Success,
    /// Some measured runs failed.
    Partial,
    /// Runs were planned but none produced metrics.
    NoData,
    Cancelled,
    Failed,
}

/// Everything a session produced, including partial results.
#[derive(Debug)]
pub struct SessionReport {
    pub id: Uuid,
    pub game: String,
    pub mode: SessionMode,
    pub planned_runs: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub history: Vec<SessionState>,
    pub final_state: SessionState,
    pub outcomes: Vec<RunOutcome>,
    pub failure: Option<BenchmarkError>,
}

impl SessionReport {
    /// Measured runs that produced metrics, in run order.
    pub fn measured(&self) -> impl Iterator<Item = (u32, &MetricsRecord, &[f64])> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            RunOutcome::Measured {
                run,
                metrics,
                frame_times,
                ..
            } => Some((*run, metrics, frame_times.as_slice())),
            _ => None,
        })
    }

    pub fn failed_runs(&self) -> impl Iterator<Item = (u32, &BenchmarkError)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            RunOutcome::Failed { run, error } => Some((*run, error)),
            _ => None,
        })
    }

    pub fn status(&self) -> SessionStatus {
        match &self.failure {
            Some(BenchmarkError::UserCancelled) => return SessionStatus::Cancelled,
            Some(_) => return SessionStatus::Failed,
            None => {}
        }
        let measured = self.measured().count();
        if measured == 0 && self.planned_runs > 0 {
            SessionStatus::NoData
        } else if self.failed_runs().next().is_some() {
            SessionStatus::Partial
        } else {
            SessionStatus::Success
        }
    }
}

/// External collaborators a session drives.
pub struct Collaborators<'a> {
    pub launcher: &'a mut dyn Launcher,
    pub trigger: &'a mut dyn CaptureTrigger,
    pub signal: &'a mut dyn UserSignal,
    pub completion: &'a dyn CompletionStrategy,
}

pub struct Orchestrator<'a> {
    game: String,
    plan: SessionPlan,
    analyzer: &'a FrametimeAnalyzer,
    parts: Collaborators<'a>,
    trace_dir: PathBuf,
    poll_interval: Duration,
    discovery_timeout: Duration,
    cancel: CancelToken,
    capture_guard: Option<CaptureConfigGuard>,
    history: Vec<SessionState>,
    outcomes: Vec<RunOutcome>,
    iterations: u32,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        game: &str,
        plan: SessionPlan,
        analyzer: &'a FrametimeAnalyzer,
        parts: Collaborators<'a>,
        trace_dir: &Path,
    ) -> Self {
        Self {
            game: game.to_string(),
            plan,
            analyzer,
            parts,
            trace_dir: trace_dir.to_path_buf(),
            poll_interval: Duration::from_millis(500),
            discovery_timeout: Duration::from_secs(60),
            cancel: CancelToken::new(),
            capture_guard: None,
            history: vec![SessionState::Idle],
            outcomes: Vec::new(),
            iterations: 0,
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// How long to wait for a capture file to show up after an iteration.
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Restored during finalize on every exit path.
    pub fn capture_guard(mut self, guard: CaptureConfigGuard) -> Self {
        self.capture_guard = Some(guard);
        self
    }

    pub fn run(mut self) -> SessionReport {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(session = %id, game = %self.game, mode = ?self.plan.mode, "Session started");

        let result = self.drive();

        self.transition(SessionState::Finalize);
        self.finalize();

        let failure = result.err();
        let final_state = match &failure {
            None => SessionState::Done,
            Some(err) => {
                warn!(session = %id, "Session ended early: {err}");
                SessionState::Failed
            }
        };
        self.transition(final_state);

        SessionReport {
            id,
            game: self.game,
            mode: self.plan.mode,
            planned_runs: self.plan.runs,
            started_at,
            ended_at: Utc::now(),
            history: self.history,
            final_state,
            outcomes: self.outcomes,
            failure,
        }
    }

    fn drive(&mut self) -> BenchResult<()> {
        self.transition(SessionState::Launch);
        self.launch()?;

        for warmup in 1..=self.plan.warmup_runs {
            self.transition(SessionState::Warmup);
            let trace = match self.capture_iteration(warmup) {
                Ok(path) => Some(path),
                Err(err) if err.is_per_run() => {
                    warn!("Warmup #{warmup}: {err}");
                    None
                }
                Err(err) => return Err(err),
            };
            self.outcomes.push(RunOutcome::Discarded { warmup, trace });
        }

        for run in 1..=self.plan.runs {
            if run > 1 {
                self.transition(SessionState::Cooldown);
                if !self.cancel.sleep(self.plan.cooldown) {
                    return Err(BenchmarkError::UserCancelled);
                }
            }
            self.transition(SessionState::Measure);

            let outcome = match self.measure(run) {
                Ok((trace, metrics, frame_times)) => {
                    info!(
                        run,
                        average = metrics.fps.average,
                        stutter = %metrics.stutter.rating,
                        "Run complete"
                    );
                    RunOutcome::Measured {
                        run,
                        trace,
                        metrics,
                        frame_times,
                    }
                }
                Err(err) if err.is_per_run() => {
                    warn!("Run #{run} failed: {err}");
                    RunOutcome::Failed { run, error: err }
                }
                Err(err) => return Err(err),
            };
            self.outcomes.push(outcome);
        }
        Ok(())
    }

    fn measure(&mut self, run: u32) -> BenchResult<(PathBuf, MetricsRecord, Vec<f64>)> {
        let path = self.capture_iteration(run)?;
        let trace = read_trace(&path)?;
        let (metrics, frame_times) = self.analyzer.analyze_with_intervals(&trace)?;
        Ok((path, metrics, frame_times))
    }

    /// One capture, warmup or measured. Returns the finished trace file.
    fn capture_iteration(&mut self, run: u32) -> BenchResult<PathBuf> {
        self.checkpoint()?;
        if self.plan.mode == SessionMode::Builtin && self.iterations > 0 {
            // The builtin benchmark closes the game when it is done.
            self.launch()?;
        }
        self.iterations += 1;
        let iteration = self.iterations;

        let snapshot = TraceSnapshot::take(&self.trace_dir);
        self.parts.trigger.start(iteration)?;
        match self.plan.mode {
            SessionMode::Timed => {
                if !self.cancel.sleep(self.plan.duration) {
                    return Err(BenchmarkError::UserCancelled);
                }
            }
            SessionMode::Manual => self.parts.signal.wait_for_stop(run, &self.cancel)?,
            SessionMode::Builtin => self.wait_for_exit()?,
        }
        self.parts.trigger.stop(iteration)?;

        let path =
            snapshot.wait_for_new(run, self.poll_interval, self.discovery_timeout, &self.cancel)?;
        self.parts
            .completion
            .wait_for_completion(&path, run, &self.cancel)?;
        Ok(path)
    }

    fn launch(&mut self) -> BenchResult<()> {
        self.parts.launcher.launch()?;

        let deadline = Instant::now() + self.plan.launch_timeout;
        loop {
            if self.parts.launcher.is_running() {
                info!("{} is running", self.game);
                return Ok(());
            }
            self.checkpoint()?;
            if Instant::now() >= deadline {
                return Err(BenchmarkError::LaunchTimeout {
                    game: self.game.clone(),
                    timeout_secs: self.plan.launch_timeout.as_secs(),
                });
            }
            thread::sleep(self.poll_interval);
        }
    }

    fn wait_for_exit(&mut self) -> BenchResult<()> {
        while self.parts.launcher.is_running() {
            self.checkpoint()?;
            thread::sleep(self.poll_interval);
        }
        Ok(())
    }

    fn checkpoint(&self) -> BenchResult<()> {
        if self.cancel.is_cancelled() {
            Err(BenchmarkError::UserCancelled)
        } else {
            Ok(())
        }
    }

    fn finalize(&mut self) {
        if let Some(mut guard) = self.capture_guard.take() {
            if let Err(err) = guard.restore() {
                warn!("Could not restore MangoHud config: {err}");
            }
        }
        self.parts.launcher.shutdown();
    }

    fn transition(&mut self, state: SessionState) {
        info!(game = %self.game, "Session state -> {state}");
        self.history.push(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::{CaptureSettings, PollingCompletion, DEFAULT_TOGGLE_KEY};
    use std::cell::Cell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Running after launch for `ready_polls` checks, exits after `exit_after` more.
    struct FakeLauncher {
        launches: u32,
        running: bool,
        ready_after: u32,
        polls: u32,
        exit_after: Option<u32>,
        shutdowns: u32,
    }

    impl FakeLauncher {
        fn ready() -> Self {
            Self {
                launches: 0,
                running: false,
                ready_after: 0,
                polls: 0,
                exit_after: None,
                shutdowns: 0,
            }
        }
    }

    impl Launcher for FakeLauncher {
        fn launch(&mut self) -> BenchResult<()> {
            self.launches += 1;
            self.polls = 0;
            self.running = true;
            Ok(())
        }

        fn is_running(&mut self) -> bool {
            self.polls += 1;
            if !self.running || self.polls <= self.ready_after {
                return false;
            }
            if let Some(exit_after) = self.exit_after {
                if self.polls > self.ready_after + exit_after {
                    self.running = false;
                }
            }
            self.running
        }

        fn shutdown(&mut self) {
            self.shutdowns += 1;
            self.running = false;
        }
    }

    /// Writes a trace per iteration, like MangoHud finishing a log.
    struct FakeCapture {
        dir: PathBuf,
        frame_time: f64,
        skip_iterations: Vec<u32>,
        garbage_iterations: Vec<u32>,
        cancel_on: Option<(u32, CancelToken)>,
        started: Rc<Cell<u32>>,
    }

    impl FakeCapture {
        fn new(dir: &Path) -> Self {
            Self {
                dir: dir.to_path_buf(),
                frame_time: 16.0,
                skip_iterations: Vec::new(),
                garbage_iterations: Vec::new(),
                cancel_on: None,
                started: Rc::new(Cell::new(0)),
            }
        }
    }

    impl CaptureTrigger for FakeCapture {
        fn start(&mut self, iteration: u32) -> BenchResult<()> {
            self.started.set(self.started.get() + 1);
            if let Some((at, token)) = &self.cancel_on {
                if *at == iteration {
                    token.cancel();
                }
            }
            Ok(())
        }

        fn stop(&mut self, iteration: u32) -> BenchResult<()> {
            if self.skip_iterations.contains(&iteration) {
                return Ok(());
            }
            let body = if self.garbage_iterations.contains(&iteration) {
                "frametime\nnot-a-number\nstill-not\n".repeat(10)
            } else {
                let mut body = String::from("fps,frametime\n");
                for _ in 0..120 {
                    body.push_str(&format!("{:.1},{}\n", 1000.0 / self.frame_time, self.frame_time));
                }
                body
            };
            let name = format!("Game_2024-01-15_12-30-{iteration:02}.csv");
            fs::write(self.dir.join(name), body).unwrap();
            Ok(())
        }
    }

    struct ImmediateSignal {
        presses: u32,
    }

    impl UserSignal for ImmediateSignal {
        fn wait_for_stop(&mut self, _run: u32, cancel: &CancelToken) -> BenchResult<()> {
            if cancel.is_cancelled() {
                return Err(BenchmarkError::UserCancelled);
            }
            self.presses += 1;
            Ok(())
        }
    }

    fn plan(mode: SessionMode, warmup_runs: u32, runs: u32) -> SessionPlan {
        SessionPlan {
            mode,
            runs,
            warmup_runs,
            duration: Duration::ZERO,
            cooldown: Duration::ZERO,
            launch_timeout: Duration::from_millis(100),
        }
    }

    fn completion() -> PollingCompletion {
        PollingCompletion {
            interval: Duration::from_millis(5),
            min_bytes: 16,
            timeout: Duration::from_millis(500),
        }
    }

    fn run_session(
        plan: SessionPlan,
        launcher: &mut FakeLauncher,
        capture: &mut FakeCapture,
        signal: &mut ImmediateSignal,
        cancel: CancelToken,
        guard: Option<CaptureConfigGuard>,
    ) -> SessionReport {
        let analyzer = FrametimeAnalyzer::default();
        let completion = completion();
        let trace_dir = capture.dir.clone();
        let mut orchestrator = Orchestrator::new(
            "test-game",
            plan,
            &analyzer,
            Collaborators {
                launcher,
                trigger: capture,
                signal,
                completion: &completion,
            },
            &trace_dir,
        )
        .poll_interval(Duration::from_millis(5))
        .discovery_timeout(Duration::from_millis(100))
        .cancel_token(cancel);
        if let Some(guard) = guard {
            orchestrator = orchestrator.capture_guard(guard);
        }
        orchestrator.run()
    }

    #[test]
    fn timed_session_discards_warmups_and_measures_runs() {
        let dir = TempDir::new().unwrap();
        let mut launcher = FakeLauncher::ready();
        let mut capture = FakeCapture::new(dir.path());
        let mut signal = ImmediateSignal { presses: 0 };

        let report = run_session(
            plan(SessionMode::Timed, 1, 2),
            &mut launcher,
            &mut capture,
            &mut signal,
            CancelToken::new(),
            None,
        );

        assert_eq!(report.status(), SessionStatus::Success);
        assert_eq!(report.final_state, SessionState::Done);
        assert_eq!(
            report.history,
            vec![
                SessionState::Idle,
                SessionState::Launch,
                SessionState::Warmup,
                SessionState::Measure,
                SessionState::Cooldown,
                SessionState::Measure,
                SessionState::Finalize,
                SessionState::Done,
            ]
        );
        assert!(matches!(report.outcomes[0], RunOutcome::Discarded { warmup: 1, trace: Some(_) }));

        let measured: Vec<_> = report.measured().collect();
        assert_eq!(measured.len(), 2);
        assert_eq!(measured[0].0, 1);
        assert_eq!(measured[1].0, 2);
        assert!((measured[0].1.fps.average - 62.5).abs() < 1e-9);
        assert_eq!(measured[0].2.len(), 120);

        assert_eq!(launcher.launches, 1);
        assert_eq!(launcher.shutdowns, 1);
        assert_eq!(signal.presses, 0);
    }

    #[test]
    fn launch_timeout_fails_session_and_restores_config() {
        let dir = TempDir::new().unwrap();
        let conf = dir.path().join("MangoHud.conf");
        fs::write(&conf, "fps_limit=60\n").unwrap();
        let guard = CaptureConfigGuard::apply(
            &conf,
            &CaptureSettings {
                output_folder: dir.path().join("captures"),
                log_duration_secs: Some(1),
                autostart: true,
                toggle_key: DEFAULT_TOGGLE_KEY.to_string(),
                show_hud: true,
            },
        )
        .unwrap();

        let mut launcher = FakeLauncher::ready();
        launcher.ready_after = u32::MAX;
        let mut capture = FakeCapture::new(dir.path());
        let mut signal = ImmediateSignal { presses: 0 };

        let report = run_session(
            plan(SessionMode::Timed, 0, 3),
            &mut launcher,
            &mut capture,
            &mut signal,
            CancelToken::new(),
            Some(guard),
        );

        assert_eq!(report.status(), SessionStatus::Failed);
        assert!(matches!(
            report.failure,
            Some(BenchmarkError::LaunchTimeout { ref game, .. }) if game == "test-game"
        ));
        assert_eq!(
            &report.history[report.history.len() - 2..],
            &[SessionState::Finalize, SessionState::Failed]
        );
        assert!(report.outcomes.is_empty());
        assert_eq!(fs::read_to_string(&conf).unwrap(), "fps_limit=60\n");
    }

    #[test]
    fn incomplete_capture_fails_only_that_run() {
        let dir = TempDir::new().unwrap();
        let mut launcher = FakeLauncher::ready();
        let mut capture = FakeCapture::new(dir.path());
        capture.skip_iterations = vec![1];
        let mut signal = ImmediateSignal { presses: 0 };

        let report = run_session(
            plan(SessionMode::Timed, 0, 2),
            &mut launcher,
            &mut capture,
            &mut signal,
            CancelToken::new(),
            None,
        );

        assert_eq!(report.status(), SessionStatus::Partial);
        assert_eq!(report.final_state, SessionState::Done);
        let failed: Vec<_> = report.failed_runs().collect();
        assert_eq!(failed.len(), 1);
        assert!(matches!(
            failed[0],
            (1, BenchmarkError::IncompleteCapture { run: 1, .. })
        ));
        assert_eq!(report.measured().map(|(run, _, _)| run).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn unreadable_traces_mean_no_data() {
        let dir = TempDir::new().unwrap();
        let mut launcher = FakeLauncher::ready();
        let mut capture = FakeCapture::new(dir.path());
        capture.garbage_iterations = vec![1, 2];
        let mut signal = ImmediateSignal { presses: 0 };

        let report = run_session(
            plan(SessionMode::Manual, 0, 2),
            &mut launcher,
            &mut capture,
            &mut signal,
            CancelToken::new(),
            None,
        );

        assert_eq!(report.status(), SessionStatus::NoData);
        assert_eq!(signal.presses, 2);
        assert!(report
            .failed_runs()
            .all(|(_, err)| matches!(err, BenchmarkError::InvalidTrace(_))));
    }

    #[test]
    fn zero_planned_runs_is_not_no_data() {
        let dir = TempDir::new().unwrap();
        let mut launcher = FakeLauncher::ready();
        let mut capture = FakeCapture::new(dir.path());
        let mut signal = ImmediateSignal { presses: 0 };

        let report = run_session(
            plan(SessionMode::Timed, 0, 0),
            &mut launcher,
            &mut capture,
            &mut signal,
            CancelToken::new(),
            None,
        );
        assert_eq!(report.status(), SessionStatus::Success);
    }

    #[test]
    fn cancellation_keeps_finished_runs() {
        let dir = TempDir::new().unwrap();
        let cancel = CancelToken::new();
        let mut launcher = FakeLauncher::ready();
        let mut capture = FakeCapture::new(dir.path());
        capture.cancel_on = Some((2, cancel.clone()));
        let mut signal = ImmediateSignal { presses: 0 };

        let report = run_session(
            plan(SessionMode::Timed, 0, 3),
            &mut launcher,
            &mut capture,
            &mut signal,
            cancel,
            None,
        );

        assert_eq!(report.status(), SessionStatus::Cancelled);
        assert_eq!(report.final_state, SessionState::Failed);
        assert_eq!(report.measured().count(), 1);
        assert!(report.history.contains(&SessionState::Finalize));
        assert_eq!(launcher.shutdowns, 1);
    }

    #[test]
    fn builtin_mode_relaunches_every_iteration() {
        let dir = TempDir::new().unwrap();
        let mut launcher = FakeLauncher::ready();
        launcher.exit_after = Some(2);
        let mut capture = FakeCapture::new(dir.path());
        capture.frame_time = 8.0;
        let started = capture.started.clone();
        let mut signal = ImmediateSignal { presses: 0 };

        let report = run_session(
            plan(SessionMode::Builtin, 1, 2),
            &mut launcher,
            &mut capture,
            &mut signal,
            CancelToken::new(),
            None,
        );

        assert_eq!(report.status(), SessionStatus::Success);
        assert_eq!(launcher.launches, 3);
        assert_eq!(started.get(), 3);
        let (_, metrics, _) = report.measured().next().unwrap();
        assert!((metrics.fps.average - 125.0).abs() < 1e-9);
    }
}
