//! Linux Game Bench - frametime benchmarks for Linux games
//!
//! This is a LOCAL benchmarking tool that:
//! - Drives MangoHud captures (warmups, measured runs, cooldowns)
//! - Analyzes frametimes into FPS, stutter and frame-pacing ratings
//! - Stores results per hardware fingerprint, archiving them when the hardware changes

mod analysis;
mod benchmark;
mod config;
mod deps;
mod error;
mod hardware;
mod import;
mod storage;

use crate::analysis::{FrametimeAnalyzer, MetricsRecord, Rating, TargetVerdict};
use crate::benchmark::{
    AutostartCapture, CancelToken, CaptureConfigGuard, CaptureSettings, CaptureTrigger,
    Collaborators, CommandLauncher, HotkeyPrompt, Orchestrator, PollingCompletion, RunOutcome,
    SessionMode, SessionReport, SessionStatus, StdinSignal, DEFAULT_TOGGLE_KEY,
};
use crate::config::Config;
use crate::hardware::HardwareInfo;
use crate::import::{mangohud, parse_trace_str, read_trace, FrameTrace};
use crate::storage::{
    normalize_resolution, short_label, AggregateRecord, BenchmarkStorage, GameLock,
    CANONICAL_RESOLUTIONS,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Linux Game Bench - Benchmark games with MangoHud
#[derive(Parser)]
#[command(name = "lgb")]
#[command(version)]
#[command(about = "Benchmark Linux games with MangoHud and track results per hardware setup")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a capture log (defaults to the newest MangoHud log)
    Analyze {
        /// Path to MangoHud/PresentMon CSV, `-` for stdin
        log: Option<PathBuf>,

        /// Judge the result against this refresh rate
        #[arg(short, long)]
        target: Option<u32>,
    },

    /// Run a benchmark session: launch, capture, analyze and store
    Run {
        /// Game identifier results are stored under (e.g. Steam App ID)
        #[arg(short, long)]
        game: String,

        /// Resolution (1920x1080, 2560x1440, 3840x2160, FHD, WQHD, UHD)
        #[arg(short, long)]
        resolution: String,

        #[arg(long, value_enum)]
        mode: Option<SessionMode>,

        /// Measured runs
        #[arg(long)]
        runs: Option<u32>,

        /// Discarded warmup runs
        #[arg(long)]
        warmup: Option<u32>,

        /// Seconds per capture in timed mode
        #[arg(long)]
        duration: Option<u64>,

        /// Seconds between measured runs
        #[arg(long)]
        cooldown: Option<u64>,

        /// Process name to watch (defaults to the command's file name)
        #[arg(long)]
        process: Option<String>,

        /// Launch command; omit to start the game yourself
        #[arg(last = true)]
        command: Vec<String>,
    },

    /// Analyze existing capture logs and store them as runs
    Record {
        #[arg(short, long)]
        game: String,

        #[arg(short, long)]
        resolution: String,

        /// Capture logs, stored in the given order
        #[arg(required = true)]
        logs: Vec<PathBuf>,
    },

    /// List games with stored results
    List,

    /// Show aggregated results for a game
    Show {
        game: String,

        /// Also list individual runs
        #[arg(long)]
        runs: bool,
    },

    /// Print a stored run's frame times as CSV
    Export {
        #[arg(short, long)]
        game: String,

        #[arg(short, long)]
        resolution: String,

        /// Run number
        run: u32,
    },

    /// List archived results for a game
    Archives {
        game: String,
    },

    /// Detect hardware and print its fingerprint
    Detect,

    /// Check that MangoHud and the helper tools are available
    Check,

    /// Show configuration file location and contents
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze { log, target } => {
            let config = Config::load()?;
            cmd_analyze(&config, log, target)?;
        }
        Commands::Run {
            game,
            resolution,
            mode,
            runs,
            warmup,
            duration,
            cooldown,
            process,
            command,
        } => {
            let mut config = Config::load()?;
            let session = &mut config.session;
            if let Some(mode) = mode {
                session.mode = mode;
            }
            if let Some(runs) = runs {
                session.runs = runs;
            }
            if let Some(warmup) = warmup {
                session.warmup_runs = warmup;
            }
            if let Some(duration) = duration {
                session.duration_secs = duration;
            }
            if let Some(cooldown) = cooldown {
                session.cooldown_secs = cooldown;
            }
            cmd_run(&config, &game, &resolution, process, command)?;
        }
        Commands::Record {
            game,
            resolution,
            logs,
        } => {
            let config = Config::load()?;
            cmd_record(&config, &game, &resolution, &logs)?;
        }
        Commands::List => cmd_list(&Config::load()?)?,
        Commands::Show { game, runs } => cmd_show(&Config::load()?, &game, runs)?,
        Commands::Export {
            game,
            resolution,
            run,
        } => cmd_export(&Config::load()?, &game, &resolution, run)?,
        Commands::Archives { game } => cmd_archives(&Config::load()?, &game)?,
        Commands::Check => cmd_check(&Config::load()?)?,
        Commands::Detect => {
            let hardware = HardwareInfo::detect()?;
            print_hardware(&hardware);
        }
        Commands::Config => {
            let config = Config::init()?;
            println!(
                "{} {}",
                "Config file:".bright_white(),
                config::get_config_path()?.bright_cyan()
            );
            println!();
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_storage(config: &Config) -> Result<BenchmarkStorage> {
    let dir = config.results_dir()?;
    BenchmarkStorage::new(&dir)
        .with_context(|| format!("Failed to open results directory {}", dir.display()))
}

/// Lock the game and make sure stored results belong to this machine.
fn prepare_game(storage: &BenchmarkStorage, game: &str) -> Result<(GameLock, HardwareInfo)> {
    let lock = storage
        .try_lock_game(game)?
        .with_context(|| format!("Another lgb process is writing results for '{game}'"))?;

    let hardware = HardwareInfo::detect().context("Hardware detection failed")?;
    let fingerprint = hardware.fingerprint();

    if !storage.check_fingerprint(game, &fingerprint)? {
        println!(
            "{}",
            "System configuration changed - archiving old results".bright_yellow()
        );
        if let Some(location) = storage.archive_old_data(game)? {
            println!("  {} {}", "Archived to".bright_white(), location.display());
        }
    }
    storage.save_fingerprint(game, &fingerprint, &hardware)?;
    Ok((lock, hardware))
}

fn cmd_analyze(config: &Config, log: Option<PathBuf>, target: Option<u32>) -> Result<()> {
    let path = match log {
        Some(path) if path.as_os_str() == "-" => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read capture from stdin")?;
            return print_analysis(config, "stdin", parse_trace_str(&content)?, target);
        }
        Some(path) => path,
        None => {
            let dirs = [
                config.capture_output_dir().ok(),
                mangohud::default_log_dir(),
            ];
            dirs.iter()
                .flatten()
                .find_map(|dir| mangohud::find_latest_trace(dir))
                .context("No MangoHud log found; pass a file path")?
        }
    };

    let trace = read_trace(&path)?;
    print_analysis(config, &path.display().to_string(), trace, target)
}

fn print_analysis(config: &Config, name: &str, trace: FrameTrace, target: Option<u32>) -> Result<()> {
    if trace.is_empty() {
        bail!("{name} contains no frame times");
    }
    let analyzer = FrametimeAnalyzer::new(config.analysis.analyzer_config());
    let metrics = analyzer.analyze(&trace)?;

    println!();
    println!("{} {}", "Capture:".bright_white(), name.bright_cyan());
    if let Some(app) = &trace.application {
        println!("{} {}", "Game:".bright_white(), app);
    }
    println!(
        "{} {}, {} frames over {:.1}s",
        "Source:".bright_white(),
        trace.source,
        trace.len(),
        trace.duration_secs()
    );
    print_metrics(&metrics);

    if let Some(target) = target {
        let verdict =
            analysis::evaluate_target(metrics.fps.average, metrics.fps.one_percent_low, target);
        println!(
            "\n{} {} Hz: {}",
            "Target".bright_white(),
            target,
            colored_verdict(verdict)
        );
    }
    Ok(())
}

fn cmd_run(
    config: &Config,
    game: &str,
    resolution: &str,
    process: Option<String>,
    command: Vec<String>,
) -> Result<()> {
    let storage = open_storage(config)?;
    let (_lock, hardware) = prepare_game(&storage, game)?;
    let plan = config.session.plan();

    let canonical = normalize_resolution(resolution);
    if !CANONICAL_RESOLUTIONS.contains(&canonical.as_str()) {
        println!(
            "{} '{}' is not a standard resolution; results are grouped under it as written",
            "Note:".bright_yellow(),
            canonical
        );
    }

    println!();
    println!("{}", "Benchmark session".bright_cyan().bold());
    println!(
        "  {} {}  {} {}  {} {:?}",
        "Game:".bright_white(),
        game,
        "GPU:".bright_white(),
        hardware.gpu_model,
        "Mode:".bright_white(),
        plan.mode
    );
    println!(
        "  {} {} warmup + {} measured, {}s cooldown",
        "Runs:".bright_white(),
        plan.warmup_runs,
        plan.runs,
        plan.cooldown.as_secs()
    );
    println!();

    let capture_dir = config.capture_output_dir()?;
    let settings = CaptureSettings {
        output_folder: capture_dir.clone(),
        log_duration_secs: match plan.mode {
            SessionMode::Timed => Some(plan.duration.as_secs()),
            SessionMode::Manual | SessionMode::Builtin => None,
        },
        autostart: plan.mode == SessionMode::Builtin,
        toggle_key: DEFAULT_TOGGLE_KEY.to_string(),
        show_hud: config.capture.show_hud,
    };
    let guard = CaptureConfigGuard::apply(&config.mangohud_config_path()?, &settings)?;

    let mut launcher = match process {
        Some(name) if command.is_empty() => CommandLauncher::attach(game, name),
        other => CommandLauncher::new(game, command, other),
    };
    println!(
        "  {} {}",
        "Watching process:".bright_white(),
        launcher.process_name()
    );
    let mut trigger: Box<dyn CaptureTrigger> = match plan.mode {
        SessionMode::Builtin => Box::new(AutostartCapture),
        SessionMode::Timed | SessionMode::Manual => Box::new(HotkeyPrompt {
            key: DEFAULT_TOGGLE_KEY.to_string(),
        }),
    };
    let mut signal = StdinSignal::default();
    let completion = PollingCompletion {
        interval: Duration::from_millis(config.capture.poll_ms),
        min_bytes: config.capture.min_trace_bytes,
        timeout: Duration::from_secs(config.capture.stabilize_timeout_secs),
    };
    let analyzer = FrametimeAnalyzer::new(config.analysis.analyzer_config());

    let cancel = CancelToken::new();
    let rt = tokio::runtime::Runtime::new()?;
    let ctrl_c = cancel.clone();
    rt.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let report = Orchestrator::new(
        game,
        plan,
        &analyzer,
        Collaborators {
            launcher: &mut launcher,
            trigger: trigger.as_mut(),
            signal: &mut signal,
            completion: &completion,
        },
        &capture_dir,
    )
    .poll_interval(completion.interval)
    .discovery_timeout(completion.timeout)
    .cancel_token(cancel)
    .capture_guard(guard)
    .run();

    // Partial results are stored even when the session ended early.
    for (run, metrics, frame_times) in report.measured() {
        let record = storage.save_run(game, resolution, metrics, Some(frame_times))?;
        println!(
            "  {} run {} saved as #{}",
            "✓".bright_green(),
            run,
            record.run_number
        );
    }

    print_session_report(&report);
    rt.shutdown_background();
    println!(
        "  {} {}",
        "Results:".bright_white(),
        storage.base_dir().display()
    );

    if let Some(runs) = storage.get_all_resolutions(game)?.get(&canonical) {
        if let Some(aggregate) = BenchmarkStorage::aggregate_runs(runs) {
            println!();
            print_aggregate(&canonical, &aggregate);
        }
    }

    match report.status() {
        SessionStatus::Failed => match report.failure {
            Some(err) => Err(err.into()),
            None => bail!("Benchmark session failed"),
        },
        _ => Ok(()),
    }
}

fn cmd_record(config: &Config, game: &str, resolution: &str, logs: &[PathBuf]) -> Result<()> {
    let storage = open_storage(config)?;
    let (_lock, _hardware) = prepare_game(&storage, game)?;
    let analyzer = FrametimeAnalyzer::new(config.analysis.analyzer_config());

    let mut saved = 0;
    for log in logs {
        let result =
            read_trace(log).and_then(|trace| analyzer.analyze_with_intervals(&trace));
        match result {
            Ok((metrics, frame_times)) => {
                let record = storage.save_run(game, resolution, &metrics, Some(&frame_times))?;
                saved += 1;
                println!(
                    "  {} {} -> run #{} ({:.1} FPS avg)",
                    "✓".bright_green(),
                    log.display(),
                    record.run_number,
                    metrics.fps.average
                );
            }
            // One bad log does not stop the rest.
            Err(err) => println!("  {} {}: {}", "✗".bright_red(), log.display(), err),
        }
    }

    if saved == 0 {
        bail!("No capture could be analyzed");
    }
    cmd_show(config, game, false)
}

fn cmd_list(config: &Config) -> Result<()> {
    let storage = open_storage(config)?;
    let games = storage.get_all_games()?;
    if games.is_empty() {
        println!("{}", "No stored results yet.".bright_yellow());
        return Ok(());
    }

    println!("{}", "Stored results:".bright_cyan().bold());
    for game in games {
        let groups = storage.get_all_resolutions(&game)?;
        let summary: Vec<String> = groups
            .iter()
            .map(|(resolution, runs)| format!("{} ({} runs)", short_label(resolution), runs.len()))
            .collect();
        let archives = storage.list_archives(&game)?.len();
        println!(
            "  {:<24} {}{}",
            game.bright_white(),
            if summary.is_empty() {
                "-".to_string()
            } else {
                summary.join(", ")
            },
            if archives > 0 {
                format!("  [{archives} archived]").dimmed().to_string()
            } else {
                String::new()
            }
        );
    }
    Ok(())
}

fn cmd_show(config: &Config, game: &str, list_runs: bool) -> Result<()> {
    let storage = open_storage(config)?;
    let groups = storage.get_all_resolutions(game)?;
    if groups.is_empty() {
        println!("{} {}", "No results for".bright_yellow(), game);
        return Ok(());
    }

    if let Some(saved) = storage.saved_fingerprint(game)? {
        println!();
        println!(
            "{} {}  {}",
            game.bright_cyan().bold(),
            saved.fingerprint.dimmed(),
            format!("{} / {}", saved.hardware.gpu_model, saved.hardware.cpu_model).bright_white()
        );
    }
    for (resolution, runs) in &groups {
        if let Some(aggregate) = BenchmarkStorage::aggregate_runs(runs) {
            println!();
            print_aggregate(resolution, &aggregate);
        }
        if list_runs {
            for run in runs {
                println!(
                    "    #{:03}  {}  {:>6.1} FPS  stutter {}  pacing {}{}",
                    run.run_number,
                    run.timestamp.format("%Y-%m-%d %H:%M"),
                    run.metrics.fps.average,
                    colored_rating(run.metrics.stutter.rating),
                    colored_rating(run.metrics.frame_pacing.rating),
                    if run.has_frame_times() {
                        ""
                    } else {
                        "  (no frame times)"
                    }
                );
            }
        }
    }
    Ok(())
}

fn cmd_export(config: &Config, game: &str, resolution: &str, run: u32) -> Result<()> {
    let storage = open_storage(config)?;
    let resolution = normalize_resolution(resolution);
    let groups = storage.get_all_resolutions(game)?;
    let record = groups
        .get(&resolution)
        .and_then(|runs| runs.iter().find(|r| r.run_number == run))
        .with_context(|| format!("No run #{run} for {game} at {resolution}"))?;

    if !record.has_frame_times() {
        bail!("Run #{run} was stored without frame times");
    }
    let frame_times = record
        .frame_times()
        .with_context(|| format!("Stored frame times of run #{run} are corrupt"))?;

    println!("frametime");
    for ft in frame_times {
        println!("{ft}");
    }
    Ok(())
}

fn cmd_archives(config: &Config, game: &str) -> Result<()> {
    let storage = open_storage(config)?;
    let archives = storage.list_archives(game)?;
    if archives.is_empty() {
        println!("{} {}", "No archives for".bright_yellow(), game);
        return Ok(());
    }

    println!("{}", format!("Archives for {game}:").bright_cyan().bold());
    for location in archives {
        let archived = storage.load_archive(&location)?;
        let hardware = archived
            .fingerprint
            .as_ref()
            .map(|fp| format!("{} / {}", fp.hardware.gpu_model, fp.hardware.cpu_model))
            .unwrap_or_else(|| "unknown hardware".to_string());
        let runs: usize = archived
            .groups
            .values()
            .flat_map(|groups| groups.values())
            .map(Vec::len)
            .sum();
        println!(
            "  {}  {}  {} runs",
            archived.location.display().to_string().bright_white(),
            hardware,
            runs
        );
    }
    Ok(())
}

fn cmd_check(config: &Config) -> Result<()> {
    let mangohud_config = config.mangohud_config_path().ok();
    let statuses = deps::collect_dependency_statuses(mangohud_config.as_deref());

    println!("{}", "Checking system requirements".bright_cyan().bold());
    for status in &statuses {
        let icon = if status.available {
            "✓".bright_green()
        } else if status.required {
            "✗".bright_red()
        } else {
            "!".bright_yellow()
        };
        let kind = if status.required {
            "required"
        } else {
            "optional"
        };
        println!(
            "  {} {} ({}) - {}",
            icon,
            status.name.bright_white(),
            kind.bright_black(),
            status.details
        );
        if !status.available {
            if let Some(hint) = deps::dependency_install_hint(status.name) {
                println!("      {}", hint.dimmed());
            }
        }
    }

    let missing: Vec<&str> = statuses
        .iter()
        .filter(|s| s.required && !s.available)
        .map(|s| s.name)
        .collect();
    if !missing.is_empty() {
        bail!("Missing required components: {}", missing.join(", "));
    }
    println!("\n{}", "All required components are available.".bright_green());
    Ok(())
}

fn print_hardware(hardware: &HardwareInfo) {
    println!("{}", "Detected hardware".bright_cyan().bold());
    println!("  {:<12} {}", "OS:".bright_white(), hardware.os_name);
    println!("  {:<12} {}", "Kernel:".bright_white(), hardware.kernel);
    println!("  {:<12} {}", "GPU:".bright_white(), hardware.gpu_model);
    if let Some(driver) = &hardware.gpu_driver {
        println!("  {:<12} {}", "Driver:".bright_white(), driver);
    }
    println!("  {:<12} {}", "CPU:".bright_white(), hardware.cpu_model);
    println!("  {:<12} {} GB", "RAM:".bright_white(), hardware.ram_gb);
    println!(
        "  {:<12} {}",
        "Fingerprint:".bright_white(),
        hardware.fingerprint().bright_green()
    );
}

fn print_metrics(metrics: &MetricsRecord) {
    let fps = &metrics.fps;
    println!();
    println!("{}", "FPS".bright_cyan().bold());
    println!("  {:<14} {:.1}", "Average:", fps.average);
    println!("  {:<14} {:.1}", "Median:", fps.median);
    println!("  {:<14} {:.1} / {:.1}", "Min / Max:", fps.minimum, fps.maximum);
    println!("  {:<14} {:.1}", "1% low:", fps.one_percent_low);
    println!("  {:<14} {:.1}", "0.1% low:", fps.point_one_percent_low);
    println!(
        "  {:<14} {} frames in {:.1}s",
        "Samples:", fps.frame_count, fps.duration_seconds
    );

    println!();
    println!(
        "{} {}  (index {:.2}, {} events)",
        "Stutter:".bright_white(),
        colored_rating(metrics.stutter.rating),
        metrics.stutter.index,
        metrics.stutter.event_count
    );
    println!(
        "{} {}  (CV {:.1}%, score {:.0}, stability {:.0}%)",
        "Frame pacing:".bright_white(),
        colored_rating(metrics.frame_pacing.rating),
        metrics.frame_pacing.cv_percent,
        metrics.frame_pacing.consistency_score,
        metrics.frame_pacing.stability_percent
    );
    if let Some(target) = metrics.recommended_target() {
        println!("{} {} Hz", "Smooth up to:".bright_white(), target);
    }
}

fn print_aggregate(resolution: &str, aggregate: &AggregateRecord) {
    println!(
        "{} ({} runs)",
        short_label(resolution).bright_cyan().bold(),
        aggregate.run_count
    );
    println!(
        "  {:<14} {:.1}  (run variation {:.1}%)",
        "Average:", aggregate.average, aggregate.run_variation_percent
    );
    println!(
        "  {:<14} {:.1} / {:.1}",
        "Min / Max:", aggregate.minimum, aggregate.maximum
    );
    println!(
        "  {:<14} {:.1} / {:.1}",
        "1% / 0.1% low:", aggregate.one_percent_low, aggregate.point_one_percent_low
    );
    println!(
        "  {:<14} {}   {} {}",
        "Stutter:",
        colored_rating(aggregate.stutter_rating),
        "Pacing:",
        colored_rating(aggregate.consistency_rating)
    );
    let targets: Vec<String> = aggregate
        .fps_targets()
        .iter()
        .map(|t| format!("{}Hz {}", t.refresh_rate, colored_verdict(t.verdict)))
        .collect();
    println!("  {:<14} {}", "Targets:", targets.join("  "));
    if let Some(target) = aggregate.recommended_target() {
        println!("  {:<14} {} Hz", "Smooth up to:", target);
    }
}

fn print_session_report(report: &SessionReport) {
    println!();
    let status = match report.status() {
        SessionStatus::Success => "Session complete".bright_green().bold(),
        SessionStatus::Partial => "Session complete with failed runs".bright_yellow().bold(),
        SessionStatus::NoData => "Session produced no data".bright_red().bold(),
        SessionStatus::Cancelled => "Session cancelled".bright_yellow().bold(),
        SessionStatus::Failed => "Session failed".bright_red().bold(),
    };
    println!("{} {}", status, report.id.to_string().dimmed());
    println!(
        "  {} ({:?}), {}s, ended in {}",
        report.game,
        report.mode,
        (report.ended_at - report.started_at).num_seconds(),
        report.final_state
    );
    let states: Vec<String> = report.history.iter().map(|s| s.to_string()).collect();
    println!("  {}", states.join(" -> ").dimmed());

    for outcome in &report.outcomes {
        match outcome {
            RunOutcome::Discarded { warmup, trace } => println!(
                "  {} warmup {} discarded{}",
                "-".dimmed(),
                warmup,
                trace
                    .as_ref()
                    .map(|path| format!(" ({})", path.display()))
                    .unwrap_or_default()
            ),
            RunOutcome::Measured {
                run,
                trace,
                metrics,
                ..
            } => println!(
                "  {} run {}: {:.1} FPS, stutter {} ({})",
                "✓".bright_green(),
                run,
                metrics.fps.average,
                colored_rating(metrics.stutter.rating),
                trace.display()
            ),
            RunOutcome::Failed { run, error } => {
                println!("  {} run {}: {}", "✗".bright_red(), run, error)
            }
        }
    }
    if let Some(err) = &report.failure {
        println!("  {} {}", "Stopped:".bright_red(), err);
    }
}

fn colored_rating(rating: Rating) -> ColoredString {
    let label = rating.as_str();
    match rating {
        Rating::Excellent => label.bright_green(),
        Rating::Good => label.green(),
        Rating::Moderate => label.bright_yellow(),
        Rating::Poor => label.bright_red(),
    }
}

fn colored_verdict(verdict: TargetVerdict) -> ColoredString {
    let label = verdict.to_string();
    match verdict {
        TargetVerdict::Smooth => label.bright_green(),
        TargetVerdict::Playable => label.bright_yellow(),
        TargetVerdict::Unplayable => label.bright_red(),
    }
}
