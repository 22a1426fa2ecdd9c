//! Game process and player input
//!
//! Steam and Proton launches hand off to other processes, so the spawned child is not
//! the game. Liveness is judged by looking the target up by name.

use std::io::BufRead;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use sysinfo::{ProcessesToUpdate, System};
use tracing::{debug, info, warn};

use super::CancelToken;
use crate::error::{BenchResult, BenchmarkError};

/// Linux truncates process names (`comm`) to 15 bytes.
const COMM_LEN: usize = 15;

/// Starts the game and reports whether it is running.
pub trait Launcher {
    /// Start the game. Readiness is polled through [`Launcher::is_running`].
    fn launch(&mut self) -> BenchResult<()>;
    fn is_running(&mut self) -> bool;
    /// Best-effort stop of whatever `launch` started.
    fn shutdown(&mut self);
}

/// Player signal that ends a manual capture.
pub trait UserSignal {
    fn wait_for_stop(&mut self, run: u32, cancel: &CancelToken) -> BenchResult<()>;
}

/// Runs a shell-free command line with MangoHud enabled.
pub struct CommandLauncher {
    game: String,
    command: Vec<String>,
    process_name: String,
    child: Option<Child>,
    system: System,
}

impl CommandLauncher {
    /// `process_name` defaults to the command's file name.
    pub fn new(game: &str, command: Vec<String>, process_name: Option<String>) -> Self {
        let process_name = process_name
            .or_else(|| {
                command.first().and_then(|program| {
                    std::path::Path::new(program)
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                })
            })
            .unwrap_or_else(|| game.to_string());
        Self {
            game: game.to_string(),
            command,
            process_name,
            child: None,
            system: System::new(),
        }
    }

    /// Watch a game the player starts themselves.
    pub fn attach(game: &str, process_name: String) -> Self {
        Self::new(game, Vec::new(), Some(process_name))
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    fn child_running(&mut self) -> bool {
        match self.child.as_mut().map(|child| child.try_wait()) {
            Some(Ok(None)) => true,
            Some(Ok(Some(status))) => {
                debug!("Launcher process exited with {status}");
                self.child = None;
                false
            }
            Some(Err(err)) => {
                warn!("Could not poll launcher process: {err}");
                false
            }
            None => false,
        }
    }

    fn target_running(&mut self) -> bool {
        self.system.refresh_processes(ProcessesToUpdate::All, true);
        let target = &self.process_name;
        self.system
            .processes()
            .values()
            .any(|process| process_name_matches(&process.name().to_string_lossy(), target))
    }
}

impl Launcher for CommandLauncher {
    fn launch(&mut self) -> BenchResult<()> {
        let Some((program, args)) = self.command.split_first() else {
            println!("  Start {} now (MANGOHUD=1 %command%)", self.game);
            return Ok(());
        };

        info!("Launching {}: {}", self.game, self.command.join(" "));
        let child = Command::new(program)
            .args(args)
            .env("MANGOHUD", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| BenchmarkError::Launch {
                game: self.game.clone(),
                reason: format!("{program}: {err}"),
            })?;
        self.child = Some(child);
        Ok(())
    }

    fn is_running(&mut self) -> bool {
        // Evaluate both so an exited child is reaped.
        let child = self.child_running();
        let target = self.target_running();
        child || target
    }

    fn shutdown(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

/// Waits for Enter on stdin.
#[derive(Default)]
pub struct StdinSignal {
    lines: Option<Receiver<()>>,
}

impl StdinSignal {
    fn receiver(&mut self) -> &Receiver<()> {
        self.lines.get_or_insert_with(|| {
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    if line.is_err() || tx.send(()).is_err() {
                        break;
                    }
                }
            });
            rx
        })
    }
}

impl UserSignal for StdinSignal {
    fn wait_for_stop(&mut self, run: u32, cancel: &CancelToken) -> BenchResult<()> {
        println!("  Capturing run #{run}... press Enter when done");
        let receiver = self.receiver();
        loop {
            if cancel.is_cancelled() {
                return Err(BenchmarkError::UserCancelled);
            }
            match receiver.recv_timeout(Duration::from_millis(200)) {
                Ok(()) => return Ok(()),
                Err(RecvTimeoutError::Timeout) => {}
                // stdin closed: nobody can press Enter any more.
                Err(RecvTimeoutError::Disconnected) => return Err(BenchmarkError::UserCancelled),
            }
        }
    }
}

/// Normalize process names for matching (`Game.exe` under Proton, quoted names).
pub fn normalize_process_name(name: &str) -> String {
    name.trim()
        .trim_matches('"')
        .trim_end_matches(".exe")
        .to_ascii_lowercase()
}

/// Compare names, allowing for the kernel's `comm` truncation.
pub fn process_name_matches(active: &str, target: &str) -> bool {
    let active = normalize_process_name(active);
    let target = normalize_process_name(target);
    if active.is_empty() || target.is_empty() {
        return false;
    }
    if active == target {
        return true;
    }
    active.len() == COMM_LEN && target.starts_with(&active)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_proton_suffix() {
        assert_eq!(normalize_process_name("eldenring.exe"), "eldenring");
        assert_eq!(normalize_process_name("\"Cyberpunk2077.exe\""), "cyberpunk2077");
    }

    #[test]
    fn process_match_allows_truncated_comm() {
        assert!(process_name_matches("r5apex.exe", "r5apex"));
        assert!(process_name_matches("Cyberpunk2077", "Cyberpunk2077.exe"));
        assert!(process_name_matches("BaldursGate3_DX", "BaldursGate3_DX11.exe"));
        assert!(!process_name_matches("BaldursGate", "BaldursGate3_DX11.exe"));
        assert!(!process_name_matches("cs2", "valorant"));
        assert!(!process_name_matches("", ""));
    }

    #[test]
    fn process_name_defaults_to_program_file_name() {
        let launcher = CommandLauncher::new(
            "glxgears",
            vec!["/usr/bin/glxgears".to_string(), "-fullscreen".to_string()],
            None,
        );
        assert_eq!(launcher.process_name(), "glxgears");

        let attached = CommandLauncher::attach("elden-ring", "eldenring.exe".to_string());
        assert_eq!(attached.process_name(), "eldenring.exe");
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let mut launcher = CommandLauncher::new(
            "ghost",
            vec!["/nonexistent/lgb-test-binary".to_string()],
            None,
        );
        let err = launcher.launch().unwrap_err();
        assert!(matches!(err, BenchmarkError::Launch { .. }));
        assert!(!err.is_per_run());
    }

    #[test]
    fn command_launcher_tracks_child_lifetime() {
        let mut launcher = CommandLauncher::new(
            "sleeper",
            vec!["sleep".to_string(), "5".to_string()],
            Some("lgb-no-such-process".to_string()),
        );
        launcher.launch().unwrap();
        assert!(launcher.is_running());
        launcher.shutdown();
        assert!(!launcher.is_running());
    }
}
