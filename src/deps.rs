use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone)]
pub(crate) struct DependencyStatus {
    pub(crate) name: &'static str,
    pub(crate) required: bool,
    pub(crate) available: bool,
    pub(crate) details: String,
}

/// First path printed by `which`.
pub(crate) fn parse_which_output(output: &str) -> Option<PathBuf> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
}

pub(crate) fn locate_command(command: &str) -> Option<PathBuf> {
    let output = Command::new("which").arg(command).output().ok()?;
    if !output.status.success() {
        return None;
    }
    parse_which_output(&String::from_utf8_lossy(&output.stdout))
}

/// systemd user environment file that turns MangoHud on for every Vulkan/GL app.
pub(crate) fn global_env_file() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("environment.d/mangohud.conf"))
}

/// `MANGOHUD=1` set as an active line of an environment.d file.
pub(crate) fn enables_mangohud(env_file_content: &str) -> bool {
    env_file_content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .any(|line| line.trim_start_matches("export ").replace(' ', "") == "MANGOHUD=1")
}

fn global_mangohud_status(env_file: Option<&Path>) -> DependencyStatus {
    let enabled = env_file
        .and_then(|path| fs::read_to_string(path).ok())
        .is_some_and(|content| enables_mangohud(&content));
    let details = match (enabled, env_file) {
        (true, Some(path)) => format!("MANGOHUD=1 in {}", path.display()),
        (false, Some(path)) => format!(
            "Not set in {}; games started outside `lgb run` need MANGOHUD=1",
            path.display()
        ),
        (_, None) => "No home directory".to_string(),
    };
    DependencyStatus {
        name: "mangohud global",
        required: false,
        available: enabled,
        details,
    }
}

fn mangohud_config_status(config_path: Option<&Path>) -> DependencyStatus {
    let (available, details) = match config_path {
        Some(path) if path.is_file() => (true, path.display().to_string()),
        Some(path) => (
            true,
            format!("{} (created for each session)", path.display()),
        ),
        None => (false, "Cannot resolve the MangoHud config path".to_string()),
    };
    DependencyStatus {
        name: "mangohud config",
        required: true,
        available,
        details,
    }
}

fn command_status(
    name: &'static str,
    required: bool,
    purpose: &str,
    locate: impl Fn(&str) -> Option<PathBuf>,
) -> DependencyStatus {
    match locate(name) {
        Some(path) => DependencyStatus {
            name,
            required,
            available: true,
            details: path.display().to_string(),
        },
        None => DependencyStatus {
            name,
            required,
            available: false,
            details: format!("Not found in PATH ({purpose})"),
        },
    }
}

pub(crate) fn collect_dependency_statuses(mangohud_config: Option<&Path>) -> Vec<DependencyStatus> {
    statuses_with(mangohud_config, global_env_file().as_deref(), locate_command)
}

fn statuses_with(
    mangohud_config: Option<&Path>,
    env_file: Option<&Path>,
    locate: impl Fn(&str) -> Option<PathBuf> + Copy,
) -> Vec<DependencyStatus> {
    vec![
        command_status("mangohud", true, "captures frame times", locate),
        mangohud_config_status(mangohud_config),
        global_mangohud_status(env_file),
        command_status("lspci", false, "GPU detection", locate),
        command_status("glxinfo", false, "Mesa driver version", locate),
        command_status("nvidia-smi", false, "NVIDIA GPU and driver", locate),
        command_status("steam", false, "launching Steam games", locate),
        command_status("gamemoderun", false, "optional performance governor", locate),
    ]
}

pub(crate) fn dependency_install_hint(name: &str) -> Option<&'static str> {
    match name {
        "mangohud" => Some("sudo pacman -S mangohud (Arch) / sudo apt install mangohud (Debian)"),
        "lspci" => Some("Install pciutils"),
        "glxinfo" => Some("Install mesa-utils (Debian) / mesa-demos (Arch)"),
        "mangohud global" => {
            Some("Add MANGOHUD=1 to ~/.config/environment.d/mangohud.conf and log in again")
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn which_output_takes_first_path() {
        assert_eq!(
            parse_which_output("\n/usr/bin/mangohud\n"),
            Some(PathBuf::from("/usr/bin/mangohud"))
        );
        assert_eq!(parse_which_output("  \n"), None);
    }

    #[test]
    fn environment_file_must_set_mangohud() {
        assert!(enables_mangohud("MANGOHUD=1\n"));
        assert!(enables_mangohud("FOO=bar\nexport MANGOHUD = 1\n"));
        assert!(!enables_mangohud("# MANGOHUD=1\n"));
        assert!(!enables_mangohud("MANGOHUD=0\nMANGOHUD_DLSYM=1\n"));
    }

    #[test]
    fn statuses_report_missing_tools_and_config() {
        let dir = TempDir::new().unwrap();
        let env_file = dir.path().join("mangohud.conf");
        std::fs::write(&env_file, "MANGOHUD=1\n").unwrap();
        let mangohud_config = dir.path().join("MangoHud/MangoHud.conf");

        let only_mangohud =
            |name: &str| (name == "mangohud").then(|| PathBuf::from("/usr/bin/mangohud"));
        let statuses = statuses_with(Some(&mangohud_config), Some(&env_file), only_mangohud);

        let find = |name: &str| statuses.iter().find(|s| s.name == name).unwrap();
        assert!(find("mangohud").available);
        assert!(find("mangohud config").available);
        assert!(find("mangohud config").details.contains("created for each session"));
        assert!(find("mangohud global").available);
        assert!(!find("lspci").available);
        assert!(!find("lspci").required);
        assert!(statuses.iter().filter(|s| s.required).all(|s| s.available));
    }

    #[test]
    fn missing_environment_file_is_not_global() {
        let dir = TempDir::new().unwrap();
        let status = global_mangohud_status(Some(&dir.path().join("absent.conf")));
        assert!(!status.available);
        assert!(!status.required);
    }
}
