//! Best-effort local hardware probe
//!
//! - OS, kernel, CPU and RAM: sysinfo
//! - GPU: nvidia-smi when available, then lspci
//! - Mesa driver version: glxinfo

use anyhow::{Context, Result};
use std::process::Command;
use sysinfo::System;
use tracing::debug;

use super::fingerprint::HardwareInfo;

impl HardwareInfo {
    /// Probe the local machine. Fields that cannot be detected fall back to `Unknown`.
    pub fn detect() -> Result<Self> {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_all();

        let cpu_model = sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .context("No CPU detected")?;
        let ram_gb = (sys.total_memory() as f64 / 1024.0 / 1024.0 / 1024.0).round() as u64;

        let os_name = System::name().unwrap_or_else(|| "Linux".to_string());
        let kernel = System::kernel_version().unwrap_or_default();

        let (gpu_model, mut gpu_driver) = match detect_nvidia_smi() {
            Ok(found) => found,
            Err(err) => {
                debug!("nvidia-smi probe failed: {err:#}");
                (detect_lspci().unwrap_or_else(|_| "Unknown".to_string()), None)
            }
        };
        if gpu_driver.is_none() {
            gpu_driver = detect_mesa_version();
        }

        Ok(HardwareInfo {
            os_name,
            kernel,
            gpu_model,
            gpu_driver,
            cpu_model,
            ram_gb,
        }
        .normalized())
    }
}

fn detect_nvidia_smi() -> Result<(String, Option<String>)> {
    let output = Command::new("nvidia-smi")
        .args([
            "--query-gpu=name,driver_version",
            "--format=csv,noheader,nounits",
        ])
        .output()
        .context("nvidia-smi not found")?;

    if !output.status.success() {
        anyhow::bail!("nvidia-smi failed");
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_nvidia_smi(&stdout).context("Invalid nvidia-smi output")
}

fn parse_nvidia_smi(stdout: &str) -> Option<(String, Option<String>)> {
    let line = stdout.lines().next()?;
    let mut parts = line.split(',').map(str::trim);
    let name = parts.next().filter(|n| !n.is_empty())?.to_string();
    let driver = parts.next().filter(|d| !d.is_empty()).map(str::to_string);
    Some((name, driver))
}

fn detect_lspci() -> Result<String> {
    let output = Command::new("lspci").output().context("lspci not found")?;
    if !output.status.success() {
        anyhow::bail!("lspci failed");
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_lspci(&stdout).context("No GPU found in lspci output")
}

/// Device name of the first display controller, discrete cards preferred.
///
/// Line format: `01:00.0 VGA compatible controller: NVIDIA Corporation GA104 [GeForce RTX 3070] (rev a1)`
fn parse_lspci(stdout: &str) -> Option<String> {
    let controllers: Vec<&str> = stdout
        .lines()
        .filter(|line| {
            line.contains("VGA")
                || line.contains("3D controller")
                || line.contains("Display controller")
        })
        .collect();

    let preferred = controllers
        .iter()
        .find(|line| !line.contains("Intel"))
        .or_else(|| controllers.first())?;

    let name = match preferred.find(": ") {
        Some(idx) => &preferred[idx + 2..],
        None => preferred,
    };
    let name = match name.rfind(" (rev") {
        Some(idx) => &name[..idx],
        None => name,
    };
    Some(name.trim().to_string())
}

fn detect_mesa_version() -> Option<String> {
    let output = Command::new("glxinfo").arg("-B").output().ok()?;
    if !output.status.success() {
        return None;
    }
    mesa_version(&String::from_utf8_lossy(&output.stdout))
}

/// `OpenGL version string: 4.6 (Compatibility Profile) Mesa 24.3.1-arch1.1` -> `Mesa 24.3.1`
fn mesa_version(glxinfo: &str) -> Option<String> {
    glxinfo
        .lines()
        .filter(|line| line.contains("version string"))
        .find_map(|line| {
            let idx = line.find("Mesa ")?;
            let version = line[idx + 5..].split_whitespace().next()?;
            let version = version.split('-').next().unwrap_or(version);
            Some(format!("Mesa {version}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nvidia_smi_name_and_driver() {
        let parsed = parse_nvidia_smi("NVIDIA GeForce RTX 4070, 560.35.03\n").unwrap();
        assert_eq!(parsed.0, "NVIDIA GeForce RTX 4070");
        assert_eq!(parsed.1.as_deref(), Some("560.35.03"));
        assert!(parse_nvidia_smi("").is_none());
    }

    #[test]
    fn lspci_prefers_discrete_gpu() {
        let out = "00:02.0 VGA compatible controller: Intel Corporation Raptor Lake-S GT1 [UHD Graphics 770] (rev 04)\n\
00:14.0 USB controller: Intel Corporation Device 7a60\n\
03:00.0 VGA compatible controller: Advanced Micro Devices, Inc. [AMD/ATI] Navi 31 [Radeon RX 7900 XT/7900 XTX] (rev c8)\n";
        let name = parse_lspci(out).unwrap();
        assert!(name.starts_with("Advanced Micro Devices"));
        assert!(!name.contains("(rev"));
        assert_eq!(
            crate::hardware::fingerprint::normalize_gpu(&name),
            "RX 7900 XT/7900 XTX"
        );
    }

    #[test]
    fn lspci_without_display_controller() {
        assert!(parse_lspci("00:14.0 USB controller: Intel Corporation Device\n").is_none());
    }

    #[test]
    fn mesa_version_from_glxinfo() {
        let out = "name of display: :0\n\
OpenGL core profile version string: 4.6 (Core Profile) Mesa 24.3.1-arch1.1\n";
        assert_eq!(mesa_version(out).as_deref(), Some("Mesa 24.3.1"));
        assert_eq!(mesa_version("OpenGL version string: 4.6.0 NVIDIA 560.35"), None);
    }
}
