//! Hardware identity used to decide whether stored results are still comparable
//!
//! Raw probe strings vary between tools (lspci, nvidia-smi, Mesa renderer strings,
//! /proc/cpuinfo), so every field is reduced to a stable marketing name before hashing.
//! All normalizers are idempotent.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const MAX_GPU_NAME_LEN: usize = 40;
const FINGERPRINT_HEX_LEN: usize = 16;
const UNKNOWN: &str = "Unknown";

/// Fingerprint inputs plus the descriptive fields stored next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub os_name: String,
    /// Kernel version without distribution suffix (`6.12.1`)
    #[serde(default)]
    pub kernel: String,
    pub gpu_model: String,
    #[serde(default)]
    pub gpu_driver: Option<String>,
    pub cpu_model: String,
    #[serde(default)]
    pub ram_gb: u64,
}

impl HardwareInfo {
    /// Same info with every identity field normalized.
    pub fn normalized(&self) -> Self {
        Self {
            os_name: normalize_os(&self.os_name),
            kernel: short_kernel(&self.kernel),
            gpu_model: normalize_gpu(&self.gpu_model),
            gpu_driver: self
                .gpu_driver
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            cpu_model: normalize_cpu(&self.cpu_model),
            ram_gb: self.ram_gb,
        }
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.os_name, &self.gpu_model, &self.cpu_model)
    }
}

/// First 16 hex digits of SHA-256 over `"{os}_{gpu}_{cpu}"` of the normalized fields.
pub fn fingerprint(os: &str, gpu: &str, cpu: &str) -> String {
    let key = format!(
        "{}_{}_{}",
        normalize_os(os),
        normalize_gpu(gpu),
        normalize_cpu(cpu)
    );
    let digest = Sha256::digest(key.as_bytes());
    let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    hex[..FINGERPRINT_HEX_LEN].to_string()
}

pub fn normalize_os(os: &str) -> String {
    let collapsed = collapse_whitespace(os);
    if collapsed.is_empty() {
        UNKNOWN.to_string()
    } else {
        collapsed
    }
}

/// `6.12.1-arch1-1` -> `6.12.1`
pub fn short_kernel(kernel: &str) -> String {
    kernel.trim().split('-').next().unwrap_or_default().to_string()
}

pub fn normalize_gpu(model: &str) -> String {
    let model = model.trim();
    if model.is_empty() {
        return UNKNOWN.to_string();
    }

    let model = lspci_bracket_name(model).unwrap_or(model);
    let cleaned = collapse_whitespace(&strip_parenthesized(model));
    if cleaned.is_empty() {
        return UNKNOWN.to_string();
    }

    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if let Some(name) = marketing_gpu_name(&tokens) {
        return name;
    }
    truncate_chars(&cleaned, MAX_GPU_NAME_LEN).trim_end().to_string()
}

fn marketing_gpu_name(tokens: &[&str]) -> Option<String> {
    for (i, token) in tokens.iter().enumerate() {
        let next = tokens.get(i + 1).copied();
        match token.to_ascii_uppercase().as_str() {
            family @ ("RTX" | "GTX") => {
                if let Some(number) = next.filter(|n| starts_with_digit(n)) {
                    let mut name = format!("{family} {number}");
                    match tokens.get(i + 2).map(|s| s.to_ascii_uppercase()).as_deref() {
                        Some("TI") => name.push_str(" Ti"),
                        Some("SUPER") => name.push_str(" SUPER"),
                        _ => {}
                    }
                    return Some(name);
                }
            }
            "RX" => {
                if let Some(number) = next.filter(|n| starts_with_digit(n)) {
                    // lspci lists cards sharing a device id together: "RX 7900 XT/7900 XTX"
                    let mut name = format!("RX {number}");
                    for variant in tokens[i + 2..].iter().take_while(|t| is_rx_variant(t)) {
                        name.push(' ');
                        name.push_str(&variant.to_ascii_uppercase());
                    }
                    return Some(name);
                }
            }
            "ARC" => {
                if let Some(model) = next.filter(|n| {
                    n.len() > 1
                        && n.starts_with(['A', 'B', 'a', 'b'])
                        && starts_with_digit(&n[1..])
                }) {
                    return Some(format!("Arc {}", model.to_ascii_uppercase()));
                }
            }
            "IRIS" if tokens.iter().any(|t| t.eq_ignore_ascii_case("Xe")) => {
                return Some("Iris Xe".to_string());
            }
            _ => {}
        }
    }
    None
}

pub fn normalize_cpu(model: &str) -> String {
    let cleaned = clean_cpu_name(model);
    if cleaned.is_empty() {
        return UNKNOWN.to_string();
    }

    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    for (i, token) in tokens.iter().enumerate() {
        if *token == "Ryzen" {
            if let (Some(tier), Some(number)) = (tokens.get(i + 1), tokens.get(i + 2)) {
                return format!("Ryzen {tier} {number}");
            }
        }
        if *token == "Ultra" && i > 0 && tokens[i - 1] == "Core" {
            if let (Some(tier), Some(number)) = (tokens.get(i + 1), tokens.get(i + 2)) {
                return format!("Core Ultra {tier} {number}");
            }
        }
        if is_intel_core_model(token) {
            return token.to_string();
        }
    }

    tokens.into_iter().take(4).collect::<Vec<_>>().join(" ")
}

/// Drop trademark marks, clock speed, integrated-graphics tails and filler words.
fn clean_cpu_name(model: &str) -> String {
    let mut name = model.to_string();
    for mark in ["(R)", "(r)", "(TM)", "(tm)"] {
        name = name.replace(mark, "");
    }
    let name = name.split('@').next().unwrap_or_default();

    name.split_whitespace()
        .take_while(|word| !word.eq_ignore_ascii_case("with"))
        .filter(|word| {
            let lower = word.to_ascii_lowercase();
            lower != "cpu" && lower != "processor" && !lower.ends_with("-core")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `i5-1135G7`, `i9-13900K`
fn is_intel_core_model(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() > 3
        && bytes[0] == b'i'
        && matches!(bytes[1], b'3' | b'5' | b'7' | b'9')
        && bytes[2] == b'-'
        && bytes[3].is_ascii_digit()
}

/// Last bracketed group of an lspci device name, skipping the `[AMD/ATI]` vendor tag:
/// "NVIDIA Corporation AD104 [GeForce RTX 4070]",
/// "Advanced Micro Devices, Inc. [AMD/ATI] Navi 31 [Radeon RX 7900 XT/7900 XTX]"
fn lspci_bracket_name(model: &str) -> Option<&str> {
    let mut rest = model;
    let mut last = None;
    while let Some(open) = rest.find('[') {
        let Some(len) = rest[open..].find(']') else {
            break;
        };
        let inner = rest[open + 1..open + len].trim();
        if !inner.is_empty() && !inner.eq_ignore_ascii_case("AMD/ATI") {
            last = Some(inner);
        }
        rest = &rest[open + len + 1..];
    }
    last
}

/// `XT`, `XT/7900`, `/`, `7900M`: suffixes and variant numbers after an RX number.
fn is_rx_variant(token: &str) -> bool {
    token.split('/').all(|part| {
        part.is_empty()
            || matches!(part.to_ascii_uppercase().as_str(), "XTX" | "XT" | "GRE")
            || (starts_with_digit(part)
                && part
                    .trim_end_matches(['M', 'm'])
                    .chars()
                    .all(|c| c.is_ascii_digit()))
    })
}

fn starts_with_digit(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove `(...)` groups; an unclosed group runs to the end.
fn strip_parenthesized(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
