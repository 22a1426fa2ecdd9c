//! Column-sniffing CSV trace reader
//!
//! Handles the layouts produced by the capture tools we drive or import from:
//! - MangoHud: a system-metadata block (`os,cpu,gpu,...` plus one value row),
//!   then `fps,frametime,cpu_load,...` with frametime in milliseconds
//! - PresentMon / CapFrameX: `MsBetweenPresents` (ms) or `TimeInSeconds` (timestamps)
//! - Header-less logs with one frametime per line
//!
//! Rows before the frame header and rows whose frame cell is not numeric (such as
//! trailing summary rows) are skipped.

use csv::ReaderBuilder;
use std::path::Path;

use super::common::FrameTrace;
use super::mangohud;
use crate::error::{BenchResult, BenchmarkError};

#[derive(Debug, Clone, Copy, PartialEq)]
enum FrameColumn {
    /// Inter-frame interval, milliseconds
    Interval(usize),
    /// Absolute timestamp, multiplied by the factor to get milliseconds
    Timestamp(usize, f64),
}

impl FrameColumn {
    fn index(self) -> usize {
        match self {
            FrameColumn::Interval(idx) | FrameColumn::Timestamp(idx, _) => idx,
        }
    }
}

/// Read a capture log from disk.
pub fn read_trace<P: AsRef<Path>>(path: P) -> BenchResult<FrameTrace> {
    let path = path.as_ref();
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|err| {
            BenchmarkError::InvalidTrace(format!("failed to open {}: {err}", path.display()))
        })?;

    let trace = parse_records(reader)
        .map_err(|reason| BenchmarkError::InvalidTrace(format!("{}: {reason}", path.display())))?;
    Ok(trace.with_application(mangohud::application_from_file_name(path)))
}

/// Parse a capture log held in memory.
pub fn parse_trace_str(content: &str) -> BenchResult<FrameTrace> {
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(content.as_bytes());
    parse_records(reader).map_err(BenchmarkError::InvalidTrace)
}

fn parse_records<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<FrameTrace, String> {
    let mut column: Option<FrameColumn> = None;
    let mut source = "MangoHud";
    let mut values: Vec<f64> = Vec::new();

    for record_result in reader.records() {
        let record = record_result.map_err(|err| format!("malformed CSV record: {err}"))?;

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        if column.is_none() {
            let fields: Vec<&str> = record.iter().collect();
            if let Some(found) = find_frame_column(&fields) {
                if fields
                    .iter()
                    .any(|f| f.eq_ignore_ascii_case("msbetweenpresents"))
                {
                    source = "PresentMon";
                }
                column = Some(found);
                continue;
            }

            // Header-less logs: either bare frametimes or MangoHud's fps,frametime order.
            match headerless_column(&fields) {
                Some(found) => column = Some(found),
                None => continue,
            }
        }

        let Some(col) = column else { continue };
        if let Some(value) = record.get(col.index()).and_then(parse_number) {
            values.push(value);
        }
    }

    let Some(col) = column else {
        return Err("no frame time column found".to_string());
    };

    let trace = match col {
        FrameColumn::Interval(_) => FrameTrace::from_intervals(values, source),
        FrameColumn::Timestamp(_, factor) => {
            let millis: Vec<f64> = values.iter().map(|v| v * factor).collect();
            FrameTrace::from_timestamps(&millis, source)
        }
    };
    Ok(trace)
}

fn find_frame_column(fields: &[&str]) -> Option<FrameColumn> {
    let normalized: Vec<String> = fields
        .iter()
        .map(|field| field.trim().to_ascii_lowercase())
        .collect();

    let interval = normalized.iter().position(|name| {
        name == "frametime" || name == "frametime_ms" || name == "msbetweenpresents"
    });
    if let Some(idx) = interval {
        return Some(FrameColumn::Interval(idx));
    }

    normalized.iter().enumerate().find_map(|(idx, name)| match name.as_str() {
        "timeinseconds" => Some(FrameColumn::Timestamp(idx, 1000.0)),
        "elapsed_ms" | "timestamp_ms" => Some(FrameColumn::Timestamp(idx, 1.0)),
        _ => None,
    })
}

fn headerless_column(fields: &[&str]) -> Option<FrameColumn> {
    match fields {
        [single] if parse_number(single).is_some() => Some(FrameColumn::Interval(0)),
        [first, second, ..] if parse_number(first).is_some() && parse_number(second).is_some() => {
            Some(FrameColumn::Interval(1))
        }
        _ => None,
    }
}

/// Parse a numeric cell. Non-finite spellings (`nan`, `inf`) parse and are kept so the
/// analyzer can reject them.
fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mangohud_log_with_metadata_block_and_summary_row() {
        let log = "os,cpu,gpu,ram,kernel,driver,cpuscheduler\n\
Arch Linux,AMD Ryzen 7 9800X3D,AMD Radeon RX 7900 XTX,32GB,6.12.1-arch1,Mesa 24.3,\n\
fps,frametime,cpu_load,gpu_load\n\
60,16.67,50,80\n\
59,16.95,52,82\n\
61,16.39,48,78\n\
30,33.33,60,90\n\
AVERAGE,n/a,,\n";

        let trace = parse_trace_str(log).unwrap();
        assert_eq!(trace.frame_times_ms, vec![16.67, 16.95, 16.39, 33.33]);
        assert_eq!(trace.source, "MangoHud");
    }

    #[test]
    fn presentmon_interval_column() {
        let log = "Application,ProcessID,MsBetweenPresents,MsBetweenDisplayChange\n\
game.exe,1234,8.33,8.30\n\
game.exe,1234,8.40,8.41\n";
        let trace = parse_trace_str(log).unwrap();
        assert_eq!(trace.frame_times_ms, vec![8.33, 8.40]);
        assert_eq!(trace.source, "PresentMon");
    }

    #[test]
    fn timestamp_column_is_differenced() {
        let log = "TimeInSeconds,Other\n0.000,x\n0.016,x\n0.033,x\n";
        let trace = parse_trace_str(log).unwrap();
        assert_eq!(trace.len(), 2);
        assert!((trace.frame_times_ms[0] - 16.0).abs() < 1e-9);
        assert!((trace.frame_times_ms[1] - 17.0).abs() < 1e-9);
    }

    #[test]
    fn headerless_single_column() {
        let trace = parse_trace_str("16.67\n16.95\n16.39\n").unwrap();
        assert_eq!(trace.len(), 3);
    }

    #[test]
    fn invalid_numbers_are_passed_through() {
        let trace = parse_trace_str("frametime\n16.0\n-1.0\nnan\n0\n").unwrap();
        assert_eq!(trace.len(), 4);
        assert_eq!(trace.frame_times_ms[1], -1.0);
        assert!(trace.frame_times_ms[2].is_nan());
    }

    #[test]
    fn missing_frame_column_is_invalid_trace() {
        let err = parse_trace_str("os,cpu,gpu\nLinux,Ryzen,Radeon\n").unwrap_err();
        assert!(matches!(err, BenchmarkError::InvalidTrace(_)));
    }

    #[test]
    fn read_trace_takes_application_from_file_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Cyberpunk2077_2024-01-15_12-30-00.csv");
        std::fs::write(&path, "fps,frametime\n60,16.6\n60,16.7\n").unwrap();

        let trace = read_trace(&path).unwrap();
        assert_eq!(trace.application.as_deref(), Some("Cyberpunk2077"));
        assert_eq!(trace.len(), 2);
    }

    #[test]
    fn read_trace_reports_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.csv");
        assert!(matches!(
            read_trace(&missing),
            Err(BenchmarkError::InvalidTrace(_))
        ));
    }
}
