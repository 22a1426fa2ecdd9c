//! Persisted record shapes
//!
//! Unknown fields are ignored and optional fields default, so files written by older
//! versions stay readable.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::io;

use super::codec;
use crate::analysis::MetricsRecord;
use crate::hardware::HardwareInfo;

/// One stored benchmark run (`run_NNN.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_number: u32,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub metrics: MetricsRecord,
    /// Rating threshold set the metrics were classified with; 0 for unversioned files.
    #[serde(default)]
    pub rating_contract: u32,
    /// base64(gzip(JSON array of frame intervals))
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frametimes_compressed: Option<String>,
    /// Uncompressed intervals written by older versions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frametimes: Vec<f64>,
}

impl RunRecord {
    /// Raw frame intervals, if the run stored them.
    pub fn frame_times(&self) -> io::Result<Vec<f64>> {
        match &self.frametimes_compressed {
            Some(encoded) => codec::decompress_frametimes(encoded),
            None => Ok(self.frametimes.clone()),
        }
    }

    pub fn has_frame_times(&self) -> bool {
        self.frametimes_compressed
            .as_deref()
            .is_some_and(|encoded| !encoded.is_empty())
            || !self.frametimes.is_empty()
    }
}

/// Last hardware identity a game was benchmarked on (`fingerprint.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    pub fingerprint: String,
    #[serde(flatten)]
    pub hardware: HardwareInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339 and zone-less ISO timestamps (read as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}
