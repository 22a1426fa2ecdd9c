//! Compressed frametime encoding: JSON array -> gzip -> base64
//!
//! Lossless for every finite `f64`: serde_json writes the shortest representation
//! that parses back to the same value. Non-finite values have no JSON form and are
//! rejected.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};

/// An empty sequence encodes to the empty string.
pub fn compress_frametimes(frametimes: &[f64]) -> io::Result<String> {
    if frametimes.is_empty() {
        return Ok(String::new());
    }
    if let Some(bad) = frametimes.iter().find(|ms| !ms.is_finite()) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("frame interval {bad} cannot be stored"),
        ));
    }

    let json = serde_json::to_vec(frametimes)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

/// Inverse of [`compress_frametimes`]; the empty string decodes to an empty sequence.
pub fn decompress_frametimes(encoded: &str) -> io::Result<Vec<f64>> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Ok(Vec::new());
    }

    let compressed = STANDARD
        .decode(encoded)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut json = Vec::new();
    decoder.read_to_end(&mut json)?;
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_exact() {
        let frametimes = vec![16.667, 0.1 + 0.2, 33.333_333_333_333_336, 1e-9, 250.0];
        let encoded = compress_frametimes(&frametimes).unwrap();
        assert!(!encoded.is_empty());
        assert_eq!(decompress_frametimes(&encoded).unwrap(), frametimes);
    }

    #[test]
    fn empty_sequence_round_trips() {
        assert_eq!(compress_frametimes(&[]).unwrap(), "");
        assert!(decompress_frametimes("").unwrap().is_empty());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        for bad in [f64::NAN, f64::INFINITY] {
            let err = compress_frametimes(&[16.0, bad, 16.0]).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn garbage_is_invalid_data() {
        let err = decompress_frametimes("not base64!").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
