//! Hardware identity
//!
//! Normalizes OS/GPU/CPU descriptions into a fingerprint that keys stored results,
//! and probes the local machine for those descriptions.

mod fingerprint;
mod probe;

pub use fingerprint::HardwareInfo;
