//! Import module
//!
//! Reads per-frame timing logs written by external capture tools:
//! - MangoHud (Linux) - CSV format
//! - PresentMon / CapFrameX (Windows) - CSV format

mod common;
pub mod mangohud;
mod reader;

pub use common::FrameTrace;
pub use reader::{parse_trace_str, read_trace};
