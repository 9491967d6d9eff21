//! Utility functions for display formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{format_relative, parse_timestamp, severity_label, status_label, truncate};
