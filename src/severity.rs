//! Finding severity levels shared by every advisory check.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How urgently a finding deserves human attention.
///
/// Findings are advisory in all cases; severity orders the review queue,
/// it never gates anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Surfaced for awareness; no contradiction detected.
    Info,
    /// Likely worth a look.
    Warning,
    /// Direct conflict with canon.
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::High => "high",
        };
        f.write_str(s)
    }
}
