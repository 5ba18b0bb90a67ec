//! error types for the monitor

use lendmirror_common::MirrorError;
use thiserror::Error;

/// A ledger read did not complete
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("ledger call {call} failed: {reason}")]
    Call { call: &'static str, reason: String },

    #[error("ledger read timed out after {0}s")]
    Timeout(u64),

    #[error("malformed ledger value for {field}: {reason}")]
    Malformed { field: &'static str, reason: String },
}

impl ReadError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Call { .. } => "R001_CALL_FAILED",
            Self::Timeout(_) => "R002_TIMEOUT",
            Self::Malformed { .. } => "R003_MALFORMED",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("read failure: {0}")]
    ReadFailure(#[from] ReadError),

    #[error("stale snapshot: sequence {rejected} arrived after {published}")]
    StaleSequence { published: u64, rejected: u64 },

    #[error("snapshot belongs to a previous session")]
    SessionMismatch,

    #[error("refresh cancelled")]
    Cancelled,

    #[error("snapshot {sequence} is inconsistent and not actionable")]
    Inconsistent { sequence: u64 },

    #[error("no snapshot published yet")]
    NoSnapshot,

    #[error("preview rejected: {0}")]
    Preview(#[from] MirrorError),

    #[error("config error: {0}")]
    Config(String),

    #[error("fixture error: {0}")]
    Fixture(String),
}

pub type MonitorResult<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReadFailure(e) => e.code(),
            Self::StaleSequence { .. } => "M001_STALE_SEQUENCE",
            Self::SessionMismatch => "M002_SESSION_MISMATCH",
            Self::Cancelled => "M003_CANCELLED",
            Self::Inconsistent { .. } => "M004_INCONSISTENT",
            Self::NoSnapshot => "M005_NO_SNAPSHOT",
            Self::Preview(e) => e.code(),
            Self::Config(_) => "M010_CONFIG",
            Self::Fixture(_) => "M011_FIXTURE",
        }
    }

    /// Errors after which the last published snapshot stays valid
    /// and the next refresh may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ReadFailure(_) | Self::StaleSequence { .. } | Self::SessionMismatch | Self::Cancelled
        )
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(e: std::io::Error) -> Self {
        MonitorError::Fixture(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_failure_is_recoverable() {
        let err: MonitorError = ReadError::Timeout(10).into();
        assert!(err.is_recoverable());
        assert_eq!(err.code(), "R002_TIMEOUT");
        assert!(!MonitorError::Config("bad".into()).is_recoverable());
    }

    #[test]
    fn test_preview_keeps_mirror_code() {
        let err: MonitorError = MirrorError::Unpriced.into();
        assert_eq!(err.code(), "E030_UNPRICED");
    }
}
