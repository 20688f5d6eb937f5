//! Error types for the inclusion audit

use std::fmt;
use std::path::PathBuf;

use rf_waapi::WaapiError;
use thiserror::Error;

/// Which project query failed, with its argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryCall {
    ProjectPath,
    EventCatalog,
    BankNames,
    BankInclusions(String),
    DescendantEvents,
    SelfEvents,
    WwiseInfo,
}

impl fmt::Display for QueryCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProjectPath => write!(f, "project path"),
            Self::EventCatalog => write!(f, "event catalog"),
            Self::BankNames => write!(f, "SoundBank list"),
            Self::BankInclusions(bank) => write!(f, "inclusions of SoundBank '{}'", bank),
            Self::DescendantEvents => write!(f, "descendant events of inclusions"),
            Self::SelfEvents => write!(f, "events among inclusions"),
            Self::WwiseInfo => write!(f, "Wwise info"),
        }
    }
}

/// Why a query's answer cannot be used
#[derive(Error, Debug)]
pub enum QueryFailure {
    #[error(transparent)]
    Rpc(WaapiError),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("expected exactly one project, got {0}")]
    ProjectCount(usize),

    #[error("duplicate event name '{name}' at '{first_path}' and '{second_path}'")]
    DuplicateEvent {
        name: String,
        first_path: String,
        second_path: String,
    },
}

/// Audit errors; every variant aborts the run
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("WAAPI connection failure: {0}")]
    Connection(#[source] WaapiError),

    #[error("Project mismatch: WAAPI has '{}' open, expected '{}'", .actual.display(), .expected.display())]
    ProjectMismatch { expected: PathBuf, actual: PathBuf },

    #[error("Query for {call} failed: {failure}")]
    Query { call: QueryCall, failure: QueryFailure },

    #[error("IO failure while {action} '{}': {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AuditError {
    pub fn query(call: QueryCall, failure: QueryFailure) -> Self {
        Self::Query { call, failure }
    }

    /// Classify a WAAPI error raised while running `call`
    pub fn from_waapi(call: QueryCall, err: WaapiError) -> Self {
        if err.is_connection_failure() {
            Self::Connection(err)
        } else {
            Self::query(call, QueryFailure::Rpc(err))
        }
    }

    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Result type for audit operations
pub type AuditResult<T> = Result<T, AuditError>;
