use std::fmt;

/// Machine-readable error codes for pipeline callers and CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidUnit,
    UnknownKind,
    LockPoisoned,
    CorruptSnapshot,
    AnalysisInvariant,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidUnit => "E2001",
            Self::UnknownKind => "E2002",
            Self::LockPoisoned => "E3001",
            Self::CorruptSnapshot => "E3002",
            Self::AnalysisInvariant => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidUnit => "Malformed unit record",
            Self::UnknownKind => "Unknown unit kind",
            Self::LockPoisoned => "Graph lock poisoned",
            Self::CorruptSnapshot => "Corrupt graph snapshot",
            Self::AnalysisInvariant => "Analysis invariant violated",
        }
    }

    /// Optional remediation hint surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in the unitgraph config.toml and retry."),
            Self::InvalidUnit => {
                Some("Every unit needs a non-empty identifier and non-empty dependency targets.")
            }
            Self::UnknownKind => Some("Use one of the documented unit kinds (model, service, ...)."),
            Self::LockPoisoned => {
                Some("An extractor panicked mid-registration. Rebuild the graph from scratch.")
            }
            Self::CorruptSnapshot => Some("Re-export the snapshot from a freshly built graph."),
            Self::AnalysisInvariant => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised at the graph construction boundary.
///
/// Traversal-time anomalies such as dangling targets are not errors; they
/// are tolerated by the graph and skipped by the analyses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The unit record violates the input contract.
    #[error("invalid unit {identifier:?}: {reason}")]
    InvalidUnit { identifier: String, reason: String },

    /// A kind tag outside the closed [`crate::UnitKind`] set.
    #[error("unknown unit kind: {0}")]
    UnknownKind(String),

    /// A producer panicked while holding the build-phase lock.
    #[error("graph lock poisoned by a panicking producer")]
    Poisoned,

    /// A snapshot could not be turned back into a graph.
    #[error("corrupt snapshot: {0}")]
    Snapshot(String),
}

impl GraphError {
    pub(crate) fn invalid(identifier: &str, reason: impl Into<String>) -> Self {
        Self::InvalidUnit {
            identifier: identifier.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable machine code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidUnit { .. } => ErrorCode::InvalidUnit,
            Self::UnknownKind(_) => ErrorCode::UnknownKind,
            Self::Poisoned => ErrorCode::LockPoisoned,
            Self::Snapshot(_) => ErrorCode::CorruptSnapshot,
        }
    }
}
