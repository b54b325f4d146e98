use unitgraph_core::ErrorCode;

/// An analysis broke one of its own invariants.
///
/// These never come from the input graph: dangling references and
/// disconnected subgraphs are routine and handled in place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("{section}: internal invariant violated: {detail}")]
    Invariant {
        section: &'static str,
        detail: String,
    },
}

impl AnalysisError {
    pub(crate) fn invariant(section: &'static str, detail: impl Into<String>) -> Self {
        Self::Invariant {
            section,
            detail: detail.into(),
        }
    }

    /// Stable machine code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Invariant { .. } => ErrorCode::AnalysisInvariant,
        }
    }
}
