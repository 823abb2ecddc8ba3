//! Error types for port operations.

/// Narrative collaborator errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NarrativeError {
    /// The request never produced a response (connection, I/O, exhausted source).
    #[error("Narrative request failed: {0}")]
    Transport(String),

    /// The collaborator did not answer within the caller's deadline.
    #[error("Narrative request timed out after {0}s")]
    Timeout(u64),

    /// A response arrived but was not usable as text.
    #[error("Invalid narrative response: {0}")]
    InvalidResponse(String),
}
