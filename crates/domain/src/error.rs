//! Unified error types for the domain layer
//!
//! Provides a common error type for domain operations so the engine can
//! propagate rule violations without falling back to strings or anyhow.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    ///
    /// Use this when domain invariants or constraints are violated:
    /// - Required fields are empty or missing
    /// - Values are outside allowed ranges
    ///
    /// # Example
    /// ```ignore
    /// if name.trim().is_empty() {
    ///     return Err(DomainError::validation("Player name cannot be empty"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    ///
    /// Used by `FromStr` implementations when the input does not name a
    /// known variant (attribute names, rarity tags, outcome tags).
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
