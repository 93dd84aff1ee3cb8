//! Error types for the AIngle truth-maintenance knowledge base.

use thiserror::Error;

/// A specialized `Result` type for knowledge base operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Defines the errors that can occur while building, querying or maintaining a knowledge base.
///
/// None of these are fatal: the knowledge base stays consistent after any of them is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `ask` was given something that is not fact-shaped.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The item named in a retraction is not in the knowledge base.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A direct retraction of an item that is still asserted or still supported.
    #[error("Illegal retract: {0}")]
    IllegalRetract(String),

    /// A rule was defined incorrectly.
    #[error("Invalid rule definition: {0}")]
    InvalidRule(String),

    /// The textual notation could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A single assertion performed more derivations than the configured limit.
    #[error("Derivation limit exceeded: {limit}")]
    DerivationLimitExceeded { limit: usize },

    /// The justification graph violates one of its invariants.
    #[error("Inconsistent knowledge base: {0}")]
    Inconsistent(String),

    /// A shared knowledge base lock was poisoned by a panicking writer.
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    /// An error occurred during data serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidRule("empty left-hand side".to_string());
        assert!(err.to_string().contains("empty left-hand side"));
    }

    #[test]
    fn test_derivation_limit_display() {
        let err = Error::DerivationLimitExceeded { limit: 10 };
        assert_eq!(err.to_string(), "Derivation limit exceeded: 10");
    }

    #[test]
    fn test_from_serde_json() {
        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
