//! # Error Types

use crate::types::TokenId;

/// Errors from mergescope operations.
#[derive(Debug, thiserror::Error)]
pub enum MergescopeError {
    /// Vocabulary input is invalid; no vocabulary was constructed.
    ///
    /// Raised for merge rules referencing unminted tokens,
    /// undecodable packed/base64 input, and malformed rule files.
    #[error("malformed vocabulary: {0}")]
    MalformedVocabulary(String),

    /// Derivation history was requested for a token not minted by the vocabulary.
    #[error("no vocabulary for token <{id}>")]
    MissingVocabulary {
        /// The id of the orphan token.
        id: TokenId,
    },

    /// The inference transport failed, or a message failed structural decoding.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An inference configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for mergescope operations.
pub type MSResult<T> = core::result::Result<T, MergescopeError>;
