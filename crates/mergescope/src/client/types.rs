//! # Backend Documents
//!
//! Pass-through shapes of the backend's REST documents.

use serde::{Deserialize, Serialize};

use crate::types::TokenId;

/// Usage examples for one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// The token id.
    pub id: TokenId,

    /// ``(context, continuation)`` example pairs.
    pub examples: Vec<(String, String)>,
}

/// A next-token logits request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogitsRequest {
    /// The prompt token ids.
    pub token_input: Vec<TokenId>,
}

/// A next-token logits response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogitsResponse {
    /// One logit per vocabulary entry.
    pub logits: Vec<f32>,
}
