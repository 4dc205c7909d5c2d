//! # Inference Wire Messages
//!
//! Request (sent once per session):
//! ```json
//! { "request_id": "...",
//!   "action": { "type": "autoregressiveInference", "model_id": "...",
//!               "token_input": [..], "config": { .. } } }
//! ```
//!
//! Response (zero or more per session):
//! ```json
//! { "type": "autoregressiveInference", "request_id": "...", "tokens": [..], "done": false }
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    errors::{MSResult, MergescopeError},
    inference::InferenceConfig,
    types::TokenId,
};

/// An inference request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Correlation id; echoed by every response.
    pub request_id: String,

    /// The requested action.
    pub action: InferenceAction,
}

/// The action carried by an [`InferenceRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InferenceAction {
    /// Generate tokens autoregressively from `token_input`.
    #[serde(rename = "autoregressiveInference")]
    AutoregressiveInference {
        /// The model to run.
        model_id: String,

        /// The prompt token ids.
        token_input: Vec<TokenId>,

        /// Generation options.
        config: InferenceConfig,
    },
}

/// The kind tag of an [`InferenceResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseKind {
    /// A batch of autoregressively generated tokens.
    #[serde(rename = "autoregressiveInference")]
    AutoregressiveInference,
}

/// An inference response message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceResponse {
    /// The response kind.
    #[serde(rename = "type")]
    pub kind: ResponseKind,

    /// The echoed request id.
    pub request_id: String,

    /// Newly generated token ids, in order.
    pub tokens: Vec<TokenId>,

    /// Set on the final message of a session.
    #[serde(default)]
    pub done: bool,
}

impl InferenceRequest {
    /// Build an autoregressive inference request.
    pub fn autoregressive(
        request_id: impl Into<String>,
        model_id: impl Into<String>,
        token_input: Vec<TokenId>,
        config: InferenceConfig,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            action: InferenceAction::AutoregressiveInference {
                model_id: model_id.into(),
                token_input,
                config,
            },
        }
    }

    /// Encode the request as JSON text.
    pub fn encode(&self) -> MSResult<String> {
        serde_json::to_string(self)
            .map_err(|e| MergescopeError::Protocol(format!("failed to encode request: {e}")))
    }
}

impl InferenceResponse {
    /// Build a response for `request_id`.
    pub fn new(
        request_id: impl Into<String>,
        tokens: Vec<TokenId>,
        done: bool,
    ) -> Self {
        Self {
            kind: ResponseKind::AutoregressiveInference,
            request_id: request_id.into(),
            tokens,
            done,
        }
    }

    /// Encode the response as JSON text.
    pub fn encode(&self) -> MSResult<String> {
        serde_json::to_string(self)
            .map_err(|e| MergescopeError::Protocol(format!("failed to encode response: {e}")))
    }

    /// Decode a response, and check that it belongs to `request_id`.
    ///
    /// ## Returns
    /// The response; or [`MergescopeError::Protocol`] on a malformed message
    /// or a mismatched request id.
    pub fn decode_for(
        text: &str,
        request_id: &str,
    ) -> MSResult<Self> {
        let response: Self = serde_json::from_str(text)
            .map_err(|e| MergescopeError::Protocol(format!("malformed response: {e}")))?;

        if response.request_id != request_id {
            return Err(MergescopeError::Protocol(format!(
                "response for request {:?} on session {:?}",
                response.request_id, request_id
            )));
        }

        Ok(response)
    }
}
