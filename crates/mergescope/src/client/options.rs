//! # Client Options

use std::env;

use crate::{
    errors::{MSResult, MergescopeError},
    types::TokenId,
};

/// The default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/v0";

/// Environment variables consulted by [`ClientOptions::from_env`]; in order.
pub const BASE_URL_ENV_VARS: &[&str] = &["MERGESCOPE_BASE_URL"];

/// Join URL path segments.
///
/// * A segment starting with ``/`` replaces the path so far.
/// * A trailing ``/`` on the path so far is not doubled.
pub fn join_url(segments: &[&str]) -> String {
    let mut total = segments.first().map(|s| s.to_string()).unwrap_or_default();
    for segment in segments.iter().skip(1) {
        if segment.starts_with('/') {
            total = segment.to_string();
        } else {
            if !total.ends_with('/') {
                total.push('/');
            }
            total.push_str(segment);
        }
    }
    total
}

/// Backend endpoint options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// The backend base URL.
    pub base_url: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientOptions {
    /// Resolve options from the environment.
    ///
    /// Resolution Order:
    /// 1. ``env[$VAR]`` for each of [`BASE_URL_ENV_VARS`]; in order.
    /// 2. [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Self {
        for env_var in BASE_URL_ENV_VARS {
            if let Ok(base_url) = env::var(env_var) {
                log::debug!("base url from ${env_var}: {base_url}");
                return Self { base_url };
            }
        }
        Self::default()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the base URL.
    pub fn set_base_url(
        &mut self,
        base_url: impl Into<String>,
    ) {
        self.base_url = base_url.into();
    }

    /// Set the base URL, and return self.
    pub fn with_base_url(
        mut self,
        base_url: impl Into<String>,
    ) -> Self {
        self.set_base_url(base_url);
        self
    }

    /// The token info endpoint.
    pub fn token_info_url(
        &self,
        id: TokenId,
    ) -> String {
        let id = id.to_string();
        join_url(&[self.base_url.as_str(), "token", id.as_str(), "info"])
    }

    /// The token embeddings endpoint for a model.
    pub fn embeddings_url(
        &self,
        model_id: &str,
    ) -> String {
        join_url(&[self.base_url.as_str(), "tokens", model_id, "embeddings"])
    }

    /// The logits endpoint for a model.
    pub fn logits_url(
        &self,
        model_id: &str,
    ) -> String {
        join_url(&[self.base_url.as_str(), "model", model_id, "logits"])
    }

    /// The streaming inference socket endpoint.
    ///
    /// ## Returns
    /// The base URL with ``http``/``https`` mapped to ``ws``/``wss``;
    /// or [`MergescopeError::InvalidConfig`] for any other scheme.
    pub fn socket_url(&self) -> MSResult<String> {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(MergescopeError::InvalidConfig(format!(
                "unsupported base url scheme: {:?}",
                self.base_url
            )));
        };
        Ok(join_url(&[base.as_str(), "ws"]))
    }
}
