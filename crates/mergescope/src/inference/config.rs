//! # Generation Config

use serde::{Deserialize, Serialize};

use crate::errors::{MSResult, MergescopeError};

/// The accepted ``temperature`` range.
pub const TEMPERATURE_RANGE: core::ops::RangeInclusive<f32> = 0.0..=5.0;

/// Generation options sent with an inference request.
///
/// Absent options are omitted from the request; the server applies its defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Cap on generated tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_tokens: Option<u32>,

    /// Sampling softness; in ``[0, 5]``.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Sampling candidate width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Artificial per-step server delay, for testing and throttling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthetic_wait: Option<u32>,
}

impl InferenceConfig {
    /// Check the option ranges.
    pub fn validate(&self) -> MSResult<()> {
        if let Some(temperature) = self.temperature
            && !TEMPERATURE_RANGE.contains(&temperature)
        {
            return Err(MergescopeError::InvalidConfig(format!(
                "temperature ({temperature}) must be in [0, 5]"
            )));
        }
        Ok(())
    }

    /// Set the token cap and return the config.
    pub fn with_num_tokens(
        mut self,
        num_tokens: u32,
    ) -> Self {
        self.num_tokens = Some(num_tokens);
        self
    }

    /// Set the temperature and return the config.
    pub fn with_temperature(
        mut self,
        temperature: f32,
    ) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the candidate width and return the config.
    pub fn with_top_k(
        mut self,
        top_k: u32,
    ) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Set the synthetic wait and return the config.
    pub fn with_synthetic_wait(
        mut self,
        synthetic_wait: u32,
    ) -> Self {
        self.synthetic_wait = Some(synthetic_wait);
        self
    }
}
