//! # Training Config

use crate::{
    errors::{MSResult, MergescopeError},
    types::{BYTE_TOKEN_COUNT, TokenId},
};

/// The default batch merge threshold.
pub const DEFAULT_ETA: f64 = 0.5;

/// Options for [`super::BpeTrainer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    /// Batch merge threshold, in ``(0, 1]``.
    ///
    /// Each step merges every non-conflicting pair whose count is at least
    /// `eta` times the step's top count; ``1.0`` merges only the top pairs.
    pub eta: f64,

    /// The longest merged token value, in bytes; `None` for no limit.
    pub max_token_length: Option<usize>,

    /// Stop once the vocabulary holds this many tokens, byte tokens included.
    pub target_vocab_size: usize,
}

impl TrainConfig {
    /// Create a new config.
    ///
    /// ## Arguments
    /// * `target_vocab_size` - the target vocabulary size; must be >= 256.
    ///
    /// ## Returns
    /// A config with the default `eta` and no token length limit.
    pub fn new(target_vocab_size: usize) -> Self {
        Self {
            eta: DEFAULT_ETA,
            max_token_length: None,
            target_vocab_size,
        }
    }

    /// Check every value is in range.
    pub fn validate(&self) -> MSResult<()> {
        if !(self.eta > 0.0 && self.eta <= 1.0) {
            return Err(MergescopeError::InvalidConfig(format!(
                "eta ({}) must be in (0, 1]",
                self.eta
            )));
        }
        if self.max_token_length == Some(0) || self.max_token_length == Some(1) {
            return Err(MergescopeError::InvalidConfig(
                "max_token_length must be at least 2".to_string(),
            ));
        }
        if self.target_vocab_size < BYTE_TOKEN_COUNT
            || TokenId::try_from(self.target_vocab_size).is_err()
        {
            return Err(MergescopeError::InvalidConfig(format!(
                "target_vocab_size ({}) must be in [{BYTE_TOKEN_COUNT}, {}]",
                self.target_vocab_size,
                TokenId::MAX
            )));
        }
        Ok(())
    }

    /// Get the batch merge threshold.
    pub fn eta(&self) -> f64 {
        self.eta
    }

    /// Set the batch merge threshold.
    pub fn set_eta(
        &mut self,
        eta: f64,
    ) {
        self.eta = eta;
    }

    /// Set the batch merge threshold and return the config.
    pub fn with_eta(
        mut self,
        eta: f64,
    ) -> Self {
        self.set_eta(eta);
        self
    }

    /// Get the max merged token length.
    pub fn max_token_length(&self) -> Option<usize> {
        self.max_token_length
    }

    /// Set the max merged token length.
    pub fn set_max_token_length(
        &mut self,
        max_token_length: Option<usize>,
    ) {
        self.max_token_length = max_token_length;
    }

    /// Set the max merged token length and return the config.
    pub fn with_max_token_length(
        mut self,
        max_token_length: Option<usize>,
    ) -> Self {
        self.set_max_token_length(max_token_length);
        self
    }

    /// Get the target vocabulary size.
    pub fn target_vocab_size(&self) -> usize {
        self.target_vocab_size
    }

    /// Set the target vocabulary size.
    pub fn set_target_vocab_size(
        &mut self,
        target_vocab_size: usize,
    ) {
        self.target_vocab_size = target_vocab_size;
    }

    /// Set the target vocabulary size and return the config.
    pub fn with_target_vocab_size(
        mut self,
        target_vocab_size: usize,
    ) -> Self {
        self.set_target_vocab_size(target_vocab_size);
        self
    }

    /// Does a merged value of `len` bytes fit the length limit?
    pub fn allows_length(
        &self,
        len: usize,
    ) -> bool {
        self.max_token_length.is_none_or(|max| len <= max)
    }
}
