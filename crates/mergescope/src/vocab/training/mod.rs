//! # Vocabulary Training
//!
//! Support for learning merge rules from byte corpora.
//!
//! Training proceeds in steps; each step:
//! * counts the adjacent pairs of every sample span ([`PairHistogram`]),
//! * selects a batch of non-overlapping pairs whose counts are within
//!   ``eta`` of the top count ([`TrainConfig::eta`]),
//! * mints one merge rule per pair ([`RuleBuilder`]) and applies them.
//!
//! ```rust,ignore
//! use mergescope::vocab::training::{BpeTrainer, TrainConfig};
//!
//! let mut trainer = BpeTrainer::new(
//!     TrainConfig::new(1024)
//!         .with_eta(0.8)
//!         .with_max_token_length(Some(16)),
//! );
//! trainer.update_from_samples(text.split_inclusive(' '));
//! let vocab = trainer.train()?;
//! save_rule_file_path(&vocab, "vocab.rules")?;
//! ```

pub mod bpe_trainer;
pub mod pair_histogram;
pub mod rule_builder;
pub mod train_config;

#[doc(inline)]
pub use bpe_trainer::BpeTrainer;
#[doc(inline)]
pub use pair_histogram::PairHistogram;
#[doc(inline)]
pub use rule_builder::RuleBuilder;
#[doc(inline)]
pub use train_config::{DEFAULT_ETA, TrainConfig};
