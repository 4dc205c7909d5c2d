//! # Vocabulary
//!
//! This module provides the merge-rule vocabulary and related io mechanisms.
//!
//! ## Tokens
//!
//! A [`Vocabulary`] owns a dense arena of [`Token`]s:
//! * ids ``0..=255`` are the byte tokens,
//! * id ``256 + k`` is minted by merge rule `k`.
//!
//! Each token records its ``(left, right)`` composition and the
//! tokens which used it as a left/right half; all as dense ids.
//!
//! ## Tokenization
//!
//! [`Vocabulary::tokenize`] applies merge rules in priority order;
//! see [`merge_scan`].
//!
//! ## Training
//!
//! With the ``training`` feature, ``training::BpeTrainer`` learns new
//! merge rules from byte corpora.
pub mod history;
pub mod io;
pub mod merge_scan;
pub mod token;
#[cfg(feature = "training")]
pub mod training;
pub mod utility;
pub mod vocabulary;

#[doc(inline)]
pub use history::{HistoryNode, HistoryTree};
#[doc(inline)]
pub use merge_scan::{MergeScanner, TokenChain, TokenizeOptions};
#[doc(inline)]
pub use token::Token;
#[doc(inline)]
pub use vocabulary::{MergeRule, Vocabulary};
