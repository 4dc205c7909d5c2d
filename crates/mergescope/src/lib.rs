//! # `mergescope` Merge-Rule Vocabulary Explorer
//!
//! Tools for inspecting how a BPE merge-rule vocabulary builds its tokens,
//! and for streaming generated tokens from a remote model.
//!
//! See:
//! * [`vocab`] to build a [`Vocabulary`], tokenize text, and unfold token histories.
//! * [`inference`] to run a streaming [`InferenceSession`].
//! * [`client`] for backend endpoints, per-model caching, and REST documents.
//!
//! ## Crate Features
//!
//! #### feature: ``default``
//!
//! * ``ahash``
//! * ``training``
//!
//! #### feature: ``ahash``
//!
//! This swaps all `HashMap`/`HashSet` implementations for ``ahash``; which is a performance
//! win on many/(most?) modern CPUs.
//!
//! This is done by the ``types::MS{*}`` type alias machinery.
//!
//! #### feature: ``training``
//!
//! Enables the BPE merge-rule trainer in ``vocab::training``.
//!
//! #### feature: ``testing``
//!
//! Exports the in-process scripted transports in ``inference::testing``.
//!
//! ## Loading a Vocabulary
//!
//! ```rust,ignore
//! use mergescope::vocab::{TokenizeOptions, Vocabulary};
//!
//! let vocab = Vocabulary::from_base64("AGEAYgEAAGM=")?;
//!
//! let tokens = vocab.tokenize_str("abcab", &TokenizeOptions::default());
//! for token in &tokens {
//!     println!("{} {}", token.id(), token.display_debug());
//! }
//!
//! let tree = vocab.history_tree(257)?;
//! println!("{}", serde_json::to_string_pretty(&tree)?);
//! ```
//!
//! ## Streaming Inference
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use mergescope::inference::{CancellationToken, InferenceConfig, InferenceSession};
//!
//! let mut session = InferenceSession::start(
//!     connector,
//!     "causal1",
//!     vocab.tokenize_ids(b"hello", &Default::default()),
//!     InferenceConfig::default().with_temperature(0.8),
//!     CancellationToken::new(),
//! );
//! while let Some(batch) = session.next().await {
//!     print!("{}", String::from_utf8_lossy(&vocab.decode(&batch?)?));
//! }
//! ```
#![warn(missing_docs, unused)]

pub mod client;
pub mod errors;
pub mod inference;
pub mod types;
pub mod vocab;

#[doc(inline)]
pub use errors::{MSResult, MergescopeError};
#[doc(inline)]
pub use inference::{CancellationToken, InferenceConfig, InferenceSession};
#[doc(inline)]
pub use types::TokenId;
#[doc(inline)]
pub use vocab::{HistoryTree, Token, Vocabulary};
