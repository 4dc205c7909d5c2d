//! # Backend Client Support
//!
//! Endpoint configuration, per-model caching, and the REST document shapes
//! of the inference backend. No HTTP stack is bundled; bring your own.

mod cache;
mod options;
mod types;

#[doc(inline)]
pub use cache::ModelCache;
#[doc(inline)]
pub use options::{BASE_URL_ENV_VARS, ClientOptions, DEFAULT_BASE_URL, join_url};
#[doc(inline)]
pub use types::{LogitsRequest, LogitsResponse, TokenInfo};
