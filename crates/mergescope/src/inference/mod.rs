//! # Streaming Inference
//!
//! Client-side sessions against a remote autoregressive model.
//!
//! An [`InferenceSession`] sends one request over a [`MessageTransport`]
//! and yields the generated token batches as a [`futures::Stream`].
//! Transports are pluggable through [`TransportConnector`].

mod cancel;
mod config;
mod inbox;
mod messages;
mod session;
mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[doc(inline)]
pub use cancel::CancellationToken;
#[doc(inline)]
pub use config::{InferenceConfig, TEMPERATURE_RANGE};
#[doc(inline)]
pub use inbox::{InboundEvent, Inbox};
#[doc(inline)]
pub use messages::{InferenceAction, InferenceRequest, InferenceResponse, ResponseKind};
#[doc(inline)]
pub use session::{InferenceSession, SessionState};
#[doc(inline)]
pub use transport::{MessageSink, MessageTransport, TransportConnector};
