//! # Scripted Transports
//!
//! In-process [`TransportConnector`]s for exercising sessions without a server.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    errors::{MSResult, MergescopeError},
    inference::{
        messages::{InferenceRequest, InferenceResponse},
        transport::{MessageSink, MessageTransport, TransportConnector},
    },
    types::TokenId,
};

/// One scripted reply, played back after the request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// A well-formed response echoing the request id.
    Tokens {
        /// The token batch.
        tokens: Vec<TokenId>,

        /// The done flag.
        done: bool,
    },

    /// A raw text message, delivered verbatim.
    Raw(String),

    /// A transport failure.
    Fail(String),

    /// A remote close.
    Close,
}

impl ScriptedReply {
    /// A non-final token batch.
    pub fn batch(tokens: &[TokenId]) -> Self {
        Self::Tokens {
            tokens: tokens.to_vec(),
            done: false,
        }
    }

    /// The final token batch.
    pub fn done(tokens: &[TokenId]) -> Self {
        Self::Tokens {
            tokens: tokens.to_vec(),
            done: true,
        }
    }
}

/// What the scripted transports observed.
#[derive(Debug, Clone, Default)]
pub struct TransportLog {
    /// Number of successful connects.
    pub connects: usize,

    /// Every message sent, in order.
    pub sent: Vec<String>,

    /// Number of `close()` calls.
    pub closes: usize,
}

impl TransportLog {
    /// The first sent message, parsed as a request.
    pub fn request(&self) -> Option<InferenceRequest> {
        self.sent
            .first()
            .and_then(|text| serde_json::from_str(text).ok())
    }
}

/// A connector which opens immediately and plays back a script.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    script: Vec<ScriptedReply>,
    refuse: Option<String>,
    log: Arc<Mutex<TransportLog>>,
    sink: Arc<Mutex<Option<MessageSink>>>,
}

impl ScriptedConnector {
    /// Play back `script` once the request has been sent.
    pub fn new(script: Vec<ScriptedReply>) -> Self {
        Self {
            script,
            ..Default::default()
        }
    }

    /// Open, but deliver nothing; drive the session through [`ScriptedConnector::sink`].
    pub fn manual() -> Self {
        Self::default()
    }

    /// Fail every connect attempt.
    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            refuse: Some(reason.into()),
            ..Default::default()
        }
    }

    /// A snapshot of the transport log.
    pub fn log(&self) -> TransportLog {
        self.log.lock().clone()
    }

    /// The sink of the most recent connection.
    pub fn sink(&self) -> Option<MessageSink> {
        self.sink.lock().clone()
    }
}

impl TransportConnector for ScriptedConnector {
    type Transport = ScriptedTransport;

    fn connect(
        &self,
        sink: MessageSink,
    ) -> MSResult<ScriptedTransport> {
        if let Some(reason) = &self.refuse {
            return Err(MergescopeError::Protocol(format!(
                "connection refused: {reason}"
            )));
        }

        self.log.lock().connects += 1;
        *self.sink.lock() = Some(sink.clone());
        sink.opened();

        Ok(ScriptedTransport {
            sink,
            script: self.script.clone(),
            log: self.log.clone(),
            closed: false,
        })
    }
}

/// The transport produced by [`ScriptedConnector`].
pub struct ScriptedTransport {
    sink: MessageSink,
    script: Vec<ScriptedReply>,
    log: Arc<Mutex<TransportLog>>,
    closed: bool,
}

impl MessageTransport for ScriptedTransport {
    fn send(
        &mut self,
        text: String,
    ) -> MSResult<()> {
        if self.closed {
            return Err(MergescopeError::Protocol(
                "send on a closed transport".to_string(),
            ));
        }

        let request: InferenceRequest = serde_json::from_str(&text)
            .map_err(|e| MergescopeError::Protocol(format!("malformed request: {e}")))?;
        self.log.lock().sent.push(text);

        for reply in self.script.drain(..) {
            match reply {
                ScriptedReply::Tokens { tokens, done } => {
                    let response = InferenceResponse::new(&request.request_id, tokens, done);
                    self.sink.message(response.encode()?);
                }
                ScriptedReply::Raw(text) => self.sink.message(text),
                ScriptedReply::Fail(reason) => self.sink.failed(reason),
                ScriptedReply::Close => self.sink.closed(),
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
        self.log.lock().closes += 1;
    }
}
