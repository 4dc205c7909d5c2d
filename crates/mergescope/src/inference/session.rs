//! # Streaming Inference Sessions
//!
//! An [`InferenceSession`] is a lazy, finite [`Stream`] of generated token batches.
//!
//! Nothing happens until the first poll; then the session:
//! 1. connects, and waits for the transport to open;
//! 2. sends one [`InferenceRequest`];
//! 3. yields the ``tokens`` of each response, in arrival order;
//! 4. ends after the response marked ``done``.
//!
//! The transport is closed on every exit path: completion, failure,
//! cancellation, and dropping the session mid-stream.

use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::{Stream, StreamExt, stream};
use parking_lot::Mutex;

use crate::{
    errors::{MSResult, MergescopeError},
    inference::{
        CancellationToken,
        InferenceConfig,
        inbox::{InboundEvent, Inbox},
        messages::{InferenceAction, InferenceRequest, InferenceResponse},
        transport::{MessageSink, TransportConnector, TransportGuard},
    },
    types::TokenId,
};

/// The lifecycle of an [`InferenceSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not yet open.
    Connecting,

    /// Open; the request has been sent.
    Open,

    /// At least one batch has been received.
    StreamingTokens,

    /// Finished normally, or cancelled.
    Closed,

    /// Finished with an error.
    Errored,
}

impl SessionState {
    /// Is this a final state?
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Errored)
    }
}

#[derive(Clone)]
struct StateCell {
    request_id: Arc<str>,
    state: Arc<Mutex<SessionState>>,
}

impl StateCell {
    fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.into(),
            state: Arc::new(Mutex::new(SessionState::Connecting)),
        }
    }

    fn get(&self) -> SessionState {
        *self.state.lock()
    }

    fn set(
        &self,
        next: SessionState,
    ) {
        let mut state = self.state.lock();
        if *state != next {
            log::debug!(
                "session {}: {:?} -> {:?}",
                self.request_id,
                *state,
                next
            );
            *state = next;
        }
    }
}

/// Everything needed to open a session, held until the first poll.
struct Launch<C> {
    connector: C,
    request: InferenceRequest,
    config: InferenceConfig,
    cancel: CancellationToken,
    state: StateCell,
}

/// A live connection.
struct Driver<C: TransportConnector> {
    request_id: String,
    inbox: Arc<Inbox>,
    transport: TransportGuard<C::Transport>,
    cancel: CancellationToken,
    state: StateCell,
}

enum Phase<C: TransportConnector> {
    Launch(Launch<C>),
    Streaming(Driver<C>),
    Finished,
}

enum Step {
    Batch(Vec<TokenId>),
    Final(Vec<TokenId>),
    Cancelled,
    Failed(MergescopeError),
}

impl<C: TransportConnector> Launch<C> {
    /// Connect, wait for open, and send the request.
    ///
    /// ## Returns
    /// The live driver; ``None`` if cancelled first.
    async fn open(self) -> MSResult<Option<Driver<C>>> {
        let Launch {
            connector,
            request,
            config,
            cancel,
            state,
        } = self;

        if let Err(err) = config.validate() {
            state.set(SessionState::Errored);
            return Err(err);
        }

        if cancel.is_cancelled() {
            log::debug!("session {}: cancelled before connect", request.request_id);
            state.set(SessionState::Closed);
            return Ok(None);
        }

        let inbox = Arc::new(Inbox::new());
        let transport = match connector.connect(MessageSink::new(inbox.clone())) {
            Ok(transport) => transport,
            Err(err) => {
                log::warn!("session {}: connect failed: {err}", request.request_id);
                state.set(SessionState::Errored);
                return Err(err);
            }
        };

        let mut driver = Driver {
            request_id: request.request_id.clone(),
            inbox,
            transport: TransportGuard::new(transport),
            cancel,
            state,
        };

        match driver.inbox.next().await {
            InboundEvent::Opened => {}
            InboundEvent::Message(_) => {
                return Err(driver.fail(MergescopeError::Protocol(
                    "message received before open".to_string(),
                )));
            }
            InboundEvent::Failed(reason) => {
                return Err(driver.fail(MergescopeError::Protocol(format!(
                    "transport failed while connecting: {reason}"
                ))));
            }
            InboundEvent::Closed => {
                return Err(driver.fail(MergescopeError::Protocol(
                    "connection closed while connecting".to_string(),
                )));
            }
        }

        if driver.cancel.is_cancelled() {
            driver.cancelled();
            return Ok(None);
        }

        let text = match request.encode() {
            Ok(text) => text,
            Err(err) => return Err(driver.fail(err)),
        };
        if let Err(err) = driver.transport.send(text) {
            return Err(driver.fail(err));
        }

        let InferenceAction::AutoregressiveInference {
            model_id,
            token_input,
            ..
        } = &request.action;
        log::debug!(
            "session {}: request sent; model {model_id:?}, {} input tokens",
            driver.request_id,
            token_input.len()
        );
        driver.state.set(SessionState::Open);
        Ok(Some(driver))
    }
}

impl<C: TransportConnector> Driver<C> {
    fn finish(
        &mut self,
        state: SessionState,
    ) {
        self.transport.close();
        self.state.set(state);
    }

    fn cancelled(&mut self) {
        log::debug!("session {}: cancelled", self.request_id);
        self.finish(SessionState::Closed);
    }

    fn fail(
        &mut self,
        err: MergescopeError,
    ) -> MergescopeError {
        log::warn!("session {}: {err}", self.request_id);
        self.finish(SessionState::Errored);
        err
    }

    /// Wait for, and classify, the next response.
    async fn step(&mut self) -> Step {
        loop {
            if self.cancel.is_cancelled() {
                self.cancelled();
                return Step::Cancelled;
            }

            let text = match self.inbox.next().await {
                InboundEvent::Message(text) => text,
                InboundEvent::Opened => {
                    log::warn!("session {}: ignoring duplicate open", self.request_id);
                    continue;
                }
                InboundEvent::Failed(reason) => {
                    return Step::Failed(self.fail(MergescopeError::Protocol(format!(
                        "transport failed: {reason}"
                    ))));
                }
                InboundEvent::Closed => {
                    return Step::Failed(self.fail(MergescopeError::Protocol(
                        "connection closed before the final response".to_string(),
                    )));
                }
            };

            let decoded = InferenceResponse::decode_for(&text, &self.request_id);

            // A cancelled session ends cleanly, even on an undecodable message.
            if self.cancel.is_cancelled() {
                self.cancelled();
                return Step::Cancelled;
            }

            let response = match decoded {
                Ok(response) => response,
                Err(err) => return Step::Failed(self.fail(err)),
            };

            if response.done {
                self.finish(SessionState::Closed);
                return Step::Final(response.tokens);
            }

            self.state.set(SessionState::StreamingTokens);
            return Step::Batch(response.tokens);
        }
    }
}

/// A streaming autoregressive inference session.
///
/// Yields ``Ok(batch)`` per response, and at most one ``Err`` as its last item.
/// Cancellation ends the stream without an error.
///
/// ## Example
/// ```rust,ignore
/// let mut session = InferenceSession::start(
///     connector,
///     "causal1",
///     vocab.tokenize_ids(b"hello", &Default::default()),
///     InferenceConfig::default().with_num_tokens(16),
///     CancellationToken::new(),
/// );
/// while let Some(batch) = session.next().await {
///     println!("{:?}", vocab.decode(&batch?)?);
/// }
/// ```
pub struct InferenceSession {
    request_id: String,
    state: StateCell,
    batches: Pin<Box<dyn Stream<Item = MSResult<Vec<TokenId>>> + Send>>,
}

impl InferenceSession {
    /// Create a session; nothing is sent until the first poll.
    ///
    /// ## Arguments
    /// * `connector` - opens the transport.
    /// * `model_id` - the model to run.
    /// * `token_ids` - the prompt.
    /// * `config` - generation options; validated on the first poll.
    /// * `cancel` - cooperative cancellation signal.
    pub fn start<C>(
        connector: C,
        model_id: impl Into<String>,
        token_ids: Vec<TokenId>,
        config: InferenceConfig,
        cancel: CancellationToken,
    ) -> Self
    where
        C: TransportConnector + 'static,
    {
        let request_id = uuid::Uuid::new_v4().to_string();
        let state = StateCell::new(&request_id);

        let launch = Launch {
            connector,
            request: InferenceRequest::autoregressive(&request_id, model_id, token_ids, config),
            config,
            cancel,
            state: state.clone(),
        };

        let batches = stream::unfold(Phase::Launch(launch), |phase| async move {
            let mut driver = match phase {
                Phase::Finished => return None,
                Phase::Streaming(driver) => driver,
                Phase::Launch(launch) => match launch.open().await {
                    Ok(Some(driver)) => driver,
                    Ok(None) => return None,
                    Err(err) => return Some((Err(err), Phase::Finished)),
                },
            };

            match driver.step().await {
                Step::Batch(tokens) => Some((Ok(tokens), Phase::Streaming(driver))),
                Step::Final(tokens) => Some((Ok(tokens), Phase::Finished)),
                Step::Cancelled => None,
                Step::Failed(err) => Some((Err(err), Phase::Finished)),
            }
        })
        .fuse();

        Self {
            request_id,
            state,
            batches: Box::pin(batches),
        }
    }

    /// The correlation id sent with the request.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Drain the session, concatenating every batch.
    pub async fn collect_tokens(mut self) -> MSResult<Vec<TokenId>> {
        let mut tokens = Vec::new();
        while let Some(batch) = self.next().await {
            tokens.extend(batch?);
        }
        Ok(tokens)
    }
}

impl Stream for InferenceSession {
    type Item = MSResult<Vec<TokenId>>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.batches.as_mut().poll_next(cx)
    }
}
