//! # Message Transports
//!
//! A transport is a bidirectional text-message channel, such as a websocket.
//! Inbound traffic is reported through a [`MessageSink`]; outbound traffic
//! goes through [`MessageTransport::send`].

use std::sync::Arc;

use crate::{
    errors::{MSResult, MergescopeError},
    inference::inbox::{InboundEvent, Inbox},
};

/// The delivery side of a session [`Inbox`].
///
/// Handed to a transport at connect time; transports call it from their
/// own callbacks, in arrival order.
#[derive(Clone)]
pub struct MessageSink {
    inbox: Arc<Inbox>,
}

impl MessageSink {
    /// Wrap an inbox.
    pub fn new(inbox: Arc<Inbox>) -> Self {
        Self { inbox }
    }

    /// Report an arbitrary event.
    pub fn deliver(
        &self,
        event: InboundEvent,
    ) {
        self.inbox.deliver(event);
    }

    /// Report that the connection is open.
    pub fn opened(&self) {
        self.deliver(InboundEvent::Opened);
    }

    /// Report an inbound text message.
    pub fn message(
        &self,
        text: impl Into<String>,
    ) {
        self.deliver(InboundEvent::Message(text.into()));
    }

    /// Report a transport failure.
    pub fn failed(
        &self,
        reason: impl Into<String>,
    ) {
        self.deliver(InboundEvent::Failed(reason.into()));
    }

    /// Report that the remote end closed the connection.
    pub fn closed(&self) {
        self.deliver(InboundEvent::Closed);
    }
}

/// An open, bidirectional text-message channel.
pub trait MessageTransport: Send {
    /// Send one text message.
    fn send(
        &mut self,
        text: String,
    ) -> MSResult<()>;

    /// Close the channel.
    ///
    /// Must tolerate repeated calls.
    fn close(&mut self);
}

/// Opens [`MessageTransport`]s.
pub trait TransportConnector: Send {
    /// The transport type produced.
    type Transport: MessageTransport + 'static;

    /// Begin opening a connection.
    ///
    /// The connection is usable once [`MessageSink::opened`] has been reported;
    /// implementations may report it before or after returning.
    fn connect(
        &self,
        sink: MessageSink,
    ) -> MSResult<Self::Transport>;
}

/// Owns a transport and closes it exactly once: on [`TransportGuard::close`],
/// or on drop.
pub(crate) struct TransportGuard<T: MessageTransport> {
    transport: Option<T>,
}

impl<T: MessageTransport> TransportGuard<T> {
    pub(crate) fn new(transport: T) -> Self {
        Self {
            transport: Some(transport),
        }
    }

    pub(crate) fn send(
        &mut self,
        text: String,
    ) -> MSResult<()> {
        match self.transport.as_mut() {
            Some(transport) => transport.send(text),
            None => Err(MergescopeError::Protocol(
                "send on a closed transport".to_string(),
            )),
        }
    }

    pub(crate) fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }
}

impl<T: MessageTransport> Drop for TransportGuard<T> {
    fn drop(&mut self) {
        self.close();
    }
}
