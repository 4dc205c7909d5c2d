//! # Inbound Message Rendezvous
//!
//! A single-producer/single-consumer rendezvous between transport
//! delivery callbacks and the session's consumer.
//!
//! The [`Inbox`] holds either a FIFO queue of undelivered events, or at most
//! one parked consumer; never both.

use std::collections::VecDeque;

use futures::channel::oneshot;
use parking_lot::Mutex;

/// An event delivered by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// The connection is open.
    Opened,

    /// A raw inbound text message.
    Message(String),

    /// The transport failed.
    Failed(String),

    /// The connection was closed by the remote end.
    Closed,
}

#[derive(Default)]
struct InboxState {
    pending: VecDeque<InboundEvent>,
    waiter: Option<oneshot::Sender<InboundEvent>>,
}

impl InboxState {
    fn check_invariant(&self) {
        debug_assert!(
            self.pending.is_empty() || self.waiter.is_none(),
            "inbox has both pending events and a parked consumer"
        );
    }
}

/// Rendezvous queue between a transport and one consumer.
#[derive(Default)]
pub struct Inbox {
    state: Mutex<InboxState>,
}

impl Inbox {
    /// Create an empty inbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event.
    ///
    /// Hands the event directly to a parked consumer, if any;
    /// otherwise appends it to the pending queue.
    pub fn deliver(
        &self,
        event: InboundEvent,
    ) {
        let mut state = self.state.lock();

        let event = match state.waiter.take() {
            Some(waiter) => match waiter.send(event) {
                Ok(()) => return,
                // The parked `next()` call was abandoned.
                Err(event) => event,
            },
            None => event,
        };

        state.pending.push_back(event);
        state.check_invariant();
    }

    /// Receive the next event, in delivery order.
    ///
    /// Returns a buffered event immediately; otherwise parks until one is delivered.
    /// Only one consumer may call this at a time.
    pub async fn next(&self) -> InboundEvent {
        let receiver = {
            let mut state = self.state.lock();
            if let Some(event) = state.pending.pop_front() {
                return event;
            }

            let (sender, receiver) = oneshot::channel();
            state.waiter = Some(sender);
            state.check_invariant();
            receiver
        };

        receiver.await.unwrap_or(InboundEvent::Closed)
    }

    /// The number of buffered events.
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Is a consumer parked on [`Inbox::next`]?
    pub fn has_waiter(&self) -> bool {
        self.state
            .lock()
            .waiter
            .as_ref()
            .is_some_and(|waiter| !waiter.is_canceled())
    }
}
