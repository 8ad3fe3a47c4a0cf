// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live update fan-out to connected check-in clients.
//!
//! Each subscriber owns a bounded queue drained by its WebSocket task. A
//! broadcast serializes the message once and offers it to every open
//! subscriber; a closed or full queue counts as a disconnect and the
//! subscriber is dropped on the spot. The whole fan-out runs under one lock,
//! so each subscriber receives broadcasts in the order they were issued.

use crate::models::LiveMessage;
use crate::time_utils::format_utc_rfc3339;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Frames queued per subscriber before it is considered dead.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 256;

pub type SubscriberId = u64;

/// Serialized frame shared by all subscribers of one broadcast.
pub type Frame = Arc<str>;

/// Lifecycle of a subscriber channel. `Closed` and `Errored` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
    Errored,
}

/// Receiving half handed to the connection task.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<Frame>,
}

/// Outcome of one broadcast, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Subscribers a send was attempted on.
    pub attempted: usize,
    pub delivered: usize,
    /// Subscribers dropped because the send failed or the channel was shut.
    pub dropped: usize,
}

struct Subscriber {
    sender: mpsc::Sender<Frame>,
    state: ChannelState,
}

impl Subscriber {
    /// Offer `frame`, moving to a terminal state on failure.
    fn deliver(&mut self, frame: &Frame) -> ChannelState {
        if self.state != ChannelState::Open && self.state != ChannelState::Connecting {
            return self.state;
        }
        if self.sender.is_closed() {
            self.state = ChannelState::Closed;
            return self.state;
        }
        self.state = match self.sender.try_send(frame.clone()) {
            Ok(()) => ChannelState::Open,
            Err(mpsc::error::TrySendError::Closed(_)) => ChannelState::Closed,
            Err(mpsc::error::TrySendError::Full(_)) => ChannelState::Errored,
        };
        self.state
    }
}

struct Inner {
    subscribers: Mutex<HashMap<SubscriberId, Subscriber>>,
    next_id: AtomicU64,
    capacity: usize,
}

/// Shared broadcaster handle.
#[derive(Clone)]
pub struct Broadcaster {
    inner: Arc<Inner>,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_CAPACITY)
    }
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                subscribers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
            }),
        }
    }

    fn subscribers(&self) -> MutexGuard<'_, HashMap<SubscriberId, Subscriber>> {
        match self.inner.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Add a subscriber and queue its `connected` acknowledgement.
    pub fn register(&self) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.inner.capacity);
        let mut subscriber = Subscriber {
            sender,
            state: ChannelState::Connecting,
        };

        let welcome = LiveMessage::Connected {
            subscriber_id: id,
            connected_at: format_utc_rfc3339(chrono::Utc::now()),
        };

        let mut subscribers = self.subscribers();
        match serialize(&welcome) {
            Some(frame) if subscriber.deliver(&frame) == ChannelState::Open => {
                subscribers.insert(id, subscriber);
                tracing::info!(
                    subscriber_id = id,
                    subscribers = subscribers.len(),
                    "Live subscriber registered"
                );
            }
            _ => {
                tracing::warn!(subscriber_id = id, "Live subscriber failed before opening");
            }
        }

        Subscription { id, receiver }
    }

    /// Remove a subscriber. Unknown or already removed ids are ignored.
    pub fn unregister(&self, id: SubscriberId) {
        if self.subscribers().remove(&id).is_some() {
            tracing::info!(subscriber_id = id, "Live subscriber unregistered");
        }
    }

    /// Send `message` to every open subscriber, pruning dead ones.
    ///
    /// Failures are never returned; they only shrink the subscriber set.
    pub fn broadcast(&self, message: &LiveMessage) -> BroadcastReport {
        let Some(frame) = serialize(message) else {
            return BroadcastReport::default();
        };

        let mut report = BroadcastReport::default();
        let mut subscribers = self.subscribers();

        subscribers.retain(|id, subscriber| {
            report.attempted += 1;
            match subscriber.deliver(&frame) {
                ChannelState::Open => {
                    report.delivered += 1;
                    true
                }
                state => {
                    report.dropped += 1;
                    tracing::info!(subscriber_id = id, ?state, "Dropping live subscriber");
                    false
                }
            }
        });

        tracing::debug!(
            attempted = report.attempted,
            delivered = report.delivered,
            dropped = report.dropped,
            "Live update broadcast"
        );
        report
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    /// State of a registered subscriber; `None` once it has been removed.
    pub fn state(&self, id: SubscriberId) -> Option<ChannelState> {
        self.subscribers().get(&id).map(|s| s.state)
    }
}

fn serialize(message: &LiveMessage) -> Option<Frame> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Arc::from(json)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize live message");
            None
        }
    }
}
