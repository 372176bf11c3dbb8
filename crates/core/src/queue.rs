//! Dual-channel event queue
//!
//! Every queue instance carries two FIFO channels: a normal channel
//! for events generated outside entity action code, and an internal
//! channel for events an entity raises on itself (plus initialization
//! events). `dequeue` always drains the internal channel first, so a
//! cascade of self-triggered transitions completes before the next
//! externally queued event is handled.

use crate::event::Event;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

#[derive(Default)]
struct Channels {
    internal: VecDeque<Event>,
    normal: VecDeque<Event>,
}

/// An ordered buffer of pending events with cooperative cancellation.
///
/// Appends never block (both channels are unbounded). `dequeue` is the
/// single suspension point: it parks the calling dispatcher until an
/// event arrives or the queue is closed.
pub struct EventQueue {
    channels: Mutex<Channels>,
    available: Notify,
    closed: AtomicBool,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(Channels::default()),
            available: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Append to the normal channel.
    pub fn push_normal(&self, event: Event) {
        self.push(event, false);
    }

    /// Append to the internal channel.
    pub fn push_internal(&self, event: Event) {
        self.push(event, true);
    }

    fn push(&self, event: Event, internal: bool) {
        if self.closed.load(Ordering::SeqCst) {
            tracing::debug!(entity = %event.entity, "event dropped, queue closed");
            return;
        }
        {
            let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
            if internal {
                channels.internal.push_back(event);
            } else {
                channels.normal.push_back(event);
            }
        }
        self.available.notify_one();
    }

    /// Remove the next event, preferring the internal channel.
    ///
    /// Suspends while both channels are empty. Returns `None` once the
    /// queue has been closed; events still buffered at that point are
    /// dropped (shutdown is best-effort).
    pub async fn dequeue(&self) -> Option<Event> {
        loop {
            if self.closed.load(Ordering::SeqCst) {
                return None;
            }
            // Register for a wakeup before checking, so a push that
            // lands between the check and the await is not lost.
            let notified = self.available.notified();
            if let Some(event) = self.try_dequeue() {
                return Some(event);
            }
            if self.closed.load(Ordering::SeqCst) {
                return None;
            }
            notified.await;
        }
    }

    fn try_dequeue(&self) -> Option<Event> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .internal
            .pop_front()
            .or_else(|| channels.normal.pop_front())
    }

    /// Close the queue, unblocking any pending `dequeue`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        // notify_one stores a permit even with no waiter registered,
        // so a dispatcher about to park still observes the close.
        self.available.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of buffered events across both channels.
    pub fn len(&self) -> usize {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels.internal.len() + channels.normal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
