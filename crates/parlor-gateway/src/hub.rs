//! Per-room broadcast hub.
//!
//! The hub keeps, for every room with at least one open event stream, the
//! ordered list of its subscribers. Each subscriber owns a bounded queue
//! drained by its HTTP response and a keep-alive task that pushes a
//! heartbeat into the same queue on a fixed interval.
//!
//! Delivery is best effort and never blocks: a subscriber whose queue is
//! full or closed is dropped on the spot, together with its keep-alive.
//! The hub retains no messages, so clients that reconnect re-fetch history
//! from the store.
//!
//! # Locking
//!
//! The subscriber table sits behind a [`std::sync::Mutex`] that is never
//! held across an `.await`. Publishing to a room holds the lock for the
//! whole fan-out, so two concurrent publishes to the same room reach every
//! subscriber in the same order.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use parlor_types::{ChatMessage, SubscriberId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Shortest heartbeat interval the hub will schedule.
const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1);

/// An event queued for one subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEvent {
    /// Keep-alive with no payload.
    Heartbeat,
    /// A chat message, already serialized to JSON.
    Message(Arc<str>),
}

/// Identifies one registered subscriber inside the hub.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    jid: String,
    id: SubscriberId,
}

impl SubscriptionHandle {
    /// The room this subscriber listens to.
    pub fn jid(&self) -> &str {
        &self.jid
    }

    /// The subscriber's unique identifier.
    pub const fn id(&self) -> SubscriberId {
        self.id
    }
}

struct Subscriber {
    id: SubscriberId,
    tx: mpsc::Sender<HubEvent>,
    keepalive: JoinHandle<()>,
}

impl Subscriber {
    /// Stop the keep-alive task. Dropping `self` closes the queue.
    fn close(self) {
        self.keepalive.abort();
    }
}

#[derive(Default)]
struct Table {
    rooms: HashMap<String, Vec<Subscriber>>,
    closed: bool,
}

struct HubInner {
    table: Mutex<Table>,
    heartbeat_interval: Duration,
    buffer: usize,
}

impl HubInner {
    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove one subscriber. Returns `false` if it was already gone.
    fn remove(&self, handle: &SubscriptionHandle) -> bool {
        let removed = {
            let mut table = self.lock();
            let Some(subscribers) = table.rooms.get_mut(&handle.jid) else {
                return false;
            };
            let Some(pos) = subscribers.iter().position(|s| s.id == handle.id) else {
                return false;
            };
            let removed = subscribers.remove(pos);
            if subscribers.is_empty() {
                table.rooms.remove(&handle.jid);
            }
            removed
        };
        removed.close();
        true
    }
}

/// Room-scoped fan-out of chat messages to open event streams.
///
/// Cheap to clone; all clones share the same subscriber table.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

impl Hub {
    /// Create an empty hub.
    ///
    /// `heartbeat_interval` is the period of each subscriber's keep-alive
    /// and `buffer` the depth of each subscriber's queue.
    pub fn new(heartbeat_interval: Duration, buffer: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                table: Mutex::new(Table::default()),
                heartbeat_interval: heartbeat_interval.max(MIN_HEARTBEAT_INTERVAL),
                buffer: buffer.max(1),
            }),
        }
    }

    /// Register a new subscriber to a room and start its keep-alive.
    ///
    /// Dropping the returned [`Subscription`] unregisters it. After
    /// [`shutdown`](Self::shutdown) the subscription is returned already
    /// closed and yields nothing.
    pub fn subscribe(&self, jid: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(self.inner.buffer);
        let handle = SubscriptionHandle {
            jid: jid.to_owned(),
            id: SubscriberId::new(),
        };

        let mut table = self.inner.lock();
        if table.closed {
            debug!(room = jid, "Hub is shut down, returning closed subscription");
            return Subscription {
                handle,
                rx,
                hub: Weak::new(),
            };
        }

        let keepalive = tokio::spawn(keepalive(
            Arc::downgrade(&self.inner),
            handle.clone(),
            tx.clone(),
            self.inner.heartbeat_interval,
        ));
        let subscribers = table.rooms.entry(handle.jid.clone()).or_default();
        subscribers.push(Subscriber {
            id: handle.id,
            tx,
            keepalive,
        });
        debug!(
            room = jid,
            subscriber = %handle.id,
            subscribers = subscribers.len(),
            "Subscriber registered"
        );
        drop(table);

        Subscription {
            handle,
            rx,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a subscriber and stop its keep-alive.
    ///
    /// Returns `false` if it had already been removed.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let removed = self.inner.remove(handle);
        if removed {
            debug!(room = handle.jid, subscriber = %handle.id, "Subscriber removed");
        }
        removed
    }

    /// Deliver a message to every current subscriber of a room.
    ///
    /// The message is serialized once and queued for each subscriber in
    /// registration order. Subscribers that cannot accept it are removed.
    /// Returns the number of subscribers the message was queued for;
    /// publishing to a room nobody watches returns `0`.
    pub fn publish(&self, jid: &str, message: &ChatMessage) -> usize {
        let payload: Arc<str> = match serde_json::to_string(message) {
            Ok(json) => Arc::from(json),
            Err(e) => {
                warn!(room = jid, "Failed to serialize chat message: {e}");
                return 0;
            }
        };

        let (delivered, dropped) = {
            let mut table = self.inner.lock();
            let Some(subscribers) = table.rooms.get_mut(jid) else {
                return 0;
            };

            let mut kept = Vec::with_capacity(subscribers.len());
            let mut dropped = Vec::new();
            for subscriber in subscribers.drain(..) {
                match subscriber.tx.try_send(HubEvent::Message(Arc::clone(&payload))) {
                    Ok(()) => kept.push(subscriber),
                    Err(e) => {
                        debug!(room = jid, subscriber = %subscriber.id, "Dropping subscriber: {e}");
                        dropped.push(subscriber);
                    }
                }
            }

            let delivered = kept.len();
            if kept.is_empty() {
                table.rooms.remove(jid);
            } else {
                *subscribers = kept;
            }
            (delivered, dropped)
        };

        for subscriber in dropped {
            subscriber.close();
        }
        delivered
    }

    /// Close every subscription and refuse new ones.
    ///
    /// Open event streams end once their queued events are drained.
    pub fn shutdown(&self) {
        let drained: Vec<Subscriber> = {
            let mut table = self.inner.lock();
            table.closed = true;
            table.rooms.drain().flat_map(|(_, subs)| subs).collect()
        };

        let count = drained.len();
        for subscriber in drained {
            subscriber.close();
        }
        info!(subscribers = count, "Broadcast hub shut down");
    }

    /// Number of open subscriptions to a room.
    pub fn subscriber_count(&self, jid: &str) -> usize {
        self.inner.lock().rooms.get(jid).map_or(0, Vec::len)
    }

    /// Number of rooms with at least one open subscription.
    pub fn room_count(&self) -> usize {
        self.inner.lock().rooms.len()
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.inner.lock().closed
    }
}

impl core::fmt::Debug for Hub {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hub")
            .field("rooms", &self.room_count())
            .field("heartbeat_interval", &self.inner.heartbeat_interval)
            .field("buffer", &self.inner.buffer)
            .finish()
    }
}

/// Push a heartbeat every `period` until the queue stops accepting them.
async fn keepalive(
    hub: Weak<HubInner>,
    handle: SubscriptionHandle,
    tx: mpsc::Sender<HubEvent>,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if let Err(e) = tx.try_send(HubEvent::Heartbeat) {
            debug!(room = handle.jid, subscriber = %handle.id, "Heartbeat failed: {e}");
            drop(tx);
            if let Some(inner) = hub.upgrade() {
                inner.remove(&handle);
            }
            return;
        }
    }
}

/// The receiving end of one subscriber's queue.
///
/// Implements [`Stream`]; the stream ends when the hub drops the
/// subscriber or shuts down. Dropping the subscription unregisters it.
pub struct Subscription {
    handle: SubscriptionHandle,
    rx: mpsc::Receiver<HubEvent>,
    hub: Weak<HubInner>,
}

impl Subscription {
    /// The hub-side handle of this subscription.
    pub const fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    /// Wait for the next event. Returns `None` once the subscription is closed.
    pub async fn recv(&mut self) -> Option<HubEvent> {
        self.rx.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<HubEvent> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = HubEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.hub.upgrade() {
            inner.remove(&self.handle);
        }
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
