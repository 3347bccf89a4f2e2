/*!
 * Event Bus
 *
 * Carries stream lifecycle notifications into the cap controller and cap
 * notices back out. Inbound events go to every subscriber over its own
 * unbounded mpsc queue, so a slow subscriber never loses a lifecycle event.
 * Outbound notices use a broadcast channel.
 */

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::cap::CapLevel;
use crate::surface::PlaybackSurface;

/// Default notice channel capacity
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Inbound notifications the controller reacts to
#[derive(Debug, Clone)]
pub enum CapEvent {
    /// Frames were dropped while playing the rung at this index
    PerformanceDrop { dropped_rung_index: usize },
    /// A playback surface was attached
    SurfaceAttached(Arc<dyn PlaybackSurface>),
    /// A new manifest finished parsing
    ManifestParsed {
        first_rung_index: Option<usize>,
        has_video: bool,
    },
    /// Container inspection reported the codecs in the stream
    CodecsDetected { has_video: bool },
    /// The playback surface went away
    SurfaceDetached,
    /// The host rebuilt its rung list
    RungsUpdated,
    /// Runtime toggle of the master enable
    SetCapToSurfaceSize(bool),
}

/// Outbound notices published by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapNotice {
    /// An evaluation completed and published this cap
    CapUpdated(CapLevel),
    /// The cap loosened; the in-flight rung should be re-evaluated
    RungSwitchRequested { cap: CapLevel },
}

type Subscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<CapEvent>>>>;

/// Bus shared by the host and the controller.
///
/// Subscriptions see their queue close once every clone of the bus is gone.
#[derive(Debug, Clone)]
pub struct EventBus {
    subscribers: Subscribers,
    notices: broadcast::Sender<CapNotice>,
}

impl EventBus {
    /// Create a bus whose notice channel buffers `capacity` notices per listener
    pub fn new(capacity: usize) -> Self {
        let (notices, _) = broadcast::channel(capacity);
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            notices,
        }
    }

    /// Publish an inbound event. Returns the number of subscribers reached.
    pub fn publish(&self, event: CapEvent) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        // Dropped subscriptions close their queue; forget them here
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());

        if subscribers.is_empty() {
            debug!("No subscribers for cap event {:?}, dropping", event);
        }
        subscribers.len()
    }

    /// Register for inbound events. Dropping the subscription unregisters.
    pub fn subscribe(&self) -> Subscription {
        let (tx, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        debug!("Cap event subscriber registered");

        Subscription { receiver }
    }

    /// Listen for outbound cap notices
    pub fn notices(&self) -> broadcast::Receiver<CapNotice> {
        self.notices.subscribe()
    }

    /// Sender the controller publishes notices through
    pub fn notice_sender(&self) -> broadcast::Sender<CapNotice> {
        self.notices.clone()
    }

    /// Number of live inbound subscriptions
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

/// Registration on an [`EventBus`], released exactly once when dropped
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<CapEvent>,
}

impl Subscription {
    /// Wait for the next event. `None` once every bus handle is gone and
    /// the queue is drained.
    pub async fn recv(&mut self) -> Option<CapEvent> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.receiver.close();
        debug!("Cap event subscriber unregistered");
    }
}
