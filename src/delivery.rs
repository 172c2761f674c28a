
//! Deliver decoded patches to subscribers.
//!
//! Every subscriber owns a queue. Publishing never waits for a subscriber,
//! so a slow consumer cannot stall the decoding of a region.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use crate::error::Error;
use crate::layer::LayerType;
use crate::patch::TerrainPatch;


/// Identifies the region a layer was received from.
/// Packs the global position of the south west corner of the region, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RegionHandle(pub u64);

impl RegionHandle {

    /// Pack the global position of the region corner.
    pub fn from_global_position(x: u32, y: u32) -> Self {
        RegionHandle(((x as u64) << 32) | y as u64)
    }

    /// The global position of the region corner.
    pub fn global_position(self) -> (u32, u32) {
        ((self.0 >> 32) as u32, self.0 as u32)
    }
}

impl fmt::Display for RegionHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = self.global_position();
        write!(formatter, "region ({}, {})", x, y)
    }
}


/// A successfully decoded patch, ready to be merged into a region.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchReceived {

    /// The region the patch was received from.
    pub region: RegionHandle,

    /// The decoded patch. Subscribers share the same samples.
    pub patch: Arc<TerrainPatch>,
}

impl PatchReceived {

    /// Column in the patch grid.
    pub fn x(&self) -> u8 { self.patch.x() }

    /// Row in the patch grid.
    pub fn y(&self) -> u8 { self.patch.y() }

    /// Number of samples along one edge.
    pub fn size(&self) -> usize { self.patch.size() }

    /// The row-major samples.
    pub fn samples(&self) -> &[f32] { self.patch.samples() }
}

/// A patch that could not be decoded. The patch is lost.
#[derive(Debug, Clone)]
pub struct PatchFailed {

    /// The region the patch was received from.
    pub region: RegionHandle,

    /// The layer the patch belonged to.
    pub layer_type: LayerType,

    /// Position of the patch within its buffer, starting at zero.
    pub patch_index: usize,

    /// Why decoding failed.
    pub error: Arc<Error>,
}

/// What a subscriber receives.
#[derive(Debug, Clone)]
pub enum PatchEvent {

    /// A patch has been decoded.
    Received(PatchReceived),

    /// A patch could not be decoded.
    Failed(PatchFailed),
}

impl PatchEvent {

    /// The region this event originates from.
    pub fn region(&self) -> RegionHandle {
        match self {
            PatchEvent::Received(received) => received.region,
            PatchEvent::Failed(failed) => failed.region,
        }
    }
}


/// How many events may wait in the queue of a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueCapacity {

    /// Never drop events. Memory grows while the subscriber lags behind.
    Unbounded,

    /// Drop new events while the queue holds this many events.
    /// A capacity of zero drops every event the subscriber is not already waiting for.
    Bounded(usize),
}

impl Default for QueueCapacity {
    fn default() -> Self { QueueCapacity::Unbounded }
}

/// Which events a subscriber wants to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubscriptionFilter {

    /// Only events of this region, or all regions.
    pub region: Option<RegionHandle>,

    /// Also receive failed patches.
    pub include_failures: bool,
}

impl SubscriptionFilter {

    /// Successful patches of all regions.
    pub fn all_regions() -> Self { Self::default() }

    /// Successful patches of a single region.
    pub fn region(region: RegionHandle) -> Self {
        SubscriptionFilter { region: Some(region), ..Self::default() }
    }

    /// Also receive failed patches.
    pub fn with_failures(self) -> Self {
        SubscriptionFilter { include_failures: true, ..self }
    }

    fn accepts(&self, event: &PatchEvent) -> bool {
        let region_matches = self.region.map_or(true, |region| region == event.region());
        let kind_matches = self.include_failures || matches!(event, PatchEvent::Received(_));
        region_matches && kind_matches
    }
}


/// The receiving end of a subscription.
/// Dropping it ends the subscription.
#[derive(Debug)]
pub struct Subscription {
    receiver: flume::Receiver<PatchEvent>,
}

impl Subscription {

    /// Wait for the next event. Returns `None` once the publisher is gone and the queue is empty.
    pub fn recv(&self) -> Option<PatchEvent> { self.receiver.recv().ok() }

    /// Return the next event if one is queued.
    pub fn try_recv(&self) -> Option<PatchEvent> { self.receiver.try_recv().ok() }

    /// Take all currently queued events.
    pub fn drain(&self) -> Vec<PatchEvent> { self.receiver.try_iter().collect() }

    /// Number of queued events.
    pub fn len(&self) -> usize { self.receiver.len() }

    /// Whether no event is queued.
    pub fn is_empty(&self) -> bool { self.receiver.is_empty() }

    /// The underlying channel, for use with `select` or async receivers.
    pub fn into_receiver(self) -> flume::Receiver<PatchEvent> { self.receiver }
}


#[derive(Debug)]
struct Subscriber {
    filter: SubscriptionFilter,
    sender: flume::Sender<PatchEvent>,
}

/// Fans events out to all subscribers.
/// Can be shared between threads that decode different regions.
#[derive(Debug, Default)]
pub struct PatchPublisher {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl PatchPublisher {

    /// A publisher without subscribers.
    pub fn new() -> Self { Self::default() }

    /// Register a new subscriber with its own queue.
    pub fn subscribe(&self, filter: SubscriptionFilter, capacity: QueueCapacity) -> Subscription {
        let (sender, receiver) = match capacity {
            QueueCapacity::Unbounded => flume::unbounded(),
            QueueCapacity::Bounded(capacity) => flume::bounded(capacity),
        };

        self.lock().push(Subscriber { filter, sender });
        Subscription { receiver }
    }

    /// Number of subscribers that have not been dropped yet.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|subscriber| !subscriber.sender.is_disconnected());
        subscribers.len()
    }

    /// Publish a decoded patch.
    pub fn publish_patch(&self, region: RegionHandle, patch: TerrainPatch) -> usize {
        self.publish(PatchEvent::Received(PatchReceived { region, patch: Arc::new(patch) }))
    }

    /// Publish a patch that failed to decode.
    pub fn publish_failure(&self, region: RegionHandle, layer_type: LayerType, patch_index: usize, error: Error) -> usize {
        self.publish(PatchEvent::Failed(PatchFailed { region, layer_type, patch_index, error: Arc::new(error) }))
    }

    /// Queue the event for every interested subscriber, without waiting.
    /// Subscribers whose queue is full miss this event.
    /// Returns the number of subscribers that received the event.
    pub fn publish(&self, event: PatchEvent) -> usize {
        let mut subscribers = self.lock();
        let mut delivered = 0;

        subscribers.retain(|subscriber| {
            if !subscriber.filter.accepts(&event) {
                return !subscriber.sender.is_disconnected();
            }

            match subscriber.sender.try_send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                },

                Err(flume::TrySendError::Full(_)) => {
                    log::warn!("subscriber queue is full, dropping patch event of {}", event.region());
                    true
                },

                Err(flume::TrySendError::Disconnected(_)) => {
                    log::debug!("removing disconnected patch subscriber");
                    false
                },
            }
        });

        delivered
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber>> {
        // the list is still valid after a panic in another thread
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
