//! Publish/subscribe channel for asynchronous scanner notifications.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use scanner3d_data::DeviceState;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone, Debug, PartialEq)]
pub enum ScannerEvent {
    /// The serial link went up or down.
    Link { connected: bool },
    /// Device State changed. Carries a snapshot.
    DeviceState(DeviceState),
    /// `STATUS` message from the firmware.
    Status(String),
    /// `ERROR` message from the firmware.
    DeviceError(String),
    /// `OK` acknowledgment of the previous command.
    Acknowledged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Subscription {
    pub id: SubscriptionId,
    pub receiver: Receiver<ScannerEvent>,
}

/// Fan-out of [`ScannerEvent`]s to any number of bounded subscriber queues.
///
/// A full queue drops the event for that subscriber only. Subscribers whose
/// receiver was dropped are removed on the next publish.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<(SubscriptionId, Sender<ScannerEvent>)>>>,
    next_id: Arc<AtomicU64>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> EventBus {
        EventBus {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = bounded(self.capacity);
        self.lock().push((id, tx));
        Subscription { id, receiver: rx }
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    pub fn publish(&self, event: ScannerEvent) {
        self.lock().retain(|(id, tx)| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::trace!("Subscriber {:?} is full, dropping {:?}", id, event);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Sender<ScannerEvent>)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
