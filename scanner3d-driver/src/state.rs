use crate::buffer::ScanPointBuffer;
use crate::events::{EventBus, ScannerEvent, Subscription, SubscriptionId};
use scanner3d_data::{DeviceState, ScanSample, ScanVolume};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Everything the interpreter and the façade share, guarded by one lock.
#[derive(Debug, Default)]
pub struct ScannerState {
    pub device: DeviceState,
    pub points: ScanPointBuffer,
    /// Volume passed to the most recent scan start.
    pub volume: ScanVolume,
}

/// Handle to the process-wide [`ScannerState`] and its change notifications.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<Mutex<ScannerState>>,
    events: EventBus,
}

impl SharedState {
    pub fn new(events: EventBus) -> SharedState {
        SharedState {
            inner: Arc::new(Mutex::new(ScannerState::default())),
            events,
        }
    }

    /// Runs `f` with exclusive access. Effects applied inside one call are
    /// never observed half-done.
    pub fn update<R>(&self, f: impl FnOnce(&mut ScannerState) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn device(&self) -> DeviceState {
        self.lock().device.clone()
    }

    pub fn drain_points(&self) -> Vec<ScanSample> {
        self.lock().points.drain()
    }

    pub fn publish(&self, event: ScannerEvent) {
        self.events.publish(event);
    }

    /// Publishes a snapshot of the current Device State.
    pub fn publish_device(&self) {
        let device = self.device();
        self.events.publish(ScannerEvent::DeviceState(device));
    }

    pub fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn lock(&self) -> MutexGuard<'_, ScannerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
