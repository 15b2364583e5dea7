//! Build steps and the gates that order them
//!
//! A step waits on at most one gate, signaled by its parent step, and
//! signals any number of subscribers, one per child step, when notified.
//! Gates are one-shot: a signal, or the notifier being dropped, opens the
//! gate for good. A gate is only consumed once it has opened, so a wait that
//! is cancelled leaves the step still gated.

use dockyard_core::types::Image;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{self, oneshot};
use tracing::trace;

/// Create a connected notifier/gate pair
pub fn gate() -> (Notifier, WaitGate) {
    let (tx, rx) = oneshot::channel();
    (Notifier(tx), WaitGate(rx))
}

/// Sending half of a gate, held by the parent step
#[derive(Debug)]
pub struct Notifier(oneshot::Sender<()>);

impl Notifier {
    /// Open the gate
    pub fn notify(self) {
        // a receiver that is gone has nothing left to wake
        let _ = self.0.send(());
    }
}

/// Receiving half of a gate, held by the child step
#[derive(Debug)]
pub struct WaitGate(oneshot::Receiver<()>);

impl WaitGate {
    /// Wait until the gate opens
    ///
    /// Must not be awaited again once it has returned.
    pub async fn opened(&mut self) {
        // a dropped notifier opens the gate as well
        let _ = (&mut self.0).await;
    }
}

/// Unit of work produced by a planner
pub struct Step {
    image: Arc<Image>,
    name: String,
    wait_gate: sync::Mutex<Option<WaitGate>>,
    subscribers: Mutex<Vec<Notifier>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Step {
    /// Create a step; root steps have no wait gate
    pub fn new(image: Arc<Image>, name: impl Into<String>, wait_gate: Option<WaitGate>) -> Self {
        Self {
            image,
            name: name.into(),
            wait_gate: sync::Mutex::new(wait_gate),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Image this step builds
    pub fn image(&self) -> &Arc<Image> {
        &self.image
    }

    /// Name the step was planned under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the step still has to wait for its parent
    pub fn has_wait_gate(&self) -> bool {
        // a held lock means someone is waiting on a gate that has not opened
        self.wait_gate
            .try_lock()
            .map_or(true, |gate| gate.is_some())
    }

    /// Register a notifier to signal once this step completes
    pub fn subscribe(&self, notifier: Notifier) {
        lock(&self.subscribers).push(notifier);
    }

    /// Number of notifiers waiting on this step
    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }

    /// Wait until the parent step completes
    ///
    /// Returns at once for root steps and once the gate has opened.
    /// Cancel safe: dropping the future keeps the gate, and concurrent
    /// callers all wait for the same signal.
    pub async fn wait(&self) {
        let mut gate = self.wait_gate.lock().await;
        if let Some(receiver) = gate.as_mut() {
            trace!("Step {} waiting for its parent", self.name);
            receiver.opened().await;
            *gate = None;
        }
    }

    /// Signal every subscriber at once
    ///
    /// Subscribers are forgotten once signaled, so notifying again does
    /// nothing.
    pub fn notify(&self) {
        let subscribers = std::mem::take(&mut *lock(&self.subscribers));
        trace!("Step {} notifying {} subscriber(s)", self.name, subscribers.len());
        for subscriber in subscribers {
            subscriber.notify();
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("image", &self.image.reference())
            .field("has_wait_gate", &self.has_wait_gate())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
