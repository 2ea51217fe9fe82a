//! Deployment progress events and the per-run event bus.
//!
//! The bus buffers every emitted event in order and replays the buffer to
//! subscribers before handing them live events, so an observer attaching
//! mid-flight or after completion sees the same sequence as one attached
//! from the start.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use alloy_primitives::B256;
use tokio::sync::broadcast;

use crate::chain::TxReceipt;

const BUS_CAPACITY: usize = 256;

/// What kind of step an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Full contract deployment.
    Contract,
    /// Minimal-forwarder deployment.
    ProxyContract,
    /// Plain transaction (initialization, data write, handoff step).
    Transaction,
}

/// Lifecycle stage of the step the event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// Submitted, not yet mined.
    Pending,
    /// Mined successfully.
    Complete,
    /// Failed; terminal for the whole run.
    Error,
}

/// A single immutable progress event.
#[derive(Debug, Clone)]
pub struct DeploymentEvent {
    /// Step kind.
    pub kind: EventKind,
    /// Stable name of the contract or transaction.
    pub contract_name: &'static str,
    /// Lifecycle stage.
    pub status: EventStatus,
    /// Transaction hash, once submitted.
    pub transaction: Option<B256>,
    /// Normalized receipt, once mined.
    pub receipt: Option<TxReceipt>,
    /// Failure description for [`EventStatus::Error`].
    pub error: Option<String>,
}

impl DeploymentEvent {
    /// Event for a submitted, unmined step.
    pub fn pending(kind: EventKind, contract_name: &'static str, transaction: B256) -> Self {
        Self {
            kind,
            contract_name,
            status: EventStatus::Pending,
            transaction: Some(transaction),
            receipt: None,
            error: None,
        }
    }

    /// Event for a mined step.
    pub fn complete(kind: EventKind, contract_name: &'static str, receipt: TxReceipt) -> Self {
        Self {
            kind,
            contract_name,
            status: EventStatus::Complete,
            transaction: Some(receipt.transaction_hash),
            receipt: Some(receipt),
            error: None,
        }
    }

    /// Terminal failure event.
    pub fn error(contract_name: &'static str, message: String) -> Self {
        Self {
            kind: EventKind::Transaction,
            contract_name,
            status: EventStatus::Error,
            transaction: None,
            receipt: None,
            error: Some(message),
        }
    }
}

struct BusState {
    buffer: Vec<DeploymentEvent>,
    closed: bool,
}

struct BusInner {
    state: Mutex<BusState>,
    sender: broadcast::Sender<Option<DeploymentEvent>>,
}

/// Per-run event bus with replay.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            inner: Arc::new(BusInner {
                state: Mutex::new(BusState { buffer: Vec::new(), closed: false }),
                sender,
            }),
        }
    }

    /// Appends an event and forwards it to live subscribers.
    pub fn emit(&self, event: DeploymentEvent) {
        let mut state = self.inner.state.lock().expect("event bus lock poisoned");
        if state.closed {
            return;
        }
        state.buffer.push(event.clone());
        // Send while holding the lock so replay and live delivery cannot
        // interleave out of order. No receivers is fine.
        let _ = self.inner.sender.send(Some(event));
    }

    /// Marks the stream terminal. Subsequent `emit` calls are dropped.
    pub fn close(&self) {
        let mut state = self.inner.state.lock().expect("event bus lock poisoned");
        if state.closed {
            return;
        }
        state.closed = true;
        let _ = self.inner.sender.send(None);
    }

    /// Subscribes, replaying everything emitted so far.
    pub fn subscribe(&self) -> EventStream {
        let state = self.inner.state.lock().expect("event bus lock poisoned");
        EventStream {
            replay: state.buffer.iter().cloned().collect(),
            closed: state.closed,
            live: self.inner.sender.subscribe(),
        }
    }

    /// Snapshot of everything emitted so far.
    pub fn snapshot(&self) -> Vec<DeploymentEvent> {
        self.inner.state.lock().expect("event bus lock poisoned").buffer.clone()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscriber's view of the event sequence.
pub struct EventStream {
    replay: VecDeque<DeploymentEvent>,
    closed: bool,
    live: broadcast::Receiver<Option<DeploymentEvent>>,
}

impl EventStream {
    /// Next event, or `None` once the run is over and the replay drained.
    pub async fn next(&mut self) -> Option<DeploymentEvent> {
        if let Some(event) = self.replay.pop_front() {
            return Some(event);
        }
        if self.closed {
            return None;
        }
        loop {
            match self.live.recv().await {
                Ok(Some(event)) => return Some(event),
                Ok(None) | Err(broadcast::error::RecvError::Closed) => {
                    self.closed = true;
                    return None;
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
            }
        }
    }

    /// Drains the remaining events into a vector.
    pub async fn collect(mut self) -> Vec<DeploymentEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }
        events
    }
}
