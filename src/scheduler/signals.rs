//! Lifecycle signal marshaling
//!
//! The scheduler runs on a single I/O execution context and is never
//! locked. Page-load lifecycle events originate on the UI-authority
//! thread, so they cross over as ordered messages on a single-consumer
//! channel and are applied only when the scheduler drains them on its own
//! context.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::utils::{Result, SchedulerError};

use super::client::ClientId;

/// Page-load lifecycle events delivered by the UI-authority thread
///
/// Delivery order matches the order the real events occurred for a given
/// client: `ClientCreated` precedes any tracked request, `Navigate`
/// precedes the new document's `WillInsertBody`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A tab/frame context came into existence
    ClientCreated(ClientId),
    /// A tab/frame context was torn down
    ClientDeleted(ClientId),
    /// The client's loading flag changed
    LoadingStateChanged(ClientId, bool),
    /// A new top-level navigation started
    Navigate(ClientId),
    /// The document's visible markup began parsing
    WillInsertBody(ClientId),
    /// A response arrived through a multiplexed SPDY proxy
    SpdyProxiedResponse(ClientId),
}

/// Receiving half of the lifecycle channel, drained by the scheduler
pub type LifecycleReceiver = UnboundedReceiver<LifecycleEvent>;

/// Create a lifecycle signal channel pair
pub fn lifecycle_channel() -> (LifecycleProxy, LifecycleReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (LifecycleProxy { tx }, rx)
}

/// Clonable sender handed to the UI-authority thread
///
/// Sends never block; events queue until the scheduler drains them.
#[derive(Debug, Clone)]
pub struct LifecycleProxy {
    tx: UnboundedSender<LifecycleEvent>,
}

impl LifecycleProxy {
    fn send(&self, event: LifecycleEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| SchedulerError::SignalDropped)
    }

    pub fn client_created(&self, client: ClientId) -> Result<()> {
        self.send(LifecycleEvent::ClientCreated(client))
    }

    pub fn client_deleted(&self, client: ClientId) -> Result<()> {
        self.send(LifecycleEvent::ClientDeleted(client))
    }

    pub fn loading_state_changed(&self, client: ClientId, is_loaded: bool) -> Result<()> {
        self.send(LifecycleEvent::LoadingStateChanged(client, is_loaded))
    }

    pub fn navigate(&self, client: ClientId) -> Result<()> {
        self.send(LifecycleEvent::Navigate(client))
    }

    pub fn will_insert_body(&self, client: ClientId) -> Result<()> {
        self.send(LifecycleEvent::WillInsertBody(client))
    }

    pub fn spdy_proxied_response(&self, client: ClientId) -> Result<()> {
        self.send(LifecycleEvent::SpdyProxiedResponse(client))
    }
}
