//! Request admission scheduling
//!
//! Decides when each resource request may start and at what relative
//! priority, so a page loads quickly without saturating the network or
//! starving render-blocking resources. The scheduler reconciles per-client
//! page-load lifecycle events, request-level schedule/reprioritize/finish
//! calls, and global in-flight limits.
//!
//! Everything runs on one logical I/O execution context with no internal
//! locking; see [`signals`] for how lifecycle events cross threads.

mod client;
mod priority;
mod queue;
mod request;
mod signals;

pub use client::ClientId;
pub use priority::{compute_priority, ImportanceHint, Priority, ResourceType};
pub use request::{RequestHandle, RequestId, RequestState};
pub use signals::{lifecycle_channel, LifecycleEvent, LifecycleProxy, LifecycleReceiver};

use std::collections::{HashMap, HashSet};

use client::Client;
use queue::QueueKey;
use request::ScheduledRequest;

/// Global admission limits
///
/// Both caps are optional; with both disabled the scheduler degrades to
/// pure priority ordering with immediate admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Cap on total in-flight requests across all clients
    pub outstanding_request_limit: Option<usize>,
    /// Cap on concurrently in-flight delayable requests across all clients
    pub max_num_delayable_requests: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            outstanding_request_limit: None,
            max_num_delayable_requests: Some(10),
        }
    }
}

/// Point-in-time scheduler counters, for devtools and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerSnapshot {
    pub clients: usize,
    pub in_flight: usize,
    pub in_flight_delayable: usize,
    pub deferred: usize,
    pub unowned: usize,
}

/// Network request admission scheduler
///
/// Owns the client table and the request arena. Requests live in exactly
/// one container at a time: their owning client's queue, or the unowned
/// set once that client has been torn down. In-flight counts are derived
/// from the arena on demand, never cached.
pub struct ResourceScheduler {
    config: SchedulerConfig,
    clients: HashMap<ClientId, Client>,
    requests: HashMap<RequestId, ScheduledRequest>,
    unowned: HashSet<RequestId>,
    next_seq: u64,
}

impl ResourceScheduler {
    /// Create a scheduler with default limits
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create a scheduler with explicit limits
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            clients: HashMap::new(),
            requests: HashMap::new(),
            unowned: HashSet::new(),
            next_seq: 0,
        }
    }

    // ---- Request-level calls (transport side) ----

    /// Register a new request under the named client
    ///
    /// The client must already exist via
    /// [`on_client_created`](ResourceScheduler::on_client_created);
    /// if it does not, the request
    /// takes the unowned always-admit path so legitimate pre-navigation
    /// fetches are never lost. Returns the suspend/resume handle the
    /// transport layer must obey until the request finishes.
    pub fn schedule_request(
        &mut self,
        client: ClientId,
        is_async: bool,
        id: RequestId,
        priority: Priority,
        intra_priority: i32,
    ) -> RequestHandle {
        if let Some(existing) = self.requests.get(&id) {
            log::warn!("{} scheduled twice; keeping first registration", id);
            return existing.handle.clone();
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        let known = self.clients.contains_key(&client);
        let handle = RequestHandle::new(true, priority, intra_priority);
        let mut request = ScheduledRequest {
            id,
            client: known.then_some(client),
            priority,
            intra_priority,
            is_async,
            seq,
            state: RequestState::Deferred,
            admitted_as_delayable: false,
            handle: handle.clone(),
        };

        let admit = if known {
            self.should_start(&request)
        } else {
            // Fail open: refusing network access to a legitimate resource
            // is worse than admitting one outside a tab's bookkeeping.
            log::warn!("{} arrived for unknown {}; admitting unowned", id, client);
            true
        };
        if admit {
            request.start();
        }

        let key = request.key();
        let owner = request.client;
        self.requests.insert(id, request);
        match owner {
            Some(c) => {
                if let Some(state) = self.clients.get_mut(&c) {
                    state.queue.insert(id, key);
                }
            }
            None => {
                self.unowned.insert(id);
            }
        }

        log::debug!(
            "{} scheduled at {:?} ({})",
            id,
            priority,
            if admit { "in flight" } else { "deferred" }
        );
        handle
    }

    /// Change the priority of an already-scheduled request
    ///
    /// Mirrors the new priority to the transport handle, re-sorts the
    /// request within its queue, and re-evaluates admission. Already
    /// started requests are never preempted and keep the cap class they
    /// were admitted under. Untracked ids are a no-op.
    pub fn reprioritize_request(
        &mut self,
        id: RequestId,
        new_priority: Priority,
        new_intra_priority: i32,
    ) {
        let Some(request) = self.requests.get_mut(&id) else {
            log::debug!("reprioritize for untracked {}; ignoring", id);
            return;
        };
        if request.priority == new_priority && request.intra_priority == new_intra_priority {
            return;
        }

        request.priority = new_priority;
        request.intra_priority = new_intra_priority;
        request.handle.set_priority(new_priority, new_intra_priority);
        let key = request.key();
        let owner = request.client;

        if let Some(c) = owner {
            if let Some(state) = self.clients.get_mut(&c) {
                state.queue.reinsert(id, key);
            }
        }

        self.load_any_startable_requests();
    }

    /// A request completed or was cancelled by the transport layer
    ///
    /// Removes it from whichever container holds it and lets the most
    /// eligible deferred request take the freed slot. Idempotent.
    pub fn on_request_finished(&mut self, id: RequestId) {
        let Some(request) = self.requests.remove(&id) else {
            return;
        };
        match request.client {
            Some(c) => {
                if let Some(state) = self.clients.get_mut(&c) {
                    state.queue.remove(id);
                }
            }
            None => {
                self.unowned.remove(&id);
            }
        }

        log::debug!("{} finished", id);
        self.load_any_startable_requests();
    }

    // ---- Lifecycle calls (UI-authority side, marshaled) ----

    /// A tab/frame context came into existence
    pub fn on_client_created(&mut self, client: ClientId) {
        if self.clients.contains_key(&client) {
            log::warn!("{} created twice; keeping existing state", client);
            return;
        }
        self.clients.insert(client, Client::new());
    }

    /// A tab/frame context was torn down
    ///
    /// Its requests are detached into the unowned set rather than
    /// cancelled: in-flight network activity is not truncated merely
    /// because a tab closed.
    pub fn on_client_deleted(&mut self, client: ClientId) {
        let Some(state) = self.clients.remove(&client) else {
            log::warn!("delete for unknown {}; ignoring", client);
            return;
        };

        let detached: Vec<RequestId> = state.queue.ids().collect();
        for id in &detached {
            if let Some(request) = self.requests.get_mut(id) {
                request.client = None;
            }
            self.unowned.insert(*id);
        }
        if !detached.is_empty() {
            log::debug!("{} deleted; {} requests detached", client, detached.len());
        }

        self.load_any_startable_requests();
    }

    /// Update the client's loading flag
    pub fn on_loading_state_changed(&mut self, client: ClientId, is_loaded: bool) {
        if let Some(state) = self.clients.get_mut(&client) {
            state.loading = !is_loaded;
        }
    }

    /// A new top-level navigation started for the client
    pub fn on_navigate(&mut self, client: ClientId) {
        if let Some(state) = self.clients.get_mut(&client) {
            state.on_navigate();
        }
    }

    /// The client's document body began parsing
    ///
    /// This is the backpressure-release signal: held-back delayable
    /// requests become eligible up to the global delayable cap.
    pub fn on_will_insert_body(&mut self, client: ClientId) {
        if let Some(state) = self.clients.get_mut(&client) {
            state.body_inserted = true;
        }
        self.load_any_startable_requests();
    }

    /// A SPDY-proxied response was observed for the client
    pub fn on_received_spdy_proxied_response(&mut self, client: ClientId) {
        if let Some(state) = self.clients.get_mut(&client) {
            state.used_spdy_proxy = true;
        }
        self.load_any_startable_requests();
    }

    /// Whether any client is still loading
    ///
    /// The transport layer uses this to keep background maintenance work
    /// paused while pages load.
    pub fn has_loading_clients(&self) -> bool {
        self.clients.values().any(|c| c.loading)
    }

    // ---- Signal channel ----

    /// Apply one lifecycle event
    pub fn apply(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::ClientCreated(c) => self.on_client_created(c),
            LifecycleEvent::ClientDeleted(c) => self.on_client_deleted(c),
            LifecycleEvent::LoadingStateChanged(c, is_loaded) => {
                self.on_loading_state_changed(c, is_loaded)
            }
            LifecycleEvent::Navigate(c) => self.on_navigate(c),
            LifecycleEvent::WillInsertBody(c) => self.on_will_insert_body(c),
            LifecycleEvent::SpdyProxiedResponse(c) => {
                self.on_received_spdy_proxied_response(c)
            }
        }
    }

    /// Drain all pending lifecycle events without blocking
    pub fn drain_signals(&mut self, rx: &mut LifecycleReceiver) {
        while let Ok(event) = rx.try_recv() {
            self.apply(event);
        }
    }

    // ---- Introspection ----

    /// Current counters, derived from live state
    pub fn stats(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            clients: self.clients.len(),
            in_flight: self.in_flight_count(),
            in_flight_delayable: self.in_flight_delayable_count(),
            deferred: self
                .requests
                .values()
                .filter(|r| r.state == RequestState::Deferred)
                .count(),
            unowned: self.unowned.len(),
        }
    }

    // ---- Admission algorithm ----

    fn in_flight_count(&self) -> usize {
        self.requests
            .values()
            .filter(|r| r.state == RequestState::InFlight)
            .count()
    }

    // Counts the class each request was admitted under, not its current
    // priority: a running request reprioritized below the delayable
    // threshold was never charged against the cap and is not preempted,
    // so it stays in the pool it started in.
    fn in_flight_delayable_count(&self) -> usize {
        self.requests
            .values()
            .filter(|r| r.state == RequestState::InFlight && r.admitted_as_delayable)
            .count()
    }

    /// The core decision rule
    fn should_start(&self, request: &ScheduledRequest) -> bool {
        // Synchronous loads and never-delay priorities skip every check.
        if !request.is_async || request.priority.bypasses_limits() {
            return true;
        }

        if let Some(limit) = self.config.outstanding_request_limit {
            if self.in_flight_count() >= limit {
                return false;
            }
        }

        if request.is_delayable() {
            if let Some(cap) = self.config.max_num_delayable_requests {
                // Detached requests have no body gate left to wait on.
                let gate_open = match request.client {
                    Some(c) => self
                        .clients
                        .get(&c)
                        .map(|state| state.delayable_gate_open())
                        .unwrap_or(true),
                    None => true,
                };
                if !gate_open {
                    return false;
                }
                if self.in_flight_delayable_count() >= cap {
                    return false;
                }
            }
        }

        true
    }

    /// A slot freed or a gate opened: admit every eligible deferred
    /// request, scanning in global (priority, intra-priority, insertion)
    /// order so one client's high-priority work is never starved by
    /// another's backlog.
    fn load_any_startable_requests(&mut self) {
        let mut candidates: Vec<(QueueKey, RequestId)> = self
            .requests
            .values()
            .filter(|r| r.state == RequestState::Deferred)
            .map(|r| (r.key(), r.id))
            .collect();
        candidates.sort();

        for (_, id) in candidates {
            // Re-check against the arena; earlier admissions in this scan
            // consume slots, and entries may have been removed.
            let startable = match self.requests.get(&id) {
                Some(r) if r.state == RequestState::Deferred => self.should_start(r),
                _ => continue,
            };
            if startable {
                if let Some(request) = self.requests.get_mut(&id) {
                    request.start();
                    log::debug!("{} admitted", id);
                }
            }
        }
    }
}

impl Default for ResourceScheduler {
    fn default() -> Self {
        Self::new()
    }
}
