//! Per tab/frame client bookkeeping

use super::queue::RequestQueue;

/// Identity of one live tab/frame context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId {
    /// Render-process id
    pub process_id: u32,
    /// Frame/route id within that process
    pub route_id: u32,
}

impl ClientId {
    pub fn new(process_id: u32, route_id: u32) -> Self {
        Self {
            process_id,
            route_id,
        }
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client {}:{}", self.process_id, self.route_id)
    }
}

/// Scheduler-side state for one page/tab/frame request context
#[derive(Debug)]
pub(crate) struct Client {
    /// Whether the page is still loading; feeds `has_loading_clients`
    pub loading: bool,
    /// True once the document's visible content begins parsing
    pub body_inserted: bool,
    /// Sticky once a SPDY-proxied response has been observed
    pub used_spdy_proxy: bool,
    pub queue: RequestQueue,
}

impl Client {
    pub fn new() -> Self {
        Self {
            loading: true,
            body_inserted: false,
            used_spdy_proxy: false,
            queue: RequestQueue::new(),
        }
    }

    /// New top-level navigation: resources return to pre-body policy
    pub fn on_navigate(&mut self) {
        self.body_inserted = false;
    }

    /// Whether delayable requests for this client may start
    ///
    /// A multiplexed proxy connection does not suffer HTTP/1.1 head-of-line
    /// blocking, so observing one relaxes the body-insertion gate.
    pub fn delayable_gate_open(&self) -> bool {
        self.body_inserted || self.used_spdy_proxy
    }
}
