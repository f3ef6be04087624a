//! Scheduled request bookkeeping and the transport-facing handle

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, Ordering};
use std::sync::Arc;

use super::client::ClientId;
use super::priority::Priority;
use super::queue::QueueKey;

/// Unique request identity, supplied by the transport layer at schedule time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request {}", self.0)
    }
}

/// Admission state of a scheduled request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Held back by the scheduler; the transport layer must not start it
    Deferred,
    /// Admitted; running until finished or cancelled
    InFlight,
}

/// State shared between the scheduler and the transport layer
///
/// The scheduler itself is single-threaded, but the handle may be polled
/// from wherever the transport runs, so the mirrored fields are atomics.
#[derive(Debug)]
struct HandleShared {
    deferred: AtomicBool,
    priority: AtomicU8,
    intra_priority: AtomicI32,
}

/// Suspend/resume handle returned from `schedule_request`
///
/// The transport layer polls [`is_deferred`](RequestHandle::is_deferred)
/// and must not start the request while it reads true. Priority changes
/// made through the scheduler are mirrored here. The caller disposes of
/// the handle before disposing of the underlying transport request.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    shared: Arc<HandleShared>,
}

impl RequestHandle {
    pub(crate) fn new(deferred: bool, priority: Priority, intra_priority: i32) -> Self {
        Self {
            shared: Arc::new(HandleShared {
                deferred: AtomicBool::new(deferred),
                priority: AtomicU8::new(priority.index()),
                intra_priority: AtomicI32::new(intra_priority),
            }),
        }
    }

    /// Whether the request is currently held back
    pub fn is_deferred(&self) -> bool {
        self.shared.deferred.load(Ordering::Acquire)
    }

    /// Current priority as last written by the scheduler
    pub fn priority(&self) -> Priority {
        Priority::from_index(self.shared.priority.load(Ordering::Acquire))
    }

    /// Current intra-priority tie-break as last written by the scheduler
    pub fn intra_priority(&self) -> i32 {
        self.shared.intra_priority.load(Ordering::Acquire)
    }

    pub(crate) fn set_deferred(&self, deferred: bool) {
        self.shared.deferred.store(deferred, Ordering::Release);
    }

    pub(crate) fn set_priority(&self, priority: Priority, intra_priority: i32) {
        self.shared.priority.store(priority.index(), Ordering::Release);
        self.shared
            .intra_priority
            .store(intra_priority, Ordering::Release);
    }
}

/// One outstanding resource fetch tracked by the scheduler
#[derive(Debug)]
pub(crate) struct ScheduledRequest {
    pub id: RequestId,
    /// Owning client, or None once detached to the unowned set
    pub client: Option<ClientId>,
    pub priority: Priority,
    pub intra_priority: i32,
    /// Synchronous loads (`is_async == false`) are exempt from deferral
    pub is_async: bool,
    /// Scheduler-assigned insertion order, the tie-break of last resort
    pub seq: u64,
    pub state: RequestState,
    /// Cap-accounting class, captured when the request starts. Started
    /// requests are never preempted, so later priority changes must not
    /// move them between the delayable and non-delayable pools.
    pub admitted_as_delayable: bool,
    pub handle: RequestHandle,
}

impl ScheduledRequest {
    pub fn key(&self) -> QueueKey {
        QueueKey::new(self.priority, self.intra_priority, self.seq)
    }

    pub fn is_delayable(&self) -> bool {
        self.priority.is_delayable()
    }

    /// Transition to in-flight and tell the transport layer to resume
    pub fn start(&mut self) {
        self.state = RequestState::InFlight;
        self.admitted_as_delayable = self.is_delayable();
        self.handle.set_deferred(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_defer_resume() {
        let handle = RequestHandle::new(true, Priority::Low, 0);
        assert!(handle.is_deferred());

        handle.set_deferred(false);
        assert!(!handle.is_deferred());
    }

    #[test]
    fn test_handle_priority_mirror() {
        let handle = RequestHandle::new(false, Priority::Low, 0);
        handle.set_priority(Priority::High, 7);

        assert_eq!(handle.priority(), Priority::High);
        assert_eq!(handle.intra_priority(), 7);
    }

    #[test]
    fn test_handle_clone_shares_state() {
        let handle = RequestHandle::new(true, Priority::Idle, 0);
        let transport_side = handle.clone();

        handle.set_deferred(false);
        assert!(!transport_side.is_deferred());
    }
}
