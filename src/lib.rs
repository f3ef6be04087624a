//! # Loadgate - Network Request Admission Scheduler
//!
//! Sits between a browser's page-rendering clients (tabs/frames) and its
//! network stack, deciding when each HTTP(S) resource request is allowed
//! to start and at what relative priority, so pages load quickly without
//! saturating the network or starving render-blocking resources.
//!
//! ## Architecture
//!
//! - **scheduler**: the admission core — client table, request queues,
//!   priority model, global limits, and lifecycle signal marshaling
//! - **utils**: shared utilities and error types
//!
//! Actual socket I/O, TLS, DNS, HTTP parsing, and connection pooling live
//! in the transport layer; the scheduler only tells it when to start each
//! request, through the [`RequestHandle`] it returns.
//!
//! ## Usage
//!
//! ```
//! use loadgate::{ClientId, Priority, RequestId, ResourceScheduler};
//!
//! let mut scheduler = ResourceScheduler::new();
//! let tab = ClientId::new(1, 1);
//!
//! scheduler.on_client_created(tab);
//! let handle = scheduler.schedule_request(tab, true, RequestId(1), Priority::Low, 0);
//!
//! // Delayable and the body hasn't been inserted yet: held back
//! assert!(handle.is_deferred());
//!
//! scheduler.on_will_insert_body(tab);
//! assert!(!handle.is_deferred());
//! ```

pub mod scheduler;
pub mod utils;

// Re-export main types for convenience
pub use scheduler::{
    compute_priority, lifecycle_channel, ClientId, ImportanceHint, LifecycleEvent,
    LifecycleProxy, LifecycleReceiver, Priority, RequestHandle, RequestId, ResourceScheduler,
    ResourceType, SchedulerConfig, SchedulerSnapshot,
};
pub use utils::error::{Result, SchedulerError};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Loadgate";
