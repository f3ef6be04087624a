//! Error types for the admission scheduler
//!
//! Admission itself is a policy decision and cannot fail; the only real
//! failure mode is losing the lifecycle signal channel.

use thiserror::Error;

/// Main error type for scheduler operations
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A lifecycle signal was sent after the scheduler's receiver was dropped
    #[error("lifecycle signal dropped: scheduler receiver is gone")]
    SignalDropped,
}

/// Convenience Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;
