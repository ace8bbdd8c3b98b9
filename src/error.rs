// Error taxonomy
// Nothing in this crate is fatal; every variant degrades gracefully.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    /// A required field is missing or malformed. The form stays open and no
    /// store mutation occurs.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Storage load/save failed. In-memory state remains usable for the
    /// session; durability is degraded.
    #[error(transparent)]
    Persistence(#[from] anyhow::Error),

    /// Notification permission not granted; the reminder was not armed.
    #[error("notification permission denied")]
    PermissionDenied,
}
