use crate::services::price_storage::StorageError;

/// Returned when the shared cancellation token fires during an await.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Failure of a single product check inside a watch cycle.
#[derive(Debug)]
pub enum WatchError {
    Cancelled,
    Storage(StorageError),
}

impl std::fmt::Display for WatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchError::Cancelled => write!(f, "watch cancelled"),
            WatchError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for WatchError {}

impl From<Cancelled> for WatchError {
    fn from(_: Cancelled) -> Self {
        WatchError::Cancelled
    }
}

impl From<StorageError> for WatchError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Cancelled => WatchError::Cancelled,
            other => WatchError::Storage(other),
        }
    }
}
