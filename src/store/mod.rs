//! SQLite-backed collaborators: the call log and the contacts directory
//!
//! The core owns no durable state of its own; everything displayed is rebuilt
//! from the call log on each activation, and identity repairs flow back into
//! the same table best-effort.

pub mod call_log;
pub mod contacts;

pub use call_log::SqliteCallLog;
pub use contacts::SqliteContactDirectory;

use crate::history_core::{CallRecord, CallType};

#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    Io(std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Row selection for bulk deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteFilter {
    All,
    ByType(CallType),
    /// Every row reaching the same caller as this number, matched through the
    /// shortest stored variant so prefixed spellings go away together.
    ByNumber(String),
    ByCachedName(String),
}

/// Read/write surface of the call history store.
pub trait CallLogSource: Send + Sync {
    /// All rows, newest first.
    fn recent_calls(&self) -> Result<Vec<CallRecord>, StoreError>;

    /// Best-effort rewrite of the cached identity columns for every row whose
    /// number ends with `number`. Failures are the caller's to log and drop;
    /// the in-memory view stays authoritative either way.
    fn update_cached_identity(
        &self,
        number: &str,
        name: Option<&str>,
        number_type: i64,
        number_label: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Delete matching rows, returning how many went away.
    fn delete_where(&self, filter: DeleteFilter) -> Result<usize, StoreError>;

    /// Clear the new-flag on missed calls, returning how many were still new.
    fn mark_missed_as_seen(&self) -> Result<usize, StoreError>;
}
