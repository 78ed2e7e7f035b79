//! Resolver Core - Asynchronous Caller Identity Resolution
//!
//! Keeps the visible list responsive while caller names are resolved against
//! the contacts directory in the background.
//!
//! # Architecture
//!
//! ```text
//! bind (presentation side, single-threaded)
//!     ↓ IdentityCache miss → placeholder + LookupRequest
//! RequestQueue (mutex + condvar FIFO, 1 s bounded dequeue)
//!     ↓
//! ResolutionWorker (one thread per active session)
//!     ├─ ContactDirectory lookup → IdentityCache put (Resolved / no-match)
//!     ├─ CallLogSource repair write when the stored snapshot is stale
//!     └─ coalesced refresh signal once the queue drains
//! ```
//!
//! The cache, queue and worker are created together on activation and
//! discarded together on deactivation; nothing survives across sessions.

pub mod cache;
pub mod directory;
pub mod identity;
pub mod queue;
pub mod refresh;
pub mod worker;

pub use cache::IdentityCache;
pub use directory::{ContactDirectory, ContactMatch, DirectoryError};
pub use identity::{Identity, ResolutionState};
pub use queue::{LookupRequest, RequestQueue};
pub use refresh::{refresh_channel, RefreshNotifier, RefreshReceiver};
pub use worker::ResolutionWorker;
