//! Client-side incremental sync.
//!
//! There is no push channel. A view polls the server on a fixed interval,
//! compares collection sizes against what it has already seen, and raises
//! a notification only for growth it did not cause itself.
//!
//! # Usage
//!
//! ```ignore
//! use tripvisor_sync::{start, ApiClient, HttpBlogSource, SyncConfig};
//!
//! let client = ApiClient::new("http://localhost:8080/social").with_token(jwt);
//! let source = Arc::new(HttpBlogSource::new(client, blog_id));
//! let (tx, mut rx) = tokio::sync::mpsc::channel(16);
//! let handle = start(source, SyncConfig::default(), tx).await?;
//! while let Some(note) = rx.recv().await {
//!     println!("{}", note.message());
//! }
//! ```

pub mod error;
pub mod http;
pub mod poller;
pub mod tracker;

pub use error::SyncError;
pub use http::{ApiClient, HttpBlogSource, HttpGroupSource};
pub use poller::{start, SnapshotSource, SyncConfig, SyncHandle};
pub use tracker::{Change, Coalescing, Notification, Snapshot, SyncTracker, WatchKey};
