//! Typed, versioned documents on top of a [`tripvisor_kv::KVStore`].
//!
//! A model implements [`Document`] to declare its key prefix and hooks.
//! [`DocOps<T>`] provides reads, conditional inserts, optimistic
//! read-check-write updates, and in-memory filter/sort/page queries.

mod document;
mod ops;

pub use document::Document;
pub use ops::{DocOps, Found, DEFAULT_MAX_ATTEMPTS};
