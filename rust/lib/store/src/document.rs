use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Trait implemented by models stored through [`crate::DocOps`].
///
/// Hooks have default no-op impls and receive the store's clock reading.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Human-readable kind, used in error messages ("blog 'x' not found").
    const KIND: &'static str;

    /// KV key prefix: "{module}:{resource}:".
    fn kv_prefix() -> &'static str;

    /// Extract the key value from this instance.
    fn key_value(&self) -> String;

    /// Called before inserting a new record.
    fn before_create(&mut self, _now: DateTime<Utc>) {}

    /// Called before writing a changed record. Not called for no-op updates.
    fn before_update(&mut self, _now: DateTime<Utc>) {}
}

/// On-disk wrapper. `version` increases by one on every committed write.
#[derive(Deserialize)]
pub(crate) struct Envelope<T> {
    pub version: u64,
    pub data: T,
}

#[derive(Serialize)]
pub(crate) struct EnvelopeRef<'a, T> {
    pub version: u64,
    pub data: &'a T,
}
