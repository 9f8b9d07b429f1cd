use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};
use tripvisor_core::{Clock, ServiceError};
use tripvisor_kv::{CasOp, KVError, KVStore};

use crate::document::{Document, Envelope, EnvelopeRef};

/// How many times an optimistic update re-reads and retries after losing
/// a write race before giving up with `Conflict`.
pub const DEFAULT_MAX_ATTEMPTS: usize = 8;

/// One page of a [`DocOps::find`] query plus the size of the full match set.
#[derive(Debug, Clone)]
pub struct Found<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// CRUD operations for a [`Document`] model. Holds a reference to the KV backend.
///
/// Every write is a compare-and-swap against the exact bytes read, so two
/// handlers racing on the same document never silently overwrite each other:
/// the loser re-reads, re-applies its change to fresh state, and tries again.
pub struct DocOps<T: Document> {
    kv: Arc<dyn KVStore>,
    clock: Arc<dyn Clock>,
    max_attempts: usize,
    _phantom: PhantomData<T>,
}

impl<T: Document> DocOps<T> {
    pub fn new(kv: Arc<dyn KVStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            kv,
            clock,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            _phantom: PhantomData,
        }
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    fn make_key(id: &str) -> String {
        format!("{}{}", T::kv_prefix(), id)
    }

    fn kv_err(e: KVError) -> ServiceError {
        ServiceError::Storage(e.to_string())
    }

    fn not_found(id: &str) -> ServiceError {
        ServiceError::NotFound(format!("{} '{}' not found", T::KIND, id))
    }

    fn contended(&self, id: &str) -> ServiceError {
        warn!("{} '{}' still contended after {} attempts", T::KIND, id, self.max_attempts);
        ServiceError::Conflict(format!(
            "{} '{}' is being modified concurrently, try again",
            T::KIND, id
        ))
    }

    fn decode(bytes: &[u8]) -> Result<Envelope<T>, ServiceError> {
        serde_json::from_slice(bytes)
            .map_err(|e| ServiceError::Internal(format!("deserialize {}: {}", T::KIND, e)))
    }

    fn encode(version: u64, data: &T) -> Result<Vec<u8>, ServiceError> {
        serde_json::to_vec(&EnvelopeRef { version, data })
            .map_err(|e| ServiceError::Internal(format!("serialize {}: {}", T::KIND, e)))
    }

    fn unchanged(before: &T, after: &T) -> Result<bool, ServiceError> {
        let a = serde_json::to_vec(before)
            .map_err(|e| ServiceError::Internal(format!("serialize {}: {}", T::KIND, e)))?;
        let b = serde_json::to_vec(after)
            .map_err(|e| ServiceError::Internal(format!("serialize {}: {}", T::KIND, e)))?;
        Ok(a == b)
    }

    fn read_raw(&self, id: &str) -> Result<Vec<u8>, ServiceError> {
        self.kv
            .get(&Self::make_key(id))
            .map_err(Self::kv_err)?
            .ok_or_else(|| Self::not_found(id))
    }

    /// Get a record by key value. Returns None if not found.
    pub fn get(&self, id: &str) -> Result<Option<T>, ServiceError> {
        Ok(self.get_versioned(id)?.map(|(doc, _)| doc))
    }

    /// Get a record together with its current version.
    pub fn get_versioned(&self, id: &str) -> Result<Option<(T, u64)>, ServiceError> {
        match self.kv.get(&Self::make_key(id)).map_err(Self::kv_err)? {
            Some(bytes) => {
                let env = Self::decode(&bytes)?;
                Ok(Some((env.data, env.version)))
            }
            None => Ok(None),
        }
    }

    /// Get a record or return NotFound error.
    pub fn get_or_err(&self, id: &str) -> Result<T, ServiceError> {
        self.get(id)?.ok_or_else(|| Self::not_found(id))
    }

    /// List all records with this prefix, in key order.
    pub fn list(&self) -> Result<Vec<T>, ServiceError> {
        let entries = self.kv.scan(T::kv_prefix()).map_err(Self::kv_err)?;
        let mut records = Vec::with_capacity(entries.len());
        for (_key, bytes) in entries {
            records.push(Self::decode(&bytes)?.data);
        }
        Ok(records)
    }

    /// Filter, sort descending by `sort_key`, then skip/limit.
    ///
    /// Scans all entries then slices in memory. Ties keep key order.
    pub fn find<K, F, S>(&self, filter: F, sort_key: S, skip: usize, limit: usize) -> Result<Found<T>, ServiceError>
    where
        K: Ord,
        F: Fn(&T) -> bool,
        S: Fn(&T) -> K,
    {
        self.find_by(filter, |a, b| sort_key(b).cmp(&sort_key(a)), skip, limit)
    }

    /// Like [`DocOps::find`], with the order given by `cmp`.
    pub fn find_by<F, C>(&self, filter: F, cmp: C, skip: usize, limit: usize) -> Result<Found<T>, ServiceError>
    where
        F: Fn(&T) -> bool,
        C: Fn(&T, &T) -> std::cmp::Ordering,
    {
        let mut matched: Vec<T> = self.list()?.into_iter().filter(|d| filter(d)).collect();
        matched.sort_by(|a, b| cmp(a, b));
        let total = matched.len();
        let items = matched.into_iter().skip(skip).take(limit).collect();
        Ok(Found { items, total })
    }

    /// Create a new record. Calls `before_create`; fails with Conflict if the
    /// key already exists. The existence check and the write are one atomic step.
    pub fn insert(&self, mut record: T) -> Result<T, ServiceError> {
        record.before_create(self.clock.now());

        let id = record.key_value();
        let key = Self::make_key(&id);
        let bytes = Self::encode(1, &record)?;

        if !self.kv.compare_and_swap(&[CasOp::insert(&key, &bytes)]).map_err(Self::kv_err)? {
            return Err(ServiceError::Conflict(format!(
                "{} '{}' already exists",
                T::KIND, id
            )));
        }
        Ok(record)
    }

    /// Read-check-write a single record.
    ///
    /// `apply` mutates a copy of the current state. If it returns `Err`
    /// nothing is written. If the copy is unchanged nothing is written.
    /// Otherwise `before_update` runs and the record is swapped in only if
    /// nobody wrote it since it was read; on a lost race the whole cycle
    /// repeats against fresh state, so `apply` may run more than once.
    ///
    /// Returns the record as committed and whatever `apply` returned.
    pub fn update<R, E, F>(&self, id: &str, mut apply: F) -> Result<(T, R), E>
    where
        E: From<ServiceError>,
        F: FnMut(&mut T) -> Result<R, E>,
    {
        let key = Self::make_key(id);
        for attempt in 1..=self.max_attempts {
            let raw = self.read_raw(id)?;
            let current = Self::decode(&raw)?;

            let mut next = current.data.clone();
            let out = apply(&mut next)?;
            if Self::unchanged(&current.data, &next)? {
                return Ok((next, out));
            }

            next.before_update(self.clock.now());
            let bytes = Self::encode(current.version + 1, &next)?;
            let swapped = self
                .kv
                .compare_and_swap(&[CasOp::replace(&key, &raw, &bytes)])
                .map_err(Self::kv_err)?;
            if swapped {
                return Ok((next, out));
            }
            debug!("{} '{}' changed during update, retrying (attempt {})", T::KIND, id, attempt);
        }
        Err(self.contended(id).into())
    }

    /// Read-check-write two distinct records of the same kind as one unit.
    ///
    /// Both records are guarded, including one that `apply` left unchanged,
    /// because the decision may depend on its state. Either both writes land
    /// or neither does.
    pub fn update_pair<R, E, F>(&self, first: &str, second: &str, mut apply: F) -> Result<(T, T, R), E>
    where
        E: From<ServiceError>,
        F: FnMut(&mut T, &mut T) -> Result<R, E>,
    {
        if first == second {
            return Err(ServiceError::Validation(format!(
                "pair update on {} needs two distinct ids",
                T::KIND
            ))
            .into());
        }

        let (key_a, key_b) = (Self::make_key(first), Self::make_key(second));
        for attempt in 1..=self.max_attempts {
            let raw_a = self.read_raw(first)?;
            let raw_b = self.read_raw(second)?;
            let cur_a = Self::decode(&raw_a)?;
            let cur_b = Self::decode(&raw_b)?;

            let mut next_a = cur_a.data.clone();
            let mut next_b = cur_b.data.clone();
            let out = apply(&mut next_a, &mut next_b)?;

            let same_a = Self::unchanged(&cur_a.data, &next_a)?;
            let same_b = Self::unchanged(&cur_b.data, &next_b)?;
            if same_a && same_b {
                return Ok((next_a, next_b, out));
            }

            let now = self.clock.now();
            let new_a = if same_a {
                raw_a.clone()
            } else {
                next_a.before_update(now);
                Self::encode(cur_a.version + 1, &next_a)?
            };
            let new_b = if same_b {
                raw_b.clone()
            } else {
                next_b.before_update(now);
                Self::encode(cur_b.version + 1, &next_b)?
            };

            let ops = [
                CasOp::replace(&key_a, &raw_a, &new_a),
                CasOp::replace(&key_b, &raw_b, &new_b),
            ];
            if self.kv.compare_and_swap(&ops).map_err(Self::kv_err)? {
                return Ok((next_a, next_b, out));
            }
            debug!(
                "{} '{}'/'{}' changed during pair update, retrying (attempt {})",
                T::KIND, first, second, attempt
            );
        }
        Err(self.contended(first).into())
    }

    /// Delete a record if `check` accepts its current state.
    /// Returns the record as it was just before deletion.
    pub fn remove_with<E, F>(&self, id: &str, mut check: F) -> Result<T, E>
    where
        E: From<ServiceError>,
        F: FnMut(&T) -> Result<(), E>,
    {
        let key = Self::make_key(id);
        for attempt in 1..=self.max_attempts {
            let raw = self.read_raw(id)?;
            let current = Self::decode(&raw)?;
            check(&current.data)?;

            if self.kv.compare_and_swap(&[CasOp::remove(&key, &raw)]).map_err(Self::kv_err)? {
                return Ok(current.data);
            }
            debug!("{} '{}' changed before delete, retrying (attempt {})", T::KIND, id, attempt);
        }
        Err(self.contended(id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use tripvisor_core::SystemClock;
    use tripvisor_kv::RedbStore;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Thing {
        id: String,
        count: u32,
        touched: Option<DateTime<Utc>>,
    }

    impl Document for Thing {
        const KIND: &'static str = "thing";

        fn kv_prefix() -> &'static str {
            "test:thing:"
        }

        fn key_value(&self) -> String {
            self.id.clone()
        }

        fn before_update(&mut self, now: DateTime<Utc>) {
            self.touched = Some(now);
        }
    }

    fn thing(id: &str, count: u32) -> Thing {
        Thing { id: id.to_string(), count, touched: None }
    }

    fn make_ops() -> (DocOps<Thing>, Arc<dyn KVStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let kv: Arc<dyn KVStore> = Arc::new(RedbStore::open(&dir.path().join("test.redb")).unwrap());
        let ops = DocOps::new(Arc::clone(&kv), Arc::new(SystemClock));
        (ops, kv, dir)
    }

    #[test]
    fn insert_and_get() {
        let (ops, _kv, _dir) = make_ops();
        ops.insert(thing("a", 1)).unwrap();

        assert_eq!(ops.get("a").unwrap(), Some(thing("a", 1)));
        assert_eq!(ops.get_versioned("a").unwrap().unwrap().1, 1);
        assert!(ops.get("missing").unwrap().is_none());
        assert!(matches!(ops.get_or_err("missing"), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn insert_duplicate_conflicts() {
        let (ops, _kv, _dir) = make_ops();
        ops.insert(thing("a", 1)).unwrap();
        let err = ops.insert(thing("a", 2)).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(ops.get_or_err("a").unwrap().count, 1);
    }

    #[test]
    fn update_bumps_version_and_runs_hook() {
        let (ops, _kv, _dir) = make_ops();
        ops.insert(thing("a", 1)).unwrap();

        let (doc, out) = ops
            .update::<_, ServiceError, _>("a", |t| {
                t.count += 1;
                Ok(t.count)
            })
            .unwrap();
        assert_eq!(out, 2);
        assert!(doc.touched.is_some());

        let (stored, version) = ops.get_versioned("a").unwrap().unwrap();
        assert_eq!(stored.count, 2);
        assert_eq!(version, 2);
    }

    #[test]
    fn noop_update_writes_nothing() {
        let (ops, _kv, _dir) = make_ops();
        ops.insert(thing("a", 1)).unwrap();

        ops.update::<_, ServiceError, _>("a", |_| Ok(())).unwrap();
        let (stored, version) = ops.get_versioned("a").unwrap().unwrap();
        assert_eq!(version, 1);
        assert!(stored.touched.is_none());
    }

    #[test]
    fn failed_apply_writes_nothing() {
        let (ops, _kv, _dir) = make_ops();
        ops.insert(thing("a", 1)).unwrap();

        let err = ops
            .update::<(), _, _>("a", |t| {
                t.count = 99;
                Err(ServiceError::Validation("nope".into()))
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(ops.get_or_err("a").unwrap().count, 1);
    }

    #[test]
    fn update_missing_is_not_found() {
        let (ops, _kv, _dir) = make_ops();
        let err = ops.update::<(), ServiceError, _>("nope", |_| Ok(())).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn lost_race_retries_against_fresh_state() {
        let (ops, kv, _dir) = make_ops();
        ops.insert(thing("a", 1)).unwrap();
        let rival = DocOps::<Thing>::new(kv, Arc::new(SystemClock));

        let mut calls = 0;
        let (doc, _) = ops
            .update::<_, ServiceError, _>("a", |t| {
                calls += 1;
                if calls == 1 {
                    // Someone else commits between our read and our write.
                    rival
                        .update::<_, ServiceError, _>("a", |r| {
                            r.count += 10;
                            Ok(())
                        })
                        .unwrap();
                }
                t.count += 1;
                Ok(())
            })
            .unwrap();

        assert_eq!(calls, 2);
        assert_eq!(doc.count, 12);
        assert_eq!(ops.get_or_err("a").unwrap().count, 12);
    }

    #[test]
    fn endless_contention_gives_conflict() {
        let (ops, kv, _dir) = make_ops();
        let ops = ops.with_max_attempts(3);
        ops.insert(thing("a", 1)).unwrap();
        let rival = DocOps::<Thing>::new(kv, Arc::new(SystemClock));

        let mut calls = 0;
        let err = ops
            .update::<(), ServiceError, _>("a", |t| {
                calls += 1;
                rival
                    .update::<_, ServiceError, _>("a", |r| {
                        r.count += 1;
                        Ok(())
                    })
                    .unwrap();
                t.count = 0;
                Ok(())
            })
            .unwrap_err();

        assert_eq!(calls, 3);
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(ops.get_or_err("a").unwrap().count, 4);
    }

    #[test]
    fn concurrent_increments_all_land() {
        let (ops, _kv, _dir) = make_ops();
        let ops = Arc::new(ops.with_max_attempts(1000));
        ops.insert(thing("a", 0)).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ops = Arc::clone(&ops);
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        ops.update::<_, ServiceError, _>("a", |t| {
                            t.count += 1;
                            Ok(())
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(ops.get_or_err("a").unwrap().count, 80);
    }

    #[test]
    fn pair_update_commits_both() {
        let (ops, _kv, _dir) = make_ops();
        ops.insert(thing("a", 1)).unwrap();
        ops.insert(thing("b", 1)).unwrap();

        let (a, b, _) = ops
            .update_pair::<_, ServiceError, _>("a", "b", |a, b| {
                a.count += 1;
                b.count += 2;
                Ok(())
            })
            .unwrap();
        assert_eq!((a.count, b.count), (2, 3));
        assert_eq!(ops.get_versioned("a").unwrap().unwrap().1, 2);
        assert_eq!(ops.get_versioned("b").unwrap().unwrap().1, 2);
    }

    #[test]
    fn pair_update_guards_the_unchanged_side() {
        let (ops, kv, _dir) = make_ops();
        ops.insert(thing("a", 1)).unwrap();
        ops.insert(thing("b", 1)).unwrap();
        let rival = DocOps::<Thing>::new(kv, Arc::new(SystemClock));

        let mut seen_b = Vec::new();
        ops.update_pair::<_, ServiceError, _>("a", "b", |a, b| {
            seen_b.push(b.count);
            if seen_b.len() == 1 {
                rival
                    .update::<_, ServiceError, _>("b", |r| {
                        r.count = 50;
                        Ok(())
                    })
                    .unwrap();
            }
            // Only `a` changes; `b` is read but written back as-is.
            a.count = b.count + 1;
            Ok(())
        })
        .unwrap();

        assert_eq!(seen_b, vec![1, 50]);
        assert_eq!(ops.get_or_err("a").unwrap().count, 51);
        assert_eq!(ops.get_versioned("a").unwrap().unwrap().1, 2);
        assert_eq!(ops.get_versioned("b").unwrap().unwrap().1, 2);
    }

    #[test]
    fn pair_update_rejects_same_id() {
        let (ops, _kv, _dir) = make_ops();
        ops.insert(thing("a", 1)).unwrap();
        let err = ops
            .update_pair::<(), ServiceError, _>("a", "a", |_, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn remove_with_respects_check() {
        let (ops, _kv, _dir) = make_ops();
        ops.insert(thing("a", 1)).unwrap();

        let err = ops
            .remove_with("a", |_| Err(ServiceError::Forbidden("not yours".into())))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert!(ops.get("a").unwrap().is_some());

        let removed = ops.remove_with::<ServiceError, _>("a", |_| Ok(())).unwrap();
        assert_eq!(removed.id, "a");
        assert!(ops.get("a").unwrap().is_none());
    }

    #[test]
    fn find_filters_sorts_and_pages() {
        let (ops, _kv, _dir) = make_ops();
        for (id, count) in [("a", 5), ("b", 9), ("c", 1), ("d", 7), ("e", 3)] {
            ops.insert(thing(id, count)).unwrap();
        }

        let found = ops.find(|t| t.count > 2, |t| t.count, 1, 2).unwrap();
        assert_eq!(found.total, 4);
        let counts: Vec<_> = found.items.iter().map(|t| t.count).collect();
        assert_eq!(counts, vec![7, 5]);
    }

    #[test]
    fn find_by_uses_the_given_order() {
        let (ops, _kv, _dir) = make_ops();
        for (id, count) in [("a", 5), ("b", 9), ("c", 1)] {
            ops.insert(thing(id, count)).unwrap();
        }

        let found = ops.find_by(|_| true, |a, b| a.count.cmp(&b.count), 0, 10).unwrap();
        let ids: Vec<_> = found.items.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
