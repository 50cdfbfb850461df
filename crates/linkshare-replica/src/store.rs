//! The bounded, deduplicated local record store.
//!
//! [`LocalStore`] is owned by a single session and mutated only through
//! [`LocalStore::upsert`]. After every call:
//! - no two records share an id;
//! - in capped mode the store holds at most `cap` records, and they are the
//!   ones with the greatest `created_at` (ties broken by id);
//! - in singleton mode the store holds at most one record.

use std::cmp::Ordering;

use linkshare_types::{PostId, Record};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Default number of records kept in live mode.
pub const DEFAULT_RETENTION_CAP: usize = 50;

/// Which records the store keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Retention {
    /// Keep the `n` newest records, ordered newest first.
    Capped(usize),
    /// Keep only the first record ever inserted.
    Singleton,
}

/// How a delivery for an id already in the store is combined with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergePolicy {
    /// The later delivery replaces the whole record.
    ///
    /// Two clients liking from the same base count both write `n + 1`, and
    /// one increment is lost. That matches the replicated store's own
    /// semantics and is kept as-is.
    #[default]
    LastWriteWins,
}

impl MergePolicy {
    pub fn merge(&self, _existing: &Record, incoming: Record) -> Record {
        match self {
            Self::LastWriteWins => incoming,
        }
    }
}

/// What an upsert did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
    /// A new id was added.
    Inserted,
    /// An existing record changed.
    Replaced,
    /// The delivery matched what was already stored.
    Unchanged,
    /// The record was older than everything kept under the cap.
    Dropped,
    /// The store is a singleton pinned to a different id.
    Rejected,
}

impl Upsert {
    /// `true` if the store's contents changed.
    pub fn changed(&self) -> bool {
        matches!(self, Self::Inserted | Self::Replaced)
    }
}

/// Newest first; equal timestamps by id ascending.
fn retention_order(a: &Record, b: &Record) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Clone, Debug)]
pub struct LocalStore {
    records: Vec<Record>,
    retention: Retention,
    merge: MergePolicy,
}

impl LocalStore {
    /// Store for live mode, keeping at most `cap` records.
    pub fn live(cap: usize) -> Self {
        Self::with_policy(Retention::Capped(cap), MergePolicy::default())
    }

    /// Store for deep-link mode, holding a single record.
    pub fn singleton() -> Self {
        Self::with_policy(Retention::Singleton, MergePolicy::default())
    }

    pub fn with_policy(retention: Retention, merge: MergePolicy) -> Self {
        Self {
            records: Vec::new(),
            retention,
            merge,
        }
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    pub fn merge_policy(&self) -> MergePolicy {
        self.merge
    }

    /// Insert or replace a record, then re-apply ordering and retention.
    pub fn upsert(&mut self, record: Record) -> Upsert {
        let outcome = match self.position(&record.id) {
            Some(index) => self.replace_at(index, record),
            None => self.insert(record),
        };
        trace!(?outcome, len = self.records.len(), "local upsert");
        outcome
    }

    /// Records in store order (newest first in capped mode).
    pub fn all(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, id: &PostId) -> Option<&Record> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn contains(&self, id: &PostId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: &PostId) -> Option<usize> {
        self.records.iter().position(|r| &r.id == id)
    }

    fn replace_at(&mut self, index: usize, incoming: Record) -> Upsert {
        let merged = self.merge.merge(&self.records[index], incoming);
        if merged == self.records[index] {
            return Upsert::Unchanged;
        }
        let id = merged.id.clone();
        self.records[index] = merged;
        if let Retention::Capped(cap) = self.retention {
            // A changed created_at can move the record, or push it past the cap.
            self.records.sort_by(retention_order);
            self.records.truncate(cap);
            if !self.contains(&id) {
                return Upsert::Dropped;
            }
        }
        Upsert::Replaced
    }

    fn insert(&mut self, record: Record) -> Upsert {
        match self.retention {
            Retention::Singleton => {
                if self.records.is_empty() {
                    self.records.push(record);
                    Upsert::Inserted
                } else {
                    Upsert::Rejected
                }
            }
            Retention::Capped(cap) => {
                let id = record.id.clone();
                self.records.push(record);
                self.records.sort_by(retention_order);
                if self.records.len() > cap {
                    self.records.truncate(cap);
                    if !self.contains(&id) {
                        return Upsert::Dropped;
                    }
                }
                Upsert::Inserted
            }
        }
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::live(DEFAULT_RETENTION_CAP)
    }
}
