//! A [`MemoryRemote`] whose writes survive the process.
//!
//! Every accepted write is appended to a [`Journal`] before it is applied
//! and routed. Opening the store replays the journal, so separate processes
//! pointed at the same file see one shared replicated store.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::journal::{Journal, JournalConfig};
use crate::memory::{self, MemoryRemote};
use crate::node::{FieldValue, RemoteNode, RemoteWrite};
use crate::subscription::{OnceFetch, Subscription};
use crate::traits::RemoteStore;

pub struct JournaledRemote {
    inner: MemoryRemote,
    journal: Journal,
}

impl JournaledRemote {
    /// Open (or create) the journal at `path` and rebuild the store from it.
    pub fn open(path: &Path, config: JournalConfig) -> Result<Self> {
        let journal = Journal::open(path, config)?;
        let inner = MemoryRemote::new();

        let writes = journal.recover()?;
        let mut skipped = 0usize;
        for write in &writes {
            if let Err(e) = inner.apply_silently(write) {
                warn!(error = %e, "invalid journal write; skipping");
                skipped += 1;
            }
        }

        info!(path = %path.display(), writes = writes.len(), skipped, "journaled remote opened");
        Ok(Self { inner, journal })
    }

    /// Rewrite the journal to one frame per live node.
    pub fn compact(&self) -> Result<usize> {
        let writes = self.inner.snapshot_writes();
        self.journal.rewrite(&writes)?;
        info!(frames = writes.len(), "journal compacted");
        Ok(writes.len())
    }

    pub fn set_connected(&self, connected: bool) {
        self.inner.set_connected(connected);
    }

    pub fn node(&self, namespace: &str, id: &str) -> Option<RemoteNode> {
        self.inner.node(namespace, id)
    }

    pub fn nodes(&self, namespace: &str) -> Vec<(String, RemoteNode)> {
        self.inner.nodes(namespace)
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    fn commit(&self, write: RemoteWrite) -> Result<()> {
        self.inner.ensure_connected()?;
        memory::validate(&write)?;
        self.journal.append(&write)?;
        self.inner.commit(&write)
    }
}

impl RemoteStore for JournaledRemote {
    fn put_node(&self, namespace: &str, id: &str, fields: BTreeMap<String, FieldValue>) -> Result<()> {
        self.commit(RemoteWrite::PutNode {
            namespace: namespace.to_string(),
            id: id.to_string(),
            fields,
        })
    }

    fn put_field(&self, namespace: &str, id: &str, field: &str, value: FieldValue) -> Result<()> {
        self.commit(RemoteWrite::PutField {
            namespace: namespace.to_string(),
            id: id.to_string(),
            field: field.to_string(),
            value,
        })
    }

    fn put_tombstone(&self, namespace: &str, id: &str) -> Result<()> {
        self.commit(RemoteWrite::Tombstone {
            namespace: namespace.to_string(),
            id: id.to_string(),
        })
    }

    fn fetch_once(&self, namespace: &str, id: &str) -> Result<OnceFetch> {
        self.inner.fetch_once(namespace, id)
    }

    fn subscribe(&self, namespace: &str) -> Result<Subscription> {
        self.inner.subscribe(namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;

    const NS: &str = "posts";

    fn open(dir: &tempfile::TempDir) -> JournaledRemote {
        JournaledRemote::open(&dir.path().join("remote.journal"), JournalConfig::default()).unwrap()
    }

    #[test]
    fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let remote = open(&dir);
            remote.put_field(NS, "a", "content", "hi".into()).unwrap();
            remote.put_field(NS, "a", "likeCount", FieldValue::Integer(2)).unwrap();
        }

        let remote = open(&dir);
        let node = remote.node(NS, "a").unwrap();
        assert_eq!(node.get("content"), Some(&FieldValue::text("hi")));
        assert_eq!(node.get("likeCount"), Some(&FieldValue::Integer(2)));
    }

    #[test]
    fn reopened_store_replays_to_subscribers() {
        let dir = tempfile::tempdir().unwrap();
        open(&dir).put_field(NS, "a", "content", "hi".into()).unwrap();

        let remote = open(&dir);
        let mut sub = remote.subscribe(NS).unwrap();
        assert_eq!(sub.try_next().unwrap().id, "a");
    }

    #[test]
    fn tombstones_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let remote = open(&dir);
            remote.put_field(NS, "a", "content", "hi".into()).unwrap();
            remote.put_tombstone(NS, "a").unwrap();
        }
        assert!(open(&dir).node(NS, "a").is_none());
    }

    #[test]
    fn offline_writes_are_not_journaled() {
        let dir = tempfile::tempdir().unwrap();
        let remote = open(&dir);
        remote.set_connected(false);
        assert!(matches!(
            remote.put_field(NS, "a", "content", "hi".into()),
            Err(RemoteError::Unavailable)
        ));
        assert_eq!(remote.journal().offset(), 0);
    }

    #[test]
    fn invalid_writes_are_not_journaled() {
        let dir = tempfile::tempdir().unwrap();
        {
            let remote = open(&dir);
            assert!(matches!(
                remote.put_field(NS, "", "content", "hi".into()),
                Err(RemoteError::InvalidKey(_))
            ));
            assert!(matches!(
                remote.put_field(NS, "a", "", "hi".into()),
                Err(RemoteError::InvalidKey(_))
            ));
            assert_eq!(remote.journal().offset(), 0);
        }
        assert!(open(&dir).nodes(NS).is_empty());
    }

    #[test]
    fn replay_skips_invalid_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote.journal");
        {
            let journal = Journal::open(&path, JournalConfig::default()).unwrap();
            journal
                .append(&RemoteWrite::PutField {
                    namespace: NS.into(),
                    id: String::new(),
                    field: "content".into(),
                    value: "lost".into(),
                })
                .unwrap();
            journal
                .append(&RemoteWrite::PutField {
                    namespace: NS.into(),
                    id: "a".into(),
                    field: "content".into(),
                    value: "kept".into(),
                })
                .unwrap();
        }

        let remote = JournaledRemote::open(&path, JournalConfig::default()).unwrap();
        assert_eq!(
            remote.node(NS, "a").unwrap().get("content"),
            Some(&FieldValue::text("kept"))
        );
        assert_eq!(remote.nodes(NS).len(), 1);
    }

    #[test]
    fn compact_keeps_state_and_shrinks_journal() {
        let dir = tempfile::tempdir().unwrap();
        {
            let remote = open(&dir);
            for count in 0..20 {
                remote.put_field(NS, "a", "likeCount", FieldValue::Integer(count)).unwrap();
            }
            let before = remote.journal().offset();
            assert_eq!(remote.compact().unwrap(), 1);
            assert!(remote.journal().offset() < before);
        }

        let remote = open(&dir);
        assert_eq!(
            remote.node(NS, "a").unwrap().get("likeCount"),
            Some(&FieldValue::Integer(19))
        );
    }
}
