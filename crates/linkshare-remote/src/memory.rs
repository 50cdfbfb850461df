//! In-process replicated store for tests, demos, and embedding.
//!
//! [`MemoryRemote`] keeps every node in memory behind a `RwLock` and fans
//! changes out to subscribers through per-subscriber channels. It can be
//! switched offline to exercise the "remote unavailable" paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, Weak};

use tracing::{debug, info};

use crate::error::{RemoteError, Result};
use crate::node::{FieldValue, NodeMeta, RemoteNode, RemoteUpdate, RemoteWrite};
use crate::subscription::{Detach, OnceFetch, Router, Subscription};
use crate::traits::RemoteStore;

#[derive(Default)]
struct StoreState {
    namespaces: HashMap<String, BTreeMap<String, RemoteNode>>,
    /// Write sequence, stamped into each touched field's metadata.
    seq: u64,
}

impl StoreState {
    fn apply(&mut self, write: &RemoteWrite) -> RemoteUpdate {
        self.seq += 1;
        let seq = self.seq;
        let namespace = write.namespace().to_string();
        let id = write.id().to_string();
        let nodes = self.namespaces.entry(namespace.clone()).or_default();

        let node = match write {
            RemoteWrite::Tombstone { .. } => {
                nodes.remove(&id);
                None
            }
            RemoteWrite::PutNode { fields, .. } => {
                let node = nodes
                    .entry(id.clone())
                    .or_insert_with(|| new_node(&namespace, &id));
                for (field, value) in fields {
                    set_field(node, field, value.clone(), seq);
                }
                Some(node.clone())
            }
            RemoteWrite::PutField { field, value, .. } => {
                let node = nodes
                    .entry(id.clone())
                    .or_insert_with(|| new_node(&namespace, &id));
                set_field(node, field, value.clone(), seq);
                Some(node.clone())
            }
        };

        RemoteUpdate {
            namespace,
            id,
            node,
        }
    }
}

fn new_node(namespace: &str, id: &str) -> RemoteNode {
    RemoteNode {
        meta: Some(NodeMeta {
            soul: format!("{namespace}/{id}"),
            states: BTreeMap::new(),
        }),
        fields: BTreeMap::new(),
    }
}

fn set_field(node: &mut RemoteNode, field: &str, value: FieldValue, seq: u64) {
    node.fields.insert(field.to_string(), value);
    if let Some(meta) = node.meta.as_mut() {
        meta.states.insert(field.to_string(), seq);
    }
}

/// Reject writes with an empty namespace, node id, or field name.
pub(crate) fn validate(write: &RemoteWrite) -> Result<()> {
    if write.namespace().is_empty() {
        return Err(RemoteError::InvalidKey("empty namespace".into()));
    }
    if write.id().is_empty() {
        return Err(RemoteError::InvalidKey("empty node id".into()));
    }
    if let RemoteWrite::PutField { field, .. } = write {
        if field.is_empty() {
            return Err(RemoteError::InvalidKey("empty field name".into()));
        }
    }
    Ok(())
}

/// An in-memory implementation of [`RemoteStore`].
///
/// Data is lost when the store is dropped.
pub struct MemoryRemote {
    state: RwLock<StoreState>,
    router: Arc<Router>,
    connected: AtomicBool,
}

impl MemoryRemote {
    /// Create a new, empty, connected store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            router: Arc::new(Router::new()),
            connected: AtomicBool::new(true),
        }
    }

    /// Simulate losing or regaining the connection to the store.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
        info!(connected, "remote connection state changed");
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Current value of a node, if present.
    pub fn node(&self, namespace: &str, id: &str) -> Option<RemoteNode> {
        let state = self.state.read().expect("remote lock poisoned");
        state.namespaces.get(namespace)?.get(id).cloned()
    }

    /// Every node under a namespace, ordered by id.
    pub fn nodes(&self, namespace: &str) -> Vec<(String, RemoteNode)> {
        let state = self.state.read().expect("remote lock poisoned");
        state
            .namespaces
            .get(namespace)
            .map(|nodes| nodes.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.router.subscriber_count()
    }

    /// One `PutNode` per stored node; replaying them rebuilds the user data.
    pub fn snapshot_writes(&self) -> Vec<RemoteWrite> {
        let state = self.state.read().expect("remote lock poisoned");
        let mut namespaces: Vec<_> = state.namespaces.iter().collect();
        namespaces.sort_by(|(a, _), (b, _)| a.cmp(b));
        namespaces
            .into_iter()
            .flat_map(|(namespace, nodes)| {
                nodes.iter().map(move |(id, node)| RemoteWrite::PutNode {
                    namespace: namespace.clone(),
                    id: id.clone(),
                    fields: node.fields.clone(),
                })
            })
            .collect()
    }

    pub(crate) fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(RemoteError::Unavailable)
        }
    }

    /// Apply a write without routing it. Used when rebuilding from a journal.
    pub(crate) fn apply_silently(&self, write: &RemoteWrite) -> Result<()> {
        validate(write)?;
        self.state.write().expect("remote lock poisoned").apply(write);
        Ok(())
    }

    /// Apply a write and fan the resulting node out to subscribers.
    pub(crate) fn commit(&self, write: &RemoteWrite) -> Result<()> {
        self.ensure_connected()?;
        validate(write)?;

        // Route under the write lock so subscribers see writes in apply order.
        let mut state = self.state.write().expect("remote lock poisoned");
        let update = state.apply(write);
        debug!(
            namespace = %update.namespace,
            id = %update.id,
            tombstone = update.node.is_none(),
            "remote write applied"
        );
        self.router.route(&update);
        drop(state);
        Ok(())
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStore for MemoryRemote {
    fn put_node(&self, namespace: &str, id: &str, fields: BTreeMap<String, FieldValue>) -> Result<()> {
        self.commit(&RemoteWrite::PutNode {
            namespace: namespace.to_string(),
            id: id.to_string(),
            fields,
        })
    }

    fn put_field(&self, namespace: &str, id: &str, field: &str, value: FieldValue) -> Result<()> {
        self.commit(&RemoteWrite::PutField {
            namespace: namespace.to_string(),
            id: id.to_string(),
            field: field.to_string(),
            value,
        })
    }

    fn put_tombstone(&self, namespace: &str, id: &str) -> Result<()> {
        self.commit(&RemoteWrite::Tombstone {
            namespace: namespace.to_string(),
            id: id.to_string(),
        })
    }

    fn fetch_once(&self, namespace: &str, id: &str) -> Result<OnceFetch> {
        self.ensure_connected()?;
        Ok(OnceFetch::ready(id, self.node(namespace, id)))
    }

    fn subscribe(&self, namespace: &str) -> Result<Subscription> {
        self.ensure_connected()?;

        // Hold the read lock so no write lands between snapshot and registration.
        let state = self.state.read().expect("remote lock poisoned");
        let (id, sender, receiver) = self.router.register(namespace);
        if let Some(nodes) = state.namespaces.get(namespace) {
            for (key, node) in nodes {
                let _ = sender.send(RemoteUpdate {
                    namespace: namespace.to_string(),
                    id: key.clone(),
                    node: Some(node.clone()),
                });
            }
        }
        drop(state);

        info!(subscriber = id, namespace, "subscription opened");
        let source: Weak<dyn Detach> = Arc::downgrade(&self.router) as Weak<dyn Detach>;
        Ok(Subscription::new(id, namespace, receiver, source))
    }
}
