//! The [`RemoteStore`] trait defining the replicated store boundary.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::node::FieldValue;
use crate::subscription::{OnceFetch, Subscription};

/// Handle to the replicated key-value graph.
///
/// Nodes live at `namespace/id`; fields of a node are individually
/// addressable at `namespace/id/field`. Implementations must satisfy these
/// rules:
///
/// - Writes never block on replication. They either hand the mutation off
///   or fail immediately with [`RemoteError::Unavailable`](crate::RemoteError::Unavailable).
///   There is no acknowledgement, retry, or ordering guarantee beyond that.
/// - Writes merge at field level: `put_node` sets the given fields and
///   leaves others alone.
/// - A subscription first yields every node already under the namespace,
///   then every later change, always as the full merged node.
/// - A fetch resolves at most once.
pub trait RemoteStore: Send + Sync {
    /// Merge `fields` into the node at `namespace/id`.
    fn put_node(&self, namespace: &str, id: &str, fields: BTreeMap<String, FieldValue>) -> Result<()>;

    /// Set one field of the node at `namespace/id`.
    fn put_field(&self, namespace: &str, id: &str, field: &str, value: FieldValue) -> Result<()>;

    /// Clear the node at `namespace/id`.
    fn put_tombstone(&self, namespace: &str, id: &str) -> Result<()>;

    /// One-shot read of a single node.
    fn fetch_once(&self, namespace: &str, id: &str) -> Result<OnceFetch>;

    /// Live feed of every node under `namespace`.
    fn subscribe(&self, namespace: &str) -> Result<Subscription>;
}
