//! Folding remote deliveries into the local store.

use linkshare_remote::{
    OnceFetch, RemoteNode, RemoteStore, RemoteUpdate, Result as RemoteResult, Subscription,
};
use tracing::{debug, info};

use crate::codec::decode_record;
use crate::error::MalformedRecord;
use crate::store::{LocalStore, Upsert};

/// Decode one delivery and upsert it.
///
/// Malformed deliveries are returned as errors and leave the store untouched.
pub fn apply_update(store: &mut LocalStore, update: &RemoteUpdate) -> Result<Upsert, MalformedRecord> {
    let record = decode_record(&update.id, update.node.as_ref())?;
    Ok(store.upsert(record))
}

/// Counts from one [`ReplicaIngestor::poll`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Deliveries decoded and upserted (including no-op merges).
    pub applied: usize,
    /// Deliveries dropped as malformed.
    pub dropped: usize,
    /// `true` if a one-shot fetch resolved during this poll.
    pub resolved: bool,
}

impl IngestReport {
    pub fn is_empty(&self) -> bool {
        self.applied == 0 && self.dropped == 0 && !self.resolved
    }

    fn absorb(&mut self, outcome: &Result<Upsert, MalformedRecord>) {
        match outcome {
            Ok(_) => self.applied += 1,
            Err(_) => self.dropped += 1,
        }
    }
}

enum Feed {
    Live(Subscription),
    Once(OnceFetch),
    Closed,
}

/// Moves records from a remote store into a [`LocalStore`].
///
/// The ingestor never holds the store; callers pass it to [`poll`] or
/// [`next`] so a single owner keeps all mutation.
///
/// [`poll`]: ReplicaIngestor::poll
/// [`next`]: ReplicaIngestor::next
pub struct ReplicaIngestor {
    feed: Feed,
    namespace: String,
}

impl ReplicaIngestor {
    /// Subscribe to every record under `namespace`.
    pub fn start_live(remote: &dyn RemoteStore, namespace: &str) -> RemoteResult<Self> {
        let subscription = remote.subscribe(namespace)?;
        info!(namespace, "live ingest started");
        Ok(Self {
            feed: Feed::Live(subscription),
            namespace: namespace.to_string(),
        })
    }

    /// Read the single record `namespace/id`.
    pub fn fetch_once(remote: &dyn RemoteStore, namespace: &str, id: &str) -> RemoteResult<Self> {
        let fetch = remote.fetch_once(namespace, id)?;
        info!(namespace, id, "one-shot fetch started");
        Ok(Self {
            feed: Feed::Once(fetch),
            namespace: namespace.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn is_live(&self) -> bool {
        matches!(self.feed, Feed::Live(_))
    }

    /// `true` once the feed can yield nothing more.
    pub fn is_finished(&self) -> bool {
        match &self.feed {
            Feed::Live(sub) => !sub.is_active(),
            Feed::Once(fetch) => fetch.is_terminated(),
            Feed::Closed => true,
        }
    }

    /// Apply every delivery already waiting, without blocking.
    pub fn poll(&mut self, store: &mut LocalStore) -> IngestReport {
        let mut report = IngestReport::default();
        match &mut self.feed {
            Feed::Live(sub) => {
                while let Some(update) = sub.try_next() {
                    report.absorb(&ingest(store, &update));
                }
            }
            Feed::Once(fetch) => {
                if let Some(result) = fetch.try_resolve() {
                    report.resolved = true;
                    if let Some(outcome) = resolve(store, fetch.id(), &self.namespace, result) {
                        report.absorb(&outcome);
                    }
                }
            }
            Feed::Closed => {}
        }
        report
    }

    /// Wait for the next delivery and apply it.
    ///
    /// Returns `None` when the feed is finished. A one-shot fetch that found
    /// nothing yields `Some(Ok(Upsert::Unchanged))` once and then `None`.
    pub async fn next(&mut self, store: &mut LocalStore) -> Option<Result<Upsert, MalformedRecord>> {
        match &mut self.feed {
            Feed::Live(sub) => {
                let update = sub.next().await?;
                Some(ingest(store, &update))
            }
            Feed::Once(fetch) => {
                let result = fetch.resolve().await?;
                let id = fetch.id().to_string();
                Some(resolve(store, &id, &self.namespace, result).unwrap_or(Ok(Upsert::Unchanged)))
            }
            Feed::Closed => None,
        }
    }

    /// Tear the feed down. Returns `false` if it was already torn down.
    pub fn shutdown(&mut self) -> bool {
        match std::mem::replace(&mut self.feed, Feed::Closed) {
            Feed::Live(mut sub) => {
                let closed = sub.unsubscribe();
                info!(namespace = %self.namespace, "live ingest stopped");
                closed
            }
            Feed::Once(_) => true,
            Feed::Closed => false,
        }
    }
}

impl Drop for ReplicaIngestor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn ingest(store: &mut LocalStore, update: &RemoteUpdate) -> Result<Upsert, MalformedRecord> {
    let outcome = apply_update(store, update);
    match &outcome {
        Ok(upsert) => debug!(id = %update.id, ?upsert, "ingest applied"),
        Err(reason) => debug!(id = %update.id, %reason, "ingest dropped"),
    }
    outcome
}

/// Fold a one-shot result. `None` means the key did not exist.
fn resolve(
    store: &mut LocalStore,
    id: &str,
    namespace: &str,
    result: Option<RemoteNode>,
) -> Option<Result<Upsert, MalformedRecord>> {
    let Some(node) = result else {
        debug!(namespace, id, "one-shot fetch found no record");
        return None;
    };
    let update = RemoteUpdate {
        namespace: namespace.to_string(),
        id: id.to_string(),
        node: Some(node),
    };
    Some(ingest(store, &update))
}
