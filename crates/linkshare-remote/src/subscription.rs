use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, Weak};

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::node::{RemoteNode, RemoteUpdate};

/// Something a [`Subscription`] can detach itself from.
pub trait Detach: Send + Sync {
    /// Stop delivering to the subscriber with the given id.
    fn detach(&self, subscriber: u64);
}

/// Cancellable feed of every update under one namespace.
///
/// The feed is lazy and infinite until [`Subscription::unsubscribe`] is
/// called or the handle is dropped. Teardown happens exactly once; after
/// it, buffered updates are discarded and nothing more is yielded. A torn
/// down subscription cannot be restarted.
pub struct Subscription {
    id: u64,
    namespace: String,
    receiver: Option<mpsc::UnboundedReceiver<RemoteUpdate>>,
    source: Weak<dyn Detach>,
}

impl Subscription {
    pub fn new(
        id: u64,
        namespace: impl Into<String>,
        receiver: mpsc::UnboundedReceiver<RemoteUpdate>,
        source: Weak<dyn Detach>,
    ) -> Self {
        Self {
            id,
            namespace: namespace.into(),
            receiver: Some(receiver),
            source,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }

    /// Next already-delivered update, without waiting.
    pub fn try_next(&mut self) -> Option<RemoteUpdate> {
        self.receiver.as_mut()?.try_recv().ok()
    }

    /// Wait for the next update. Returns `None` once torn down.
    pub async fn next(&mut self) -> Option<RemoteUpdate> {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.recv().await,
            None => None,
        }
    }

    /// Tear the feed down. Returns `false` if it was already torn down.
    pub fn unsubscribe(&mut self) -> bool {
        let Some(mut receiver) = self.receiver.take() else {
            return false;
        };
        if let Some(source) = self.source.upgrade() {
            source.detach(self.id);
        }
        receiver.close();
        debug!(subscriber = self.id, namespace = %self.namespace, "subscription closed");
        true
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("namespace", &self.namespace)
            .field("active", &self.is_active())
            .finish()
    }
}

/// A point read that resolves at most once.
///
/// Resolves to `Some(node)` if the key exists, `None` otherwise, and then
/// terminates.
#[derive(Debug)]
pub struct OnceFetch {
    id: String,
    receiver: Option<oneshot::Receiver<Option<RemoteNode>>>,
}

impl OnceFetch {
    pub fn new(id: impl Into<String>, receiver: oneshot::Receiver<Option<RemoteNode>>) -> Self {
        Self {
            id: id.into(),
            receiver: Some(receiver),
        }
    }

    /// A fetch that has already resolved to `result`.
    pub fn ready(id: impl Into<String>, result: Option<RemoteNode>) -> Self {
        let (tx, rx) = oneshot::channel();
        // The receiver is alive right here, so the send cannot fail.
        let _ = tx.send(result);
        Self::new(id, rx)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_terminated(&self) -> bool {
        self.receiver.is_none()
    }

    /// The result if it has arrived. Yields `Some` exactly once.
    ///
    /// A source that goes away without answering counts as "no record".
    pub fn try_resolve(&mut self) -> Option<Option<RemoteNode>> {
        let receiver = self.receiver.as_mut()?;
        match receiver.try_recv() {
            Ok(result) => {
                self.receiver = None;
                Some(result)
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.receiver = None;
                Some(None)
            }
        }
    }

    /// Wait for the result. Returns `None` if already resolved.
    pub async fn resolve(&mut self) -> Option<Option<RemoteNode>> {
        let receiver = self.receiver.take()?;
        Some(receiver.await.unwrap_or(None))
    }
}

/// Internal subscriber: a namespace paired with a channel sender.
struct Subscriber {
    id: u64,
    namespace: String,
    sender: mpsc::UnboundedSender<RemoteUpdate>,
}

/// Fan-out router that delivers updates to subscribers of a namespace.
pub(crate) struct Router {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl Router {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Register a subscriber and return its id and sender.
    ///
    /// The caller may push an initial snapshot through the sender before
    /// handing the receiver out.
    pub(crate) fn register(
        &self,
        namespace: &str,
    ) -> (u64, mpsc::UnboundedSender<RemoteUpdate>, mpsc::UnboundedReceiver<RemoteUpdate>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .write()
            .expect("router lock poisoned")
            .push(Subscriber {
                id,
                namespace: namespace.to_string(),
                sender: tx.clone(),
            });
        (id, tx, rx)
    }

    /// Route an update to every subscriber of its namespace.
    /// Subscribers whose channels are closed are pruned.
    pub(crate) fn route(&self, update: &RemoteUpdate) {
        let mut subs = self.subscribers.write().expect("router lock poisoned");
        subs.retain(|sub| {
            if sub.namespace == update.namespace {
                sub.sender.send(update.clone()).is_ok()
            } else {
                !sub.sender.is_closed()
            }
        });
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.read().expect("router lock poisoned").len()
    }
}

impl Detach for Router {
    fn detach(&self, subscriber: u64) {
        self.subscribers
            .write()
            .expect("router lock poisoned")
            .retain(|sub| sub.id != subscriber);
    }
}
