//! Optimistic writes.
//!
//! Each write is applied to the local store and issued to the remote store
//! independently. Neither waits for the other. A failed remote write is
//! logged and forgotten, so the local view may diverge from the remote until
//! the session ends.

use std::sync::Arc;

use linkshare_gate::{validate_post, GateError, LikeGate, ValidationError};
use linkshare_remote::RemoteStore;
use linkshare_replica::{encode_like_count, encode_record, LocalStore, Upsert};
use linkshare_types::{fields, Clock, PostId, Record};
use tracing::{debug, info, warn};

pub struct WriteCoordinator {
    remote: Arc<dyn RemoteStore>,
    namespace: String,
    clock: Arc<dyn Clock>,
}

impl WriteCoordinator {
    pub fn new(remote: Arc<dyn RemoteStore>, namespace: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            remote,
            namespace: namespace.into(),
            clock,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Create a post with a fresh id and zero likes.
    ///
    /// Nothing is written anywhere if validation fails. In a singleton store
    /// pinned to another post the remote write still happens but the local
    /// view is left alone.
    pub fn create_post(
        &self,
        store: &mut LocalStore,
        content: &str,
        author: &str,
    ) -> Result<Record, ValidationError> {
        validate_post(content, author)?;

        let now = self.clock.now();
        let record = Record::new(PostId::generate(now), content, author, now);

        if let Err(e) = self
            .remote
            .put_node(&self.namespace, record.id.as_str(), encode_record(&record))
        {
            warn!(id = %record.id, error = %e, "remote create dropped");
        }

        let outcome = store.upsert(record.clone());
        if outcome == Upsert::Rejected {
            debug!(id = %record.id, "created post not shown in single-post view");
        }
        info!(id = %record.id, author = %record.author, "post created");
        Ok(record)
    }

    /// Add one like to `id`. Returns the new count.
    pub fn like_post(
        &self,
        store: &mut LocalStore,
        gate: &mut LikeGate,
        id: &PostId,
    ) -> Result<u64, GateError> {
        gate.check(id, store.contains(id))?;
        let current = store
            .get(id)
            .cloned()
            .ok_or_else(|| GateError::NotFound { id: id.clone() })?;
        let count = current.like_count + 1;

        if let Err(e) = self.remote.put_field(
            &self.namespace,
            id.as_str(),
            fields::LIKE_COUNT,
            encode_like_count(count),
        ) {
            warn!(%id, error = %e, "remote like dropped");
        }

        store.upsert(current.with_like_count(count));
        gate.admit(id.clone());
        info!(%id, count, "post liked");
        Ok(count)
    }
}
