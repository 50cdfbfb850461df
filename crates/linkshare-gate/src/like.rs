use std::collections::HashSet;

use linkshare_types::PostId;
use tracing::debug;

use crate::error::GateError;

/// Posts this session has liked.
///
/// Lives exactly as long as the session that owns it and is never
/// persisted, so a restarted client may like the same post again. Check
/// and admit run on the session's single thread, which keeps the pair
/// atomic.
#[derive(Clone, Debug, Default)]
pub struct LikeGate {
    liked: HashSet<PostId>,
}

impl LikeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a like of `id` may proceed.
    ///
    /// The already-liked check runs before the existence check, so a post
    /// liked earlier and since evicted still reports `AlreadyLiked`.
    pub fn check(&self, id: &PostId, exists: bool) -> Result<(), GateError> {
        if self.liked.contains(id) {
            debug!(%id, "like refused: already liked");
            return Err(GateError::AlreadyLiked { id: id.clone() });
        }
        if !exists {
            debug!(%id, "like refused: not found");
            return Err(GateError::NotFound { id: id.clone() });
        }
        Ok(())
    }

    /// Record a successful like. Returns `false` if it was already recorded.
    pub fn admit(&mut self, id: PostId) -> bool {
        self.liked.insert(id)
    }

    pub fn contains(&self, id: &PostId) -> bool {
        self.liked.contains(id)
    }

    pub fn len(&self) -> usize {
        self.liked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.liked.is_empty()
    }
}
