use serde::{Deserialize, Serialize};

use crate::post::PostId;
use crate::temporal::Millis;

/// Wire field names of a post node.
///
/// The id is never a field; it is the key the node is stored under.
pub mod fields {
    pub const CONTENT: &str = "content";
    pub const AUTHOR: &str = "author";
    pub const CREATED_AT: &str = "createdAt";
    pub const LIKE_COUNT: &str = "likeCount";

    /// Every field a node must carry to be a complete record.
    pub const REQUIRED: [&str; 4] = [CONTENT, AUTHOR, CREATED_AT, LIKE_COUNT];
}

/// A single replicated post.
///
/// `id`, `author` and `created_at` are fixed at creation. Only
/// `like_count` changes afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: PostId,
    pub content: String,
    pub author: String,
    pub created_at: Millis,
    pub like_count: u64,
}

impl Record {
    /// A freshly created record with no likes.
    pub fn new(
        id: PostId,
        content: impl Into<String>,
        author: impl Into<String>,
        created_at: Millis,
    ) -> Self {
        Self {
            id,
            content: content.into(),
            author: author.into(),
            created_at,
            like_count: 0,
        }
    }

    /// Copy of this record carrying a different like count.
    pub fn with_like_count(&self, like_count: u64) -> Self {
        Self {
            like_count,
            ..self.clone()
        }
    }
}
