use linkshare_types::PostId;

/// Why a new post was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("post content must not be empty")]
    EmptyContent,

    #[error("author must not be empty")]
    EmptyAuthor,
}

/// Why a like was refused.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// This session already liked the post.
    #[error("post {id} was already liked in this session")]
    AlreadyLiked { id: PostId },

    /// The post is not in the local view.
    #[error("post {id} not found")]
    NotFound { id: PostId },
}
