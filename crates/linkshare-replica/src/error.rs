use linkshare_types::TypeError;

/// Why a delivered node could not become a record.
///
/// These are dropped during ingestion and never surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedRecord {
    #[error("node was cleared")]
    Tombstone,

    #[error("node carries only store metadata")]
    MetadataOnly,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("invalid id: {0}")]
    InvalidId(#[from] TypeError),
}
