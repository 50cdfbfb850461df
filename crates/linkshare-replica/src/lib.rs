//! Local replica for LinkShare.
//!
//! This crate turns the unordered, possibly duplicated, possibly partial
//! stream of remote nodes into one authoritative local view. It provides:
//! - [`LocalStore`]: bounded, deduplicated record store with an explicit
//!   retention and merge policy
//! - [`ReplicaIngestor`]: live subscription or one-shot fetch folding
//!   remote nodes into the store
//! - Record decoding that drops tombstones and partial nodes
//! - [`ProjectionEngine`]: Home / Recent / Trending / Search views

pub mod codec;
pub mod error;
pub mod ingest;
pub mod projection;
pub mod store;

pub use codec::{decode_record, encode_like_count, encode_record};
pub use error::MalformedRecord;
pub use ingest::{apply_update, IngestReport, ReplicaIngestor};
pub use projection::{FeedTab, ProjectionEngine, ProjectionLimits};
pub use store::{LocalStore, MergePolicy, Retention, Upsert, DEFAULT_RETENTION_CAP};
