//! High-level SDK for LinkShare.
//!
//! A [`Session`] is the entry point for applications: it opens either the
//! live feed or a single shared post, keeps the local replica up to date,
//! and performs optimistic creates and likes.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use linkshare_remote::MemoryRemote;
//! use linkshare_sdk::{Session, SessionConfig, ViewMode};
//!
//! let remote = Arc::new(MemoryRemote::new());
//! let mut session = Session::open(remote, SessionConfig::default(), ViewMode::LiveFeed).unwrap();
//! let post = session.create_post("hello", "alice").unwrap();
//! session.like_post(&post.id).unwrap();
//! assert_eq!(session.trending()[0].like_count, 1);
//! ```

pub mod config;
pub mod error;
pub mod session;
pub mod share;
pub mod writer;

pub use config::{SessionConfig, DEFAULT_NAMESPACE};
pub use error::{SdkError, SdkResult};
pub use session::{Session, SessionStatus};
pub use share::{base_link, build_link, parse_link, parse_requested_id, ShareBase, ViewMode};
pub use writer::WriteCoordinator;

// Re-export key types
pub use linkshare_gate::{Draft, GateError, ValidationError};
pub use linkshare_replica::{FeedTab, IngestReport, ProjectionLimits};
pub use linkshare_types::{Millis, PostId, Record};
