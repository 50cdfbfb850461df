//! Replicated store boundary for LinkShare.
//!
//! The replicated key-value graph that holds every post is an external
//! collaborator. This crate defines how the rest of LinkShare talks to it:
//!
//! - [`RemoteStore`]: point writes, field writes, one-shot reads and live
//!   namespace subscriptions
//! - [`RemoteNode`] / [`FieldValue`]: the untyped node shape the store
//!   delivers, including its internal metadata marker
//! - [`Subscription`]: a cancellable, lazily consumed update feed
//! - [`OnceFetch`]: a read that resolves at most once
//!
//! Two in-process implementations are provided: [`MemoryRemote`] for tests
//! and embedding, and [`JournaledRemote`], which persists every write to a
//! CRC-framed journal so separate processes can share one store.

pub mod error;
pub mod journal;
pub mod journaled;
pub mod memory;
pub mod node;
pub mod subscription;
pub mod traits;

pub use error::{RemoteError, Result};
pub use journal::{Journal, JournalConfig, SyncMode};
pub use journaled::JournaledRemote;
pub use memory::MemoryRemote;
pub use node::{FieldValue, NodeMeta, RemoteNode, RemoteUpdate, RemoteWrite};
pub use subscription::{Detach, OnceFetch, Subscription};
pub use traits::RemoteStore;
