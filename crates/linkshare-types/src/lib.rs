//! Foundation types for LinkShare.
//!
//! This crate provides the record shape and identifiers shared by every
//! other LinkShare crate.
//!
//! # Key Types
//!
//! - [`PostId`]: Opaque, client-generated post identifier
//! - [`Record`]: A single replicated post
//! - [`Millis`]: Wall-clock milliseconds since the UNIX epoch
//! - [`Clock`]: Source of creation timestamps (system or manual)

pub mod error;
pub mod post;
pub mod record;
pub mod temporal;

pub use error::TypeError;
pub use post::PostId;
pub use record::{fields, Record};
pub use temporal::{Clock, ManualClock, Millis, SystemClock};
