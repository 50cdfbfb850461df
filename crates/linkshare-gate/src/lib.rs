//! Write gates for LinkShare.
//!
//! Every write a session makes passes one of two gates first:
//! - [`LikeGate`] lets each post be liked at most once per session
//! - [`Draft`] and [`validate_post`] reject posts with blank content or author
//!
//! # Quick Start
//!
//! ```rust
//! use linkshare_gate::{Draft, GateError, LikeGate};
//! use linkshare_types::PostId;
//!
//! let mut gate = LikeGate::new();
//! let id = PostId::parse("lq2x9abc").unwrap();
//! gate.check(&id, true).unwrap();
//! gate.admit(id.clone());
//! assert!(matches!(gate.check(&id, true), Err(GateError::AlreadyLiked { .. })));
//!
//! let mut draft = Draft::default();
//! draft.set_author("alice");
//! assert!(draft.validate().is_err());
//! ```

pub mod draft;
pub mod error;
pub mod like;

pub use draft::{validate_post, Draft};
pub use error::{GateError, ValidationError};
pub use like::LikeGate;
