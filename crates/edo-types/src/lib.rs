//! Foundation types for edo.
//!
//! This crate provides the identifiers shared by every other edo crate. It
//! has no knowledge of storage layout beyond the [`RepoHandle`], which names
//! the working root and its `.edo` metadata directory.
//!
//! # Key Types
//!
//! - [`ObjectKey`] — SHA-1 content key of a framed object
//! - [`ElementKey`] — `TYPE/ELEMENT` identity of a tracked mainframe element
//! - [`StageId`] — `ENV-N-SYSTEM-SUBSYSTEM` stage coordinate
//! - [`Fingerprint`] — opaque remote concurrency token
//! - [`RepoHandle`] — explicit repository root threaded through every call

pub mod element;
pub mod error;
pub mod fingerprint;
pub mod key;
pub mod repo;
pub mod stage;
pub mod text;

pub use element::ElementKey;
pub use error::TypeError;
pub use fingerprint::Fingerprint;
pub use key::ObjectKey;
pub use repo::{RepoHandle, EDO_DIR};
pub use stage::StageId;
