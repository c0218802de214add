//! Diff engine for edo.
//!
//! Computes change sets between any two of {working directory, index,
//! index}, the fingerprint gate between a local and a remote index, and
//! unified text patches for individual elements.
//!
//! # Key Types
//!
//! - [`ChangeSet`] / [`Change`] / [`ChangeSide`] -- per-element `[new, old]` pairs
//! - [`diff_workdir`] -- working files against an index
//! - [`diff_indexes`] / [`diff_self`] -- index against index, local against base
//! - [`fingerprint_diff`] -- elements whose remote fingerprint moved
//! - [`text_diff`] -- unified patch lines with `a/<key>` / `b/<key>` labels

pub mod change;
pub mod error;
pub mod snapshot;
pub mod text;
pub mod workdir;

pub use change::{Change, ChangeKind, ChangeSet, ChangeSide};
pub use error::{DiffError, DiffResult};
pub use snapshot::{diff_indexes, diff_self, fingerprint_diff};
pub use text::{load_side, patch_for_change, text_diff};
pub use workdir::{diff_workdir, working_file_key};
