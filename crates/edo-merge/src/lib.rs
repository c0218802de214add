//! Merge engine for edo.
//!
//! Line-level three-way merge of element text, producing conflict marker
//! blocks where both sides changed the same region, and the per-element
//! decision of how a local version is reconciled with a freshly pulled
//! remote one.
//!
//! # Key Types
//!
//! - [`merge_buffers`] -- merge three texts into one
//! - [`structured_merge`] -- the hunk list a merge is rendered from
//! - [`MergeOptions`] -- whitespace normalization and marker labels
//! - [`MergeStatus`] -- `merged`, `conflict`, `up-to-date` or `deleted`
//! - [`reconcile`] -- decide and perform the merge for one element

pub mod error;
pub mod hunks;
pub mod reconcile;
pub mod status;
pub mod three_way;

pub use error::{MergeError, MergeResult};
pub use hunks::{structured_merge, Hunk, HunkEntry, HunkLine, LineTag};
pub use reconcile::{plan, reconcile, ContentKind, LocalSide, ReconcilePlan, Reconciliation};
pub use status::MergeStatus;
pub use three_way::{merge_buffers, merge_lines, MergeOptions, MergedText};
