//! Index snapshots and their history chain.
//!
//! An [`Index`] is an immutable snapshot of one stage: which elements it
//! tracks, the local/base/history object of each, and the remote
//! fingerprint last seen. Every write produces a new `list` object whose
//! `prev` line points at the index it replaced, forming a chain that
//! [`IndexManager::walk_back`] can navigate.
//!
//! # Key Types
//!
//! - [`Index`] / [`Parent`] / [`IndexStatus`] -- snapshot record and its codec
//! - [`ElementRecord`] -- per-element local/base/fingerprint/history tuple
//! - [`TypeList`] / [`TypeRecord`] -- element type metadata (`type` objects)
//! - [`History`] -- parsed change history (`logs` objects)
//! - [`IndexManager`] -- loads, stores and resolves indexes through refs

pub mod error;
pub mod history;
pub mod index;
pub mod manager;
pub mod record;
pub mod type_list;

pub use error::{IndexError, IndexResult};
pub use history::{ChangeDetail, ChangeLevel, History, HistoryLine};
pub use index::{Index, IndexStatus, Parent};
pub use manager::IndexManager;
pub use record::ElementRecord;
pub use type_list::{DataFormat, TypeList, TypeRecord};
