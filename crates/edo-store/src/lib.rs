//! Content-addressed object storage for edo.
//!
//! This crate implements a hash-keyed object store analogous to git's
//! `.git/objects/` directory. Every piece of data edo keeps -- element
//! content, indexes, type lists, change histories -- is stored as an
//! immutable object identified by the SHA-1 of its frame.
//!
//! # Object Frame
//!
//! ```text
//! "<kind> <byteLength>\0" + payload
//! ```
//!
//! The key is the digest of the whole frame, so the kind participates in
//! the key and identical payloads of different kinds never collide.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`FsObjectStore`] -- sharded loose files under `.edo/objects/`
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written. Re-adding identical content is a no-op.
//! 2. Every read re-hashes the raw frame and rejects mismatches.
//! 3. The store checks the frame header but never interprets payloads.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{blob_key, ObjectKind, StoredObject};
pub use traits::ObjectStore;
