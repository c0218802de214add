//! Reference management for edo.
//!
//! References are named, mutable pointers to the tip index of a stage. They
//! are the only mutable state in a repository apart from the working files.
//!
//! # Architecture
//!
//! - **Local refs** (`refs/<stage>`) track what has been committed locally.
//! - **Remote refs** (`refs/remote/<stage>`) track what was last fetched,
//!   pulled or pushed. They are only updated by sync operations.
//! - **STAGE** names the checked-out stage, or holds an index key directly
//!   when the checkout is detached.
//! - **MERGE** / **MERGE_CONFLICT** record an in-progress merge until the
//!   next commit consumes them.
//!
//! # Modules
//!
//! - [`error`] — Error types for ref operations
//! - [`types`] — [`Namespace`], [`Checkout`], [`CheckoutTarget`]
//! - [`traits`] — The [`RefStore`] trait defining the storage interface
//! - [`names`] — Stage name validation
//! - [`fs`] — [`FsRefStore`] over the `.edo` directory
//! - [`memory`] — In-memory [`InMemoryRefStore`] for tests

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use fs::FsRefStore;
pub use memory::InMemoryRefStore;
pub use names::validate_stage_name;
pub use traits::RefStore;
pub use types::{Checkout, CheckoutTarget, Namespace};
