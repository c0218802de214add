//! Repository workflows for edo.
//!
//! [`Repository`] ties the object store, refs and working directory
//! together and implements fetch, pull, merge, commit and push against a
//! [`RemoteTransport`], plus local working-copy management. Per-element
//! work runs through a bounded pool and is reported per item in a
//! [`BatchReport`]; one failing element never aborts its siblings.

pub mod commit;
pub mod config;
pub mod error;
pub mod fetch;
pub mod memory;
pub mod merge;
pub mod pool;
pub mod pull;
pub mod push;
pub mod report;
pub mod repository;
pub mod topology;
pub mod transport;
pub mod worktree;

pub use commit::CommitOutcome;
pub use config::RepoConfig;
pub use error::{SyncError, SyncResult};
pub use fetch::FetchOutcome;
pub use memory::InMemoryRemote;
pub use merge::MergeReport;
pub use pool::settle_all;
pub use pull::{Downloaded, PullOutcome};
pub use push::PushOutcome;
pub use report::BatchReport;
pub use repository::Repository;
pub use topology::{StageTopology, StaticTopology};
pub use transport::{ChangeInfo, FetchedElement, PushRequest, RemoteElement, RemoteTransport};
pub use worktree::{CheckoutOutcome, StatusReport};
