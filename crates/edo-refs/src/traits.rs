//! The [`RefStore`] trait defining the reference storage interface.

use edo_types::{ElementKey, ObjectKey, StageId};
use tracing::info;

use crate::error::Result;
use crate::names::validate_stage_name;
use crate::types::{Checkout, CheckoutTarget, Namespace};

/// Storage backend for stage refs and repository state pointers.
///
/// Implementations must be thread-safe (`Send + Sync`). Writes are plain
/// overwrites: there is no locking, and at most one writer per repository
/// is assumed.
pub trait RefStore: Send + Sync {
    /// Read the tip of `stage` in `ns`.
    ///
    /// Returns `Ok(None)` if the ref does not exist.
    fn read_ref(&self, ns: Namespace, stage: &StageId) -> Result<Option<ObjectKey>>;

    /// Point `stage` in `ns` at `key`, replacing any previous value.
    fn write_ref(&self, ns: Namespace, stage: &StageId, key: &ObjectKey) -> Result<()>;

    /// Delete a ref. Returns `Ok(true)` if it existed.
    fn delete_ref(&self, ns: Namespace, stage: &StageId) -> Result<bool>;

    /// List every ref of a namespace, sorted by stage.
    fn list_refs(&self, ns: Namespace) -> Result<Vec<(StageId, ObjectKey)>>;

    /// Read the checkout pointer. `Ok(None)` if nothing is checked out.
    fn checkout(&self) -> Result<Option<Checkout>>;

    /// Replace the checkout pointer.
    fn set_checkout(&self, checkout: &Checkout) -> Result<()>;

    /// Key of the remote index last merged into the working directory.
    fn merge_head(&self) -> Result<Option<ObjectKey>>;

    /// Record (or with `None`, clear) the pending merge.
    fn set_merge_head(&self, key: Option<&ObjectKey>) -> Result<()>;

    /// Elements still carrying conflict markers from the last merge.
    fn conflicts(&self) -> Result<Vec<ElementKey>>;

    /// Replace the conflict list. An empty slice clears it.
    fn set_conflicts(&self, keys: &[ElementKey]) -> Result<()>;

    /// Validate the stage name and move the ref to `key`.
    fn advance(&self, ns: Namespace, stage: &StageId, key: &ObjectKey) -> Result<()> {
        validate_stage_name(stage)?;
        self.write_ref(ns, stage, key)?;
        info!(stage_ref = %ns.qualify(stage), key = %key.short_hex(), "advanced ref");
        Ok(())
    }

    /// Resolve a namespace-qualified name such as `DEV-1-SYS-SUB` or
    /// `remote/DEV-1-SYS-SUB`.
    fn resolve(&self, name: &str) -> Result<Option<ObjectKey>> {
        let (ns, stage) = match name.strip_prefix(Namespace::Remote.prefix()) {
            Some(rest) => (Namespace::Remote, rest),
            None => (Namespace::Local, name),
        };
        self.read_ref(ns, &StageId::parse(stage)?)
    }

    /// Follow the checkout pointer through the local refs.
    ///
    /// A detached pointer is returned as-is; a stage with no local ref yet
    /// is reported as [`CheckoutTarget::Unborn`].
    fn resolve_checkout(&self) -> Result<Option<CheckoutTarget>> {
        let target = match self.checkout()? {
            None => return Ok(None),
            Some(Checkout::Detached(key)) => CheckoutTarget::Index { stage: None, key },
            Some(Checkout::Stage(stage)) => match self.read_ref(Namespace::Local, &stage)? {
                Some(key) => CheckoutTarget::Index {
                    stage: Some(stage),
                    key,
                },
                None => CheckoutTarget::Unborn(stage),
            },
        };
        Ok(Some(target))
    }
}
