use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use edo_index::{History, TypeList};
use edo_types::{ElementKey, Fingerprint, StageId};

use crate::error::{SyncError, SyncResult};
use crate::transport::{FetchedElement, PushRequest, RemoteElement, RemoteTransport};

#[derive(Clone, Debug)]
struct RemoteEntry {
    content: Vec<u8>,
    fingerprint: Fingerprint,
    history: Option<String>,
}

#[derive(Debug, Default)]
struct RemoteStage {
    types: TypeList,
    elements: BTreeMap<ElementKey, RemoteEntry>,
}

/// In-memory upstream repository.
///
/// Every content change gets a fresh fingerprint, and uploads based on a
/// stale fingerprint are refused, mirroring the remote's optimistic
/// concurrency. Elements can be marked as failing to exercise per-item
/// error handling.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    stages: RwLock<HashMap<StageId, RemoteStage>>,
    failing: RwLock<BTreeSet<ElementKey>>,
    counter: AtomicU64,
}

fn poisoned() -> SyncError {
    SyncError::Transport("remote state lock poisoned".into())
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_fingerprint(&self) -> SyncResult<Fingerprint> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Fingerprint::new(format!("FP{n:06}"))?)
    }

    pub fn set_types(&self, stage: &StageId, types: TypeList) -> SyncResult<()> {
        let mut stages = self.stages.write().map_err(|_| poisoned())?;
        stages.entry(stage.clone()).or_default().types = types;
        Ok(())
    }

    /// Create or replace an element, returning its new fingerprint.
    pub fn put_element(
        &self,
        stage: &StageId,
        key: &ElementKey,
        content: &[u8],
    ) -> SyncResult<Fingerprint> {
        let fingerprint = self.next_fingerprint()?;
        let mut stages = self.stages.write().map_err(|_| poisoned())?;
        let elements = &mut stages.entry(stage.clone()).or_default().elements;
        let history = elements.get(key).and_then(|e| e.history.clone());
        elements.insert(
            key.clone(),
            RemoteEntry {
                content: content.to_vec(),
                fingerprint: fingerprint.clone(),
                history,
            },
        );
        Ok(fingerprint)
    }

    pub fn set_history(&self, stage: &StageId, key: &ElementKey, listing: &str) -> SyncResult<()> {
        let mut stages = self.stages.write().map_err(|_| poisoned())?;
        if let Some(entry) = stages
            .get_mut(stage)
            .and_then(|s| s.elements.get_mut(key))
        {
            entry.history = Some(listing.to_string());
        }
        Ok(())
    }

    pub fn remove_element(&self, stage: &StageId, key: &ElementKey) -> SyncResult<bool> {
        let mut stages = self.stages.write().map_err(|_| poisoned())?;
        Ok(stages
            .get_mut(stage)
            .is_some_and(|s| s.elements.remove(key).is_some()))
    }

    /// Current content of an element.
    pub fn content(&self, stage: &StageId, key: &ElementKey) -> SyncResult<Option<Vec<u8>>> {
        let stages = self.stages.read().map_err(|_| poisoned())?;
        Ok(stages
            .get(stage)
            .and_then(|s| s.elements.get(key))
            .map(|e| e.content.clone()))
    }

    /// Make every request touching `key` fail.
    pub fn fail_on(&self, key: &ElementKey) -> SyncResult<()> {
        self.failing.write().map_err(|_| poisoned())?.insert(key.clone());
        Ok(())
    }

    fn check_failing(&self, key: &ElementKey) -> SyncResult<()> {
        if self.failing.read().map_err(|_| poisoned())?.contains(key) {
            return Err(SyncError::Transport(format!("simulated failure for {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteTransport for InMemoryRemote {
    async fn element_list(&self, stage: &StageId) -> SyncResult<Vec<RemoteElement>> {
        let stages = self.stages.read().map_err(|_| poisoned())?;
        let stage = stages
            .get(stage)
            .ok_or_else(|| SyncError::Transport(format!("unknown stage {stage}")))?;
        Ok(stage
            .elements
            .iter()
            .map(|(key, entry)| RemoteElement {
                key: key.clone(),
                fingerprint: entry.fingerprint.clone(),
            })
            .collect())
    }

    async fn type_list(&self, stage: &StageId) -> SyncResult<TypeList> {
        let stages = self.stages.read().map_err(|_| poisoned())?;
        Ok(stages.get(stage).map(|s| s.types.clone()).unwrap_or_default())
    }

    async fn fetch_element(
        &self,
        stage: &StageId,
        key: &ElementKey,
        version: Option<&str>,
    ) -> SyncResult<FetchedElement> {
        self.check_failing(key)?;
        let stages = self.stages.read().map_err(|_| poisoned())?;
        let Some(stage) = stages.get(stage) else {
            return Ok(FetchedElement::NotFound);
        };
        let Some(entry) = stage.elements.get(key) else {
            return Ok(FetchedElement::Deleted);
        };
        let content = match version {
            None => entry.content.clone(),
            // Older levels are rebuilt from the change history.
            Some(level) => match &entry.history {
                Some(listing) => History::parse(listing).reconstruct(level).into_bytes(),
                None => return Ok(FetchedElement::NotFound),
            },
        };
        Ok(FetchedElement::Found {
            content,
            fingerprint: entry.fingerprint.clone(),
        })
    }

    async fn fetch_history(&self, stage: &StageId, key: &ElementKey) -> SyncResult<Option<String>> {
        self.check_failing(key)?;
        let stages = self.stages.read().map_err(|_| poisoned())?;
        Ok(stages
            .get(stage)
            .and_then(|s| s.elements.get(key))
            .and_then(|e| e.history.clone()))
    }

    async fn push_element(&self, request: PushRequest<'_>) -> SyncResult<Fingerprint> {
        self.check_failing(request.key)?;
        let fingerprint = self.next_fingerprint()?;
        let mut stages = self.stages.write().map_err(|_| poisoned())?;
        let elements = &mut stages.entry(request.stage.clone()).or_default().elements;
        if let Some(entry) = elements.get_mut(request.key) {
            if request.fingerprint != Some(&entry.fingerprint) {
                return Err(SyncError::Transport(format!(
                    "fingerprint mismatch for {}",
                    request.key
                )));
            }
            entry.content = request.content.to_vec();
            entry.fingerprint = fingerprint.clone();
        } else {
            elements.insert(
                request.key.clone(),
                RemoteEntry {
                    content: request.content.to_vec(),
                    fingerprint: fingerprint.clone(),
                    history: None,
                },
            );
        }
        Ok(fingerprint)
    }
}
