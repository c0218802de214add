//! Promotion order between stages.

use std::collections::{HashMap, HashSet};

use edo_types::StageId;

/// Supplies the stages to visit when an operation spans a promotion path.
pub trait StageTopology: Send + Sync {
    /// `start` followed by each stage it promotes into, in order.
    fn ordered_stage_chain(&self, start: &StageId) -> Vec<StageId>;
}

/// A fixed promotion map.
#[derive(Clone, Debug, Default)]
pub struct StaticTopology {
    next: HashMap<StageId, StageId>,
}

impl StaticTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `from` promotes into `to`.
    pub fn link(mut self, from: StageId, to: StageId) -> Self {
        self.next.insert(from, to);
        self
    }
}

impl StageTopology for StaticTopology {
    fn ordered_stage_chain(&self, start: &StageId) -> Vec<StageId> {
        let mut chain = vec![start.clone()];
        let mut seen: HashSet<&StageId> = HashSet::from([start]);
        let mut current = start;
        while let Some(next) = self.next.get(current) {
            if !seen.insert(next) {
                break;
            }
            chain.push(next.clone());
            current = next;
        }
        chain
    }
}
