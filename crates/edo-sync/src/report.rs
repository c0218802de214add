use std::fmt;

use tracing::warn;

use crate::error::SyncError;

/// Per-item outcome of a batch operation.
///
/// Failures are recorded and the batch carries on; callers decide whether
/// a partial result is acceptable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReport<K, T> {
    pub succeeded: Vec<(K, T)>,
    pub failed: Vec<(K, String)>,
}

impl<K, T> Default for BatchReport<K, T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<K: fmt::Display, T> BatchReport<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: K, result: Result<T, SyncError>) {
        match result {
            Ok(value) => self.succeeded.push((key, value)),
            Err(e) => {
                warn!(item = %key, error = %e, "batch item failed");
                self.failed.push((key, e.to_string()));
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The succeeded value recorded for `key`.
    pub fn get(&self, key: &K) -> Option<&T>
    where
        K: PartialEq,
    {
        self.succeeded
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }
}

impl<K, T> fmt::Display for BatchReport<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} succeeded, {} failed", self.succeeded.len(), self.failed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_both_outcomes() {
        let mut report: BatchReport<String, u32> = BatchReport::new();
        report.record("a".into(), Ok(1));
        report.record("b".into(), Err(SyncError::Transport("down".into())));
        assert!(!report.is_clean());
        assert_eq!(report.len(), 2);
        assert_eq!(report.get(&"a".to_string()), Some(&1));
        assert_eq!(report.failed[0].1, "transport error: down");
        assert_eq!(report.to_string(), "1 succeeded, 1 failed");
    }
}
