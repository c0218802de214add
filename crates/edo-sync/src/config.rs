use std::io::ErrorKind;

use edo_types::RepoHandle;
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

fn default_concurrency() -> usize {
    8
}

fn default_trim() -> bool {
    true
}

/// Repository settings stored as JSON in `.edo/config`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Base URL of the upstream repository.
    pub repo_url: String,
    /// Encoded credentials handed to the transport as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Maximum number of remote requests or merges in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Ignore trailing whitespace when merging and diffing.
    #[serde(default = "default_trim")]
    pub trim_trailing_whitespace: bool,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            repo_url: String::new(),
            credentials: None,
            instance: None,
            concurrency: default_concurrency(),
            trim_trailing_whitespace: default_trim(),
        }
    }
}

impl RepoConfig {
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            ..Self::default()
        }
    }

    pub fn load(repo: &RepoHandle) -> SyncResult<Self> {
        let path = repo.config_path();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SyncError::Config(format!(
                    "{} is missing; initialize the repository first",
                    path.display()
                )))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, repo: &RepoHandle) -> SyncResult<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(repo.config_path(), text)?;
        Ok(())
    }
}
