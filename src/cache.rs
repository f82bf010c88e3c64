use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::github::{GitHubError, Resource};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to access cache file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One JSON file per resource name, `<dir>/<key>.json`.
///
/// Entries are never invalidated: whatever a previous run stored is reused,
/// regardless of the filters it was fetched with.
#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache rooted at the current working directory.
    pub fn in_current_dir() -> Self {
        Self::new(".")
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Load a stored collection. Missing, unreadable and undecodable files are all a miss.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<Vec<T>> {
        let path = self.path(key);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(key, path = %path.display(), error = %e, "cache miss");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(items) => {
                debug!(key, path = %path.display(), "cache hit");
                Some(items)
            }
            Err(e) => {
                debug!(key, path = %path.display(), error = %e, "cache entry undecodable, treating as miss");
                None
            }
        }
    }

    pub fn store<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), CacheError> {
        let json = serde_json::to_string(items)?;
        std::fs::write(self.path(key), json)?;
        Ok(())
    }

    /// Return the cached collection for `R`, or run `fetch` and store its result.
    ///
    /// Fetch errors propagate. A failed store is logged and the fetched data
    /// is returned anyway.
    #[instrument(skip(self, fetch), fields(resource = R::NAME))]
    pub async fn load_or_fetch<R, F, Fut>(&self, fetch: F) -> Result<Vec<R>, GitHubError>
    where
        R: Resource,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<R>, GitHubError>>,
    {
        if let Some(items) = self.load(R::NAME) {
            return Ok(items);
        }

        let items = fetch().await?;
        if let Err(e) = self.store(R::NAME, &items) {
            warn!(error = %e, path = %self.path(R::NAME).display(), "could not persist {}", R::NAME);
        }
        Ok(items)
    }
}
