//! Git-tree-hash-addressed result cache
//!
//! A check can be skipped when the subtree it runs against is provably
//! unchanged since the check last passed: the path is clean, and its
//! committed tree hash matches the recorded one. Anything uncertain -
//! dirty tree, failed git query, path outside the repo - degrades to
//! "must run", never to a false hit.

mod git;
mod store;

pub use git::{GitClient, GitError};
pub use store::{Entry, Store};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use eyre::Result;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::normalize;
use crate::domain::{Cache, Command};

/// Entries older than this many days are dropped from the working set at
/// load time
pub const TTL_DAYS: i64 = 7;

/// The real cache: git queries + durable store + pending-results buffer.
///
/// The durable map is loaded once at construction (pruned by age) and
/// written once by [`Cache::flush`] after the checks phase; only the
/// pending buffer is touched concurrently.
pub struct GitCache {
    git: GitClient,
    cache_dir: PathBuf,
    work_dir: PathBuf,
    data: Mutex<HashMap<String, Entry>>,
    results: Mutex<HashMap<String, bool>>,
}

impl GitCache {
    /// Build a cache for the repository containing `work_dir`. Fails when
    /// `work_dir` is not inside a git repository; callers degrade to
    /// [`NoopCache`] rather than aborting the run.
    pub async fn new(cache_dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        let work_dir = work_dir.into();
        let git = GitClient::discover(&work_dir).await?;

        let data = Store::load(&cache_dir, git.repo_root()).unwrap_or_else(|e| {
            debug!(error = %e, "GitCache::new: unreadable cache file, starting empty");
            HashMap::new()
        });
        let data = prune(data, Utc::now());

        Ok(Self {
            git,
            cache_dir,
            work_dir,
            data: Mutex::new(data),
            results: Mutex::new(HashMap::new()),
        })
    }

    /// Repository-relative form of a command's working directory, or None
    /// when it falls outside the repository.
    fn resolve_path(&self, working_dir: &Path) -> Option<PathBuf> {
        let abs = if working_dir.is_absolute() {
            working_dir.to_path_buf()
        } else {
            normalize(&self.work_dir.join(working_dir))
        };
        self.git.to_relative(&abs).ok()
    }
}

#[async_trait]
impl Cache for GitCache {
    async fn hit(&self, cmd: &Command) -> bool {
        let Some(rel) = self.resolve_path(&cmd.working_dir) else {
            return false;
        };

        match self.git.is_dirty(&rel).await {
            Ok(false) => {}
            Ok(true) | Err(_) => return false,
        }

        let Ok(hash) = self.git.tree_hash(&rel).await else {
            return false;
        };

        let key = cache_key(&rel, &cmd.text);
        let data = self.data.lock().await;
        match data.get(&key) {
            Some(entry) => entry.hash == hash,
            None => false,
        }
    }

    async fn record_result(&self, cmd: &Command, success: bool) {
        let Some(rel) = self.resolve_path(&cmd.working_dir) else {
            return;
        };
        let key = cache_key(&rel, &cmd.text);
        self.results.lock().await.insert(key, success);
    }

    async fn flush(&self) -> Result<()> {
        let results: Vec<(String, bool)> = {
            let results = self.results.lock().await;
            results.iter().map(|(k, v)| (k.clone(), *v)).collect()
        };

        let now = Utc::now();
        let mut fresh = Vec::new();
        for (key, passed) in results {
            if !passed {
                continue;
            }
            let Some((path, _)) = key.split_once(KEY_SEPARATOR) else {
                continue;
            };
            // Hash what is committed now; a failed query just means this
            // key stays unrecorded.
            match self.git.tree_hash(Path::new(path)).await {
                Ok(hash) => fresh.push((key, Entry { hash, last_pass: now })),
                Err(e) => debug!(key, error = %e, "GitCache::flush: skipping unhashable path"),
            }
        }

        let mut data = self.data.lock().await;
        for (key, entry) in fresh {
            data.insert(key, entry);
        }
        Store::save(&self.cache_dir, self.git.repo_root(), &data)
    }
}

/// Cache that never hits. Used for `--no-cache` and when cache
/// construction fails; the run degrades to executing everything.
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn hit(&self, _cmd: &Command) -> bool {
        false
    }

    async fn record_result(&self, _cmd: &Command, _success: bool) {}

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

const KEY_SEPARATOR: &str = "::";

fn cache_key(rel: &Path, text: &str) -> String {
    format!("{}{}{}", rel.display(), KEY_SEPARATOR, text)
}

fn prune(data: HashMap<String, Entry>, now: DateTime<Utc>) -> HashMap<String, Entry> {
    let cutoff = now - Duration::days(TTL_DAYS);
    data.into_iter()
        .filter(|(_, entry)| entry.last_pass > cutoff)
        .collect()
}
