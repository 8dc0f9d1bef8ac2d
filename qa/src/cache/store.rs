//! Durable cache storage
//!
//! One YAML file per repository inside the cache directory. Saves go
//! through a temp file and an atomic rename so a crash or concurrent
//! reader never observes a half-written file.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One recorded pass for a `(path, command)` cache key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Git tree hash of the path when the command last passed
    pub hash: String,

    /// When the command last passed
    pub last_pass: DateTime<Utc>,
}

/// Loads and saves the per-repository cache file
pub struct Store;

impl Store {
    /// Read the cache file for `repo_root`. A missing file is an empty
    /// cache; a malformed file is a hard error.
    pub fn load(cache_dir: &Path, repo_root: &Path) -> Result<HashMap<String, Entry>> {
        let path = cache_file(cache_dir, repo_root);

        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Store::load: no cache file yet");
                return Ok(HashMap::new());
            }
            Err(e) => {
                return Err(e).wrap_err_with(|| format!("reading cache file {}", path.display()))
            }
        };

        let entries: HashMap<String, Entry> = serde_yaml::from_str(&data)
            .wrap_err_with(|| format!("parsing cache file {}", path.display()))?;
        debug!(path = %path.display(), entries = entries.len(), "Store::load: loaded cache");
        Ok(entries)
    }

    /// Write the cache file for `repo_root`, creating `cache_dir` first.
    pub fn save(cache_dir: &Path, repo_root: &Path, data: &HashMap<String, Entry>) -> Result<()> {
        fs::create_dir_all(cache_dir)
            .wrap_err_with(|| format!("creating cache directory {}", cache_dir.display()))?;

        let content = serde_yaml::to_string(data).wrap_err("serializing cache data")?;

        let path = cache_file(cache_dir, repo_root);
        let tmp = path.with_extension("yml.tmp");

        fs::write(&tmp, content)
            .wrap_err_with(|| format!("writing temp cache file {}", tmp.display()))?;

        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e).wrap_err_with(|| format!("renaming cache file to {}", path.display()));
        }

        debug!(path = %path.display(), entries = data.len(), "Store::save: wrote cache");
        Ok(())
    }
}

/// One cache file per distinct repository: the repo root path with
/// separators flattened, so repos sharing a cache dir cannot collide.
fn cache_file(cache_dir: &Path, repo_root: &Path) -> PathBuf {
    let sanitized = repo_root
        .display()
        .to_string()
        .replace(std::path::MAIN_SEPARATOR, "_");
    cache_dir.join(format!("{sanitized}.yml"))
}
