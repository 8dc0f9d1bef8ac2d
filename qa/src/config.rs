//! Recursive `.qa.yml` composition
//!
//! Each directory may carry a `.qa.yml` declaring `format` commands,
//! `checks` commands, and `includes` pointing at further config files.
//! The loader walks the include tree depth-first and merges everything
//! into one [`ConfigSet`]. A single visitation set covers the whole
//! traversal, so true cycles and diamond re-inclusion both fail loudly
//! instead of registering the same commands twice.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Command, ConfigSet};

/// Config file name looked up in every included directory
pub const CONFIG_FILE: &str = ".qa.yml";

/// Errors surfaced while composing configuration. All are fatal to the
/// run; no partial [`ConfigSet`] is ever returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("circular include detected: {0}")]
    CircularInclude(PathBuf),
}

/// On-disk schema of a single `.qa.yml`. Absent keys mean empty lists.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QaFile {
    includes: Vec<String>,
    format: Vec<String>,
    checks: Vec<String>,
}

/// Composes `.qa.yml` trees into a [`ConfigSet`]
pub struct Loader;

impl Loader {
    /// Load the config tree rooted at `root/.qa.yml`
    pub fn load(root: &Path) -> Result<ConfigSet, ConfigError> {
        let mut visited = HashSet::new();
        let set = load_file(&root.join(CONFIG_FILE), &mut visited)?;
        debug!(
            format_groups = set.format.len(),
            checks = set.checks.len(),
            files = visited.len(),
            "Loader::load: composed config"
        );
        Ok(set)
    }
}

fn load_file(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<ConfigSet, ConfigError> {
    let clean = normalize(path);

    if !visited.insert(clean.clone()) {
        return Err(ConfigError::CircularInclude(clean));
    }

    let data = fs::read_to_string(&clean).map_err(|source| ConfigError::Read {
        path: clean.clone(),
        source,
    })?;

    let file: QaFile = serde_yaml::from_str(&data).map_err(|source| ConfigError::Parse {
        path: clean.clone(),
        source,
    })?;

    let dir = match clean.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut set = ConfigSet::default();

    if !file.format.is_empty() {
        let cmds = file
            .format
            .iter()
            .map(|text| Command::new(text, &dir))
            .collect();
        set.format.insert(dir.clone(), cmds);
    }

    for text in &file.checks {
        set.checks.push(Command::new(text, &dir));
    }

    // Includes are resolved relative to this file's directory, in declared
    // order, each merged after the file's own entries.
    for include in &file.includes {
        let included = load_file(&dir.join(include), visited)?;
        merge(&mut set, included);
    }

    Ok(set)
}

fn merge(into: &mut ConfigSet, from: ConfigSet) {
    for (dir, cmds) in from.format {
        into.format.entry(dir).or_default().extend(cmds);
    }
    into.checks.extend(from.checks);
}

/// Lexical path normalization (no filesystem access), so the same file
/// reached through different relative spellings hits the visitation set.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}
