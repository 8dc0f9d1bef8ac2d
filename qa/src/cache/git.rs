//! Git queries backing the result cache
//!
//! Pure query facade over the `git` CLI: repository root, committed tree
//! hashes, and working-tree dirtiness. Nothing here mutates the repo.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("not a git repository")]
    NotARepo,

    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git {args}: {message}")]
    CommandFailed { args: String, message: String },

    #[error("path {path} is outside repository {root}")]
    OutsideRepo { path: PathBuf, root: PathBuf },
}

/// Handle to one repository, rooted at discovery time
#[derive(Debug)]
pub struct GitClient {
    repo_root: PathBuf,
}

impl GitClient {
    /// Discover the repository containing `dir`.
    ///
    /// Failure here (not a repo, git unavailable) is fatal to cache
    /// construction; callers fall back to the no-op cache.
    pub async fn discover(dir: &Path) -> Result<Self, GitError> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("not a git repository") {
                return Err(GitError::NotARepo);
            }
            return Err(GitError::CommandFailed {
                args: "rev-parse --show-toplevel".into(),
                message: stderr.trim().to_string(),
            });
        }

        let repo_root = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
        debug!(repo_root = %repo_root.display(), "GitClient::discover: found repository");
        Ok(Self { repo_root })
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Content hash of `rel` as committed at HEAD. The repository root is
    /// addressed as the whole tree (`HEAD^{tree}`); anything else as
    /// `HEAD:<path>`. An error means freshness cannot be certified and
    /// must be treated as a cache miss.
    pub async fn tree_hash(&self, rel: &Path) -> Result<String, GitError> {
        let reference = if rel == Path::new(".") {
            "HEAD^{tree}".to_string()
        } else {
            format!("HEAD:{}", rel.display())
        };

        let output = self.git(&["rev-parse", &reference]).await?;
        Ok(output.trim().to_string())
    }

    /// True if `rel` has any uncommitted modification, including untracked
    /// additions.
    pub async fn is_dirty(&self, rel: &Path) -> Result<bool, GitError> {
        let rel = rel.display().to_string();
        let output = self.git(&["status", "--porcelain", &rel]).await?;
        Ok(!output.trim().is_empty())
    }

    /// Map an absolute path into a repository-relative one. The root
    /// itself maps to `.`.
    pub fn to_relative(&self, abs: &Path) -> Result<PathBuf, GitError> {
        let rel = abs
            .strip_prefix(&self.repo_root)
            .map_err(|_| GitError::OutsideRepo {
                path: abs.to_path_buf(),
                root: self.repo_root.clone(),
            })?;
        if rel.as_os_str().is_empty() {
            Ok(PathBuf::from("."))
        } else {
            Ok(rel.to_path_buf())
        }
    }

    async fn git(&self, args: &[&str]) -> Result<String, GitError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                args: args.join(" "),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
