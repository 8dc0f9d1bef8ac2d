//! One-time project setup helpers
//!
//! `qa init hook` installs a pre-commit hook that runs `qa`, and
//! `qa init expectations` drops a code-quality expectations document
//! into the project. Both refuse to overwrite anything that exists.

use std::fs;
use std::path::Path;

use eyre::{bail, Context, Result};
use tracing::info;

const HOOK_SCRIPT: &str = "#!/bin/bash\nqa\n";

const EXPECTATIONS_TEMPLATE: &str = include_str!("../templates/EXPECTATIONS.md");

/// Default destination for the expectations document
pub const DEFAULT_EXPECTATIONS_DEST: &str = "CLAUDE.md";

/// Install `.git/hooks/pre-commit` under `root`, running `qa`.
pub fn install_hook(root: &Path) -> Result<()> {
    let git_dir = root.join(".git");
    if !git_dir.exists() {
        bail!(".git directory not found");
    }

    let hooks_dir = git_dir.join("hooks");
    fs::create_dir_all(&hooks_dir)
        .wrap_err_with(|| format!("creating {}", hooks_dir.display()))?;

    let hook_path = hooks_dir.join("pre-commit");
    if hook_path.exists() {
        bail!("pre-commit hook already exists");
    }

    fs::write(&hook_path, HOOK_SCRIPT)
        .wrap_err_with(|| format!("writing {}", hook_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&hook_path, fs::Permissions::from_mode(0o755))
            .wrap_err("marking hook executable")?;
    }

    info!(path = %hook_path.display(), "installed pre-commit hook");
    Ok(())
}

/// Write the expectations template to `dest`.
pub fn copy_expectations(dest: &Path) -> Result<()> {
    if dest.exists() {
        bail!("file already exists: {}", dest.display());
    }

    fs::write(dest, EXPECTATIONS_TEMPLATE)
        .wrap_err_with(|| format!("writing {}", dest.display()))?;

    info!(path = %dest.display(), "wrote expectations document");
    Ok(())
}
