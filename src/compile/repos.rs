//! Source repository synchronisation.

use super::model::CompileConfig;
use super::types::RepoSpec;
use crate::error::Result;
use crate::git;
use std::path::{Path, PathBuf};

impl CompileConfig {
    /// Bring every repository listed in `repos` up to date under `source_dir`.
    ///
    /// Missing checkouts are cloned, existing ones fetched. A `refspec` naming
    /// a branch of `origin` resets the local branch to the fetched one; any
    /// other refspec (tag or commit) is checked out as is. Without a refspec
    /// an existing checkout fast-forwards its current branch. Repos are
    /// processed in name order and the first git failure stops the sync.
    pub fn pull_repos(&self, source_dir: &Path) -> Result<()> {
        for (name, repo) in &self.repos {
            let dest = repo_dest(source_dir, name, repo);

            let existing = git::is_checkout(&dest);
            if existing {
                tracing::info!(repo = %name, "updating {}", dest.display());
                git::fetch(&dest)?;
            } else {
                tracing::info!(repo = %name, "cloning {} into {}", repo.url, dest.display());
                git::clone(&repo.url, &dest)?;
            }

            match repo.refspec.as_deref() {
                Some(branch) if git::has_remote_branch(&dest, branch) => {
                    git::checkout_remote_branch(&dest, branch)?;
                }
                Some(refspec) => git::checkout(&dest, refspec)?,
                None if existing => {
                    if !git::fast_forward(&dest)? {
                        tracing::debug!(repo = %name, "no upstream branch; leaving checkout as is");
                    }
                }
                None => {}
            }
        }
        Ok(())
    }
}

/// Checkout location of `repo` inside the source directory.
pub(crate) fn repo_dest(source_dir: &Path, name: &str, repo: &RepoSpec) -> PathBuf {
    source_dir.join(repo.path.as_deref().unwrap_or(name))
}
