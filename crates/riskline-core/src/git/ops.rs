//! Base-revision access through the system git binary.
//!
//! All operations spawn `git` asynchronously; nothing links against libgit.
//! Retrieval failures other than "file absent on the base branch" surface as
//! `RisklineError::Git` and are downgraded to a conservative mapping by the
//! highlight pipeline, never propagated to the host as a crash.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::cache::TtlCache;
use crate::error::{Result, RisklineError};

/// Cache key for the process-wide "already synced with origin" flag.
pub const FETCH_ORIGIN_KEY: &str = "fetch_origin";

pub struct GitOps {
    repo_root: PathBuf,
}

impl GitOps {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Walk up from `start` to the enclosing repository root.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            if current.join(".git").exists() {
                return Some(current);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    async fn run_git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| RisklineError::git(args.join(" "), e.to_string()))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(RisklineError::git(
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }

    /// Runs `git fetch origin` at most once per TTL window.
    ///
    /// The gate is read before and written after an await, so two
    /// interleaved highlight cycles can both miss the flag and fetch twice;
    /// the second fetch is an idempotent no-op.
    pub async fn ensure_synced(&self, gate: &TtlCache<String, ()>) -> Result<()> {
        if gate.get(&FETCH_ORIGIN_KEY.to_string()).is_some() {
            return Ok(());
        }

        tracing::debug!(repo = %self.repo_root.display(), "syncing with origin");
        self.run_git(&["fetch", "origin"]).await?;
        gate.set(FETCH_ORIGIN_KEY.to_string(), ());
        Ok(())
    }

    /// Content of `relative_path` as committed on `origin/<base_branch>`.
    ///
    /// A file that does not exist on that revision resolves to an empty
    /// string: that is the signal the mapper's treat-as-new path consumes,
    /// not an error. Every other failure is returned as `Err`.
    pub async fn base_text(&self, base_branch: &str, relative_path: &str) -> Result<String> {
        let spec = format!("origin/{base_branch}:{relative_path}");
        match self.run_git(&["show", &spec]).await {
            Ok(text) => Ok(text),
            Err(RisklineError::Git { ref message, .. }) if missing_on_revision(message) => {
                tracing::debug!(%spec, "file absent on base revision");
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }

    /// URL of the `origin` remote.
    pub async fn remote_url(&self) -> Result<String> {
        let url = self
            .run_git(&["config", "--get", "remote.origin.url"])
            .await?;
        Ok(url.trim().to_string())
    }

    /// Repository name derived from the `origin` remote URL.
    pub async fn repo_name(&self) -> Result<String> {
        let url = self.remote_url().await?;
        repo_name_from_remote(&url).ok_or_else(|| {
            RisklineError::Workspace(format!("cannot extract repository name from '{url}'"))
        })
    }
}

fn missing_on_revision(stderr: &str) -> bool {
    stderr.contains("does not exist in") || stderr.contains("exists on disk, but not in")
}

/// Extracts the repository name from an SSH or HTTPS remote URL.
///
/// `git@host:owner/repo.git` and `https://host/owner/repo.git` both yield
/// `repo`; a trailing `.git` or `/` is ignored.
pub fn repo_name_from_remote(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let stripped = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let name = stripped.rsplit(['/', ':']).next()?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_name_from_ssh_remote() {
        assert_eq!(
            repo_name_from_remote("git@github.com:acme/widgets.git").as_deref(),
            Some("widgets")
        );
    }

    #[test]
    fn test_repo_name_from_https_remote() {
        assert_eq!(
            repo_name_from_remote("https://github.com/acme/widgets.git").as_deref(),
            Some("widgets")
        );
        assert_eq!(
            repo_name_from_remote("https://gitlab.example.com/acme/widgets/").as_deref(),
            Some("widgets")
        );
    }

    #[test]
    fn test_repo_name_without_git_suffix() {
        assert_eq!(
            repo_name_from_remote("https://github.com/acme/widgets").as_deref(),
            Some("widgets")
        );
    }

    #[test]
    fn test_repo_name_rejects_empty() {
        assert_eq!(repo_name_from_remote(""), None);
        assert_eq!(repo_name_from_remote("/"), None);
    }

    #[test]
    fn test_missing_on_revision_patterns() {
        assert!(missing_on_revision(
            "fatal: path 'src/new.rs' does not exist in 'origin/main'"
        ));
        assert!(missing_on_revision(
            "fatal: path 'src/new.rs' exists on disk, but not in 'origin/main'"
        ));
        assert!(!missing_on_revision(
            "fatal: invalid object name 'origin/nope'"
        ));
    }
}
