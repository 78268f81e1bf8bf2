use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{Result, RisklineError};
use crate::git::GitOps;

/// Resolved once at session start; the engine never re-derives it per cycle.
#[derive(Debug, Clone)]
pub struct WorkspaceInfo {
    pub root: PathBuf,
    pub repo_name: String,
    pub base_branch: String,
}

/// Locates the repository enclosing `start` and pins the session context:
/// repository root, repository name (from the `origin` remote), and the
/// base branch the anchors were recorded against (from settings).
pub async fn resolve_workspace(start: &Path, settings: &Settings) -> Result<WorkspaceInfo> {
    let start = if start.is_file() {
        start.parent().unwrap_or(start)
    } else {
        start
    };

    let root = GitOps::find_root(start).ok_or_else(|| {
        RisklineError::Workspace(format!(
            "no git repository found at or above {}",
            start.display()
        ))
    })?;

    let git = GitOps::new(&root);
    let repo_name = git.repo_name().await?;

    Ok(WorkspaceInfo {
        root,
        repo_name,
        base_branch: settings.repo.base_branch.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_resolve_fails_outside_a_repository() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::default();

        let result = resolve_workspace(tmp.path(), &settings).await;
        assert!(matches!(result, Err(RisklineError::Workspace(_))));
    }
}
