//! Watch loop and terminal rendering: the thin host around the engine.
//!
//! This stands in for an editor's decoration layer. It reads risk findings
//! from a JSON export, runs a highlight cycle on the watched file, and
//! prints the grouped map; edits re-trigger the cycle through a trailing
//! 500 ms debounce. Cycles run sequentially, so the last rendered result is
//! always the last issued one.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use riskline_core::cache::TtlCache;
use riskline_core::config::Settings;
use riskline_core::error::Result as CoreResult;
use riskline_core::git::GitOps;
use riskline_core::highlight::{highlight_cycle, HighlightUpdate};
use riskline_core::project::{resolve_workspace, Debouncer, FileWatcher};
use riskline_core::risk::{highest_risk_level, CachedRiskProvider, Risk, RiskLevel, RiskProvider};

/// Risk source backed by a JSON export (either a bare array or an
/// `{"items": [...]}` wrapper, as the service's export endpoints produce).
struct FileRiskProvider {
    risks: Vec<Risk>,
}

impl FileRiskProvider {
    fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read risks file {}", path.display()))?;
        let value: serde_json::Value =
            serde_json::from_str(&content).context("risks file is not valid JSON")?;
        let items = value.get("items").cloned().unwrap_or(value);
        let risks: Vec<Risk> =
            serde_json::from_value(items).context("risks file does not match the risk schema")?;
        Ok(Self { risks })
    }
}

#[async_trait]
impl RiskProvider for FileRiskProvider {
    async fn risks_for_file(&self, relative_path: &str) -> CoreResult<Vec<Risk>> {
        Ok(self
            .risks
            .iter()
            .filter(|r| r.source_code.file_path == relative_path)
            .cloned()
            .collect())
    }
}

pub async fn run(
    file: PathBuf,
    risks_path: PathBuf,
    base_branch: Option<String>,
    once: bool,
) -> Result<()> {
    let file = std::fs::canonicalize(&file)
        .with_context(|| format!("cannot resolve {}", file.display()))?;

    let root = GitOps::find_root(&file)
        .with_context(|| format!("{} is not inside a git repository", file.display()))?;

    let mut settings = Settings::load_for_repo(&root);
    if let Some(branch) = base_branch {
        settings.repo.base_branch = branch;
    }

    let workspace = resolve_workspace(&file, &settings).await?;
    tracing::info!(
        repo = %workspace.repo_name,
        base_branch = %workspace.base_branch,
        "session started"
    );

    let relative = file
        .strip_prefix(&workspace.root)
        .context("file is outside the resolved workspace")?
        .to_string_lossy()
        .into_owned();

    let git = GitOps::new(&workspace.root);
    let fetch_gate: TtlCache<String, ()> = TtlCache::new(settings.fetch_ttl());
    let provider = CachedRiskProvider::new(FileRiskProvider::load(&risks_path)?, settings.risks_ttl());

    run_cycle(&git, &fetch_gate, &provider, &workspace.base_branch, &relative, &file).await;

    if once {
        return Ok(());
    }

    watch_loop(
        &git,
        &fetch_gate,
        &provider,
        &workspace.base_branch,
        &relative,
        &file,
        settings.debounce(),
    )
    .await
}

async fn watch_loop(
    git: &GitOps,
    fetch_gate: &TtlCache<String, ()>,
    provider: &dyn RiskProvider,
    base_branch: &str,
    relative: &str,
    file: &Path,
    debounce: std::time::Duration,
) -> Result<()> {
    let watch_dir = file.parent().context("watched file has no parent directory")?;
    let (_watcher, mut rx) = FileWatcher::watch(watch_dir)?;
    let mut debouncer = Debouncer::new(debounce);

    println!("watching {} (ctrl-c to stop)", file.display());

    loop {
        let deadline = debouncer.deadline().map(tokio::time::Instant::from_std);

        tokio::select! {
            event = rx.recv() => {
                match event {
                    Some(event) if event.path.file_name() == file.file_name() => {
                        debouncer.note();
                    }
                    Some(_) => {}
                    None => break,
                }
            }
            _ = sleep_until_or_forever(deadline) => {
                if debouncer.fire() {
                    run_cycle(git, fetch_gate, provider, base_branch, relative, file).await;
                }
            }
        }
    }

    Ok(())
}

async fn sleep_until_or_forever(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// One fetch -> diff -> map -> group pass plus rendering. Failures are
/// reported and skipped; the loop keeps running.
async fn run_cycle(
    git: &GitOps,
    fetch_gate: &TtlCache<String, ()>,
    provider: &dyn RiskProvider,
    base_branch: &str,
    relative: &str,
    file: &Path,
) {
    let current_text = match tokio::fs::read_to_string(file).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "cannot read watched file, skipping cycle");
            return;
        }
    };

    match highlight_cycle(git, fetch_gate, provider, base_branch, relative, &current_text).await {
        Ok(update) => render(relative, &update),
        Err(e) => tracing::warn!(error = %e, "risks were not highlighted"),
    }
}

fn render(relative: &str, update: &HighlightUpdate) {
    println!();
    if let Some(reason) = &update.degraded {
        println!("(!) positions are approximate: {reason}");
    }

    if update.grouped.is_empty() {
        println!("no risks currently anchored in {relative}");
        return;
    }

    for (line, risks) in &update.grouped {
        let level = highest_risk_level(risks).unwrap_or(RiskLevel::Low);
        println!("{} line {:>4}  {}", severity_icon(level), line, level);
        for risk in risks {
            println!("      - {} [{}]", risk.rule_name, risk.risk_level);
        }
    }
}

fn severity_icon(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Critical => "🚨",
        RiskLevel::High => "❗",
        RiskLevel::Medium => "☢️",
        RiskLevel::Low => "⚠️",
    }
}
