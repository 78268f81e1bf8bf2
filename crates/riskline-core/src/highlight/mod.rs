//! Re-keying risks onto current line numbers and the highlight-cycle
//! pipeline that produces the renderer's input.
//!
//! One cycle is a pure sequence: sync with origin (TTL-gated) -> fetch base
//! text -> map lines -> group risks. The engine holds no state between
//! cycles beyond the injected TTL caches; each cycle computes from its own
//! snapshot of `(base_text, current_text)`.

use std::collections::BTreeMap;

use crate::cache::TtlCache;
use crate::diff::{map_lines, DegradeReason, LineChangeInfo, LineMapResult};
use crate::error::Result;
use crate::git::GitOps;
use crate::risk::{Risk, RiskProvider};

/// Current line number -> risks anchored there. Rebuilt every cycle.
pub type GroupedRisks = BTreeMap<u32, Vec<Risk>>;

/// What a cycle hands to the rendering layer.
#[derive(Debug, Clone)]
pub struct HighlightUpdate {
    pub grouped: GroupedRisks,
    /// Set when the positions are a conservative guess rather than a real
    /// mapping; renderers may want to annotate that.
    pub degraded: Option<DegradeReason>,
}

impl HighlightUpdate {
    pub fn empty() -> Self {
        Self {
            grouped: BTreeMap::new(),
            degraded: None,
        }
    }
}

/// Buckets `risks[i]` under the current line given by `infos[i]`.
///
/// A deleted anchor drops its risk entirely: a finding on a line the user
/// removed is not shown. A verdict that somehow carries no new position but
/// is not deleted falls back to the original anchor line. Several risks may
/// land in the same bucket; nothing is de-duplicated.
pub fn group_by_current_line(risks: Vec<Risk>, infos: &[LineChangeInfo]) -> GroupedRisks {
    let mut grouped = GroupedRisks::new();

    for (risk, info) in risks.into_iter().zip(infos.iter()) {
        if info.has_changed && info.new_line.is_none() {
            continue;
        }
        let line = info.new_line.unwrap_or(risk.source_code.line_number);
        grouped.entry(line).or_default().push(risk);
    }

    grouped
}

/// Runs one full highlight cycle for `relative_path` whose in-editor content
/// is `current_text`.
///
/// Base-revision trouble (failed sync, failed show) degrades the mapping and
/// keeps the cycle alive; only a provider failure is returned as `Err`, for
/// the host to report.
pub async fn highlight_cycle(
    git: &GitOps,
    fetch_gate: &TtlCache<String, ()>,
    provider: &dyn RiskProvider,
    base_branch: &str,
    relative_path: &str,
    current_text: &str,
) -> Result<HighlightUpdate> {
    let risks = provider.risks_for_file(relative_path).await?;
    let risks: Vec<Risk> = risks
        .into_iter()
        .filter(|r| r.source_code.file_path == relative_path)
        .collect();

    if risks.is_empty() {
        return Ok(HighlightUpdate::empty());
    }

    let target_lines: Vec<u32> = risks.iter().map(|r| r.source_code.line_number).collect();

    let result = match fetch_base_text(git, fetch_gate, base_branch, relative_path).await {
        Ok(base_text) => map_lines(&base_text, current_text, &target_lines),
        Err(e) => {
            tracing::warn!(
                error = %e,
                file = relative_path,
                "base revision unavailable, keeping original risk positions"
            );
            LineMapResult::degraded(&target_lines, DegradeReason::BaseUnavailable(e.to_string()))
        }
    };

    Ok(HighlightUpdate {
        grouped: group_by_current_line(risks, &result.infos),
        degraded: result.degraded,
    })
}

async fn fetch_base_text(
    git: &GitOps,
    fetch_gate: &TtlCache<String, ()>,
    base_branch: &str,
    relative_path: &str,
) -> Result<String> {
    git.ensure_synced(fetch_gate).await?;
    git.base_text(base_branch, relative_path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{RiskCategory, RiskLevel, SourceCodeReference};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration;

    fn mk_risk(id: &str, file: &str, line: u32) -> Risk {
        Risk {
            id: id.to_string(),
            rule_name: "rule".into(),
            risk_level: RiskLevel::High,
            risk_status: "Open".into(),
            risk_category: RiskCategory::SastFindings,
            component: String::new(),
            discovered_on: Utc::now(),
            insights: Vec::new(),
            source_code: SourceCodeReference {
                file_path: file.to_string(),
                line_number: line,
                url: None,
            },
            dependency_name: None,
            dependency_version: None,
            secret_type: None,
            exposure: None,
            issue_title: None,
            cwe_identifiers: Vec::new(),
        }
    }

    fn info(line: u32, has_changed: bool, has_moved: bool, new_line: Option<u32>) -> LineChangeInfo {
        LineChangeInfo {
            original_line: line,
            has_changed,
            has_moved,
            new_line,
        }
    }

    #[test]
    fn test_grouping_drops_deleted_anchors() {
        let risks = vec![mk_risk("a", "f.rs", 3), mk_risk("b", "f.rs", 7)];
        let infos = vec![info(3, true, false, None), info(7, false, false, Some(7))];

        let grouped = group_by_current_line(risks, &infos);

        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped.get(&7).map(|v| v.len()), Some(1));
        assert!(grouped.values().flatten().all(|r| r.id != "a"));
    }

    #[test]
    fn test_grouping_collapses_collisions() {
        // Both anchors map to current line 5 after an edit elsewhere.
        let risks = vec![mk_risk("a", "f.rs", 5), mk_risk("b", "f.rs", 9)];
        let infos = vec![info(5, false, false, Some(5)), info(9, false, true, Some(5))];

        let grouped = group_by_current_line(risks, &infos);

        assert_eq!(grouped.len(), 1);
        let bucket = grouped.get(&5).unwrap();
        let mut ids: Vec<&str> = bucket.iter().map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_grouping_falls_back_to_original_line() {
        let risks = vec![mk_risk("a", "f.rs", 4)];
        // Not flagged deleted, but no new position either.
        let infos = vec![info(4, false, false, None)];

        let grouped = group_by_current_line(risks, &infos);

        assert_eq!(grouped.get(&4).map(|v| v.len()), Some(1));
    }

    #[test]
    fn test_grouping_keys_moved_anchor_by_new_line() {
        let risks = vec![mk_risk("a", "f.rs", 2)];
        let infos = vec![info(2, false, true, Some(6))];

        let grouped = group_by_current_line(risks, &infos);

        assert!(grouped.get(&2).is_none());
        assert_eq!(grouped.get(&6).map(|v| v.len()), Some(1));
    }

    struct StaticProvider(Vec<Risk>);

    #[async_trait]
    impl RiskProvider for StaticProvider {
        async fn risks_for_file(&self, _relative_path: &str) -> Result<Vec<Risk>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_cycle_degrades_when_repo_is_unreachable() {
        let git = GitOps::new("/definitely/not/a/repo");
        let gate = TtlCache::new(Duration::from_secs(600));
        let provider = StaticProvider(vec![mk_risk("a", "f.rs", 12)]);

        let update = highlight_cycle(&git, &gate, &provider, "main", "f.rs", "whatever\n")
            .await
            .unwrap();

        assert!(matches!(
            update.degraded,
            Some(DegradeReason::BaseUnavailable(_))
        ));
        // The risk stays visible at its original, possibly stale, position.
        assert_eq!(update.grouped.get(&12).map(|v| v.len()), Some(1));
    }

    #[tokio::test]
    async fn test_cycle_filters_risks_for_other_files() {
        let git = GitOps::new("/definitely/not/a/repo");
        let gate = TtlCache::new(Duration::from_secs(600));
        let provider = StaticProvider(vec![mk_risk("other", "other.rs", 1)]);

        let update = highlight_cycle(&git, &gate, &provider, "main", "f.rs", "text\n")
            .await
            .unwrap();

        assert!(update.grouped.is_empty());
        assert!(update.degraded.is_none());
    }
}
