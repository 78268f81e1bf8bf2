//! Risk records as delivered by the remote risk service.
//!
//! The engine consumes these read-only: anchors (`source_code`) are assigned
//! by the service against the base revision and never mutated here.

pub mod provider;

pub use provider::{CachedRiskProvider, RiskProvider};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity, ordered lowest to highest so `max()` picks the worst finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    Secrets,
    #[serde(rename = "OSS Security")]
    OssSecurity,
    #[serde(rename = "SAST Findings")]
    SastFindings,
    #[serde(rename = "Entry Point Changes")]
    EntryPointChanges,
    #[serde(rename = "Sensitive Data")]
    SensitiveData,
}

/// Where the finding was anchored, expressed against the base revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCodeReference {
    pub file_path: String,
    pub line_number: u32,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub name: String,
    pub reason: String,
}

/// One finding from the risk service. Category-specific fields are optional
/// and only populated for their own category (e.g. `dependency_name` on
/// OSS Security findings).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    pub id: String,
    pub rule_name: String,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub risk_status: String,
    pub risk_category: RiskCategory,
    #[serde(default)]
    pub component: String,
    pub discovered_on: DateTime<Utc>,
    #[serde(default)]
    pub insights: Vec<Insight>,
    pub source_code: SourceCodeReference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cwe_identifiers: Vec<String>,
}

/// The worst severity among `risks`, if any. Renderers use this to pick one
/// decoration per line when several findings share it.
pub fn highest_risk_level(risks: &[Risk]) -> Option<RiskLevel> {
    risks.iter().map(|r| r.risk_level).max()
}
