pub mod cache;
pub mod config;
pub mod diff;
pub mod error;
pub mod git;
pub mod highlight;
pub mod project;
pub mod risk;

// Re-export key types
pub use cache::TtlCache;
pub use config::Settings;
pub use diff::{map_lines, DegradeReason, LineChangeInfo, LineMapResult};
pub use error::RisklineError;
pub use git::GitOps;
pub use highlight::{group_by_current_line, highlight_cycle, GroupedRisks, HighlightUpdate};
pub use risk::{Risk, RiskCategory, RiskLevel, RiskProvider};
