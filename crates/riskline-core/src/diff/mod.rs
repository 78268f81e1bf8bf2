//! Line correspondence mapping between a base-revision text and the current
//! buffer content.
//!
//! The mapper builds a complete old-line -> new-line table from the diff and
//! classifies each tracked anchor line as unchanged, moved, or deleted. All
//! line numbers in the public API are 1-based, matching the addressing used
//! by the risk anchors and the rendering layer; the diff engine's 0-based
//! ranges are normalized here and nowhere else.

use std::collections::HashMap;

use similar::{DiffOp, TextDiff};

/// Verdict for a single tracked line.
///
/// Exactly one of three states holds: unchanged at the same position
/// (`!has_changed && !has_moved`), moved (`has_moved`, with `new_line`
/// differing from `original_line`), or deleted (`has_changed` with
/// `new_line == None`). A degraded mapping reports `has_changed` with the
/// original position retained so callers can keep rendering conservatively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChangeInfo {
    pub original_line: u32,
    pub has_changed: bool,
    pub has_moved: bool,
    pub new_line: Option<u32>,
}

impl LineChangeInfo {
    fn unchanged(line: u32) -> Self {
        Self {
            original_line: line,
            has_changed: false,
            has_moved: false,
            new_line: Some(line),
        }
    }

    fn moved(line: u32, new_line: u32) -> Self {
        Self {
            original_line: line,
            has_changed: false,
            has_moved: true,
            new_line: Some(new_line),
        }
    }

    fn deleted(line: u32) -> Self {
        Self {
            original_line: line,
            has_changed: true,
            has_moved: false,
            new_line: None,
        }
    }

    fn assume_changed(line: u32) -> Self {
        Self {
            original_line: line,
            has_changed: true,
            has_moved: false,
            new_line: Some(line),
        }
    }
}

/// Why a mapping fell back to the conservative "assume everything changed"
/// verdict instead of a real diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// The file does not exist on the base branch; every line is new.
    NewFile,
    /// The base revision could not be retrieved; positions may be stale.
    BaseUnavailable(String),
}

impl std::fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegradeReason::NewFile => f.write_str("file not present on the base branch"),
            DegradeReason::BaseUnavailable(message) => {
                write!(f, "base revision unavailable: {message}")
            }
        }
    }
}

/// Result of one remap operation. Built fresh per document-change cycle and
/// discarded after the grouping step; never persisted.
#[derive(Debug, Clone)]
pub struct LineMapResult {
    pub infos: Vec<LineChangeInfo>,
    pub degraded: Option<DegradeReason>,
}

impl LineMapResult {
    /// Conservative fallback: every target is flagged changed but keeps its
    /// original position, so downstream grouping shows risks at stale
    /// locations instead of dropping them.
    pub fn degraded(target_lines: &[u32], reason: DegradeReason) -> Self {
        Self {
            infos: target_lines
                .iter()
                .map(|&line| LineChangeInfo::assume_changed(line))
                .collect(),
            degraded: Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Maps each 1-based `target_lines` entry (expressed against `base_text`)
/// to its position in `current_text`. Results come back in input order.
///
/// An empty `base_text` means the file has no base revision; the whole file
/// is treated as new rather than risking a false "unchanged" claim.
pub fn map_lines(base_text: &str, current_text: &str, target_lines: &[u32]) -> LineMapResult {
    if base_text.is_empty() {
        return LineMapResult::degraded(target_lines, DegradeReason::NewFile);
    }

    let mapping = build_line_mapping(base_text, current_text);

    let infos = target_lines
        .iter()
        .map(|&line| match mapping.get(&line) {
            None => LineChangeInfo::deleted(line),
            Some(&new_line) if new_line == line => LineChangeInfo::unchanged(line),
            Some(&new_line) => LineChangeInfo::moved(line, new_line),
        })
        .collect();

    LineMapResult {
        infos,
        degraded: None,
    }
}

/// Builds the complete old-line -> new-line table for every surviving line
/// of `base_text`, not only the tracked ones: the equal runs between edits
/// are what keep the old and new counters synchronized.
///
/// `Equal` ops map each line in the run; `Delete`/`Replace` consume old
/// lines without producing an entry (those lines are gone); `Insert`
/// consumes only new lines. The engine's ranges already carry both
/// counters, so the walk reduces to expanding the equal runs.
fn build_line_mapping(base_text: &str, current_text: &str) -> HashMap<u32, u32> {
    let diff = TextDiff::from_lines(base_text, current_text);
    let mut mapping = HashMap::new();

    for op in diff.ops() {
        if let DiffOp::Equal {
            old_index,
            new_index,
            len,
        } = *op
        {
            for offset in 0..len {
                // 0-based engine ranges, 1-based anchor addressing.
                mapping.insert(
                    (old_index + offset + 1) as u32,
                    (new_index + offset + 1) as u32,
                );
            }
        }
    }

    mapping
}
