//! Artifact path construction.
//!
//! Paths have the shape
//! `{base}{run timestamp}/{feature}/{scenario}/{ordinal}-{step text}.{ext}`
//! with every title segment passed through [`sanitize`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::event::ScenarioInfo;
use crate::run::Run;

/// What kind of evidence an artifact holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// PNG screenshot from the session
    Screenshot,
    /// Page markup, used when the driver cannot take screenshots
    PageContent,
}

impl ArtifactKind {
    /// File extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Screenshot => "png",
            ArtifactKind::PageContent => "html",
        }
    }
}

/// Make a title safe to use as a single path segment.
///
/// Drops everything except ASCII letters, digits, `_`, whitespace and `-`,
/// then folds each run of whitespace and hyphens into one `-`.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_gap = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
            in_gap = false;
        } else if is_gap_char(c) {
            if !in_gap {
                out.push('-');
                in_gap = true;
            }
        }
        // anything else is dropped without ending the gap
    }

    out
}

/// Whitespace (space, tab, LF, VT, FF, CR) or a hyphen
fn is_gap_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r' | '-')
}

/// Relative file name of an artifact inside the run directory
pub fn artifact_file_name(
    scenario: &ScenarioInfo,
    step_ordinal: usize,
    step_text: &str,
    kind: ArtifactKind,
) -> String {
    format!(
        "{}/{}/{}-{}.{}",
        sanitize(&scenario.feature_title),
        sanitize(&scenario.scenario_title),
        step_ordinal,
        sanitize(step_text),
        kind.extension()
    )
}

/// Full artifact path for a failing step
pub fn build_path(
    run: &Run,
    scenario: &ScenarioInfo,
    step_ordinal: usize,
    step_text: &str,
    kind: ArtifactKind,
) -> PathBuf {
    PathBuf::from(format!(
        "{}{}/{}",
        run.base_path(),
        run.timestamp(),
        artifact_file_name(scenario, step_ordinal, step_text, kind)
    ))
}
