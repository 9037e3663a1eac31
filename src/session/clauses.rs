//! Clause display for the analysis view.
//!
//! When the backend returns structured key clauses they are shown as-is.
//! Otherwise a degraded renderer cuts the raw summary between two literal
//! markers. It is not a parser and does not try to be robust beyond that.

use crate::models::{AnalysisResult, KeyClause};

/// Marker that opens the clauses section in a raw summary.
pub const KEY_CLAUSES_MARKER: &str = "KEY CLAUSES";

/// Marker that closes the clauses section in a raw summary.
pub const RISK_ASSESSMENT_MARKER: &str = "RISK ASSESSMENT";

/// Shown when neither structured clauses nor markers are available.
pub const CLAUSES_UNAVAILABLE: &str = "Key clauses information not available";

/// Shown on the risk tab when the assessment is empty.
pub const NO_RISKS_IDENTIFIED: &str = "No specific risks identified in this document.";

/// What the clauses tab should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClausesView<'a> {
    Structured(&'a [KeyClause]),
    Degraded(String),
    Unavailable,
}

/// Slice the summary text between `KEY CLAUSES` and `RISK ASSESSMENT`.
///
/// The section after the first `KEY CLAUSES` runs up to a repeated
/// `KEY CLAUSES`, if any. Within it, text before `RISK ASSESSMENT` is used;
/// when that is empty the whole section is. Returns `None` if the opening
/// marker does not occur.
pub fn degraded_clause_extract(summary: &str) -> Option<String> {
    let (_, rest) = summary.split_once(KEY_CLAUSES_MARKER)?;
    let section = rest
        .split_once(KEY_CLAUSES_MARKER)
        .map_or(rest, |(section, _)| section);
    let clauses = match section.split_once(RISK_ASSESSMENT_MARKER) {
        Some((before, _)) if !before.is_empty() => before,
        _ => section,
    };
    Some(clauses.to_string())
}

/// Choose between the structured list and the degraded extract.
pub fn clauses_view(analysis: &AnalysisResult) -> ClausesView<'_> {
    if !analysis.key_clauses.is_empty() {
        return ClausesView::Structured(&analysis.key_clauses);
    }
    match degraded_clause_extract(&analysis.summary) {
        Some(text) => ClausesView::Degraded(text),
        None => ClausesView::Unavailable,
    }
}

/// Risk tab text, with the empty-assessment message. Whitespace-only text is
/// shown as-is.
pub fn risk_text(analysis: &AnalysisResult) -> &str {
    if analysis.risk_assessment.is_empty() {
        NO_RISKS_IDENTIFIED
    } else {
        &analysis.risk_assessment
    }
}
