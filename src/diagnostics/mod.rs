//! Diagnostics collected during layout
//!
//! Problems in the score never abort layout. Each pass reports what it had to
//! work around as a `DiagnosticMark`; the marks travel back to the caller
//! next to the laid-out tree.

pub mod anchors;

use serde::{Deserialize, Serialize};

/// Kind identifiers used by the passes
pub mod kind {
    /// A control element refers to an id that is not a live layer element
    pub const DANGLING_ANCHOR: &str = "dangling_anchor";
    /// A control element has neither an anchor id nor a time-stamp
    pub const UNANCHORED_CONTROL: &str = "unanchored_control";
    /// A time-stamp falls outside its measure
    pub const UNRESOLVED_TSTAMP: &str = "unresolved_tstamp";
    /// A duration that cannot be turned into a time advance
    pub const INVALID_DURATION: &str = "invalid_duration";
    /// A measure wider than the page
    pub const MEASURE_OVERFLOW: &str = "measure_overflow";
    /// A system taller than the page
    pub const SYSTEM_OVERFLOW: &str = "system_overflow";
}

/// Severity level for diagnostic marks
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

/// A diagnostic mark attached to a node of the score
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DiagnosticMark {
    /// Identifier of the offending node, when there is one
    pub node: Option<String>,
    /// Severity level
    pub severity: DiagnosticSeverity,
    /// Kind identifier (see [`kind`])
    pub kind: String,
    /// Human-readable message
    pub message: String,
}

impl DiagnosticMark {
    /// Create a new diagnostic mark
    pub fn new(
        node: Option<&str>,
        severity: DiagnosticSeverity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            node: node.map(str::to_string),
            severity,
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn warning(node: &str, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Some(node), DiagnosticSeverity::Warning, kind, message)
    }

    pub fn error(node: &str, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Some(node), DiagnosticSeverity::Error, kind, message)
    }
}

/// Collection of diagnostic marks for an entire layout run
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
    /// All diagnostic marks, in the order they were raised
    pub marks: Vec<DiagnosticMark>,
}

impl Diagnostics {
    /// Create empty diagnostics
    pub fn new() -> Self {
        Self { marks: Vec::new() }
    }

    /// Add a mark
    pub fn add(&mut self, mark: DiagnosticMark) {
        self.marks.push(mark);
    }

    /// Extend with multiple marks
    pub fn extend(&mut self, marks: impl IntoIterator<Item = DiagnosticMark>) {
        self.marks.extend(marks);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.marks
            .iter()
            .any(|m| m.severity == DiagnosticSeverity::Error)
    }

    /// Check if there are any diagnostics
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Marks of one kind
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a DiagnosticMark> + 'a {
        self.marks.iter().filter(move |m| m.kind == kind)
    }

    pub fn count_kind(&self, kind: &str) -> usize {
        self.of_kind(kind).count()
    }
}
