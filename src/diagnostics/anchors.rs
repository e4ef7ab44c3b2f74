//! Anchor analysis for control elements
//!
//! Control elements reach their notes through identifiers. This pass
//! resolves those identifiers to live layer elements and reports the ones
//! that do not resolve; an unresolved control element is flagged `omitted`
//! and every later pass leaves it out.

use crate::functor::{process, Functor, VisitResult};
use crate::tree::{Document, NodeId, NodeTag};

use super::{kind, DiagnosticMark};

/// Why an anchor id does not resolve
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorError {
    /// No node carries the id
    Missing,
    /// The node was removed from the tree
    Detached,
    /// The node is not a layer element
    NotAnElement,
}

impl AnchorError {
    fn describe(self) -> &'static str {
        match self {
            AnchorError::Missing => "does not exist",
            AnchorError::Detached => "was removed from the score",
            AnchorError::NotAnElement => "is not a layer element",
        }
    }
}

/// Resolve an anchor id to a live layer element
pub fn resolve_anchor(doc: &Document, id: &str) -> Result<NodeId, AnchorError> {
    let node = doc.find_by_id(id).ok_or(AnchorError::Missing)?;
    if !doc.is_live(node) {
        return Err(AnchorError::Detached);
    }
    if doc[node].tag() != NodeTag::Element {
        return Err(AnchorError::NotAnElement);
    }
    Ok(node)
}

/// Resolve the anchors of every control element in the document
///
/// Returns one diagnostic mark per control element that had to be omitted.
pub fn analyze_anchors(doc: &mut Document) -> Vec<DiagnosticMark> {
    let mut resolver = AnchorResolver::default();
    let root = doc.root();
    process(doc, root, &mut resolver);
    resolver.marks
}

#[derive(Default)]
struct AnchorResolver {
    marks: Vec<DiagnosticMark>,
}

impl AnchorResolver {
    fn omit(&mut self, doc: &mut Document, node: NodeId, mark: DiagnosticMark) {
        log::debug!("Omitting {}: {}", doc[node].id(), mark.message);
        let layout = &mut doc[node].layout;
        layout.omitted = true;
        layout.start_anchor = None;
        layout.end_anchor = None;
        self.marks.push(mark);
    }

    fn resolve_control(&mut self, doc: &mut Document, node: NodeId) {
        let Some(control) = doc[node].kind.as_control() else {
            return;
        };
        let name = control.name();
        let point = control.as_time_point();
        let start_id = point.start_anchor_id().map(str::to_string);
        let has_tstamp = point.tstamp().is_some();
        let end_id = control
            .as_time_spanning()
            .and_then(|span| span.end_anchor_id())
            .map(str::to_string);
        let control_id = doc[node].id().to_string();
        let in_measure = doc
            .parent(node)
            .map(|parent| doc[parent].tag() == NodeTag::Measure)
            .unwrap_or(false);

        match start_id {
            Some(start) => match resolve_anchor(doc, &start) {
                Ok(anchor) => doc[node].layout.start_anchor = Some(anchor),
                Err(err) => {
                    let message = format!(
                        "{} '{}': start anchor '{}' {}",
                        name,
                        control_id,
                        start,
                        err.describe()
                    );
                    let mark = DiagnosticMark::warning(&control_id, kind::DANGLING_ANCHOR, message);
                    return self.omit(doc, node, mark);
                }
            },
            None if has_tstamp && in_measure => {}
            None if has_tstamp => {
                let message = format!("{} '{}': time-stamp outside of a measure", name, control_id);
                let mark = DiagnosticMark::warning(&control_id, kind::UNRESOLVED_TSTAMP, message);
                return self.omit(doc, node, mark);
            }
            None => {
                let message = format!("{} '{}': no anchor and no time-stamp", name, control_id);
                let mark = DiagnosticMark::warning(&control_id, kind::UNANCHORED_CONTROL, message);
                return self.omit(doc, node, mark);
            }
        }

        if let Some(end) = end_id {
            match resolve_anchor(doc, &end) {
                Ok(anchor) => doc[node].layout.end_anchor = Some(anchor),
                Err(err) => {
                    let message = format!(
                        "{} '{}': end anchor '{}' {}",
                        name,
                        control_id,
                        end,
                        err.describe()
                    );
                    let mark = DiagnosticMark::warning(&control_id, kind::DANGLING_ANCHOR, message);
                    self.omit(doc, node, mark);
                }
            }
        }
    }
}

impl Functor for AnchorResolver {
    fn enter(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        match doc[node].tag() {
            NodeTag::Control => {
                self.resolve_control(doc, node);
                VisitResult::SkipChildren
            }
            // Layer content holds no control elements
            NodeTag::Layer => VisitResult::SkipChildren,
            _ => VisitResult::Continue,
        }
    }
}
