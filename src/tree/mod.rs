//! Document tree
//!
//! The score is an arena of nodes addressed by `NodeId` handles. Parent links
//! and control-element anchors are plain handles resolved through the arena,
//! so removing a subtree never leaves a dangling pointer behind.

mod document;

pub use document::{Document, CONTENT_PAGE_ID, CONTENT_SYSTEM_ID};

use serde::{Deserialize, Serialize};

use crate::align::horizontal::{AlignmentKey, MeasureAligner};
use crate::align::vertical::SystemAligner;
use crate::models::bbox::BoundingBox;
use crate::models::control::ControlElement;
use crate::models::duration::{zero, Onset};
use crate::models::elements::{BarLineForm, LayerElement};
use crate::models::score_def::{ScoreDefChange, ScoreDefState};

/// Handle of a node inside its document's arena
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A page produced by cast-off
#[derive(Clone, Debug, Default)]
pub struct Page {
    /// Height used by the systems, before vertical justification
    pub content_height: f64,
}

/// A system: a vertical slice of every staff for a run of measures
#[derive(Clone, Debug, Default)]
pub struct System {
    pub aligner: SystemAligner,
    /// Top of the system, relative to the top margin of its page
    pub y_rel: f64,
    /// Width of the clef/key/meter block the system starts with
    pub score_def_width: f64,
    /// Natural (unjustified) width of the measures
    pub measures_width: f64,
    /// A lone measure wider than the page
    pub overflow: bool,
}

impl System {
    pub fn width(&self) -> f64 {
        self.score_def_width + self.measures_width
    }
}

/// A measure: one metrical unit of simultaneous music across staves
#[derive(Clone, Debug)]
pub struct Measure {
    pub n: u32,
    pub aligner: MeasureAligner,
    /// Left edge relative to the system content start
    pub x_rel: f64,
    pub left_barline: Option<BarLineForm>,
    pub right_barline: BarLineForm,
    /// Clefs, key and meter in effect where the measure starts
    pub start_state: ScoreDefState,
}

impl Measure {
    pub fn new(n: u32) -> Self {
        Self {
            n,
            aligner: MeasureAligner::new(),
            x_rel: 0.0,
            left_barline: None,
            right_barline: BarLineForm::Single,
            start_state: ScoreDefState::default(),
        }
    }

    pub fn width(&self) -> f64 {
        self.aligner.width()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Staff {
    pub n: u32,
    /// Hidden in this measure; the staff takes no room in a system where
    /// all of its measures hide it
    pub hidden: bool,
}

impl Staff {
    pub fn new(n: u32) -> Self {
        Self { n, hidden: false }
    }

    pub fn hidden(n: u32) -> Self {
        Self { n, hidden: true }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    pub n: u32,
}

/// Node kinds: a closed sum type, dispatched by `match` in every pass
#[derive(Clone, Debug)]
pub enum NodeKind {
    Document,
    Page(Page),
    System(System),
    Measure(Measure),
    Staff(Staff),
    Layer(Layer),
    Element(LayerElement),
    Control(ControlElement),
    ScoreDef(ScoreDefChange),
    SystemBreak,
    PageBreak,
}

/// Payload-free copy of a node kind, for matching without borrowing the node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Document,
    Page,
    System,
    Measure,
    Staff,
    Layer,
    Element,
    Control,
    ScoreDef,
    SystemBreak,
    PageBreak,
}

impl NodeKind {
    pub fn tag(&self) -> NodeTag {
        match self {
            NodeKind::Document => NodeTag::Document,
            NodeKind::Page(_) => NodeTag::Page,
            NodeKind::System(_) => NodeTag::System,
            NodeKind::Measure(_) => NodeTag::Measure,
            NodeKind::Staff(_) => NodeTag::Staff,
            NodeKind::Layer(_) => NodeTag::Layer,
            NodeKind::Element(_) => NodeTag::Element,
            NodeKind::Control(_) => NodeTag::Control,
            NodeKind::ScoreDef(_) => NodeTag::ScoreDef,
            NodeKind::SystemBreak => NodeTag::SystemBreak,
            NodeKind::PageBreak => NodeTag::PageBreak,
        }
    }

    /// Kind name, used as identifier prefix and in error messages
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Document => "doc",
            NodeKind::Page(_) => "page",
            NodeKind::System(_) => "system",
            NodeKind::Measure(_) => "measure",
            NodeKind::Staff(_) => "staff",
            NodeKind::Layer(_) => "layer",
            NodeKind::Element(element) => element.name(),
            NodeKind::Control(control) => control.name(),
            NodeKind::ScoreDef(_) => "scoreDef",
            NodeKind::SystemBreak => "sb",
            NodeKind::PageBreak => "pb",
        }
    }

    /// Whether a node of this kind may own a child of kind `child`
    pub fn accepts(&self, child: &NodeKind) -> bool {
        match (self, child) {
            (NodeKind::Document, NodeKind::Page(_)) => true,
            (NodeKind::Page(_), NodeKind::System(_)) => true,
            (
                NodeKind::System(_),
                NodeKind::Measure(_)
                | NodeKind::SystemBreak
                | NodeKind::PageBreak
                | NodeKind::ScoreDef(_)
                | NodeKind::Control(_),
            ) => true,
            (NodeKind::Measure(_), NodeKind::Staff(_) | NodeKind::Control(_)) => true,
            (NodeKind::Staff(_), NodeKind::Layer(_)) => true,
            (NodeKind::Layer(_), NodeKind::Element(_)) => true,
            (NodeKind::Element(parent), NodeKind::Element(element)) => parent.accepts_child(element),
            _ => false,
        }
    }

    pub fn as_element(&self) -> Option<&LayerElement> {
        match self {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_control(&self) -> Option<&ControlElement> {
        match self {
            NodeKind::Control(control) => Some(control),
            _ => None,
        }
    }

    pub fn as_measure(&self) -> Option<&Measure> {
        match self {
            NodeKind::Measure(measure) => Some(measure),
            _ => None,
        }
    }

    pub fn as_measure_mut(&mut self) -> Option<&mut Measure> {
        match self {
            NodeKind::Measure(measure) => Some(measure),
            _ => None,
        }
    }

    pub fn as_system(&self) -> Option<&System> {
        match self {
            NodeKind::System(system) => Some(system),
            _ => None,
        }
    }

    pub fn as_system_mut(&mut self) -> Option<&mut System> {
        match self {
            NodeKind::System(system) => Some(system),
            _ => None,
        }
    }

    pub fn as_page_mut(&mut self) -> Option<&mut Page> {
        match self {
            NodeKind::Page(page) => Some(page),
            _ => None,
        }
    }
}

/// Per-node state written by the layout passes and cleared on every re-layout
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutState {
    /// Onset relative to the start of the measure
    pub onset: Option<Onset>,
    /// Time advance contributed to the layer
    pub duration: Onset,
    /// Alignment slot in the measure aligner
    pub alignment: Option<AlignmentKey>,
    /// Staff the node is drawn on
    pub staff_n: Option<u32>,
    /// Vertical anchor relative to the top line of the staff
    pub y_rel: f64,
    /// Resolved anchors of control elements
    pub start_anchor: Option<NodeId>,
    pub end_anchor: Option<NodeId>,
    /// Excluded from layout (unresolved control element)
    pub omitted: bool,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            onset: None,
            duration: zero(),
            alignment: None,
            staff_n: None,
            y_rel: 0.0,
            start_anchor: None,
            end_anchor: None,
            omitted: false,
        }
    }
}

/// A tree member
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) id: String,
    pub kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Computed footprint; only valid once the pass computing it has run
    pub bbox: BoundingBox,
    /// Set by edits, cleared by layout
    pub dirty: bool,
    pub layout: LayoutState,
}

impl Node {
    pub(crate) fn new(id: String, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            parent: None,
            children: Vec::new(),
            bbox: BoundingBox::default(),
            dirty: true,
            layout: LayoutState::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn tag(&self) -> NodeTag {
        self.kind.tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::capabilities::{Pitch, PitchName};
    use crate::models::duration::{DurationAttrs, DurationBase};
    use crate::models::elements::{Beam, Note};

    fn note() -> NodeKind {
        NodeKind::Element(LayerElement::Note(Note::new(
            DurationAttrs::new(DurationBase::Quarter),
            Pitch::new(PitchName::A, 4),
        )))
    }

    #[test]
    fn test_hierarchy_rules() {
        let measure = NodeKind::Measure(Measure::new(1));
        let layer = NodeKind::Layer(Layer { n: 1 });
        assert!(measure.accepts(&NodeKind::Staff(Staff::new(1))));
        assert!(measure.accepts(&NodeKind::Control(ControlElement::slur("a", "b"))));
        assert!(!measure.accepts(&note()));
        assert!(layer.accepts(&note()));
        assert!(NodeKind::Element(LayerElement::Beam(Beam::default())).accepts(&note()));
        assert!(!NodeKind::Document.accepts(&NodeKind::System(System::default())));
    }

    #[test]
    fn test_names() {
        assert_eq!(note().name(), "note");
        assert_eq!(NodeKind::SystemBreak.name(), "sb");
        assert_eq!(note().tag(), NodeTag::Element);
    }
}
