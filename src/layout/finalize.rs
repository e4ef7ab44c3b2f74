//! Absolute positions
//!
//! The last pass turns the relative offsets of the earlier passes (system
//! y, measure x, staff y, slot x, element y) into page coordinates and
//! computes the bounding boxes of containers and control elements.

use crate::functor::{Functor, VisitResult};
use crate::layout::metrics::{control_footprint, GlyphMetrics, CONTROL_MARGIN};
use crate::layout::options::LayoutOptions;
use crate::models::bbox::{BoundingBox, Rect};
use crate::models::control::{ControlElement, Placement};
use crate::tree::{Document, NodeId, NodeKind, NodeTag};

#[derive(Clone, Copy)]
struct SystemFrame {
    node: NodeId,
    x: f64,
    y: f64,
}

#[derive(Clone, Copy)]
struct MeasureFrame {
    node: NodeId,
    x: f64,
}

pub struct FinalizePositions<'a> {
    metrics: &'a dyn GlyphMetrics,
    unit: f64,
    margin_left: f64,
    margin_top: f64,
    system: Option<SystemFrame>,
    measure: Option<MeasureFrame>,
    staff_y: f64,
    /// The staff being visited is hidden in its system
    staff_hidden: bool,
    /// Anchored control elements, placed once every element has its position
    deferred: Vec<NodeId>,
}

impl<'a> FinalizePositions<'a> {
    pub fn new(options: &LayoutOptions, metrics: &'a dyn GlyphMetrics) -> Self {
        Self {
            metrics,
            unit: options.scaled_unit(),
            margin_left: options.page_margin_left,
            margin_top: options.page_margin_top,
            system: None,
            measure: None,
            staff_y: 0.0,
            staff_hidden: false,
            deferred: Vec::new(),
        }
    }

    /// Top of a staff in the current system, in page coordinates, with its
    /// height and whether the system hides it
    fn staff_top(&self, doc: &Document, staff_n: u32) -> Option<(f64, f64, bool)> {
        let frame = self.system?;
        let system = doc[frame.node].kind.as_system()?;
        let staff = system.aligner.get(staff_n)?;
        Some((frame.y + staff.y_rel, staff.staff_height, staff.hidden))
    }

    fn enter_system(&mut self, doc: &mut Document, node: NodeId) {
        let x = self.margin_left;
        let Some((y_rel, width, height)) = doc[node]
            .kind
            .as_system()
            .map(|s| (s.y_rel, s.width(), s.aligner.height()))
        else {
            return;
        };
        let y = self.margin_top + y_rel;
        doc[node].bbox = BoundingBox::new(x, y, Some(Rect::new(0.0, 0.0, width, height)));
        self.system = Some(SystemFrame { node, x, y });
    }

    fn enter_measure(&mut self, doc: &mut Document, node: NodeId) {
        let Some(frame) = self.system else {
            return;
        };
        let score_def_width = doc[frame.node]
            .kind
            .as_system()
            .map(|s| s.score_def_width)
            .unwrap_or(0.0);
        let height = doc[frame.node]
            .kind
            .as_system()
            .map(|s| s.aligner.height())
            .unwrap_or(0.0);
        let Some((x_rel, width)) = doc[node].kind.as_measure().map(|m| (m.x_rel, m.width())) else {
            return;
        };
        let x = frame.x + score_def_width + x_rel;
        doc[node].bbox = BoundingBox::new(x, frame.y, Some(Rect::new(0.0, 0.0, width, height)));
        self.measure = Some(MeasureFrame { node, x });
    }

    fn enter_staff(&mut self, doc: &mut Document, node: NodeId) {
        let (Some(measure), NodeKind::Staff(staff)) = (self.measure, &doc[node].kind) else {
            return;
        };
        let Some((y, height, hidden)) = self.staff_top(doc, staff.n) else {
            return;
        };
        let width = doc[measure.node].kind.as_measure().map(|m| m.width()).unwrap_or(0.0);
        self.staff_y = y;
        self.staff_hidden = hidden;
        let rect = (!hidden).then(|| Rect::new(0.0, 0.0, width, height));
        doc[node].bbox = BoundingBox::new(measure.x, y, rect);
    }

    fn enter_element(&mut self, doc: &mut Document, node: NodeId) {
        let Some(measure) = self.measure else {
            return;
        };
        let slot_x = doc[node].layout.alignment.and_then(|key| {
            doc[measure.node]
                .kind
                .as_measure()
                .and_then(|m| m.aligner.x_of(&key))
        });
        let x = measure.x + slot_x.unwrap_or(0.0);
        let y = self.staff_y + doc[node].layout.y_rel;
        // Nothing is drawn on a hidden staff
        if self.staff_hidden {
            doc[node].bbox = BoundingBox::new(x, y, None);
        } else {
            doc[node].bbox.set_anchor(x, y);
        }
    }

    /// Containers take the union of their content
    fn leave_element(&mut self, doc: &mut Document, node: NodeId) {
        let is_container = doc[node]
            .kind
            .as_element()
            .map(|e| e.is_container())
            .unwrap_or(false);
        if !is_container {
            return;
        }
        let union = doc
            .children(node)
            .iter()
            .filter(|&&child| doc[child].bbox.has_content())
            .map(|&child| doc[child].bbox.bounds())
            .reduce(|a, b| a.union(&b));
        if let Some(bounds) = union {
            let bbox = &mut doc[node].bbox;
            let own = bbox.rect.map(|r| r.translate(bbox.x, bbox.y));
            let bounds = own.map(|r| r.union(&bounds)).unwrap_or(bounds);
            bbox.rect = Some(bounds.translate(-bbox.x, -bbox.y));
        }
    }

    /// Time-stamped control element, placed at its slot
    fn enter_control(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        if doc[node].layout.omitted {
            return VisitResult::SkipChildren;
        }
        if doc[node].layout.start_anchor.is_some() {
            self.deferred.push(node);
            return VisitResult::SkipChildren;
        }
        let (Some(measure), Some(key)) = (self.measure, doc[node].layout.alignment) else {
            return VisitResult::SkipChildren;
        };
        if doc.parent(node) != Some(measure.node) {
            return VisitResult::SkipChildren;
        }
        let slot_x = doc[measure.node]
            .kind
            .as_measure()
            .and_then(|m| m.aligner.x_of(&key))
            .unwrap_or(0.0);
        let staff_n = doc[node].layout.staff_n.unwrap_or(1);
        let Some((staff_y, staff_height, false)) = self.staff_top(doc, staff_n) else {
            return VisitResult::SkipChildren;
        };
        let Some(control) = doc[node].kind.as_control().cloned() else {
            return VisitResult::SkipChildren;
        };
        let rect = self.control_rect(&control, 0.0);
        let x = measure.x + slot_x;
        let y = self.control_y(control.placement(), staff_y, staff_y + staff_height, rect.height());
        doc[node].bbox = BoundingBox::new(x, y, Some(rect));
        VisitResult::SkipChildren
    }

    fn control_rect(&self, control: &ControlElement, span: f64) -> Rect {
        control_footprint(self.metrics, control, span, self.unit)
    }

    fn control_y(&self, placement: Placement, top: f64, bottom: f64, height: f64) -> f64 {
        let margin = CONTROL_MARGIN * self.unit;
        match placement {
            Placement::Above => top - margin - height,
            Placement::Below => bottom + margin,
        }
    }

    /// Place a control element between its anchors
    fn place_anchored(&self, doc: &mut Document, node: NodeId) {
        let Some(start) = doc[node].layout.start_anchor else {
            return;
        };
        let end = doc[node].layout.end_anchor.unwrap_or(start);
        let Some(control) = doc[node].kind.as_control().cloned() else {
            return;
        };
        let staff = doc.ancestor_of_kind(start, NodeTag::Staff);
        // Anchored on a hidden staff
        if staff.map(|s| doc[s].bbox.rect.is_none()).unwrap_or(false) {
            return;
        }
        let start_bounds = doc[start].bbox.bounds();
        let start_x = doc[start].bbox.x;
        let start_system = doc.ancestor_of_kind(start, NodeTag::System);
        let end_system = doc.ancestor_of_kind(end, NodeTag::System);

        // A span crossing a system break is cut at the end of its first system
        let (end_x, end_bounds) = if start_system == end_system {
            (doc[end].bbox.bounds().x2, doc[end].bbox.bounds())
        } else {
            let right = start_system
                .map(|s| doc[s].bbox.bounds().x2)
                .unwrap_or(start_bounds.x2);
            (right, start_bounds)
        };

        // Vertical reference: the staff of the start anchor
        let (staff_top, staff_bottom) = staff
            .map(|s| {
                let b = doc[s].bbox.bounds();
                (b.y1, b.y2)
            })
            .unwrap_or((start_bounds.y1, start_bounds.y2));
        let top = staff_top.min(start_bounds.y1).min(end_bounds.y1);
        let bottom = staff_bottom.max(start_bounds.y2).max(end_bounds.y2);

        let rect = self.control_rect(&control, end_x - start_x);
        let y = self.control_y(control.placement(), top, bottom, rect.height());
        let staff_n = doc[start].layout.staff_n;
        let target = &mut doc[node];
        target.bbox = BoundingBox::new(start_x, y, Some(rect));
        target.layout.staff_n = staff_n;
    }
}

impl Functor for FinalizePositions<'_> {
    fn enter(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        match doc[node].tag() {
            NodeTag::System => self.enter_system(doc, node),
            NodeTag::Measure => self.enter_measure(doc, node),
            NodeTag::Staff => self.enter_staff(doc, node),
            NodeTag::Element => self.enter_element(doc, node),
            NodeTag::Control => return self.enter_control(doc, node),
            NodeTag::Document
            | NodeTag::Page
            | NodeTag::Layer
            | NodeTag::ScoreDef
            | NodeTag::SystemBreak
            | NodeTag::PageBreak => {}
        }
        VisitResult::Continue
    }

    fn leave(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        match doc[node].tag() {
            NodeTag::Element => self.leave_element(doc, node),
            NodeTag::Measure => self.measure = None,
            NodeTag::Staff => self.staff_hidden = false,
            NodeTag::System => self.system = None,
            NodeTag::Document => {
                for control in std::mem::take(&mut self.deferred) {
                    self.place_anchored(doc, control);
                }
            }
            _ => {}
        }
        VisitResult::Continue
    }
}
