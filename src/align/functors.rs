//! Alignment passes
//!
//! `ResetLayout` clears engine state, `AlignHorizontally` fills every
//! measure's time grid, `CalcAlignmentXPos` turns the grids into x positions
//! and `AlignVertically` stacks the staves of every system.

use num_rational::Ratio;
use num_traits::{CheckedAdd, CheckedMul, CheckedSub};

use super::horizontal::{AlignmentKey, AlignmentType, MeasureAligner, SpacingParams};
use crate::diagnostics::{kind, DiagnosticMark, Diagnostics};
use crate::functor::{Functor, VisitResult};
use crate::layout::metrics::{control_footprint, GlyphMetrics, CONTROL_MARGIN};
use crate::models::bbox::Rect;
use crate::models::capabilities::{onset_advance, staff_location};
use crate::models::control::Placement;
use crate::errors::DurationError;
use crate::models::duration::{zero, Onset, TupletRatio};
use crate::models::elements::LayerElement;
use crate::models::score_def::{Clef, ScoreDef, ScoreDefState};
use crate::tree::{Document, NodeId, NodeKind, NodeTag};

/// Height of a staff with `lines` lines
pub fn staff_height(lines: u8, unit: f64) -> f64 {
    lines.max(1).saturating_sub(1) as f64 * 2.0 * unit
}

/// Vertical position of a staff location, relative to the top line
pub fn loc_to_y(loc: i32, lines: u8, unit: f64) -> f64 {
    ((lines.max(1) as i32 - 1) * 2 - loc) as f64 * unit
}

fn measure_aligner(doc: &mut Document, measure: NodeId) -> Option<&mut MeasureAligner> {
    doc[measure].kind.as_measure_mut().map(|m| &mut m.aligner)
}

/// Clears everything a previous layout left on the nodes
#[derive(Default)]
pub struct ResetLayout;

impl Functor for ResetLayout {
    fn enter(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        let node = &mut doc[node];
        node.layout = Default::default();
        node.bbox = Default::default();
        node.dirty = false;
        match &mut node.kind {
            NodeKind::Measure(measure) => {
                measure.aligner.reset();
                measure.x_rel = 0.0;
            }
            NodeKind::System(system) => {
                system.aligner.reset();
                system.y_rel = 0.0;
                system.score_def_width = 0.0;
                system.measures_width = 0.0;
                system.overflow = false;
            }
            NodeKind::Page(page) => page.content_height = 0.0,
            _ => {}
        }
        VisitResult::Continue
    }
}

/// Chord being visited: its notes share its slot
#[derive(Clone, Copy)]
struct ChordContext {
    node: NodeId,
    onset: Onset,
    /// `None` for a grace chord until its principal note is reached
    key: Option<AlignmentKey>,
}

/// Running state of one layer
struct LayerCursor {
    time: Onset,
    tuplets: Vec<TupletRatio>,
    graces: Vec<NodeId>,
    chord: Option<ChordContext>,
    clef: Clef,
}

impl LayerCursor {
    fn new(clef: Clef) -> Self {
        Self {
            time: zero(),
            tuplets: Vec::new(),
            graces: Vec::new(),
            chord: None,
            clef,
        }
    }

    fn tuplet(&self) -> TupletRatio {
        self.tuplets.last().copied().unwrap_or_default()
    }
}

/// Builds the time grid of every measure
///
/// Onsets are summed per layer. The clef, key and meter in effect are
/// threaded through the walk, so a change in one layer is seen by the layers
/// and measures visited after it.
pub struct AlignHorizontally<'a> {
    metrics: &'a dyn GlyphMetrics,
    unit: f64,
    score_def: ScoreDef,
    state: ScoreDefState,
    diagnostics: &'a mut Diagnostics,
    measure: Option<NodeId>,
    measure_staves: Vec<u32>,
    staff_n: u32,
    staff_lines: u8,
    layer: LayerCursor,
    /// Longest time advance met, used to normalize spacing
    pub longest: Onset,
}

impl<'a> AlignHorizontally<'a> {
    pub fn new(
        doc: &Document,
        metrics: &'a dyn GlyphMetrics,
        unit: f64,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            metrics,
            unit,
            score_def: doc.score_def.clone(),
            state: ScoreDefState::from_score_def(&doc.score_def),
            diagnostics,
            measure: None,
            measure_staves: Vec::new(),
            staff_n: 1,
            staff_lines: 5,
            layer: LayerCursor::new(Clef::default()),
            longest: zero(),
        }
    }

    fn staff_height(&self) -> f64 {
        staff_height(self.staff_lines, self.unit)
    }

    fn y_for_loc(&self, loc: i32) -> f64 {
        loc_to_y(loc, self.staff_lines, self.unit)
    }

    fn middle_loc(&self) -> i32 {
        self.staff_lines.max(1) as i32 - 1
    }

    /// Store onset, advance and footprint on the node
    fn record(&self, doc: &mut Document, node: NodeId, onset: Onset, advance: Onset, y: f64, rect: Option<Rect>) {
        let node = &mut doc[node];
        node.layout.onset = Some(onset);
        node.layout.duration = advance;
        node.layout.staff_n = Some(self.staff_n);
        node.layout.y_rel = y;
        node.bbox.rect = rect;
    }

    /// Attach a recorded node to a slot and register its footprint there
    fn assign(&self, doc: &mut Document, measure: NodeId, node: NodeId, key: AlignmentKey) {
        doc[node].layout.alignment = Some(key);
        let footprint = doc[node]
            .bbox
            .rect
            .map(|rect| rect.translate(0.0, doc[node].layout.y_rel));
        if let (Some(rect), Some(aligner)) = (footprint, measure_aligner(doc, measure)) {
            aligner.add_footprint(&key, self.staff_n, rect);
        }
    }

    fn slot(&self, doc: &mut Document, measure: NodeId, key: AlignmentKey) -> AlignmentKey {
        match measure_aligner(doc, measure) {
            Some(aligner) => aligner.alignment_at(key),
            None => key,
        }
    }

    /// Give pending grace notes their slots before the principal at `onset`,
    /// the farthest one first
    fn flush_graces(&mut self, doc: &mut Document, measure: NodeId, onset: Onset) {
        let graces = std::mem::take(&mut self.layer.graces);
        let count = graces.len();
        for (i, grace) in graces.into_iter().enumerate() {
            let key = self.slot(doc, measure, AlignmentKey::grace(onset, (count - i) as u32));
            self.assign(doc, measure, grace, key);
            for inner in doc.descendants(grace) {
                if doc[inner].tag() == NodeTag::Element {
                    self.assign(doc, measure, inner, key);
                }
            }
        }
    }

    fn invalid_duration(&mut self, doc: &Document, node: NodeId, reason: impl std::fmt::Display) {
        let id = doc[node].id();
        log::warn!("Invalid duration on {}: {}", id, reason);
        self.diagnostics.add(DiagnosticMark::error(
            id,
            kind::INVALID_DURATION,
            format!("{} '{}': {}; no time advance", doc[node].kind.name(), id, reason),
        ));
    }

    /// Move the layer cursor by `advance`; an onset that no longer fits is
    /// reported and the cursor stays put
    fn advance_cursor(&mut self, doc: &mut Document, node: NodeId, advance: Onset) {
        match self.layer.time.checked_add(&advance) {
            Some(time) => {
                self.layer.time = time;
                if advance > self.longest {
                    self.longest = advance;
                }
            }
            None => {
                self.invalid_duration(doc, node, DurationError::Overflow);
                doc[node].layout.duration = zero();
            }
        }
    }

    fn grace_rect(&self, rect: Option<Rect>) -> Option<Rect> {
        let scale = self.metrics.grace_scale();
        rect.map(|r| Rect::new(r.x1 * scale, r.y1 * scale, r.x2 * scale, r.y2 * scale))
    }

    fn enter_measure(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        self.measure = Some(node);
        self.measure_staves.clear();
        let start_state = self.state.clone();
        if let Some(measure) = doc[node].kind.as_measure_mut() {
            measure.aligner.reset();
            measure.aligner.begin();
            measure.start_state = start_state;
        }
        VisitResult::Continue
    }

    fn enter_staff(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        let n = match &doc[node].kind {
            NodeKind::Staff(staff) => staff.n,
            _ => return VisitResult::Continue,
        };
        self.staff_n = n;
        self.staff_lines = self.score_def.staff_def(n).map(|def| def.lines).unwrap_or(5);
        if !self.measure_staves.contains(&n) {
            self.measure_staves.push(n);
        }
        doc[node].layout.staff_n = Some(n);
        VisitResult::Continue
    }

    fn enter_layer(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        self.layer = LayerCursor::new(self.state.clef(self.staff_n));
        doc[node].layout.staff_n = Some(self.staff_n);
        VisitResult::Continue
    }

    fn leave_layer(&mut self, doc: &mut Document) -> VisitResult {
        let Some(measure) = self.measure else {
            return VisitResult::Continue;
        };
        let end = self.layer.time;
        // Trailing grace notes lean on the end of the layer
        if !self.layer.graces.is_empty() {
            self.flush_graces(doc, measure, end);
        }
        if let Some(aligner) = measure_aligner(doc, measure) {
            aligner.set_max_time(end);
        }
        VisitResult::Continue
    }

    fn enter_element(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        let Some(measure) = self.measure else {
            return VisitResult::SkipChildren;
        };
        let Some(element) = doc[node].kind.as_element().cloned() else {
            return VisitResult::Continue;
        };
        let onset = self.layer.time;
        let rect = self
            .metrics
            .element_box(&element, self.unit, self.staff_height());

        // Notes of a chord share its slot
        if let (Some(chord), LayerElement::Note(note)) = (self.layer.chord, &element) {
            if doc.parent(node) == Some(chord.node) {
                let y = self.y_for_loc(staff_location(note, &self.layer.clef));
                let rect = if doc[chord.node].kind.as_element().map(|c| c.is_grace()).unwrap_or(false) {
                    self.grace_rect(rect)
                } else {
                    rect
                };
                self.record(doc, node, chord.onset, zero(), y, rect);
                if let Some(key) = chord.key {
                    self.assign(doc, measure, node, key);
                }
                return VisitResult::Continue;
            }
        }

        match &element {
            LayerElement::Note(_) | LayerElement::Rest(_) | LayerElement::Chord(_) | LayerElement::Space(_) => {
                let advance = match element.as_duration() {
                    Some(duration) => match onset_advance(duration, self.layer.tuplet()) {
                        Ok(advance) => advance,
                        Err(err) => {
                            self.invalid_duration(doc, node, err);
                            zero()
                        }
                    },
                    None => zero(),
                };
                let y = match &element {
                    LayerElement::Note(note) => self.y_for_loc(staff_location(note, &self.layer.clef)),
                    LayerElement::Rest(rest) => {
                        self.y_for_loc(rest.loc.unwrap_or_else(|| self.middle_loc()))
                    }
                    _ => 0.0,
                };
                let grace = element.is_grace();
                let rect = if grace { self.grace_rect(rect) } else { rect };
                self.record(doc, node, onset, advance, y, rect);

                let key = if grace {
                    self.layer.graces.push(node);
                    None
                } else {
                    let key = self.slot(doc, measure, AlignmentKey::new(onset, AlignmentType::Default));
                    self.flush_graces(doc, measure, onset);
                    self.assign(doc, measure, node, key);
                    Some(key)
                };
                if matches!(element, LayerElement::Chord(_)) {
                    self.layer.chord = Some(ChordContext { node, onset, key });
                }
                self.advance_cursor(doc, node, advance);
            }
            LayerElement::MRest(_) | LayerElement::MultiRest(_) => {
                let advance = self.state.meter.measure_duration();
                let loc = element
                    .as_position()
                    .and_then(|p| p.staff_loc())
                    .unwrap_or_else(|| self.middle_loc() + 2);
                let y = self.y_for_loc(loc);
                self.record(doc, node, onset, advance, y, rect);
                let key = self.slot(doc, measure, AlignmentKey::new(onset, AlignmentType::FullMeasure));
                self.assign(doc, measure, node, key);
                self.advance_cursor(doc, node, advance);
            }
            LayerElement::Clef(change) => {
                self.layer.clef = change.clef;
                self.state.set_clef(self.staff_n, change.clef);
                self.record(doc, node, onset, zero(), 0.0, rect);
                let key = self.slot(doc, measure, AlignmentKey::new(onset, AlignmentType::Clef));
                self.assign(doc, measure, node, key);
            }
            LayerElement::KeySig(change) => {
                self.state.apply(change);
                self.record(doc, node, onset, zero(), 0.0, rect);
                let key = self.slot(doc, measure, AlignmentKey::new(onset, AlignmentType::KeySig));
                self.assign(doc, measure, node, key);
            }
            LayerElement::MeterSig(change) => {
                self.state.apply(change);
                self.record(doc, node, onset, zero(), 0.0, rect);
                let key = self.slot(doc, measure, AlignmentKey::new(onset, AlignmentType::MeterSig));
                self.assign(doc, measure, node, key);
            }
            LayerElement::BarLine(_) => {
                self.record(doc, node, onset, zero(), 0.0, rect);
                let key = self.slot(doc, measure, AlignmentKey::new(onset, AlignmentType::BarLine));
                self.assign(doc, measure, node, key);
            }
            LayerElement::Tuplet(tuplet) => {
                let ratio = if tuplet.num == 0 || tuplet.numbase == 0 {
                    self.invalid_duration(doc, node, format!("tuplet ratio {}:{}", tuplet.num, tuplet.numbase));
                    self.layer.tuplet()
                } else {
                    let current = self.layer.tuplet();
                    match current.combine(tuplet.num as i64, tuplet.numbase as i64) {
                        Ok(ratio) => ratio,
                        Err(err) => {
                            self.invalid_duration(doc, node, err);
                            current
                        }
                    }
                };
                self.layer.tuplets.push(ratio);
                self.record(doc, node, onset, zero(), 0.0, None);
            }
            LayerElement::Beam(_) => {
                self.record(doc, node, onset, zero(), 0.0, None);
            }
        }
        VisitResult::Continue
    }

    fn leave_element(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        match doc[node].kind.as_element() {
            Some(LayerElement::Chord(_)) => {
                if self.layer.chord.map(|c| c.node) == Some(node) {
                    self.layer.chord = None;
                }
            }
            Some(LayerElement::Tuplet(_)) => {
                self.layer.tuplets.pop();
            }
            _ => {}
        }
        // Containers span their content
        if doc[node].kind.as_element().map(|e| e.is_container()).unwrap_or(false) {
            let start = doc[node].layout.onset.unwrap_or_else(zero);
            if self.layer.time > start && doc[node].layout.duration == zero() {
                doc[node].layout.duration = self.layer.time.checked_sub(&start).unwrap_or_else(zero);
            }
        }
        VisitResult::Continue
    }

    fn leave_measure(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        let measure_end = match measure_aligner(doc, node) {
            Some(aligner) => aligner.max_time(),
            None => return VisitResult::Continue,
        };

        // Time-stamped control events
        let beat = self.state.meter.beat_duration();
        for child in doc.children(node).to_vec() {
            let tstamp = {
                let child_node = &doc[child];
                if child_node.layout.omitted || child_node.layout.start_anchor.is_some() {
                    continue;
                }
                match child_node.kind.as_control().and_then(|c| c.as_time_point().tstamp()) {
                    Some(tstamp) => tstamp,
                    None => continue,
                }
            };
            let staff_n = doc[child]
                .kind
                .as_control()
                .and_then(|c| c.as_time_point().staff_n())
                .or_else(|| self.measure_staves.first().copied())
                .unwrap_or(1);
            let beats = Ratio::new(((tstamp - 1.0) * 1024.0).round() as i64, 1024);
            let mut onset = beats.checked_mul(&beat).unwrap_or(beats);
            if onset < zero() || onset > measure_end {
                let id = doc[child].id().to_string();
                log::warn!("Time-stamp {} of {} is outside its measure", tstamp, id);
                self.diagnostics.add(DiagnosticMark::warning(
                    &id,
                    kind::UNRESOLVED_TSTAMP,
                    format!("time-stamp {} of '{}' is outside its measure", tstamp, id),
                ));
                onset = if onset < zero() { zero() } else { measure_end };
            }
            let key = match measure_aligner(doc, node) {
                Some(aligner) => aligner.timestamp_alignment_at(onset),
                None => continue,
            };
            let layout = &mut doc[child].layout;
            layout.alignment = Some(key);
            layout.onset = Some(onset);
            layout.staff_n = Some(staff_n);
        }

        // Barlines of every staff the measure holds
        let (left, right) = match doc[node].kind.as_measure() {
            Some(measure) => (measure.left_barline, measure.right_barline),
            None => return VisitResult::Continue,
        };
        let boxes: Vec<(u32, Option<Rect>, Option<Rect>)> = self
            .measure_staves
            .iter()
            .map(|&n| {
                let lines = self.score_def.staff_def(n).map(|def| def.lines).unwrap_or(5);
                let height = staff_height(lines, self.unit);
                (
                    n,
                    left.and_then(|form| self.metrics.barline_box(form, self.unit, height)),
                    self.metrics.barline_box(right, self.unit, height),
                )
            })
            .collect();
        if let Some(aligner) = measure_aligner(doc, node) {
            aligner.finish();
            let left_key = AlignmentKey::new(zero(), AlignmentType::MeasureLeftBarline);
            let right_key = AlignmentKey::new(measure_end, AlignmentType::MeasureRightBarline);
            for (n, left_box, right_box) in boxes {
                if let Some(rect) = left_box {
                    aligner.add_footprint(&left_key, n, rect);
                }
                if let Some(rect) = right_box {
                    aligner.add_footprint(&right_key, n, rect);
                }
            }
        }
        self.measure = None;
        VisitResult::Continue
    }
}

impl Functor for AlignHorizontally<'_> {
    fn enter(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        match doc[node].tag() {
            NodeTag::Document | NodeTag::Page | NodeTag::System => VisitResult::Continue,
            NodeTag::SystemBreak | NodeTag::PageBreak => VisitResult::Continue,
            NodeTag::ScoreDef => {
                if let NodeKind::ScoreDef(change) = &doc[node].kind {
                    self.state.apply_change(change);
                }
                VisitResult::Continue
            }
            NodeTag::Measure => self.enter_measure(doc, node),
            NodeTag::Staff => self.enter_staff(doc, node),
            NodeTag::Layer => self.enter_layer(doc, node),
            NodeTag::Element => self.enter_element(doc, node),
            // Time-stamped events are aligned once the measure is complete
            NodeTag::Control => VisitResult::SkipChildren,
        }
    }

    fn leave(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        match doc[node].tag() {
            NodeTag::Measure => self.leave_measure(doc, node),
            NodeTag::Layer => self.leave_layer(doc),
            NodeTag::Element => self.leave_element(doc, node),
            NodeTag::Document
            | NodeTag::Page
            | NodeTag::System
            | NodeTag::Staff
            | NodeTag::Control
            | NodeTag::ScoreDef
            | NodeTag::SystemBreak
            | NodeTag::PageBreak => VisitResult::Continue,
        }
    }
}

/// Computes the ideal x position of every alignment
pub struct CalcAlignmentXPos {
    pub params: SpacingParams,
}

impl Functor for CalcAlignmentXPos {
    fn enter(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        match doc[node].kind.as_measure_mut() {
            Some(measure) => {
                measure.aligner.set_alignment_x_pos(&self.params);
                VisitResult::SkipChildren
            }
            None => VisitResult::Continue,
        }
    }
}

/// Stacks the staves of every system
///
/// A staff is hidden in a system when its definition hides it or when every
/// staff of that number in the system's measures is hidden. Control elements
/// widen the extent of the staff they are placed against, above or below.
pub struct AlignVertically<'a> {
    metrics: &'a dyn GlyphMetrics,
    unit: f64,
    spacing_staff: f64,
    score_def: ScoreDef,
    system: Option<NodeId>,
    /// Staves met in the current system, with whether one of them is shown
    shown: Vec<(u32, bool)>,
}

impl<'a> AlignVertically<'a> {
    pub fn new(doc: &Document, metrics: &'a dyn GlyphMetrics, unit: f64, spacing_staff: f64) -> Self {
        Self {
            metrics,
            unit,
            spacing_staff,
            score_def: doc.score_def.clone(),
            system: None,
            shown: Vec::new(),
        }
    }

    fn lines(&self, staff_n: u32) -> u8 {
        self.score_def.staff_def(staff_n).map(|def| def.lines).unwrap_or(5)
    }

    fn enter_system(&mut self, doc: &mut Document, node: NodeId) {
        self.system = Some(node);
        self.shown.clear();
        let unit = self.unit;
        if let Some(system) = doc[node].kind.as_system_mut() {
            system.aligner.reset();
            for def in &self.score_def.staff_defs {
                system
                    .aligner
                    .ensure(def.n, staff_height(def.lines, unit), def.hidden);
            }
        }
    }

    fn enter_staff(&mut self, doc: &mut Document, node: NodeId) {
        let (Some(system), NodeKind::Staff(staff)) = (self.system, &doc[node].kind) else {
            return;
        };
        let (n, hidden) = (staff.n, staff.hidden);
        match self.shown.iter_mut().find(|(staff_n, _)| *staff_n == n) {
            Some(entry) => entry.1 |= !hidden,
            None => self.shown.push((n, !hidden)),
        }
        let height = staff_height(self.lines(n), self.unit);
        if let Some(system) = doc[system].kind.as_system_mut() {
            system.aligner.ensure(n, height, false);
        }
    }

    fn enter_element(&mut self, doc: &mut Document, node: NodeId) {
        let Some(system) = self.system else {
            return;
        };
        let element = &doc[node];
        let (Some(rect), Some(staff_n)) = (element.bbox.rect, element.layout.staff_n) else {
            return;
        };
        let y = element.layout.y_rel;
        if let Some(staff) = doc[system]
            .kind
            .as_system_mut()
            .and_then(|s| s.aligner.get_mut(staff_n))
        {
            staff.add_extent(y + rect.y1, y + rect.y2);
        }
    }

    /// Reserve the room a control element takes next to its staff
    fn enter_control(&mut self, doc: &mut Document, node: NodeId) {
        let Some(system) = self.system else {
            return;
        };
        let target = &doc[node];
        if target.layout.omitted {
            return;
        }
        let Some(control) = target.kind.as_control() else {
            return;
        };
        let anchors: Vec<NodeId> = [target.layout.start_anchor, target.layout.end_anchor]
            .into_iter()
            .flatten()
            .collect();
        let staff_n = match anchors.first() {
            Some(&start) => doc[start].layout.staff_n,
            None if target.layout.alignment.is_some() => target.layout.staff_n,
            None => None,
        };
        let Some(staff_n) = staff_n else {
            return;
        };
        let Some(staff_height) = doc[system]
            .kind
            .as_system()
            .and_then(|s| s.aligner.get(staff_n))
            .map(|staff| staff.staff_height)
        else {
            return;
        };

        // Anchored elements clear their anchors as well as the staff lines
        let (mut top, mut bottom) = (0.0_f64, staff_height);
        for anchor in anchors {
            let anchor = &doc[anchor];
            if let (Some(rect), Some(n)) = (anchor.bbox.rect, anchor.layout.staff_n) {
                if n == staff_n {
                    top = top.min(anchor.layout.y_rel + rect.y1);
                    bottom = bottom.max(anchor.layout.y_rel + rect.y2);
                }
            }
        }
        let room = control_footprint(self.metrics, control, 0.0, self.unit).height()
            + CONTROL_MARGIN * self.unit;
        let (from, to) = match control.placement() {
            Placement::Above => (top - room, top),
            Placement::Below => (bottom, bottom + room),
        };
        if let Some(staff) = doc[system]
            .kind
            .as_system_mut()
            .and_then(|s| s.aligner.get_mut(staff_n))
        {
            staff.add_extent(from, to);
        }
    }

    fn leave_system(&mut self, doc: &mut Document, node: NodeId) {
        let spacing = self.spacing_staff * self.unit;
        let shown = std::mem::take(&mut self.shown);
        if let Some(system) = doc[node].kind.as_system_mut() {
            for (n, visible) in shown {
                if let Some(staff) = system.aligner.get_mut(n) {
                    staff.hidden |= !visible;
                }
            }
            system.aligner.set_alignment_y_pos(spacing);
        }
        self.system = None;
    }
}

impl Functor for AlignVertically<'_> {
    fn enter(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        match doc[node].tag() {
            NodeTag::System => self.enter_system(doc, node),
            NodeTag::Staff => self.enter_staff(doc, node),
            NodeTag::Element => self.enter_element(doc, node),
            NodeTag::Control => {
                self.enter_control(doc, node);
                return VisitResult::SkipChildren;
            }
            _ => {}
        }
        VisitResult::Continue
    }

    fn leave(&mut self, doc: &mut Document, node: NodeId) -> VisitResult {
        if doc[node].tag() == NodeTag::System {
            self.leave_system(doc, node);
        }
        VisitResult::Continue
    }
}
