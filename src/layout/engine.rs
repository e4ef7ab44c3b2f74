//! Layout engine: the ordered pass sequence
//!
//! `layout` runs every pass in order. The passes are also public so a host
//! can stop early (e.g. after horizontal alignment, for timing export) or
//! rerun part of the sequence; each one asserts its prerequisite.

use serde::{Deserialize, Serialize};

use super::display_list::DisplayList;
use super::finalize::FinalizePositions;
use super::metrics::{DefaultMetrics, GlyphMetrics};
use super::options::LayoutOptions;
use super::{require_stage, LayoutStage};
use crate::align::functors::{AlignHorizontally, AlignVertically, CalcAlignmentXPos, ResetLayout};
use crate::castoff;
use crate::diagnostics::anchors::analyze_anchors;
use crate::diagnostics::Diagnostics;
use crate::errors::EngraverError;
use crate::functor::process;
use crate::justify;
use crate::models::duration::{zero, Onset};
use crate::tree::{Document, NodeTag};

/// Outcome of a full layout run
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LayoutResult {
    pub diagnostics: Diagnostics,
    pub page_count: usize,
    pub system_count: usize,
}

pub struct LayoutEngine {
    options: LayoutOptions,
    metrics: Box<dyn GlyphMetrics>,
}

impl LayoutEngine {
    /// Create an engine; options are clamped to their valid ranges
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options: options.normalized(),
            metrics: Box::new(DefaultMetrics),
        }
    }

    /// Create an engine from options given as JSON
    pub fn from_json(json: &str) -> Result<Self, EngraverError> {
        let options = LayoutOptions::from_json(json)?;
        log::debug!("Layout options read: {:?}", options.breaks);
        Ok(Self::new(options))
    }

    /// Use another source of glyph footprints
    pub fn with_metrics(mut self, metrics: impl GlyphMetrics + 'static) -> Self {
        self.metrics = Box::new(metrics);
        self
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Run the whole pass sequence
    ///
    /// Input problems never abort the layout; they are collected in the
    /// returned diagnostics next to the best-effort result.
    pub fn layout(&self, doc: &mut Document) -> LayoutResult {
        let mut diagnostics = Diagnostics::new();
        self.prepare(doc, &mut diagnostics);
        self.align_horizontally(doc, &mut diagnostics);
        self.calc_alignment_x_pos(doc);
        self.cast_off_systems(doc, &mut diagnostics);
        self.align_vertically(doc);
        self.cast_off_pages(doc, &mut diagnostics);
        self.justify_x(doc);
        self.justify_y(doc);
        self.finalize(doc);

        let result = LayoutResult {
            page_count: doc.page_count(),
            system_count: doc.system_count(),
            diagnostics,
        };
        log::info!(
            "Layout done: {} pages, {} systems, {} diagnostics",
            result.page_count,
            result.system_count,
            result.diagnostics.len()
        );
        result
    }

    /// Discard engine-owned state and resolve control-element anchors
    pub fn prepare(&self, doc: &mut Document, diagnostics: &mut Diagnostics) {
        castoff::uncast_off(doc);
        let root = doc.root();
        process(doc, root, &mut ResetLayout);
        let marks = analyze_anchors(doc);
        log::debug!("Prepare: {} control elements omitted", marks.len());
        diagnostics.extend(marks);
        doc.stage = LayoutStage::Prepared;
    }

    /// Build the time grid of every measure
    pub fn align_horizontally(&self, doc: &mut Document, diagnostics: &mut Diagnostics) {
        require_stage(doc.stage, LayoutStage::Prepared, "horizontal alignment");
        let unit = self.options.scaled_unit();
        let mut functor = AlignHorizontally::new(doc, self.metrics.as_ref(), unit, diagnostics);
        let root = doc.root();
        process(doc, root, &mut functor);
        log::debug!("Horizontal alignment: longest advance {}", functor.longest);
        doc.stage = LayoutStage::Aligned;
    }

    /// Turn the time grids into ideal x positions
    pub fn calc_alignment_x_pos(&self, doc: &mut Document) {
        require_stage(doc.stage, LayoutStage::Aligned, "x positioning");
        let params = self.options.spacing_params(longest_duration(doc));
        let root = doc.root();
        process(doc, root, &mut CalcAlignmentXPos { params });
        doc.stage = LayoutStage::Spaced;
    }

    pub fn cast_off_systems(&self, doc: &mut Document, diagnostics: &mut Diagnostics) {
        castoff::cast_off_systems(doc, &self.options, self.metrics.as_ref(), diagnostics);
    }

    /// Stack the staves of every system
    pub fn align_vertically(&self, doc: &mut Document) {
        require_stage(doc.stage, LayoutStage::CastOff, "vertical alignment");
        let mut functor = AlignVertically::new(
            doc,
            self.metrics.as_ref(),
            self.options.scaled_unit(),
            self.options.spacing_staff,
        );
        let root = doc.root();
        process(doc, root, &mut functor);
        doc.stage = LayoutStage::Stacked;
    }

    pub fn cast_off_pages(&self, doc: &mut Document, diagnostics: &mut Diagnostics) {
        castoff::cast_off_pages(doc, &self.options, diagnostics);
    }

    pub fn justify_x(&self, doc: &mut Document) {
        justify::justify_x(doc, &self.options);
    }

    pub fn justify_y(&self, doc: &mut Document) {
        justify::justify_y(doc, &self.options);
    }

    /// Compute absolute positions and bounding boxes
    pub fn finalize(&self, doc: &mut Document) {
        require_stage(doc.stage, LayoutStage::Justified, "finalize");
        let mut functor = FinalizePositions::new(&self.options, self.metrics.as_ref());
        let root = doc.root();
        process(doc, root, &mut functor);
        doc.stage = LayoutStage::Finalized;
    }

    /// Snapshot of the laid-out document for exporters
    pub fn display_list(&self, doc: &Document) -> DisplayList {
        DisplayList::from_document(doc, &self.options)
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutOptions::default())
    }
}

/// Longest time advance of any timed element
fn longest_duration(doc: &Document) -> Onset {
    doc.nodes_of_kind(NodeTag::Element)
        .into_iter()
        .filter(|&id| {
            doc[id]
                .kind
                .as_element()
                .map(|e| !e.is_container() || e.as_duration().is_some())
                .unwrap_or(false)
        })
        .map(|id| doc[id].layout.duration)
        .fold(zero(), |a, b| if b > a { b } else { a })
}
