//! Display List for Rendering
//!
//! This module defines the output handed from the layout engine to
//! exporters. The DisplayList carries every final position and bounding box,
//! so a renderer can draw pages without any layout computation of its own.

use serde::{Deserialize, Serialize};

use super::options::LayoutOptions;
use super::{require_stage, LayoutStage};
use crate::functor::{process_const, ConstFunctor, VisitResult};
use crate::models::bbox::Rect;
use crate::tree::{Document, NodeId, NodeKind};

/// Top-level display list: one entry per page
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct DisplayList {
    pub pages: Vec<RenderPage>,
}

/// A page with its systems
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RenderPage {
    /// Page index for identification
    pub page_index: usize,
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub systems: Vec<RenderSystem>,
}

/// A system with its staves, measures and control elements
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RenderSystem {
    /// System index over the whole document
    pub system_index: usize,
    pub id: String,
    pub bounds: Rect,
    /// Width of the clef/key/meter block the system starts with
    pub score_def_width: f64,
    pub staves: Vec<RenderStaff>,
    pub measures: Vec<RenderMeasure>,
    /// Slurs, ties, hairpins and text directives
    #[serde(default)]
    pub controls: Vec<RenderControl>,
}

/// Vertical slot of one staff
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RenderStaff {
    pub n: u32,
    /// Top line, in page coordinates
    pub y: f64,
    pub height: f64,
    pub hidden: bool,
}

/// A measure with its elements
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RenderMeasure {
    pub id: String,
    pub n: u32,
    pub bounds: Rect,
    pub elements: Vec<RenderElement>,
}

/// A positioned layer element
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RenderElement {
    pub id: String,
    /// Element name ("note", "rest", "chord" ...)
    pub kind: String,
    pub staff: Option<u32>,
    /// Anchor in page coordinates
    pub x: f64,
    pub y: f64,
    /// Absolute footprint; `None` for elements drawing nothing
    pub bounds: Option<Rect>,
}

/// A positioned control element
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RenderControl {
    pub id: String,
    pub kind: String,
    pub staff: Option<u32>,
    pub bounds: Rect,
}

impl DisplayList {
    /// Snapshot a finalized document
    pub fn from_document(doc: &Document, options: &LayoutOptions) -> Self {
        require_stage(doc.stage(), LayoutStage::Finalized, "display list");
        let mut builder = DisplayListBuilder {
            list: DisplayList::default(),
            page_width: options.page_width,
            page_height: options.page_height,
            system_count: 0,
        };
        process_const(doc, doc.root(), &mut builder);
        builder.list
    }

    /// Every element of every page, in document order
    pub fn elements(&self) -> impl Iterator<Item = &RenderElement> {
        self.pages
            .iter()
            .flat_map(|page| &page.systems)
            .flat_map(|system| &system.measures)
            .flat_map(|measure| &measure.elements)
    }

    pub fn element(&self, id: &str) -> Option<&RenderElement> {
        self.elements().find(|element| element.id == id)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

struct DisplayListBuilder {
    list: DisplayList,
    page_width: f64,
    page_height: f64,
    system_count: usize,
}

impl DisplayListBuilder {
    fn current_system(&mut self) -> Option<&mut RenderSystem> {
        self.list.pages.last_mut().and_then(|page| page.systems.last_mut())
    }

    fn add_system(&mut self, doc: &Document, node: NodeId) {
        let NodeKind::System(system) = &doc[node].kind else {
            return;
        };
        let origin = doc[node].bbox;
        let staves = system
            .aligner
            .staves()
            .iter()
            .map(|staff| RenderStaff {
                n: staff.staff_n,
                y: origin.y + staff.y_rel,
                height: staff.staff_height,
                hidden: staff.hidden,
            })
            .collect();
        let render = RenderSystem {
            system_index: self.system_count,
            id: doc[node].id().to_string(),
            bounds: origin.bounds(),
            score_def_width: system.score_def_width,
            staves,
            measures: Vec::new(),
            controls: Vec::new(),
        };
        self.system_count += 1;
        if let Some(page) = self.list.pages.last_mut() {
            page.systems.push(render);
        }
    }
}

impl ConstFunctor for DisplayListBuilder {
    fn enter(&mut self, doc: &Document, node: NodeId) -> VisitResult {
        let current = &doc[node];
        match &current.kind {
            NodeKind::Page(_) => {
                let page_index = self.list.pages.len();
                self.list.pages.push(RenderPage {
                    page_index,
                    id: current.id().to_string(),
                    width: self.page_width,
                    height: self.page_height,
                    systems: Vec::new(),
                });
            }
            NodeKind::System(_) => self.add_system(doc, node),
            NodeKind::Measure(measure) => {
                let render = RenderMeasure {
                    id: current.id().to_string(),
                    n: measure.n,
                    bounds: current.bbox.bounds(),
                    elements: Vec::new(),
                };
                if let Some(system) = self.current_system() {
                    system.measures.push(render);
                }
            }
            NodeKind::Element(element) => {
                let render = RenderElement {
                    id: current.id().to_string(),
                    kind: element.name().to_string(),
                    staff: current.layout.staff_n,
                    x: current.bbox.x,
                    y: current.bbox.y,
                    bounds: current.bbox.has_content().then(|| current.bbox.bounds()),
                };
                if let Some(measure) = self.current_system().and_then(|s| s.measures.last_mut()) {
                    measure.elements.push(render);
                }
            }
            NodeKind::Control(control) => {
                if !current.layout.omitted && current.bbox.has_content() {
                    let render = RenderControl {
                        id: current.id().to_string(),
                        kind: control.name().to_string(),
                        staff: current.layout.staff_n,
                        bounds: current.bbox.bounds(),
                    };
                    if let Some(system) = self.current_system() {
                        system.controls.push(render);
                    }
                }
                return VisitResult::SkipChildren;
            }
            NodeKind::Document
            | NodeKind::Staff(_)
            | NodeKind::Layer(_)
            | NodeKind::ScoreDef(_)
            | NodeKind::SystemBreak
            | NodeKind::PageBreak => {}
        }
        VisitResult::Continue
    }
}
