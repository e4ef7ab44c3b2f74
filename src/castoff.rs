//! Cast-off
//!
//! Importers hand over one unbroken content system. Cast-off slices it into
//! systems by width with a single greedy left-to-right pass, then stacks the
//! systems into pages by height. `uncast_off` undoes both, so layout can be
//! run again on the same tree.

use crate::diagnostics::{kind, DiagnosticMark, Diagnostics};
use crate::layout::metrics::GlyphMetrics;
use crate::layout::options::{BreakMode, LayoutOptions};
use crate::layout::{require_stage, LayoutStage};
use crate::models::score_def::ScoreDefState;
use crate::tree::{
    Document, NodeId, NodeKind, NodeTag, Page, System, CONTENT_PAGE_ID, CONTENT_SYSTEM_ID,
};

/// Tolerance for width comparisons
const EPSILON: f64 = 1e-6;

/// Collapse pages and systems back into the single content system
///
/// Measures, breaks and control elements keep their identity and order.
pub fn uncast_off(doc: &mut Document) {
    let pages = doc.pages();
    let systems = doc.systems();
    let already_content = systems.len() == 1
        && pages.len() == 1
        && doc[systems[0]].id() == CONTENT_SYSTEM_ID
        && doc[pages[0]].id() == CONTENT_PAGE_ID;
    if already_content {
        return;
    }

    let content: Vec<NodeId> = systems
        .iter()
        .flat_map(|&system| doc.children(system).to_vec())
        .collect();
    for system in systems {
        doc.destroy(system);
    }
    for page in pages {
        doc.destroy(page);
    }
    let target = doc.content_system();
    for node in content {
        doc.reparent(node, target);
    }
    log::debug!("Un-cast-off: {} nodes back in the content system", doc.children(target).len());
}

/// Width of the clef/key/meter block opening a system
pub fn score_def_width(
    doc: &Document,
    state: &ScoreDefState,
    with_meter: bool,
    metrics: &dyn GlyphMetrics,
    unit: f64,
) -> f64 {
    let clef = doc
        .score_def
        .staff_defs
        .iter()
        .filter(|def| !def.hidden)
        .map(|def| metrics.clef_width(&state.clef(def.n), unit))
        .fold(None, |acc: Option<f64>, w| Some(acc.map_or(w, |a| a.max(w))))
        .unwrap_or_else(|| metrics.clef_width(&state.clef(1), unit));
    let mut width = unit + clef + unit;
    let key = metrics.key_sig_width(&state.key, unit);
    if key > 0.0 {
        width += key + unit;
    }
    if with_meter {
        width += metrics.meter_sig_width(&state.meter, unit) + unit;
    }
    width
}

/// Measures (and what travels with them) planned for one system
#[derive(Default)]
struct SystemPlan {
    nodes: Vec<NodeId>,
    measures: Vec<NodeId>,
    measures_width: f64,
    score_def_width: f64,
    /// Started by an encoded break rather than by the width
    forced: bool,
}

impl SystemPlan {
    fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }
}

/// Distribute the measures of the content system over systems
pub fn cast_off_systems(
    doc: &mut Document,
    options: &LayoutOptions,
    metrics: &dyn GlyphMetrics,
    diagnostics: &mut Diagnostics,
) {
    require_stage(doc.stage, LayoutStage::Spaced, "system cast-off");
    uncast_off(doc);

    let unit = options.scaled_unit();
    let available = options.content_width();
    let mode = options.breaks;
    let by_width = matches!(mode, BreakMode::Auto | BreakMode::Line | BreakMode::Smart);

    let content = doc.content_system();
    let children = doc.children(content).to_vec();

    let mut plans: Vec<SystemPlan> = Vec::new();
    let mut current = SystemPlan::default();
    let mut pending: Vec<NodeId> = Vec::new();
    let mut force_break = false;

    for child in children {
        match doc[child].tag() {
            NodeTag::Measure => {
                let (width, state) = match doc[child].kind.as_measure() {
                    Some(measure) => (measure.width(), measure.start_state.clone()),
                    None => continue,
                };
                if !current.is_empty() {
                    let fits = current.measures_width + width
                        <= available - current.score_def_width + EPSILON;
                    if force_break || (by_width && !fits) {
                        plans.push(std::mem::take(&mut current));
                        current.forced = force_break;
                    }
                }
                if current.is_empty() {
                    current.score_def_width =
                        score_def_width(doc, &state, plans.is_empty(), metrics, unit);
                }
                current.nodes.append(&mut pending);
                current.nodes.push(child);
                current.measures.push(child);
                current.measures_width += width;
                force_break = false;
            }
            NodeTag::SystemBreak => {
                force_break = match mode {
                    BreakMode::None => false,
                    BreakMode::Smart => {
                        current.score_def_width + current.measures_width
                            >= options.breaks_smart_sb * available
                    }
                    BreakMode::Auto | BreakMode::Line | BreakMode::Encoded => true,
                };
                pending.push(child);
            }
            NodeTag::PageBreak => {
                if mode != BreakMode::None {
                    force_break = true;
                }
                pending.push(child);
            }
            _ => pending.push(child),
        }
    }
    current.nodes.append(&mut pending);
    if !current.nodes.is_empty() || plans.is_empty() {
        plans.push(current);
    }

    // A lone last measure joins the previous system
    if options.breaks_no_widow && by_width && plans.len() > 1 {
        let widowed = plans
            .last()
            .map(|last| last.measures.len() == 1 && !last.forced)
            .unwrap_or(false);
        if widowed {
            if let (Some(last), Some(previous)) = (plans.pop(), plans.last_mut()) {
                log::debug!("Cast-off: pulling the last measure back to avoid a widow");
                previous.nodes.extend(last.nodes);
                previous.measures.extend(last.measures);
                previous.measures_width += last.measures_width;
            }
        }
    }

    let page = doc
        .parent(content)
        .unwrap_or_else(|| doc.root());
    let mut count = 0;
    for (k, plan) in plans.into_iter().enumerate() {
        if plan.nodes.is_empty() {
            continue;
        }
        let overflow = plan.measures.len() == 1
            && plan.measures_width > available - plan.score_def_width + EPSILON;
        if overflow {
            let id = doc[plan.measures[0]].id().to_string();
            log::warn!(
                "Measure {} is wider than the system ({:.1} > {:.1})",
                id,
                plan.measures_width,
                available - plan.score_def_width
            );
            diagnostics.add(DiagnosticMark::warning(
                &id,
                kind::MEASURE_OVERFLOW,
                format!("measure '{}' does not fit the page width and overflows its system", id),
            ));
        }
        let system = System {
            score_def_width: plan.score_def_width,
            measures_width: plan.measures_width,
            overflow,
            ..System::default()
        };
        let system = doc.insert_engine_node(page, &format!("system-{}", k + 1), NodeKind::System(system));
        let mut x = 0.0;
        for node in plan.nodes {
            doc.reparent(node, system);
            if let Some(measure) = doc[node].kind.as_measure_mut() {
                measure.x_rel = x;
                x += measure.width();
            }
        }
        count += 1;
    }
    doc.destroy(content);
    doc.stage = LayoutStage::CastOff;
    log::debug!("Layout: {} systems", count);
}

/// Whether an encoded page break opens this system
fn starts_with_page_break(doc: &Document, system: NodeId) -> bool {
    doc.children(system)
        .iter()
        .take_while(|&&child| doc[child].tag() != NodeTag::Measure)
        .any(|&child| doc[child].tag() == NodeTag::PageBreak)
}

/// Distribute the systems over pages
pub fn cast_off_pages(doc: &mut Document, options: &LayoutOptions, diagnostics: &mut Diagnostics) {
    require_stage(doc.stage, LayoutStage::Stacked, "page cast-off");

    let Some(content_page) = doc.find_by_id(CONTENT_PAGE_ID).filter(|&p| doc.is_live(p)) else {
        log::debug!("Page cast-off: nothing to do");
        doc.stage = LayoutStage::Paginated;
        return;
    };
    let unit = options.scaled_unit();
    let available = options.content_height();
    let spacing = options.spacing_system * unit;
    let single_page = matches!(options.breaks, BreakMode::None | BreakMode::Line);
    let encoded_only = options.breaks == BreakMode::Encoded;

    let mut pages: Vec<(Vec<NodeId>, f64)> = Vec::new();
    let mut current: Vec<NodeId> = Vec::new();
    let mut y = 0.0;

    for system in doc.children(content_page).to_vec() {
        let height = doc[system]
            .kind
            .as_system()
            .map(|s| s.aligner.height())
            .unwrap_or(0.0);
        if height > available + EPSILON {
            let id = doc[system].id().to_string();
            log::warn!("System {} is taller than the page ({:.1} > {:.1})", id, height, available);
            diagnostics.add(DiagnosticMark::warning(
                &id,
                kind::SYSTEM_OVERFLOW,
                format!("system '{}' does not fit the page height", id),
            ));
        }
        if !current.is_empty() && !single_page {
            let forced = starts_with_page_break(doc, system);
            let full = y + spacing + height > available + EPSILON;
            if forced || (!encoded_only && full) {
                pages.push((std::mem::take(&mut current), y));
                y = 0.0;
            }
        }
        let y_rel = if current.is_empty() { 0.0 } else { y + spacing };
        if let Some(s) = doc[system].kind.as_system_mut() {
            s.y_rel = y_rel;
        }
        y = y_rel + height;
        current.push(system);
    }
    if !current.is_empty() {
        pages.push((current, y));
    }

    let root = doc.root();
    let count = pages.len();
    for (k, (systems, content_height)) in pages.into_iter().enumerate() {
        let page = doc.insert_engine_node(
            root,
            &format!("page-{}", k + 1),
            NodeKind::Page(Page { content_height }),
        );
        for system in systems {
            doc.reparent(system, page);
        }
    }
    doc.destroy(content_page);
    doc.stage = LayoutStage::Paginated;
    log::debug!("Layout: {} pages", count);
}
