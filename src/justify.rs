//! Justification
//!
//! Horizontal justification stretches the gaps of every system so its
//! measures fill the page width. Vertical justification spreads the free
//! height of a page over the gaps between systems and between staves.

use crate::align::horizontal::{distribute_space, Gap};
use crate::layout::options::{BreakMode, JustificationMode, LayoutOptions};
use crate::layout::{require_stage, LayoutStage};
use crate::tree::{Document, NodeId, NodeKind, NodeTag};

/// Below this ratio a system is considered compressed
const COMPRESSED_RATIO: f64 = 0.8;

/// Ratio between the width a system must fill and its natural width
pub fn justification_ratio(target: f64, natural: f64) -> f64 {
    if natural <= 0.0 {
        return 1.0;
    }
    target / natural
}

fn system_measures(doc: &Document, system: NodeId) -> Vec<NodeId> {
    doc.children(system)
        .iter()
        .copied()
        .filter(|&child| doc[child].tag() == NodeTag::Measure)
        .collect()
}

/// Stretch every system to the content width
pub fn justify_x(doc: &mut Document, options: &LayoutOptions) {
    require_stage(doc.stage, LayoutStage::Paginated, "horizontal justification");
    if options.breaks == BreakMode::None || !options.justify_horizontally {
        return;
    }
    let available = options.content_width();
    let systems = doc.systems();
    let last = systems.len().saturating_sub(1);

    for (index, system) in systems.into_iter().enumerate() {
        let Some((score_def_width, natural, overflow)) = doc[system]
            .kind
            .as_system()
            .map(|s| (s.score_def_width, s.measures_width, s.overflow))
        else {
            continue;
        };
        if overflow || natural <= 0.0 {
            continue;
        }
        let target = available - score_def_width;
        let ratio = justification_ratio(target, natural);
        if index == last
            && options.min_last_justification > 0.0
            && ratio > 1.0 / options.min_last_justification
        {
            log::debug!("Justification: last system left at its natural width");
            continue;
        }
        if ratio < COMPRESSED_RATIO {
            log::warn!(
                "System {} is compressed (justification ratio {:.2})",
                doc[system].id(),
                ratio
            );
        }

        let measures = system_measures(doc, system);
        let mut gaps: Vec<Gap> = Vec::new();
        let mut counts = Vec::with_capacity(measures.len());
        for &measure in &measures {
            let own = doc[measure]
                .kind
                .as_measure()
                .map(|m| m.aligner.gaps().to_vec())
                .unwrap_or_default();
            counts.push(own.len());
            gaps.extend(own);
        }
        let leftover = distribute_space(&mut gaps, target - natural);
        if leftover.abs() > 1e-6 {
            log::debug!("Justification: {:.2} could not be distributed in {}", leftover, doc[system].id());
        }

        let mut offset = 0;
        let mut x = 0.0;
        for (&measure, count) in measures.iter().zip(counts) {
            if let Some(m) = doc[measure].kind.as_measure_mut() {
                m.aligner.apply_gaps(&gaps[offset..offset + count]);
                m.x_rel = x;
                x += m.width();
            }
            offset += count;
        }
        if let Some(s) = doc[system].kind.as_system_mut() {
            s.measures_width = x;
        }
    }
}

/// Spread the free height of every page over its system and staff gaps
pub fn justify_y(doc: &mut Document, options: &LayoutOptions) {
    require_stage(doc.stage, LayoutStage::Paginated, "vertical justification");
    if options.justification == JustificationMode::Fill {
        let available = options.content_height();
        let pages = doc.pages();
        let last = pages.len().saturating_sub(1);
        for (index, page) in pages.into_iter().enumerate() {
            fill_page(doc, page, available, index == last, options);
        }
    }
    doc.stage = LayoutStage::Justified;
}

fn fill_page(doc: &mut Document, page: NodeId, available: f64, is_last: bool, options: &LayoutOptions) {
    let used = match &doc[page].kind {
        NodeKind::Page(p) => p.content_height,
        _ => return,
    };
    let free = available - used;
    if free <= 0.0 || available <= 0.0 {
        return;
    }
    if is_last && free / available >= options.justification_max_vertical {
        return;
    }

    let systems = doc.children(page).to_vec();
    let staff_gaps: Vec<usize> = systems
        .iter()
        .map(|&s| {
            doc[s]
                .kind
                .as_system()
                .map(|s| s.aligner.staff_gap_count())
                .unwrap_or(0)
        })
        .collect();
    let system_weight = systems.len().saturating_sub(1) as f64 * options.justification_system;
    let staff_weight = staff_gaps.iter().sum::<usize>() as f64 * options.justification_staff;
    let total = system_weight + staff_weight;
    if total <= 0.0 {
        return;
    }
    let per_unit = free / total;

    let mut shift = 0.0;
    for (index, (&system, gaps)) in systems.iter().zip(staff_gaps).enumerate() {
        if index > 0 {
            shift += per_unit * options.justification_system;
        }
        if let Some(s) = doc[system].kind.as_system_mut() {
            s.y_rel += shift;
            s.aligner.justify(per_unit * options.justification_staff);
        }
        shift += gaps as f64 * per_unit * options.justification_staff;
    }
    if let Some(p) = doc[page].kind.as_page_mut() {
        p.content_height = used + shift;
    }
}
