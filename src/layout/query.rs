//! Queries for exporters
//!
//! Positions are only meaningful once layout has been finalized; before that
//! the position queries return `None`.

use num_traits::CheckedAdd;
use serde::{Deserialize, Serialize};

use super::LayoutStage;
use crate::functor::{find_first, VisitResult};
use crate::models::bbox::Rect;
use crate::models::duration::{zero, Onset};
use crate::tree::{Document, NodeId, NodeKind, NodeTag};

/// Final position of a node
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ElementPosition {
    /// Anchor (drawing position) in page coordinates
    pub x: f64,
    pub y: f64,
    /// Absolute bounding box
    pub bounds: Rect,
}

impl Document {
    /// Position and bounding box of a laid-out node
    pub fn element_at(&self, id: &str) -> Option<ElementPosition> {
        if self.stage() < LayoutStage::Finalized {
            return None;
        }
        let node = self.find_by_id(id)?;
        if !self.is_live(node) || self[node].layout.omitted {
            return None;
        }
        let bbox = self[node].bbox;
        Some(ElementPosition {
            x: bbox.x,
            y: bbox.y,
            bounds: bbox.bounds(),
        })
    }

    /// Measures of the system at `index` (in reading order over all pages)
    pub fn measures_in_system(&self, index: usize) -> Vec<NodeId> {
        let Some(&system) = self.systems().get(index) else {
            return Vec::new();
        };
        self.children(system)
            .iter()
            .copied()
            .filter(|&child| self[child].tag() == NodeTag::Measure)
            .collect()
    }

    /// Pages produced by the last layout, 0 before page cast-off
    pub fn page_count(&self) -> usize {
        if self.stage() < LayoutStage::Paginated {
            return 0;
        }
        self.pages().len()
    }

    /// Systems produced by the last layout, 0 before system cast-off
    pub fn system_count(&self) -> usize {
        if self.stage() < LayoutStage::CastOff {
            return 0;
        }
        self.systems().len()
    }

    /// Onset of an element relative to the start of its measure
    pub fn time_of(&self, id: &str) -> Option<Onset> {
        if self.stage() < LayoutStage::Aligned {
            return None;
        }
        let node = self.find_by_id(id)?;
        if !self.is_live(node) {
            return None;
        }
        self[node].layout.onset
    }

    /// Onset of an element from the start of the score, `None` once the
    /// running total no longer fits
    pub fn score_time_of(&self, id: &str) -> Option<Onset> {
        let onset = self.time_of(id)?;
        let node = self.find_by_id(id)?;
        let measure = self.ancestor_of_kind(node, NodeTag::Measure)?;
        let mut start = zero();
        for previous in self.measures() {
            if previous == measure {
                return start.checked_add(&onset);
            }
            if let NodeKind::Measure(m) = &self[previous].kind {
                start = start.checked_add(&m.aligner.max_time())?;
            }
        }
        None
    }

    /// First measure numbered `n`
    pub fn measure_by_n(&self, n: u32) -> Option<NodeId> {
        find_first(self, self.root(), |node| match &node.kind {
            NodeKind::Measure(measure) if measure.n == n => VisitResult::Stop,
            // Nothing below a measure can be a measure
            NodeKind::Measure(_) => VisitResult::SkipChildren,
            _ => VisitResult::Continue,
        })
    }
}
