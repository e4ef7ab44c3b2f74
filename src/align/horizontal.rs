//! Horizontal alignment: the time grid of a measure
//!
//! A `MeasureAligner` owns one `Alignment` per distinct (onset, type,
//! grace-rank) inside its measure. Every staff of the measure registers its
//! events in the same aligner, so simultaneous events share one x position.

use std::cmp::{Ordering, Reverse};

use serde::Serialize;

use crate::models::bbox::{Axis, BoundingBox, Rect};
use crate::models::duration::{onset_to_f64, span_f64, zero, Onset};

/// Kind of an alignment slot, in drawing order for equal onsets
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AlignmentType {
    MeasureStart,
    MeasureLeftBarline,
    FullMeasure,
    Clef,
    KeySig,
    MeterSig,
    GraceNote,
    BarLine,
    Default,
    MeasureRightBarline,
    MeasureEnd,
}

/// Slots before, within and after the timed content
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Zone {
    Left,
    Content,
    Right,
}

impl AlignmentType {
    pub fn zone(self) -> Zone {
        match self {
            AlignmentType::MeasureStart | AlignmentType::MeasureLeftBarline => Zone::Left,
            AlignmentType::MeasureRightBarline | AlignmentType::MeasureEnd => Zone::Right,
            _ => Zone::Content,
        }
    }
}

const FALLBACK_WEIGHT: f64 = 1e-3;

/// Identity of an alignment slot
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AlignmentKey {
    pub time: Onset,
    pub kind: AlignmentType,
    /// Distance (in grace notes) from the principal note; 0 for non-grace slots
    pub grace_rank: u32,
}

impl AlignmentKey {
    pub fn new(time: Onset, kind: AlignmentType) -> Self {
        Self {
            time,
            kind,
            grace_rank: 0,
        }
    }

    pub fn grace(time: Onset, rank: u32) -> Self {
        Self {
            time,
            kind: AlignmentType::GraceNote,
            grace_rank: rank,
        }
    }

    pub fn zone(&self) -> Zone {
        self.kind.zone()
    }
}

impl Ord for AlignmentKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Farthest grace note first
        (self.zone(), self.time, self.kind, Reverse(self.grace_rank)).cmp(&(
            other.zone(),
            other.time,
            other.kind,
            Reverse(other.grace_rank),
        ))
    }
}

impl PartialOrd for AlignmentKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Footprint registered in a slot by one element, relative to the slot x
/// and to the top line of its staff
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
    pub staff_n: u32,
    pub rect: Rect,
}

/// One horizontal time-point of a measure
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    pub key: AlignmentKey,
    pub x_rel: f64,
    /// Created by a time-stamped control event only
    pub timestamp_only: bool,
    footprints: Vec<Footprint>,
}

impl Alignment {
    fn new(key: AlignmentKey) -> Self {
        Self {
            key,
            x_rel: 0.0,
            timestamp_only: false,
            footprints: Vec::new(),
        }
    }

    pub fn footprints(&self) -> &[Footprint] {
        &self.footprints
    }

    fn trailing_edge(&self) -> f64 {
        self.footprints
            .iter()
            .map(|f| f.rect.x2)
            .fold(0.0, f64::max)
    }
}

/// Space between two consecutive (non time-stamp) slots
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gap {
    pub width: f64,
    /// Stretchability; duration-derived, zero for fixed gaps
    pub weight: f64,
    /// Narrowest width compression may leave
    pub floor: f64,
}

/// Spacing parameters resolved from the layout options
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpacingParams {
    pub linear: f64,
    pub non_linear: f64,
    /// Scale factor (1.0 = 100%)
    pub scale: f64,
    /// Collision margin between footprints of consecutive slots
    pub margin: f64,
    pub min_slot_width: f64,
    /// Longest duration of the score, in whole notes
    pub longest: Onset,
}

impl Default for SpacingParams {
    fn default() -> Self {
        Self {
            linear: 0.25,
            non_linear: 0.6,
            scale: 1.0,
            margin: 9.0,
            min_slot_width: 18.0,
            longest: Onset::from_integer(1),
        }
    }
}

impl SpacingParams {
    /// Ideal distance for a time interval:
    /// `(Δt·1024)^non_linear · linear · 10 · scale`
    pub fn duration_space(&self, interval: Onset) -> f64 {
        self.space_for(onset_to_f64(interval))
    }

    /// Same as `duration_space` for an interval already in whole notes
    pub fn space_for(&self, mut time: f64) -> f64 {
        if time <= 0.0 {
            return 0.0;
        }
        let longest = onset_to_f64(self.longest);
        if longest > 1.0 {
            time /= longest;
        }
        (time * 1024.0).powf(self.non_linear) * self.linear * 10.0 * self.scale
    }
}

/// Lifecycle of a measure aligner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignerState {
    Empty,
    Collecting,
    Aligned,
}

/// The time grid of one measure
#[derive(Clone, Debug)]
pub struct MeasureAligner {
    alignments: Vec<Alignment>,
    state: AlignerState,
    max_time: Onset,
    gaps: Vec<Gap>,
    positioned: bool,
}

impl Default for MeasureAligner {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasureAligner {
    pub fn new() -> Self {
        Self {
            alignments: Vec::new(),
            state: AlignerState::Empty,
            max_time: zero(),
            gaps: Vec::new(),
            positioned: false,
        }
    }

    /// Drop every slot; the next layout rebuilds them
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn state(&self) -> AlignerState {
        self.state
    }

    pub fn is_positioned(&self) -> bool {
        self.positioned
    }

    /// Open the aligner for collection and create the left-zone slots
    pub fn begin(&mut self) {
        assert_eq!(
            self.state,
            AlignerState::Empty,
            "measure aligner must be reset before alignment"
        );
        self.state = AlignerState::Collecting;
        self.alignment_at(AlignmentKey::new(zero(), AlignmentType::MeasureStart));
        self.alignment_at(AlignmentKey::new(zero(), AlignmentType::MeasureLeftBarline));
    }

    /// Get or create the slot for `key`
    pub fn alignment_at(&mut self, key: AlignmentKey) -> AlignmentKey {
        let index = self.slot_index(key);
        self.alignments[index].timestamp_only = false;
        key
    }

    /// Get or create a slot for a time-stamped control event; a new slot is
    /// flagged as time-stamp only
    pub fn timestamp_alignment_at(&mut self, time: Onset) -> AlignmentKey {
        let key = AlignmentKey::new(time, AlignmentType::Default);
        if self.get(&key).is_none() {
            let index = self.slot_index(key);
            self.alignments[index].timestamp_only = true;
        }
        key
    }

    fn slot_index(&mut self, key: AlignmentKey) -> usize {
        assert_eq!(
            self.state,
            AlignerState::Collecting,
            "alignment slots can only be requested while collecting"
        );
        match self.alignments.binary_search_by(|a| a.key.cmp(&key)) {
            Ok(index) => index,
            Err(index) => {
                self.alignments.insert(index, Alignment::new(key));
                index
            }
        }
    }

    /// Register an element footprint in an existing slot
    pub fn add_footprint(&mut self, key: &AlignmentKey, staff_n: u32, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        if let Ok(index) = self.alignments.binary_search_by(|a| a.key.cmp(key)) {
            self.alignments[index].footprints.push(Footprint { staff_n, rect });
        }
    }

    /// Extend the measure duration to at least `time`
    pub fn set_max_time(&mut self, time: Onset) {
        if time > self.max_time {
            self.max_time = time;
        }
    }

    pub fn max_time(&self) -> Onset {
        self.max_time
    }

    /// Close collection: an empty measure collapses to one content slot, and
    /// the right-zone slots are placed at the measure duration
    pub fn finish(&mut self) {
        let has_content = self
            .alignments
            .iter()
            .any(|a| a.key.zone() == Zone::Content && !a.timestamp_only);
        if !has_content {
            self.alignment_at(AlignmentKey::new(zero(), AlignmentType::Default));
        }
        let end = self.max_time;
        self.alignment_at(AlignmentKey::new(end, AlignmentType::MeasureRightBarline));
        self.alignment_at(AlignmentKey::new(end, AlignmentType::MeasureEnd));
        self.state = AlignerState::Aligned;
    }

    pub fn alignments(&self) -> &[Alignment] {
        &self.alignments
    }

    /// Slots of the content zone, in order
    pub fn content_alignments(&self) -> impl Iterator<Item = &Alignment> {
        self.alignments
            .iter()
            .filter(|a| a.key.zone() == Zone::Content)
    }

    pub fn get(&self, key: &AlignmentKey) -> Option<&Alignment> {
        self.alignments
            .binary_search_by(|a| a.key.cmp(key))
            .ok()
            .map(|index| &self.alignments[index])
    }

    pub fn x_of(&self, key: &AlignmentKey) -> Option<f64> {
        self.get(key).map(|a| a.x_rel)
    }

    /// Position of the first slot of a kind
    pub fn x_of_kind(&self, kind: AlignmentType) -> Option<f64> {
        self.alignments
            .iter()
            .find(|a| a.key.kind == kind)
            .map(|a| a.x_rel)
    }

    /// Width of the measure: position of its end slot
    pub fn width(&self) -> f64 {
        self.alignments.last().map(|a| a.x_rel).unwrap_or(0.0)
    }

    /// Total stretchability of the measure
    pub fn stretch_weight(&self) -> f64 {
        self.gaps.iter().map(|g| g.weight).sum()
    }

    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    /// Compute the ideal (unjustified) x position of every slot
    pub fn set_alignment_x_pos(&mut self, params: &SpacingParams) {
        assert_eq!(
            self.state,
            AlignerState::Aligned,
            "x positions require a completed horizontal alignment"
        );
        let real = self.real_indices();
        let mut gaps = Vec::with_capacity(real.len().saturating_sub(1));
        for pair in real.windows(2) {
            let prev = &self.alignments[pair[0]];
            let cur = &self.alignments[pair[1]];
            gaps.push(Self::gap_between(prev, cur, params));
        }
        self.gaps = gaps;
        self.place();
        self.positioned = true;
    }

    /// Replace the gap widths (after justification) and re-place every slot
    pub fn apply_gaps(&mut self, gaps: &[Gap]) {
        debug_assert_eq!(gaps.len(), self.gaps.len());
        self.gaps.copy_from_slice(gaps);
        self.place();
    }

    /// Stretch (or compress, for a negative amount) the measure by `extra`
    pub fn stretch(&mut self, extra: f64) {
        let mut gaps = self.gaps.clone();
        distribute_space(&mut gaps, extra);
        self.apply_gaps(&gaps);
    }

    fn gap_between(prev: &Alignment, cur: &Alignment, params: &SpacingParams) -> Gap {
        if cur.key.kind == AlignmentType::MeasureEnd {
            let width = prev.trailing_edge();
            return Gap {
                width,
                weight: 0.0,
                floor: width,
            };
        }

        let timed = prev.key.zone() == Zone::Content && cur.key.zone() != Zone::Left;
        let duration_space = if timed && cur.key.time > prev.key.time {
            params.space_for(span_f64(prev.key.time, cur.key.time))
        } else {
            0.0
        };

        // Push the slot right until its footprints clear the previous ones
        let mut push: f64 = 0.0;
        for a in &prev.footprints {
            let placed = BoundingBox::new(0.0, 0.0, Some(a.rect));
            for b in cur.footprints.iter().filter(|b| b.staff_n == a.staff_n) {
                let candidate = BoundingBox::new(duration_space, 0.0, Some(b.rect));
                let offset = candidate.offset_to_avoid(&placed, Axis::Horizontal, params.margin);
                push = push.max(offset.forward);
            }
        }

        let floor = match (prev.key.zone(), cur.key.zone()) {
            (Zone::Content, Zone::Content) | (Zone::Content, Zone::Right) => params.min_slot_width,
            (Zone::Left, Zone::Content) => params.margin,
            _ => 0.0,
        };
        let width = (duration_space + push).max(floor);
        // Measures without timed content still stretch before their barline
        let weight = if cur.key.zone() == Zone::Right {
            duration_space.max(FALLBACK_WEIGHT)
        } else {
            duration_space
        };
        Gap {
            width,
            weight,
            floor: floor.min(width),
        }
    }

    fn real_indices(&self) -> Vec<usize> {
        self.alignments
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.timestamp_only)
            .map(|(i, _)| i)
            .collect()
    }

    fn place(&mut self) {
        let real = self.real_indices();
        let mut x = 0.0;
        for (n, &index) in real.iter().enumerate() {
            if n > 0 {
                x += self.gaps[n - 1].width;
            }
            self.alignments[index].x_rel = x;
        }

        // Time-stamp only slots sit proportionally between their neighbours
        for index in 0..self.alignments.len() {
            if !self.alignments[index].timestamp_only {
                continue;
            }
            let prev = real.iter().rev().find(|&&r| r < index).copied();
            let next = real.iter().find(|&&r| r > index).copied();
            let x = match (prev, next) {
                (Some(p), Some(n)) => {
                    let (p, n, t) = (
                        &self.alignments[p],
                        &self.alignments[n],
                        self.alignments[index].key.time,
                    );
                    let span = span_f64(p.key.time, n.key.time);
                    if span > 0.0 {
                        p.x_rel + (n.x_rel - p.x_rel) * span_f64(p.key.time, t) / span
                    } else {
                        p.x_rel
                    }
                }
                (Some(p), None) => self.alignments[p].x_rel,
                _ => 0.0,
            };
            self.alignments[index].x_rel = x;
        }
    }
}

/// Spread `extra` over the gaps in proportion to their weight. Compression
/// (negative `extra`) never takes a gap below its floor; the deficit of a
/// clamped gap moves to the others. Returns what could not be distributed.
pub fn distribute_space(gaps: &mut [Gap], extra: f64) -> f64 {
    const EPSILON: f64 = 1e-9;
    let mut remaining = extra;
    for _ in 0..gaps.len().max(1) {
        if remaining.abs() < EPSILON {
            return 0.0;
        }
        let active = |g: &Gap| g.weight > 0.0 && (remaining > 0.0 || g.width - g.floor > EPSILON);
        let total: f64 = gaps.iter().filter(|g| active(g)).map(|g| g.weight).sum();
        if total <= 0.0 {
            break;
        }
        let share = remaining;
        let mut applied = 0.0;
        for gap in gaps.iter_mut() {
            let usable = gap.weight > 0.0 && (share > 0.0 || gap.width - gap.floor > EPSILON);
            if !usable {
                continue;
            }
            let mut delta = share * gap.weight / total;
            if gap.width + delta < gap.floor {
                delta = gap.floor - gap.width;
            }
            gap.width += delta;
            applied += delta;
        }
        remaining = share - applied;
    }
    if remaining.abs() < EPSILON {
        0.0
    } else {
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_rational::Ratio;

    fn r(n: i64, d: i64) -> Onset {
        Ratio::new(n, d)
    }

    fn note_rect() -> Rect {
        Rect::new(0.0, 27.0, 22.5, 45.0)
    }

    fn aligner_with(onsets: &[Onset], end: Onset) -> MeasureAligner {
        let mut aligner = MeasureAligner::new();
        aligner.begin();
        for &time in onsets {
            let key = aligner.alignment_at(AlignmentKey::new(time, AlignmentType::Default));
            aligner.add_footprint(&key, 1, note_rect());
        }
        aligner.set_max_time(end);
        aligner.finish();
        aligner
    }

    #[test]
    fn test_key_ordering() {
        let t = r(1, 4);
        let principal = AlignmentKey::new(t, AlignmentType::Default);
        let near = AlignmentKey::grace(t, 1);
        let far = AlignmentKey::grace(t, 2);
        let clef = AlignmentKey::new(t, AlignmentType::Clef);
        let earlier = AlignmentKey::new(r(1, 8), AlignmentType::Default);
        let right = AlignmentKey::new(zero(), AlignmentType::MeasureRightBarline);
        let left = AlignmentKey::new(r(1, 1), AlignmentType::MeasureLeftBarline);

        let mut keys = vec![principal, right, near, clef, left, far, earlier];
        keys.sort();
        assert_eq!(keys, vec![left, earlier, clef, far, near, principal, right]);
    }

    #[test]
    fn test_slots_are_shared_by_onset() {
        let mut aligner = MeasureAligner::new();
        aligner.begin();
        let a = aligner.alignment_at(AlignmentKey::new(r(1, 4), AlignmentType::Default));
        let b = aligner.alignment_at(AlignmentKey::new(r(1, 4), AlignmentType::Default));
        assert_eq!(a, b);
        assert_eq!(aligner.alignments().len(), 3);
    }

    #[test]
    fn test_empty_measure_collapses_to_one_slot() {
        let aligner = aligner_with(&[], zero());
        assert_eq!(aligner.content_alignments().count(), 1);
        assert_eq!(aligner.state(), AlignerState::Aligned);
    }

    #[test]
    fn test_positions_follow_time() {
        let mut aligner = aligner_with(&[r(0, 1), r(1, 4), r(1, 2), r(3, 4)], r(1, 1));
        aligner.set_alignment_x_pos(&SpacingParams::default());

        let xs: Vec<f64> = aligner.content_alignments().map(|a| a.x_rel).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        let d1 = xs[1] - xs[0];
        let d2 = xs[2] - xs[1];
        assert!((d1 - d2).abs() < 1e-9);
        let expected = SpacingParams::default().duration_space(r(1, 4));
        assert!((d1 - expected).abs() < 1e-9);
        assert!(aligner.width() > xs[3]);
    }

    #[test]
    fn test_longer_values_get_more_space() {
        let params = SpacingParams::default();
        let quarter = params.duration_space(r(1, 4));
        let half = params.duration_space(r(1, 2));
        assert!(half > quarter);
        assert!(half < quarter * 2.0);
    }

    #[test]
    fn test_collision_widens_gap() {
        let params = SpacingParams {
            linear: 0.01,
            ..SpacingParams::default()
        };
        let mut aligner = aligner_with(&[r(0, 1), r(1, 16)], r(1, 8));
        aligner.set_alignment_x_pos(&params);
        let xs: Vec<f64> = aligner.content_alignments().map(|a| a.x_rel).collect();
        // Notehead width plus margin
        assert!((xs[1] - xs[0] - (22.5 + params.margin)).abs() < 1e-9);
    }

    #[test]
    fn test_timestamp_slot_is_interpolated() {
        let mut aligner = MeasureAligner::new();
        aligner.begin();
        for time in [r(0, 1), r(1, 2)] {
            let key = aligner.alignment_at(AlignmentKey::new(time, AlignmentType::Default));
            aligner.add_footprint(&key, 1, note_rect());
        }
        let ts = aligner.timestamp_alignment_at(r(1, 4));
        aligner.set_max_time(r(1, 1));
        aligner.finish();
        aligner.set_alignment_x_pos(&SpacingParams::default());

        let x0 = aligner.x_of(&AlignmentKey::new(r(0, 1), AlignmentType::Default)).unwrap();
        let x1 = aligner.x_of(&AlignmentKey::new(r(1, 2), AlignmentType::Default)).unwrap();
        let xt = aligner.x_of(&ts).unwrap();
        assert!((xt - (x0 + x1) / 2.0).abs() < 1e-9);
        assert_eq!(aligner.gaps().len(), aligner.alignments().len() - 2);
    }

    #[test]
    fn test_stretch_preserves_order_and_adds_width() {
        let mut aligner = aligner_with(&[r(0, 1), r(1, 2), r(3, 4)], r(1, 1));
        aligner.set_alignment_x_pos(&SpacingParams::default());
        let natural = aligner.width();
        aligner.stretch(100.0);
        assert!((aligner.width() - natural - 100.0).abs() < 1e-6);
        let xs: Vec<f64> = aligner.alignments().iter().map(|a| a.x_rel).collect();
        assert!(xs.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_compression_respects_floor() {
        let mut gaps = vec![
            Gap { width: 40.0, weight: 30.0, floor: 18.0 },
            Gap { width: 20.0, weight: 10.0, floor: 18.0 },
            Gap { width: 5.0, weight: 0.0, floor: 5.0 },
        ];
        let left = distribute_space(&mut gaps, -10.0);
        assert_eq!(left, 0.0);
        assert!(gaps[1].width >= 18.0 - 1e-9);
        assert_eq!(gaps[2].width, 5.0);
        let total: f64 = gaps.iter().map(|g| g.width).sum();
        assert!((total - 55.0).abs() < 1e-9);

        // More than the floors allow
        let left = distribute_space(&mut gaps, -100.0);
        assert!(left < 0.0);
        assert!((gaps[0].width - 18.0).abs() < 1e-9);
    }
}
