//! Score builders shared by the integration tests

#![allow(dead_code)]

use engraver::layout::{BreakMode, LayoutOptions};
use engraver::models::{
    Clef, DurationAttrs, DurationBase, LayerElement, MeterSig, Note, Pitch, PitchName, Rest,
    ScoreDef, StaffDef, Tuplet,
};
use engraver::tree::{Layer, Measure, Staff};
use engraver::{Document, NodeId, NodeKind};

/// Document with `staves` treble staves in 4/4
pub fn document(staves: u32) -> Document {
    let defs = (1..=staves).map(|n| StaffDef::new(n, Clef::treble())).collect();
    Document::new(ScoreDef::new(defs).with_meter(MeterSig::new(4, 4)))
}

pub fn note(base: DurationBase) -> NodeKind {
    note_at(PitchName::C, 5, base)
}

pub fn note_at(pname: PitchName, oct: i8, base: DurationBase) -> NodeKind {
    NodeKind::Element(LayerElement::Note(Note::new(
        DurationAttrs::new(base),
        Pitch::new(pname, oct),
    )))
}

pub fn grace(base: DurationBase) -> NodeKind {
    NodeKind::Element(LayerElement::Note(Note::new(
        DurationAttrs::new(base).as_grace(),
        Pitch::new(PitchName::D, 5),
    )))
}

pub fn rest(base: DurationBase) -> NodeKind {
    NodeKind::Element(LayerElement::Rest(Rest::new(DurationAttrs::new(base))))
}

pub fn tuplet(num: u32, numbase: u32) -> NodeKind {
    NodeKind::Element(LayerElement::Tuplet(Tuplet { num, numbase }))
}

/// Append a child with an explicit id
pub fn add(doc: &mut Document, parent: NodeId, id: &str, kind: NodeKind) -> NodeId {
    doc.add_child_with_id(parent, id, kind).unwrap()
}

/// Append an empty measure to the content system
pub fn measure(doc: &mut Document, id: &str, n: u32) -> NodeId {
    let system = doc.content_system();
    add(doc, system, id, NodeKind::Measure(Measure::new(n)))
}

/// Append a staff with one layer to a measure; returns the layer
pub fn layer(doc: &mut Document, measure: NodeId, staff_n: u32) -> NodeId {
    let staff = doc.add_child(measure, NodeKind::Staff(Staff::new(staff_n))).unwrap();
    doc.add_child(staff, NodeKind::Layer(Layer { n: 1 })).unwrap()
}

/// Measure `m{n}` holding four quarter notes `m{n}-q1` .. `m{n}-q4`
pub fn quarter_measure(doc: &mut Document, n: u32) -> NodeId {
    let m = measure(doc, &format!("m{}", n), n);
    let l = layer(doc, m, 1);
    for i in 1..=4 {
        add(doc, l, &format!("m{}-q{}", n, i), note(DurationBase::Quarter));
    }
    m
}

/// Encoded system break between measures
pub fn system_break(doc: &mut Document) -> NodeId {
    let system = doc.content_system();
    doc.add_child(system, NodeKind::SystemBreak).unwrap()
}

pub fn page_break(doc: &mut Document) -> NodeId {
    let system = doc.content_system();
    doc.add_child(system, NodeKind::PageBreak).unwrap()
}

/// Options without page margins
pub fn options() -> LayoutOptions {
    LayoutOptions {
        page_margin_left: 0.0,
        page_margin_right: 0.0,
        page_margin_top: 0.0,
        page_margin_bottom: 0.0,
        ..LayoutOptions::default()
    }
}

pub fn continuous() -> LayoutOptions {
    LayoutOptions {
        breaks: BreakMode::None,
        ..options()
    }
}

pub fn measure_width(doc: &Document, measure: NodeId) -> f64 {
    doc[measure].kind.as_measure().map(|m| m.width()).unwrap()
}

/// Identifiers of the measures of every system, in order
pub fn system_partition(doc: &Document) -> Vec<Vec<String>> {
    (0..doc.system_count())
        .map(|i| {
            doc.measures_in_system(i)
                .into_iter()
                .map(|m| doc[m].id().to_string())
                .collect()
        })
        .collect()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {} to be within 1e-6 of {}",
        actual,
        expected
    );
}
