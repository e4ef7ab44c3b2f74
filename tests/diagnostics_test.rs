mod common;

use common::*;
use engraver::models::{
    ControlElement, DurationAttrs, DurationBase, Dynam, LayerElement, Note, Pitch, PitchName,
    TimePointAttrs,
};
use engraver::{DiagnosticSeverity, Document, LayoutEngine, NodeId, NodeKind};
use num_rational::Ratio;
use pretty_assertions::assert_eq;

fn slur(doc: &mut Document, measure: NodeId, id: &str, start: &str, end: &str) -> NodeId {
    add(doc, measure, id, NodeKind::Control(ControlElement::slur(start, end)))
}

fn dynam(doc: &mut Document, measure: NodeId, id: &str, point: TimePointAttrs) -> NodeId {
    let control = ControlElement::Dynam(Dynam {
        point,
        text: "mf".to_string(),
    });
    add(doc, measure, id, NodeKind::Control(control))
}

#[test]
fn test_slur_to_removed_note_is_omitted() {
    let mut doc = document(1);
    let m = quarter_measure(&mut doc, 1);
    slur(&mut doc, m, "s1", "m1-q1", "m1-q3");
    let q3 = doc.find_by_id("m1-q3").unwrap();
    let layer = doc.parent(q3).unwrap();
    doc.remove_child(layer, q3).unwrap();

    let result = LayoutEngine::new(options()).layout(&mut doc);

    assert_eq!(result.diagnostics.len(), 1);
    let mark = &result.diagnostics.marks[0];
    assert_eq!(mark.kind, "dangling_anchor");
    assert_eq!(mark.node.as_deref(), Some("s1"));
    assert_eq!(mark.severity, DiagnosticSeverity::Warning);
    assert!(mark.message.contains("m1-q3"));

    // Everything else is still laid out
    assert!(doc.element_at("s1").is_none());
    assert!(doc.element_at("m1-q1").is_some());
    assert!(doc.element_at("m1-q3").is_none());
    let list = LayoutEngine::new(options()).display_list(&doc);
    assert!(list.pages[0].systems[0].controls.is_empty());
}

#[test]
fn test_slur_to_unknown_id_is_omitted() {
    let mut doc = document(1);
    let m = quarter_measure(&mut doc, 1);
    slur(&mut doc, m, "s1", "nowhere", "m1-q2");

    let result = LayoutEngine::new(options()).layout(&mut doc);
    assert_eq!(result.diagnostics.count_kind("dangling_anchor"), 1);
    assert!(doc.element_at("s1").is_none());
}

#[test]
fn test_resolved_slur_spans_its_notes() {
    let mut doc = document(1);
    let m = quarter_measure(&mut doc, 1);
    slur(&mut doc, m, "s1", "m1-q1", "m1-q3");

    let result = LayoutEngine::new(options()).layout(&mut doc);
    assert!(result.diagnostics.is_empty());

    let slur = doc.element_at("s1").unwrap();
    let start = doc.element_at("m1-q1").unwrap();
    let end = doc.element_at("m1-q3").unwrap();
    assert_eq!(slur.x, start.x);
    assert!((slur.bounds.x2 - end.bounds.x2).abs() < 1e-6);
    // Slurs of stem-up notes sit above them
    assert!(slur.bounds.y2 < start.bounds.y1);
}

#[test]
fn test_unanchored_control_is_reported() {
    let mut doc = document(1);
    let m = quarter_measure(&mut doc, 1);
    dynam(&mut doc, m, "d1", TimePointAttrs::default());

    let result = LayoutEngine::new(options()).layout(&mut doc);
    assert_eq!(result.diagnostics.count_kind("unanchored_control"), 1);
    assert!(doc.element_at("d1").is_none());
}

#[test]
fn test_tstamp_control_lands_on_the_matching_slot() {
    let mut doc = document(1);
    let m = quarter_measure(&mut doc, 1);
    dynam(&mut doc, m, "d1", TimePointAttrs::at_tstamp(2.0, 1));
    dynam(&mut doc, m, "d2", TimePointAttrs::at_tstamp(1.5, 1));

    let result = LayoutEngine::new(options()).layout(&mut doc);
    assert!(result.diagnostics.is_empty());

    assert_eq!(doc.time_of("d1"), Some(Ratio::new(1, 4)));
    assert_eq!(doc.time_of("d2"), Some(Ratio::new(1, 8)));
    let q1 = doc.element_at("m1-q1").unwrap().x;
    let q2 = doc.element_at("m1-q2").unwrap().x;
    let d1 = doc.element_at("d1").unwrap();
    let d2 = doc.element_at("d2").unwrap();
    assert_eq!(d1.x, q2);
    assert!(d2.x > q1 && d2.x < q2);
    // Dynamics go below the staff
    assert!(d1.bounds.y1 > doc.element_at("m1-q2").unwrap().y);
}

#[test]
fn test_tstamp_outside_the_measure_is_clamped() {
    let mut doc = document(1);
    let m = quarter_measure(&mut doc, 1);
    dynam(&mut doc, m, "d1", TimePointAttrs::at_tstamp(9.0, 1));

    let result = LayoutEngine::new(options()).layout(&mut doc);
    assert_eq!(result.diagnostics.count_kind("unresolved_tstamp"), 1);
    assert_eq!(doc.time_of("d1"), Some(Ratio::from_integer(1)));
    assert!(doc.element_at("d1").is_some());
}

#[test]
fn test_missing_duration_advances_nothing() {
    let mut doc = document(1);
    let m = measure(&mut doc, "m1", 1);
    let l = layer(&mut doc, m, 1);
    let broken = Note::new(DurationAttrs::default(), Pitch::new(PitchName::C, 5));
    add(&mut doc, l, "n1", NodeKind::Element(LayerElement::Note(broken)));
    add(&mut doc, l, "n2", note(DurationBase::Quarter));

    let result = LayoutEngine::new(options()).layout(&mut doc);

    assert_eq!(result.diagnostics.count_kind("invalid_duration"), 1);
    assert!(result.diagnostics.has_errors());
    let mark = result.diagnostics.of_kind("invalid_duration").next().unwrap();
    assert_eq!(mark.severity, DiagnosticSeverity::Error);
    assert_eq!(mark.node.as_deref(), Some("n1"));

    // The broken note shares its slot with the next one
    assert_eq!(doc.time_of("n1"), Some(Ratio::from_integer(0)));
    assert_eq!(doc.time_of("n2"), Some(Ratio::from_integer(0)));
    assert_eq!(result.page_count, 1);
}

/// A ratio product past 64 bits is an invalid duration, not a crash
#[test]
fn test_nested_tuplet_overflow_is_reported() {
    let mut doc = document(1);
    let m = measure(&mut doc, "m1", 1);
    let l = layer(&mut doc, m, 1);
    let outer = add(&mut doc, l, "t1", tuplet(u32::MAX, u32::MAX - 2));
    let inner = add(&mut doc, outer, "t2", tuplet(u32::MAX, u32::MAX - 1));
    add(&mut doc, inner, "n1", note(DurationBase::N64));
    add(&mut doc, l, "n2", note(DurationBase::Quarter));

    let result = LayoutEngine::new(options()).layout(&mut doc);

    assert!(result.diagnostics.has_errors());
    let marked: Vec<_> = result
        .diagnostics
        .of_kind("invalid_duration")
        .map(|mark| mark.node.clone().unwrap())
        .collect();
    assert_eq!(marked, vec!["t2".to_string()]);
    // The inner group falls back to the outer ratio
    let max = u32::MAX as i64;
    let n1_length = Ratio::new(max - 2, 64 * max);
    assert_eq!(doc.time_of("n2"), Some(n1_length));
    assert_eq!(result.page_count, 1);
}

/// Onsets whose common denominator outgrows 64 bits stop the cursor
#[test]
fn test_onset_overflow_advances_nothing() {
    const PRIMES: [u32; 16] = [3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59];
    let mut doc = document(1);
    let m = measure(&mut doc, "m1", 1);
    let l = layer(&mut doc, m, 1);
    for p in PRIMES {
        let group = add(&mut doc, l, &format!("t{}", p), tuplet(p, p - 1));
        add(&mut doc, group, &format!("n{}", p), note(DurationBase::N64));
    }
    add(&mut doc, l, "last", note(DurationBase::Quarter));

    let result = LayoutEngine::new(options()).layout(&mut doc);

    assert!(result.diagnostics.count_kind("invalid_duration") >= 1);
    let mut previous = Ratio::from_integer(0);
    for p in PRIMES {
        let onset = doc.time_of(&format!("n{}", p)).unwrap();
        assert!(onset >= previous);
        previous = onset;
    }
    assert!(doc.time_of("last").unwrap() >= previous);
    assert!(doc.element_at("last").is_some());
}

#[test]
fn test_diagnostics_serialize_to_json() {
    let mut doc = document(1);
    let m = quarter_measure(&mut doc, 1);
    slur(&mut doc, m, "s1", "m1-q1", "gone");

    let result = LayoutEngine::new(options()).layout(&mut doc);
    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("dangling_anchor"));
    let back: engraver::LayoutResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}

#[test]
#[should_panic(expected = "system cast-off requires x positioning")]
fn test_cast_off_before_spacing_panics() {
    let mut doc = document(1);
    quarter_measure(&mut doc, 1);
    let engine = LayoutEngine::new(options());
    let mut diagnostics = engraver::Diagnostics::new();
    engine.prepare(&mut doc, &mut diagnostics);
    engine.align_horizontally(&mut doc, &mut diagnostics);
    engine.cast_off_systems(&mut doc, &mut diagnostics);
}

#[test]
#[should_panic(expected = "finalize requires justification")]
fn test_finalize_before_justification_panics() {
    let mut doc = document(1);
    quarter_measure(&mut doc, 1);
    LayoutEngine::new(options()).finalize(&mut doc);
}
