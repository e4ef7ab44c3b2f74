mod common;

use common::*;
use engraver::layout::display_list::RenderSystem;
use engraver::models::{
    Clef, ControlElement, DurationBase, Dynam, PitchName, ScoreDef, StaffDef, TimePointAttrs,
};
use engraver::tree::{Layer, Staff};
use engraver::{Document, LayoutEngine, NodeId, NodeKind};
use pretty_assertions::assert_eq;

fn dynam(doc: &mut Document, measure: NodeId, id: &str, text: &str, staff_n: u32) -> NodeId {
    let control = ControlElement::Dynam(Dynam {
        point: TimePointAttrs::at_tstamp(1.0, staff_n),
        text: text.to_string(),
    });
    add(doc, measure, id, NodeKind::Control(control))
}

/// Staff `staff_n` hidden in this measure, with one layer
fn hidden_layer(doc: &mut Document, measure: NodeId, staff_n: u32) -> NodeId {
    let staff = doc.add_child(measure, NodeKind::Staff(Staff::hidden(staff_n))).unwrap();
    doc.add_child(staff, NodeKind::Layer(Layer { n: 1 })).unwrap()
}

fn staff_y(system: &RenderSystem, n: u32) -> f64 {
    system.staves.iter().find(|s| s.n == n).unwrap().y
}

fn staff_hidden(system: &RenderSystem, n: u32) -> bool {
    system.staves.iter().find(|s| s.n == n).unwrap().hidden
}

/// Measure `m{n}` with a whole note on each of `staves` staves
fn whole_measure(doc: &mut Document, n: u32, staves: u32) -> NodeId {
    let m = measure(doc, &format!("m{}", n), n);
    for staff_n in 1..=staves {
        let l = layer(doc, m, staff_n);
        add(
            doc,
            l,
            &format!("m{}-s{}", n, staff_n),
            note_at(PitchName::G, 4, DurationBase::Whole),
        );
    }
    m
}

/// A dynamic below a staff pushes the next staff down instead of running
/// into it
#[test]
fn test_dynamic_below_makes_room_before_next_staff() {
    let mut doc = document(2);
    let m = whole_measure(&mut doc, 1, 2);
    dynam(&mut doc, m, "d1", "fff", 1);

    let engine = LayoutEngine::new(engraver::LayoutOptions {
        spacing_staff: 1.0,
        ..options()
    });
    let result = engine.layout(&mut doc);
    assert!(result.diagnostics.is_empty());

    let list = engine.display_list(&doc);
    let system = &list.pages[0].systems[0];
    let d1 = doc.element_at("d1").unwrap();
    let staff1 = &system.staves[0];
    assert!(d1.bounds.y1 >= staff1.y + staff1.height);
    assert!(d1.bounds.y2 <= staff_y(system, 2));
}

/// A slur above the second staff stays clear of the first one
#[test]
fn test_slur_above_makes_room_after_previous_staff() {
    let mut doc = document(2);
    let m = measure(&mut doc, "m1", 1);
    let l1 = layer(&mut doc, m, 1);
    add(&mut doc, l1, "w1", note_at(PitchName::G, 4, DurationBase::Whole));
    let l2 = layer(&mut doc, m, 2);
    for i in 1..=4 {
        add(&mut doc, l2, &format!("q{}", i), note(DurationBase::Quarter));
    }
    add(&mut doc, m, "s1", NodeKind::Control(ControlElement::slur("q1", "q4")));

    let engine = LayoutEngine::new(engraver::LayoutOptions {
        spacing_staff: 1.0,
        ..options()
    });
    engine.layout(&mut doc);

    let list = engine.display_list(&doc);
    let system = &list.pages[0].systems[0];
    let staff1 = &system.staves[0];
    let slur = doc.element_at("s1").unwrap();
    assert!(slur.bounds.y1 >= staff1.y + staff1.height - 1e-6);
    assert!(slur.bounds.y2 <= doc.element_at("q1").unwrap().bounds.y1 + 1e-6);
}

/// Staff 2 is hidden in the first system only: it takes no room there and
/// its notes draw nothing, while the second system shows it again
#[test]
fn test_staff_hidden_in_one_system_only() {
    let mut doc = document(3);
    let m1 = measure(&mut doc, "m1", 1);
    let l = layer(&mut doc, m1, 1);
    add(&mut doc, l, "m1-s1", note_at(PitchName::G, 4, DurationBase::Whole));
    let l = hidden_layer(&mut doc, m1, 2);
    add(&mut doc, l, "m1-s2", note_at(PitchName::G, 4, DurationBase::Whole));
    let l = layer(&mut doc, m1, 3);
    add(&mut doc, l, "m1-s3", note_at(PitchName::G, 4, DurationBase::Whole));
    system_break(&mut doc);
    whole_measure(&mut doc, 2, 3);

    let engine = LayoutEngine::new(options());
    let result = engine.layout(&mut doc);
    assert_eq!(result.system_count, 2);

    let list = engine.display_list(&doc);
    let first = &list.pages[0].systems[0];
    let second = &list.pages[0].systems[1];
    assert!(staff_hidden(first, 2));
    assert!(!staff_hidden(second, 2));

    // Staff 3 moves up by one staff and one staff gap
    let first_span = staff_y(first, 3) - staff_y(first, 1);
    let second_span = staff_y(second, 3) - staff_y(second, 1);
    assert!(first_span < second_span);
    assert_close(second_span - first_span, 72.0 + 72.0);
    assert!(first.bounds.height() < second.bounds.height());

    assert_eq!(list.element("m1-s2").unwrap().bounds, None);
    assert!(list.element("m2-s2").unwrap().bounds.is_some());
    // The hidden staff keeps its place in the time grid
    assert_eq!(doc.time_of("m1-s2"), doc.time_of("m1-s1"));
}

/// One visible measure is enough to show a staff in its system
#[test]
fn test_staff_shown_when_any_measure_shows_it() {
    let mut doc = document(2);
    let m1 = measure(&mut doc, "m1", 1);
    let l = layer(&mut doc, m1, 1);
    add(&mut doc, l, "m1-s1", note(DurationBase::Whole));
    let l = hidden_layer(&mut doc, m1, 2);
    add(&mut doc, l, "m1-s2", rest(DurationBase::Whole));
    whole_measure(&mut doc, 2, 2);

    let engine = LayoutEngine::new(continuous());
    engine.layout(&mut doc);
    let list = engine.display_list(&doc);
    let system = &list.pages[0].systems[0];
    assert!(!staff_hidden(system, 2));
    assert!(staff_y(system, 2) > staff_y(system, 1));
}

/// A staff hidden by its definition stays hidden in every system, and a
/// dynamic on it takes no room
#[test]
fn test_hidden_staff_definition_applies_everywhere() {
    let score = |hide: bool| {
        let second = StaffDef::new(2, Clef::treble());
        let defs = vec![
            StaffDef::new(1, Clef::treble()),
            if hide { second.hidden() } else { second },
        ];
        let mut doc = Document::new(ScoreDef::new(defs));
        let m1 = whole_measure(&mut doc, 1, 2);
        dynam(&mut doc, m1, "d1", "pp", 2);
        system_break(&mut doc);
        whole_measure(&mut doc, 2, 2);
        doc
    };
    let engine = LayoutEngine::new(options());

    let mut hidden = score(true);
    engine.layout(&mut hidden);
    let hidden_list = engine.display_list(&hidden);
    let mut shown = score(false);
    engine.layout(&mut shown);
    let shown_list = engine.display_list(&shown);

    let systems = &hidden_list.pages[0].systems;
    assert_eq!(systems.len(), 2);
    for system in systems {
        assert!(staff_hidden(system, 2));
        assert_close(system.bounds.height(), 72.0);
    }
    assert!(systems[0].controls.is_empty());
    assert_eq!(shown_list.pages[0].systems[0].controls.len(), 1);
    assert!(shown_list.pages[0].systems[0].bounds.height() > 72.0 * 2.0);
}
