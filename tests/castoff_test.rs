mod common;

use common::*;
use engraver::layout::{BreakMode, LayoutOptions};
use engraver::models::DurationBase;
use engraver::{Document, LayoutEngine};
use pretty_assertions::assert_eq;

fn quarter_score(measures: u32) -> Document {
    let mut doc = document(1);
    for n in 1..=measures {
        quarter_measure(&mut doc, n);
    }
    doc
}

/// Natural measure width and opening score-def width of a quarter-note score
fn natural_widths() -> (f64, f64) {
    let mut doc = quarter_score(1);
    LayoutEngine::new(continuous()).layout(&mut doc);
    let m1 = doc.measure_by_n(1).unwrap();
    let system = doc.systems()[0];
    let score_def_width = doc[system].kind.as_system().unwrap().score_def_width;
    (measure_width(&doc, m1), score_def_width)
}

/// Page wide enough for two measures but not three
fn two_measure_options() -> LayoutOptions {
    let (width, score_def_width) = natural_widths();
    LayoutOptions {
        page_width: score_def_width + 2.2 * width,
        ..options()
    }
}

fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_greedy_break_by_width() {
    let options = two_measure_options();
    let mut doc = quarter_score(3);
    let result = LayoutEngine::new(options.clone()).layout(&mut doc);

    assert_eq!(system_partition(&doc), vec![ids(&["m1", "m2"]), ids(&["m3"])]);
    assert_eq!(result.system_count, 2);
    assert_eq!(result.page_count, 1);
    assert_eq!(result.diagnostics.count_kind("measure_overflow"), 0);
}

#[test]
fn test_partition_keeps_every_measure_in_order() {
    let options = two_measure_options();
    let mut doc = quarter_score(7);
    LayoutEngine::new(options).layout(&mut doc);

    let flat: Vec<String> = system_partition(&doc).into_iter().flatten().collect();
    assert_eq!(flat, ids(&["m1", "m2", "m3", "m4", "m5", "m6", "m7"]));
    assert_eq!(doc.system_count(), 4);
    for system in doc.systems() {
        assert!(!doc.children(system).is_empty());
    }
}

#[test]
fn test_layout_can_run_twice() {
    let options = two_measure_options();
    let mut doc = quarter_score(5);
    let engine = LayoutEngine::new(options);
    engine.layout(&mut doc);
    let first = system_partition(&doc);
    engine.layout(&mut doc);
    assert_eq!(system_partition(&doc), first);
    assert_eq!(doc.measures().len(), 5);
}

#[test]
fn test_encoded_system_break_is_honoured() {
    let mut doc = document(1);
    quarter_measure(&mut doc, 1);
    system_break(&mut doc);
    quarter_measure(&mut doc, 2);
    quarter_measure(&mut doc, 3);

    LayoutEngine::new(options()).layout(&mut doc);
    assert_eq!(system_partition(&doc), vec![ids(&["m1"]), ids(&["m2", "m3"])]);

    // The break travels with the measure it precedes
    let second = doc.systems()[1];
    let first_child = doc.children(second)[0];
    assert_eq!(doc[first_child].tag(), engraver::NodeTag::SystemBreak);
}

/// Encoded mode breaks at encoded system breaks only, however narrow or
/// short the page
#[test]
fn test_encoded_mode_ignores_width_and_height() {
    let score = || {
        let mut doc = quarter_score(3);
        system_break(&mut doc);
        quarter_measure(&mut doc, 4);
        quarter_measure(&mut doc, 5);
        doc
    };
    let narrow = LayoutOptions {
        page_height: 200.0,
        ..two_measure_options()
    };

    let mut encoded = score();
    let result = LayoutEngine::new(LayoutOptions {
        breaks: BreakMode::Encoded,
        ..narrow.clone()
    })
    .layout(&mut encoded);
    assert_eq!(
        system_partition(&encoded),
        vec![ids(&["m1", "m2", "m3"]), ids(&["m4", "m5"])]
    );
    assert_eq!(result.page_count, 1);

    let mut auto = score();
    let result = LayoutEngine::new(narrow).layout(&mut auto);
    assert_eq!(
        system_partition(&auto),
        vec![ids(&["m1", "m2"]), ids(&["m3"]), ids(&["m4", "m5"])]
    );
    assert!(result.page_count > 1);
}

#[test]
fn test_smart_mode_ignores_break_on_underfilled_system() {
    let mut doc = document(1);
    quarter_measure(&mut doc, 1);
    system_break(&mut doc);
    quarter_measure(&mut doc, 2);

    let options = LayoutOptions {
        breaks: BreakMode::Smart,
        ..options()
    };
    LayoutEngine::new(options).layout(&mut doc);
    assert_eq!(system_partition(&doc), vec![ids(&["m1", "m2"])]);
}

#[test]
fn test_continuous_mode_produces_one_system() {
    let mut doc = document(1);
    for n in 1..=6 {
        quarter_measure(&mut doc, n);
        if n % 2 == 0 {
            system_break(&mut doc);
        }
    }
    let result = LayoutEngine::new(continuous()).layout(&mut doc);
    assert_eq!(result.system_count, 1);
    assert_eq!(result.page_count, 1);
    assert_eq!(doc.measures_in_system(0).len(), 6);
}

#[test]
fn test_no_widow_pulls_last_measure_back() {
    let options = LayoutOptions {
        breaks_no_widow: true,
        ..two_measure_options()
    };
    let mut doc = quarter_score(3);
    LayoutEngine::new(options).layout(&mut doc);
    assert_eq!(system_partition(&doc), vec![ids(&["m1", "m2", "m3"])]);
}

#[test]
fn test_wide_measure_overflows_alone() {
    let mut doc = document(1);
    let m = measure(&mut doc, "m1", 1);
    let l = layer(&mut doc, m, 1);
    for i in 0..32 {
        add(&mut doc, l, &format!("s{}", i), note(DurationBase::N16));
    }

    let options = LayoutOptions {
        page_width: 300.0,
        ..options()
    };
    let result = LayoutEngine::new(options).layout(&mut doc);

    assert_eq!(result.diagnostics.count_kind("measure_overflow"), 1);
    let mark = result.diagnostics.of_kind("measure_overflow").next().unwrap();
    assert_eq!(mark.node.as_deref(), Some("m1"));
    assert_eq!(system_partition(&doc), vec![ids(&["m1"])]);

    // The overflowing system keeps its natural width
    let system = doc.systems()[0];
    assert!(doc[system].kind.as_system().unwrap().overflow);
    assert!(doc.element_at("s31").is_some());
}

/// Dots past the eighth neither count nor widen the rest
#[test]
fn test_excess_dots_do_not_widen_measure() {
    use engraver::models::{DurationAttrs, LayerElement, Rest};

    let mut doc = document(1);
    let m = measure(&mut doc, "m1", 1);
    let l = layer(&mut doc, m, 1);
    let dotted = Rest::new(DurationAttrs::new(DurationBase::Quarter).with_dots(200));
    add(&mut doc, l, "r1", engraver::NodeKind::Element(LayerElement::Rest(dotted)));

    let result = LayoutEngine::new(options()).layout(&mut doc);
    assert_eq!(result.diagnostics.count_kind("measure_overflow"), 0);
    assert!(measure_width(&doc, m) < options().content_width());
}

#[test]
fn test_pages_fill_by_height() {
    let mut doc = document(1);
    quarter_measure(&mut doc, 1);
    system_break(&mut doc);
    quarter_measure(&mut doc, 2);
    system_break(&mut doc);
    quarter_measure(&mut doc, 3);

    let options = LayoutOptions {
        page_height: 200.0,
        ..options()
    };
    let result = LayoutEngine::new(options).layout(&mut doc);
    assert_eq!(result.system_count, 3);
    assert_eq!(result.page_count, 3);
    for page in doc.pages() {
        assert_eq!(doc.children(page).len(), 1);
    }
}

#[test]
fn test_line_mode_keeps_one_page() {
    let mut doc = document(1);
    quarter_measure(&mut doc, 1);
    system_break(&mut doc);
    quarter_measure(&mut doc, 2);
    system_break(&mut doc);
    quarter_measure(&mut doc, 3);

    let options = LayoutOptions {
        page_height: 200.0,
        breaks: BreakMode::Line,
        ..options()
    };
    let result = LayoutEngine::new(options).layout(&mut doc);
    assert_eq!(result.system_count, 3);
    assert_eq!(result.page_count, 1);
}

#[test]
fn test_encoded_page_break_starts_new_page() {
    let mut doc = document(1);
    quarter_measure(&mut doc, 1);
    page_break(&mut doc);
    quarter_measure(&mut doc, 2);

    let result = LayoutEngine::new(options()).layout(&mut doc);
    assert_eq!(result.system_count, 2);
    assert_eq!(result.page_count, 2);
    let pages = doc.pages();
    assert_eq!(doc[pages[1]].id(), "page-2");
}

#[test]
fn test_empty_document_has_no_systems() {
    let mut doc = document(1);
    let result = LayoutEngine::new(options()).layout(&mut doc);
    assert_eq!(result.system_count, 0);
    assert_eq!(result.page_count, 0);
    assert!(result.diagnostics.is_empty());
}
