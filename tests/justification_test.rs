mod common;

use common::*;
use engraver::layout::{JustificationMode, LayoutOptions};
use engraver::{Document, LayoutEngine};
use pretty_assertions::assert_eq;

fn score(measures: u32, break_every: Option<u32>) -> Document {
    let mut doc = document(1);
    for n in 1..=measures {
        if let Some(every) = break_every {
            if n > 1 && (n - 1) % every == 0 {
                system_break(&mut doc);
            }
        }
        quarter_measure(&mut doc, n);
    }
    doc
}

fn system_widths(doc: &Document) -> Vec<(f64, f64, bool)> {
    doc.systems()
        .into_iter()
        .map(|s| {
            let system = doc[s].kind.as_system().unwrap();
            (system.score_def_width, system.measures_width, system.overflow)
        })
        .collect()
}

#[test]
fn test_systems_fill_the_content_width() {
    let options = LayoutOptions {
        page_width: 1000.0,
        ..options()
    };
    let mut doc = score(9, None);
    LayoutEngine::new(options.clone()).layout(&mut doc);
    assert!(doc.system_count() > 1);

    for (score_def_width, measures_width, overflow) in system_widths(&doc) {
        assert!(!overflow);
        assert!((score_def_width + measures_width - options.content_width()).abs() < 1e-3);
    }

    // The last measure of a system ends at the right margin
    let last = *doc.measures_in_system(0).last().unwrap();
    let bounds = doc.element_at(doc[last].id()).unwrap().bounds;
    assert!((bounds.x2 - options.content_width()).abs() < 1e-3);
}

#[test]
fn test_justification_keeps_order() {
    let options = LayoutOptions {
        page_width: 1000.0,
        ..options()
    };
    let mut doc = score(4, None);
    LayoutEngine::new(options).layout(&mut doc);

    for n in 1..=4 {
        let xs: Vec<f64> = (1..=4)
            .map(|i| doc.element_at(&format!("m{}-q{}", n, i)).unwrap().x)
            .collect();
        assert!(xs.windows(2).all(|pair| pair[0] < pair[1]));
    }
}

#[test]
fn test_stretched_gaps_are_proportional() {
    let mut doc = score(1, None);
    LayoutEngine::new(options()).layout(&mut doc);

    // Equal durations get equal stretch
    let xs: Vec<f64> = (1..=4)
        .map(|i| doc.element_at(&format!("m1-q{}", i)).unwrap().x)
        .collect();
    let first = xs[1] - xs[0];
    for pair in xs.windows(2) {
        assert!((pair[1] - pair[0] - first).abs() < 1e-6);
    }
}

#[test]
fn test_short_last_system_keeps_natural_width() {
    let mut natural = score(1, None);
    LayoutEngine::new(continuous()).layout(&mut natural);
    let (score_def_width, width, _) = system_widths(&natural)[0];

    let options = LayoutOptions {
        page_width: score_def_width + 2.2 * width,
        min_last_justification: 0.5,
        ..options()
    };
    let mut doc = score(3, None);
    LayoutEngine::new(options.clone()).layout(&mut doc);

    let widths = system_widths(&doc);
    assert_eq!(widths.len(), 2);
    assert!((widths[0].0 + widths[0].1 - options.content_width()).abs() < 1e-3);
    assert_close(widths[1].1, width);
}

#[test]
fn test_no_horizontal_justification_in_continuous_mode() {
    let mut doc = score(3, None);
    LayoutEngine::new(continuous()).layout(&mut doc);
    let (_, measures_width, _) = system_widths(&doc)[0];
    let natural: f64 = doc.measures().into_iter().map(|m| measure_width(&doc, m)).sum();
    assert_close(measures_width, natural);
}

#[test]
fn test_layout_is_idempotent() {
    let options = LayoutOptions {
        page_width: 1000.0,
        ..options()
    };
    let engine = LayoutEngine::new(options);
    let mut doc = score(6, Some(4));
    engine.layout(&mut doc);
    let first = engine.display_list(&doc);
    engine.layout(&mut doc);
    let second = engine.display_list(&doc);
    assert_eq!(first, second);
}

#[test]
fn test_fill_spreads_systems_down_the_page() {
    let fill = LayoutOptions {
        page_height: 400.0,
        justification: JustificationMode::Fill,
        ..options()
    };
    let compact = LayoutOptions {
        justification: JustificationMode::Compact,
        ..fill.clone()
    };

    let mut filled = score(2, Some(1));
    let engine = LayoutEngine::new(fill);
    engine.layout(&mut filled);
    assert_eq!(filled.page_count(), 1);
    let list = engine.display_list(&filled);
    let systems = &list.pages[0].systems;
    assert_eq!(systems.len(), 2);
    assert_close(systems[0].bounds.y1, 0.0);
    assert_close(systems[1].bounds.y2, 400.0);

    let mut packed = score(2, Some(1));
    let engine = LayoutEngine::new(compact);
    engine.layout(&mut packed);
    let compact_list = engine.display_list(&packed);
    let compact_systems = &compact_list.pages[0].systems;
    assert!(compact_systems[1].bounds.y2 < 400.0 - 1.0);
    assert!(compact_systems[1].bounds.y1 < systems[1].bounds.y1);
    assert_close(compact_systems[0].bounds.y1, systems[0].bounds.y1);
}

#[test]
fn test_last_page_with_much_free_space_is_not_filled() {
    let options = LayoutOptions {
        page_height: 2000.0,
        ..options()
    };
    let mut doc = score(2, Some(1));
    let engine = LayoutEngine::new(options);
    engine.layout(&mut doc);
    let list = engine.display_list(&doc);
    assert!(list.pages[0].systems[1].bounds.y2 < 1000.0);
}
