//! Glyph metrics
//!
//! The engine does not know glyph shapes. A `GlyphMetrics` implementation
//! supplies the footprint of each symbol, relative to its anchor point and in
//! the current staff unit.

use crate::models::bbox::Rect;
use crate::models::control::ControlElement;
use crate::models::elements::{BarLineForm, LayerElement};
use crate::models::score_def::{Clef, KeySig, MeterSig};

/// Dots drawn at most, matching the dots that count towards a duration
const MAX_DRAWN_DOTS: u8 = 8;
/// Height given to curves and hairpins, in units
pub const CURVE_HEIGHT: f64 = 2.0;
/// Distance kept between a control element and what it decorates, in units
pub const CONTROL_MARGIN: f64 = 1.5;

/// Source of symbol footprints
pub trait GlyphMetrics {
    /// Footprint of a layer element relative to its anchor, `None` when it
    /// draws nothing by itself
    fn element_box(&self, element: &LayerElement, unit: f64, staff_height: f64) -> Option<Rect>;

    fn barline_box(&self, form: BarLineForm, unit: f64, staff_height: f64) -> Option<Rect>;

    fn clef_width(&self, clef: &Clef, unit: f64) -> f64;

    fn key_sig_width(&self, key: &KeySig, unit: f64) -> f64;

    fn meter_sig_width(&self, meter: &MeterSig, unit: f64) -> f64;

    /// Footprint of a single-point control element (text, dynamics)
    fn control_box(&self, control: &ControlElement, unit: f64) -> Option<Rect>;

    /// Size of grace notes relative to normal ones
    fn grace_scale(&self) -> f64 {
        0.75
    }
}

/// Footprint of a control element relative to its start x and its top.
/// Spanning elements get `span` as their width.
pub fn control_footprint(metrics: &dyn GlyphMetrics, control: &ControlElement, span: f64, unit: f64) -> Rect {
    match control.as_time_spanning() {
        Some(_) => Rect::new(0.0, 0.0, span.max(unit), CURVE_HEIGHT * unit),
        None => {
            let rect = metrics
                .control_box(control, unit)
                .unwrap_or_else(|| Rect::new(0.0, 0.0, unit, unit));
            rect.translate(0.0, -rect.y1)
        }
    }
}

/// Staff-unit based footprints, usable without a font database
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultMetrics;

impl GlyphMetrics for DefaultMetrics {
    fn element_box(&self, element: &LayerElement, unit: f64, staff_height: f64) -> Option<Rect> {
        let u = unit;
        match element {
            LayerElement::Note(note) => {
                let mut rect = Rect::new(0.0, -u, 2.5 * u, u);
                if note.duration.base.map(|b| b.has_stem()).unwrap_or(false) {
                    rect.y1 = -7.0 * u;
                }
                if note.pitch.accid.is_some() {
                    rect.x1 = -2.0 * u;
                }
                rect.x2 += note.duration.dots.min(MAX_DRAWN_DOTS) as f64 * 1.2 * u;
                Some(rect)
            }
            LayerElement::Rest(rest) => {
                let mut rect = Rect::new(0.0, -3.0 * u, 2.0 * u, 3.0 * u);
                rect.x2 += rest.duration.dots.min(MAX_DRAWN_DOTS) as f64 * 1.2 * u;
                Some(rect)
            }
            LayerElement::MRest(mrest) if mrest.visible => Some(Rect::new(0.0, -u, 4.0 * u, 0.0)),
            LayerElement::MultiRest(rest) if rest.visible => {
                Some(Rect::new(0.0, -u, 10.0 * u, u))
            }
            LayerElement::Clef(change) => {
                Some(Rect::new(0.0, -2.0 * u, self.clef_width(&change.clef, u), staff_height + 2.0 * u))
            }
            LayerElement::KeySig(change) if change.key.fifths != 0 => {
                Some(Rect::new(0.0, -u, self.key_sig_width(&change.key, u), staff_height))
            }
            LayerElement::MeterSig(change) => {
                Some(Rect::new(0.0, 0.0, self.meter_sig_width(&change.meter, u), staff_height))
            }
            LayerElement::BarLine(barline) => self.barline_box(barline.form, u, staff_height),
            _ => None,
        }
    }

    fn barline_box(&self, form: BarLineForm, unit: f64, staff_height: f64) -> Option<Rect> {
        let width = match form {
            BarLineForm::Single | BarLineForm::Dashed => 0.3,
            BarLineForm::Double => 1.0,
            BarLineForm::End => 1.5,
            BarLineForm::RptStart | BarLineForm::RptEnd => 2.5,
            BarLineForm::Invisible => return None,
        };
        Some(Rect::new(0.0, 0.0, width * unit, staff_height.max(unit)))
    }

    fn clef_width(&self, _clef: &Clef, unit: f64) -> f64 {
        3.0 * unit
    }

    fn key_sig_width(&self, key: &KeySig, unit: f64) -> f64 {
        key.accidental_count() as f64 * 1.2 * unit
    }

    fn meter_sig_width(&self, meter: &MeterSig, unit: f64) -> f64 {
        let digits = meter.count.max(meter.unit).to_string().len();
        digits as f64 * 2.0 * unit
    }

    fn control_box(&self, control: &ControlElement, unit: f64) -> Option<Rect> {
        let text = match control {
            ControlElement::Dynam(dynam) => &dynam.text,
            ControlElement::Tempo(tempo) => &tempo.text,
            ControlElement::Dir(dir) => &dir.text,
            _ => return None,
        };
        let chars = text.chars().count().max(1) as f64;
        Some(Rect::new(0.0, 0.0, chars * 1.5 * unit, 2.5 * unit))
    }
}
