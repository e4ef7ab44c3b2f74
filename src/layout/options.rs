//! Layout options
//!
//! A flat set of named options with documented defaults. Options are read
//! from JSON; unknown keys are ignored and out-of-range values are clamped.

use serde::{Deserialize, Serialize};

use crate::align::horizontal::SpacingParams;
use crate::errors::OptionsError;
use crate::models::duration::Onset;

/// How the content is broken into systems and pages
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BreakMode {
    /// Fill systems to the page width, honour encoded breaks
    #[default]
    Auto,
    /// One continuous system on one page
    None,
    /// Systems as in `Auto`, all on one page
    Line,
    /// Only encoded system and page breaks
    Encoded,
    /// Encoded system breaks only once the system is filled enough
    Smart,
}

/// Vertical justification
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum JustificationMode {
    /// Spread free page height over system and staff gaps
    #[default]
    Fill,
    /// Keep natural spacing
    Compact,
}

/// Options consumed by the layout engine
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LayoutOptions {
    pub page_width: f64,
    pub page_height: f64,
    pub page_margin_left: f64,
    pub page_margin_right: f64,
    pub page_margin_top: f64,
    pub page_margin_bottom: f64,

    /// Half the distance between two staff lines
    pub unit: f64,
    /// Scale in percent
    pub scale: f64,

    pub spacing_linear: f64,
    pub spacing_non_linear: f64,
    /// Minimal space between staves, in units
    pub spacing_staff: f64,
    /// Minimal space between systems, in units
    pub spacing_system: f64,
    /// Narrowest distance between two content slots, in units
    pub min_slot_width: f64,

    pub breaks: BreakMode,
    pub breaks_smart_sb: f64,
    pub breaks_no_widow: bool,

    pub justification: JustificationMode,
    pub justify_horizontally: bool,
    /// Leave the last system unjustified when it would be stretched by more
    /// than `1 / min_last_justification`; 0 always justifies it
    pub min_last_justification: f64,
    pub justification_system: f64,
    pub justification_staff: f64,
    pub justification_max_vertical: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            page_width: 2100.0,
            page_height: 2970.0,
            page_margin_left: 50.0,
            page_margin_right: 50.0,
            page_margin_top: 50.0,
            page_margin_bottom: 50.0,
            unit: 9.0,
            scale: 100.0,
            spacing_linear: 0.25,
            spacing_non_linear: 0.6,
            spacing_staff: 8.0,
            spacing_system: 12.0,
            min_slot_width: 2.0,
            breaks: BreakMode::Auto,
            breaks_smart_sb: 0.66,
            breaks_no_widow: false,
            justification: JustificationMode::Fill,
            justify_horizontally: true,
            min_last_justification: 0.0,
            justification_system: 1.0,
            justification_staff: 1.0,
            justification_max_vertical: 0.3,
        }
    }
}

impl LayoutOptions {
    /// Read options from JSON, then clamp them to their valid ranges
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        let options: LayoutOptions = serde_json::from_str(json)?;
        Ok(options.normalized())
    }

    /// Clamp every numeric option to its documented range
    pub fn normalized(mut self) -> Self {
        self.page_width = self.page_width.clamp(100.0, 60000.0);
        self.page_height = self.page_height.clamp(100.0, 60000.0);
        let max_h = self.page_width / 2.0 - 1.0;
        let max_v = self.page_height / 2.0 - 1.0;
        self.page_margin_left = self.page_margin_left.clamp(0.0, max_h);
        self.page_margin_right = self.page_margin_right.clamp(0.0, max_h);
        self.page_margin_top = self.page_margin_top.clamp(0.0, max_v);
        self.page_margin_bottom = self.page_margin_bottom.clamp(0.0, max_v);
        self.unit = self.unit.clamp(1.0, 100.0);
        self.scale = self.scale.clamp(1.0, 1000.0);
        self.spacing_linear = self.spacing_linear.clamp(0.0, 1.0);
        self.spacing_non_linear = self.spacing_non_linear.clamp(0.0, 1.0);
        self.spacing_staff = self.spacing_staff.clamp(0.0, 24.0);
        self.spacing_system = self.spacing_system.clamp(0.0, 48.0);
        self.min_slot_width = self.min_slot_width.clamp(0.0, 24.0);
        self.breaks_smart_sb = self.breaks_smart_sb.clamp(0.0, 1.0);
        self.min_last_justification = self.min_last_justification.clamp(0.0, 1.0);
        self.justification_system = self.justification_system.clamp(0.0, 10.0);
        self.justification_staff = self.justification_staff.clamp(0.0, 10.0);
        self.justification_max_vertical = self.justification_max_vertical.clamp(0.0, 1.0);
        self
    }

    /// Staff unit after scaling
    pub fn scaled_unit(&self) -> f64 {
        self.unit * self.scale / 100.0
    }

    /// Width available to systems
    pub fn content_width(&self) -> f64 {
        if self.breaks == BreakMode::None {
            return f64::INFINITY;
        }
        self.page_width - self.page_margin_left - self.page_margin_right
    }

    /// Height available to systems
    pub fn content_height(&self) -> f64 {
        self.page_height - self.page_margin_top - self.page_margin_bottom
    }

    pub fn spacing_params(&self, longest: Onset) -> SpacingParams {
        let unit = self.scaled_unit();
        SpacingParams {
            linear: self.spacing_linear,
            non_linear: self.spacing_non_linear,
            scale: self.scale / 100.0,
            margin: unit,
            min_slot_width: self.min_slot_width * unit,
            longest,
        }
    }
}
