//! Capability interfaces
//!
//! Element types compose a subset of these narrow facets. The layout passes
//! only ever talk to elements through them, so a new element kind built from
//! existing facets needs no change in the alignment or cast-off code.

use serde::{Deserialize, Serialize};

use super::duration::{zero, DurationAttrs, DurationBase, Onset, TupletRatio};
use super::score_def::{Clef, KeySig, MeterSig};
use crate::errors::DurationError;

/// Timed elements
pub trait DurationInterface {
    fn duration_attrs(&self) -> &DurationAttrs;

    fn duration_value(&self) -> Option<DurationBase> {
        self.duration_attrs().base
    }

    fn num_dots(&self) -> u8 {
        self.duration_attrs().dots
    }

    fn is_grace_note(&self) -> bool {
        self.duration_attrs().grace
    }

    fn alignment_duration(&self, tuplet: TupletRatio) -> Result<Onset, DurationError> {
        self.duration_attrs().alignment_duration(tuplet)
    }
}

/// Pitch names in diatonic order
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PitchName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl PitchName {
    pub fn step(self) -> i32 {
        self as i32
    }
}

/// Written accidentals
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

/// Written pitch
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub pname: PitchName,
    pub oct: i8,
    #[serde(default)]
    pub accid: Option<Accidental>,
}

impl Pitch {
    pub fn new(pname: PitchName, oct: i8) -> Self {
        Self {
            pname,
            oct,
            accid: None,
        }
    }

    pub fn with_accid(mut self, accid: Accidental) -> Self {
        self.accid = Some(accid);
        self
    }

    pub fn diatonic(&self) -> i32 {
        self.oct as i32 * 7 + self.pname.step()
    }
}

/// Pitched elements
pub trait PitchInterface {
    fn pitch(&self) -> &Pitch;

    /// Staff location (half-spaces above the bottom line) under `clef`
    fn loc_for_clef(&self, clef: &Clef) -> i32 {
        self.pitch().diatonic() - clef.reference_diatonic() + clef.reference_loc()
    }
}

/// Elements with an explicit vertical location
pub trait PositionInterface {
    /// Staff location overriding any pitch-derived one
    fn staff_loc(&self) -> Option<i32>;
}

/// Attributes of events attached to one point in time
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct TimePointAttrs {
    /// Identifier of the layer element the event is attached to
    #[serde(default)]
    pub startid: Option<String>,
    /// Beat position inside the measure (1-based)
    #[serde(default)]
    pub tstamp: Option<f64>,
    /// Staff the event belongs to
    #[serde(default)]
    pub staff: Option<u32>,
}

impl TimePointAttrs {
    pub fn at_id(startid: impl Into<String>) -> Self {
        Self {
            startid: Some(startid.into()),
            ..Self::default()
        }
    }

    pub fn at_tstamp(tstamp: f64, staff: u32) -> Self {
        Self {
            startid: None,
            tstamp: Some(tstamp),
            staff: Some(staff),
        }
    }
}

/// Attributes of events spanning from one point to another
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct TimeSpanningAttrs {
    #[serde(flatten)]
    pub start: TimePointAttrs,
    #[serde(default)]
    pub endid: Option<String>,
    /// Measures ahead and beat position of the end
    #[serde(default)]
    pub tstamp2: Option<(u32, f64)>,
}

impl TimeSpanningAttrs {
    pub fn between(startid: impl Into<String>, endid: impl Into<String>) -> Self {
        Self {
            start: TimePointAttrs::at_id(startid),
            endid: Some(endid.into()),
            tstamp2: None,
        }
    }
}

/// Events attached to a point in time
pub trait TimePointInterface {
    fn time_point(&self) -> &TimePointAttrs;

    fn start_anchor_id(&self) -> Option<&str> {
        self.time_point().startid.as_deref()
    }

    fn tstamp(&self) -> Option<f64> {
        self.time_point().tstamp
    }

    fn staff_n(&self) -> Option<u32> {
        self.time_point().staff
    }
}

/// Events spanning between two points in time
pub trait TimeSpanningInterface: TimePointInterface {
    fn time_spanning(&self) -> &TimeSpanningAttrs;

    fn end_anchor_id(&self) -> Option<&str> {
        self.time_spanning().endid.as_deref()
    }

    fn tstamp2(&self) -> Option<(u32, f64)> {
        self.time_spanning().tstamp2
    }
}

/// Elements that change the running score definition
pub trait ScoreDefInterface {
    fn clef(&self) -> Option<Clef>;
    fn key_sig(&self) -> Option<KeySig>;
    fn meter_sig(&self) -> Option<MeterSig>;
}

/// Time advance of a timed element: grace notes advance nothing
pub fn onset_advance<T>(element: &T, tuplet: TupletRatio) -> Result<Onset, DurationError>
where
    T: DurationInterface + ?Sized,
{
    if element.is_grace_note() {
        return Ok(zero());
    }
    element.alignment_duration(tuplet)
}

/// Vertical location: an explicit position wins over the pitch
pub fn staff_location<T>(element: &T, clef: &Clef) -> i32
where
    T: PitchInterface + PositionInterface + ?Sized,
{
    element
        .staff_loc()
        .unwrap_or_else(|| element.loc_for_clef(clef))
}
