//! Layer elements
//!
//! The closed set of symbol-level node kinds. Each struct stores the
//! capability attributes it is made of; `LayerElement` exposes them as trait
//! objects so passes never match on concrete kinds to read time or pitch.

use serde::{Deserialize, Serialize};

use super::capabilities::{
    DurationInterface, Pitch, PitchInterface, PositionInterface, ScoreDefInterface,
};
use super::duration::DurationAttrs;
use super::score_def::{Clef, KeySig, MeterSig};

/// A note: duration + pitch + position
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Note {
    /// Notes inside a chord take the chord's duration and leave this unset
    #[serde(default)]
    pub duration: DurationAttrs,
    pub pitch: Pitch,
    #[serde(default)]
    pub loc: Option<i32>,
    #[serde(default)]
    pub cue: bool,
}

impl Note {
    pub fn new(duration: DurationAttrs, pitch: Pitch) -> Self {
        Self {
            duration,
            pitch,
            loc: None,
            cue: false,
        }
    }
}

impl DurationInterface for Note {
    fn duration_attrs(&self) -> &DurationAttrs {
        &self.duration
    }
}

impl PitchInterface for Note {
    fn pitch(&self) -> &Pitch {
        &self.pitch
    }
}

impl PositionInterface for Note {
    fn staff_loc(&self) -> Option<i32> {
        self.loc
    }
}

/// A rest: duration + position
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Rest {
    pub duration: DurationAttrs,
    #[serde(default)]
    pub loc: Option<i32>,
}

impl Rest {
    pub fn new(duration: DurationAttrs) -> Self {
        Self { duration, loc: None }
    }
}

impl DurationInterface for Rest {
    fn duration_attrs(&self) -> &DurationAttrs {
        &self.duration
    }
}

impl PositionInterface for Rest {
    fn staff_loc(&self) -> Option<i32> {
        self.loc
    }
}

/// Simultaneous notes sharing one duration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Chord {
    pub duration: DurationAttrs,
}

impl DurationInterface for Chord {
    fn duration_attrs(&self) -> &DurationAttrs {
        &self.duration
    }
}

/// Invisible time filler
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Space {
    pub duration: DurationAttrs,
}

impl DurationInterface for Space {
    fn duration_attrs(&self) -> &DurationAttrs {
        &self.duration
    }
}

fn default_true() -> bool {
    true
}

/// Rest filling the whole measure
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MRest {
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub loc: Option<i32>,
}

impl PositionInterface for MRest {
    fn staff_loc(&self) -> Option<i32> {
        self.loc
    }
}

/// Several measures of rest condensed into one
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MultiRest {
    pub num: u32,
    /// Placeholders may be invisible and then have no footprint
    #[serde(default = "default_true")]
    pub visible: bool,
}

/// Beam group; transparent for timing
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Beam {}

/// Tuplet group: `num` notes in the time of `numbase`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Tuplet {
    pub num: u32,
    pub numbase: u32,
}

/// Clef change inside a layer
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClefChange {
    pub clef: Clef,
}

impl ScoreDefInterface for ClefChange {
    fn clef(&self) -> Option<Clef> {
        Some(self.clef)
    }

    fn key_sig(&self) -> Option<KeySig> {
        None
    }

    fn meter_sig(&self) -> Option<MeterSig> {
        None
    }
}

/// Key signature change inside a layer
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KeySigChange {
    pub key: KeySig,
}

impl ScoreDefInterface for KeySigChange {
    fn clef(&self) -> Option<Clef> {
        None
    }

    fn key_sig(&self) -> Option<KeySig> {
        Some(self.key)
    }

    fn meter_sig(&self) -> Option<MeterSig> {
        None
    }
}

/// Meter signature change inside a layer
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MeterSigChange {
    pub meter: MeterSig,
}

impl ScoreDefInterface for MeterSigChange {
    fn clef(&self) -> Option<Clef> {
        None
    }

    fn key_sig(&self) -> Option<KeySig> {
        None
    }

    fn meter_sig(&self) -> Option<MeterSig> {
        Some(self.meter)
    }
}

/// Barline forms
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum BarLineForm {
    #[default]
    Single,
    Double,
    End,
    RptStart,
    RptEnd,
    Dashed,
    Invisible,
}

/// Barline inside a layer
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct BarLine {
    #[serde(default)]
    pub form: BarLineForm,
}

/// Symbol-level node kinds
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerElement {
    Note(Note),
    Rest(Rest),
    Chord(Chord),
    Space(Space),
    MRest(MRest),
    MultiRest(MultiRest),
    Beam(Beam),
    Tuplet(Tuplet),
    Clef(ClefChange),
    KeySig(KeySigChange),
    MeterSig(MeterSigChange),
    BarLine(BarLine),
}

impl LayerElement {
    /// Element name, used for identifiers and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            LayerElement::Note(_) => "note",
            LayerElement::Rest(_) => "rest",
            LayerElement::Chord(_) => "chord",
            LayerElement::Space(_) => "space",
            LayerElement::MRest(_) => "mRest",
            LayerElement::MultiRest(_) => "multiRest",
            LayerElement::Beam(_) => "beam",
            LayerElement::Tuplet(_) => "tuplet",
            LayerElement::Clef(_) => "clef",
            LayerElement::KeySig(_) => "keySig",
            LayerElement::MeterSig(_) => "meterSig",
            LayerElement::BarLine(_) => "barLine",
        }
    }

    pub fn as_duration(&self) -> Option<&dyn DurationInterface> {
        match self {
            LayerElement::Note(note) => Some(note),
            LayerElement::Rest(rest) => Some(rest),
            LayerElement::Chord(chord) => Some(chord),
            LayerElement::Space(space) => Some(space),
            _ => None,
        }
    }

    pub fn as_pitch(&self) -> Option<&dyn PitchInterface> {
        match self {
            LayerElement::Note(note) => Some(note),
            _ => None,
        }
    }

    pub fn as_position(&self) -> Option<&dyn PositionInterface> {
        match self {
            LayerElement::Note(note) => Some(note),
            LayerElement::Rest(rest) => Some(rest),
            LayerElement::MRest(mrest) => Some(mrest),
            _ => None,
        }
    }

    pub fn as_score_def(&self) -> Option<&dyn ScoreDefInterface> {
        match self {
            LayerElement::Clef(clef) => Some(clef),
            LayerElement::KeySig(key) => Some(key),
            LayerElement::MeterSig(meter) => Some(meter),
            _ => None,
        }
    }

    /// Elements filling a whole measure regardless of their content
    pub fn is_full_measure(&self) -> bool {
        matches!(self, LayerElement::MRest(_) | LayerElement::MultiRest(_))
    }

    pub fn is_grace(&self) -> bool {
        self.as_duration()
            .map(|d| d.is_grace_note())
            .unwrap_or(false)
    }

    /// Containers whose children are themselves layer elements
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            LayerElement::Chord(_) | LayerElement::Beam(_) | LayerElement::Tuplet(_)
        )
    }

    pub fn accepts_child(&self, child: &LayerElement) -> bool {
        match self {
            LayerElement::Chord(_) => matches!(child, LayerElement::Note(_)),
            LayerElement::Beam(_) | LayerElement::Tuplet(_) => matches!(
                child,
                LayerElement::Note(_)
                    | LayerElement::Rest(_)
                    | LayerElement::Chord(_)
                    | LayerElement::Space(_)
                    | LayerElement::Beam(_)
                    | LayerElement::Tuplet(_)
                    | LayerElement::Clef(_)
            ),
            _ => false,
        }
    }
}
