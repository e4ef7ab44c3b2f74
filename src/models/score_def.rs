//! Score definition: staff definitions, clefs, key and meter signatures
//!
//! The document-level `ScoreDef` is the inheritance fallback for everything
//! that a layer-level clef/key/meter change or a mid-score `ScoreDefChange`
//! does not override.

use std::collections::BTreeMap;

use num_rational::Ratio;
use serde::{Deserialize, Serialize};

use super::capabilities::ScoreDefInterface;
use super::duration::Onset;

/// Clef shapes
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ClefShape {
    G,
    F,
    C,
    Perc,
}

/// A clef: shape, staff line it sits on (1 = bottom line) and octave shift
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Clef {
    pub shape: ClefShape,
    pub line: u8,
    #[serde(default)]
    pub octave_displacement: i8,
}

impl Clef {
    pub fn new(shape: ClefShape, line: u8) -> Self {
        Self {
            shape,
            line,
            octave_displacement: 0,
        }
    }

    pub fn treble() -> Self {
        Self::new(ClefShape::G, 2)
    }

    pub fn bass() -> Self {
        Self::new(ClefShape::F, 4)
    }

    pub fn alto() -> Self {
        Self::new(ClefShape::C, 3)
    }

    /// Diatonic index (octave * 7 + step) of the pitch the clef names
    pub fn reference_diatonic(&self) -> i32 {
        let (octave, step) = match self.shape {
            ClefShape::G => (4, 4),
            ClefShape::F => (3, 3),
            ClefShape::C | ClefShape::Perc => (4, 0),
        };
        (octave + self.octave_displacement as i32) * 7 + step
    }

    /// Staff location (half-spaces above the bottom line) of the reference pitch
    pub fn reference_loc(&self) -> i32 {
        (self.line.max(1) as i32 - 1) * 2
    }
}

impl Default for Clef {
    fn default() -> Self {
        Self::treble()
    }
}

/// Key signature: positive for sharps, negative for flats
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct KeySig {
    pub fifths: i8,
}

impl KeySig {
    pub fn new(fifths: i8) -> Self {
        Self { fifths }
    }

    /// Number of accidentals drawn
    pub fn accidental_count(&self) -> u32 {
        self.fifths.unsigned_abs() as u32
    }
}

/// Meter signature (`count` beats of `unit`)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeterSig {
    pub count: u32,
    pub unit: u32,
}

impl MeterSig {
    pub fn new(count: u32, unit: u32) -> Self {
        Self { count, unit }
    }

    /// Nominal measure length in whole notes
    pub fn measure_duration(&self) -> Onset {
        Ratio::new(self.count as i64, self.unit.max(1) as i64)
    }

    /// Length of one beat in whole notes
    pub fn beat_duration(&self) -> Onset {
        Ratio::new(1, self.unit.max(1) as i64)
    }
}

impl Default for MeterSig {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

fn default_lines() -> u8 {
    5
}

/// Definition of one staff
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StaffDef {
    /// Staff number, matched against `Staff::n`
    pub n: u32,
    #[serde(default = "default_lines")]
    pub lines: u8,
    #[serde(default)]
    pub clef: Clef,
    #[serde(default)]
    pub key: Option<KeySig>,
    #[serde(default)]
    pub meter: Option<MeterSig>,
    /// Hidden staves take no vertical room
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub label: Option<String>,
}

impl StaffDef {
    pub fn new(n: u32, clef: Clef) -> Self {
        Self {
            n,
            lines: 5,
            clef,
            key: None,
            meter: None,
            hidden: false,
            label: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

impl ScoreDefInterface for StaffDef {
    fn clef(&self) -> Option<Clef> {
        Some(self.clef)
    }

    fn key_sig(&self) -> Option<KeySig> {
        self.key
    }

    fn meter_sig(&self) -> Option<MeterSig> {
        self.meter
    }
}

/// Document-level score definition
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct ScoreDef {
    pub staff_defs: Vec<StaffDef>,
    #[serde(default)]
    pub key: Option<KeySig>,
    #[serde(default)]
    pub meter: Option<MeterSig>,
}

impl ScoreDef {
    pub fn new(staff_defs: Vec<StaffDef>) -> Self {
        Self {
            staff_defs,
            key: None,
            meter: None,
        }
    }

    pub fn with_meter(mut self, meter: MeterSig) -> Self {
        self.meter = Some(meter);
        self
    }

    pub fn with_key(mut self, key: KeySig) -> Self {
        self.key = Some(key);
        self
    }

    pub fn staff_def(&self, n: u32) -> Option<&StaffDef> {
        self.staff_defs.iter().find(|def| def.n == n)
    }
}

impl ScoreDefInterface for ScoreDef {
    fn clef(&self) -> Option<Clef> {
        None
    }

    fn key_sig(&self) -> Option<KeySig> {
        self.key
    }

    fn meter_sig(&self) -> Option<MeterSig> {
        self.meter
    }
}

/// Clef change for one staff inside a `ScoreDefChange`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct StaffClef {
    pub n: u32,
    pub clef: Clef,
}

/// Mid-score change of the score definition, placed between measures
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct ScoreDefChange {
    #[serde(default)]
    pub key: Option<KeySig>,
    #[serde(default)]
    pub meter: Option<MeterSig>,
    #[serde(default)]
    pub clefs: Vec<StaffClef>,
}

impl ScoreDefInterface for ScoreDefChange {
    fn clef(&self) -> Option<Clef> {
        None
    }

    fn key_sig(&self) -> Option<KeySig> {
        self.key
    }

    fn meter_sig(&self) -> Option<MeterSig> {
        self.meter
    }
}

/// Clefs, key and meter in effect at one point of a traversal
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ScoreDefState {
    clefs: BTreeMap<u32, Clef>,
    pub key: KeySig,
    pub meter: MeterSig,
}

impl ScoreDefState {
    pub fn from_score_def(score_def: &ScoreDef) -> Self {
        let clefs = score_def
            .staff_defs
            .iter()
            .map(|def| (def.n, def.clef))
            .collect();
        let first = score_def.staff_defs.first();
        Self {
            clefs,
            key: score_def
                .key
                .or_else(|| first.and_then(|def| def.key))
                .unwrap_or_default(),
            meter: score_def
                .meter
                .or_else(|| first.and_then(|def| def.meter))
                .unwrap_or_default(),
        }
    }

    pub fn clef(&self, staff_n: u32) -> Clef {
        self.clefs.get(&staff_n).copied().unwrap_or_default()
    }

    pub fn set_clef(&mut self, staff_n: u32, clef: Clef) {
        self.clefs.insert(staff_n, clef);
    }

    /// Take over the key and meter a score-def element carries
    pub fn apply<T: ScoreDefInterface + ?Sized>(&mut self, change: &T) {
        if let Some(key) = change.key_sig() {
            self.key = key;
        }
        if let Some(meter) = change.meter_sig() {
            self.meter = meter;
        }
    }

    pub fn apply_change(&mut self, change: &ScoreDefChange) {
        self.apply(change);
        for staff_clef in &change.clefs {
            self.set_clef(staff_clef.n, staff_clef.clef);
        }
    }
}
