//! Score model
//!
//! Plain data: element kinds, their capability interfaces, durations, score
//! definitions and geometry. Nothing here knows about the tree or the passes.

pub mod bbox;
pub mod capabilities;
pub mod control;
pub mod duration;
pub mod elements;
pub mod score_def;

pub use bbox::{Axis, BoundingBox, Offset, Rect};
pub use capabilities::{
    Accidental, DurationInterface, Pitch, PitchInterface, PitchName, PositionInterface,
    ScoreDefInterface, TimePointAttrs, TimePointInterface, TimeSpanningAttrs, TimeSpanningInterface,
};
pub use control::{ControlElement, CurveDir, Dir, Dynam, Hairpin, HairpinForm, Placement, Slur, Tempo, Tie};
pub use duration::{DurationAttrs, DurationBase, Onset, TupletRatio};
pub use elements::{
    BarLine, BarLineForm, Beam, Chord, ClefChange, KeySigChange, LayerElement, MRest, MeterSigChange,
    MultiRest, Note, Rest, Space, Tuplet,
};
pub use score_def::{
    Clef, ClefShape, KeySig, MeterSig, ScoreDef, ScoreDefChange, ScoreDefState, StaffClef, StaffDef,
};
