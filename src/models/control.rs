//! Control (floating) elements
//!
//! Slurs, ties, hairpins, dynamics, tempo and directives live under a
//! measure, outside the staff/layer hierarchy. They reach the notes they
//! decorate only through identifiers, resolved at layout time.

use serde::{Deserialize, Serialize};

use super::capabilities::{
    TimePointAttrs, TimePointInterface, TimeSpanningAttrs, TimeSpanningInterface,
};

/// Curve direction of slurs and ties
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CurveDir {
    Above,
    Below,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Slur {
    #[serde(flatten)]
    pub span: TimeSpanningAttrs,
    #[serde(default)]
    pub curvedir: Option<CurveDir>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Tie {
    #[serde(flatten)]
    pub span: TimeSpanningAttrs,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HairpinForm {
    Cres,
    Dim,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Hairpin {
    #[serde(flatten)]
    pub span: TimeSpanningAttrs,
    pub form: HairpinForm,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Dynam {
    #[serde(flatten)]
    pub point: TimePointAttrs,
    pub text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Tempo {
    #[serde(flatten)]
    pub point: TimePointAttrs,
    #[serde(default)]
    pub text: String,
    /// Metronome mark in beats per minute
    #[serde(default)]
    pub mm: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Dir {
    #[serde(flatten)]
    pub point: TimePointAttrs,
    pub text: String,
}

/// Where a control element is drawn relative to its staff
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Above,
    Below,
}

/// Floating node kinds
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlElement {
    Slur(Slur),
    Tie(Tie),
    Hairpin(Hairpin),
    Dynam(Dynam),
    Tempo(Tempo),
    Dir(Dir),
}

impl TimePointInterface for Slur {
    fn time_point(&self) -> &TimePointAttrs {
        &self.span.start
    }
}

impl TimeSpanningInterface for Slur {
    fn time_spanning(&self) -> &TimeSpanningAttrs {
        &self.span
    }
}

impl TimePointInterface for Tie {
    fn time_point(&self) -> &TimePointAttrs {
        &self.span.start
    }
}

impl TimeSpanningInterface for Tie {
    fn time_spanning(&self) -> &TimeSpanningAttrs {
        &self.span
    }
}

impl TimePointInterface for Hairpin {
    fn time_point(&self) -> &TimePointAttrs {
        &self.span.start
    }
}

impl TimeSpanningInterface for Hairpin {
    fn time_spanning(&self) -> &TimeSpanningAttrs {
        &self.span
    }
}

impl TimePointInterface for Dynam {
    fn time_point(&self) -> &TimePointAttrs {
        &self.point
    }
}

impl TimePointInterface for Tempo {
    fn time_point(&self) -> &TimePointAttrs {
        &self.point
    }
}

impl TimePointInterface for Dir {
    fn time_point(&self) -> &TimePointAttrs {
        &self.point
    }
}

impl ControlElement {
    pub fn slur(startid: impl Into<String>, endid: impl Into<String>) -> Self {
        ControlElement::Slur(Slur {
            span: TimeSpanningAttrs::between(startid, endid),
            curvedir: None,
        })
    }

    pub fn tie(startid: impl Into<String>, endid: impl Into<String>) -> Self {
        ControlElement::Tie(Tie {
            span: TimeSpanningAttrs::between(startid, endid),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ControlElement::Slur(_) => "slur",
            ControlElement::Tie(_) => "tie",
            ControlElement::Hairpin(_) => "hairpin",
            ControlElement::Dynam(_) => "dynam",
            ControlElement::Tempo(_) => "tempo",
            ControlElement::Dir(_) => "dir",
        }
    }

    pub fn as_time_point(&self) -> &dyn TimePointInterface {
        match self {
            ControlElement::Slur(slur) => slur,
            ControlElement::Tie(tie) => tie,
            ControlElement::Hairpin(hairpin) => hairpin,
            ControlElement::Dynam(dynam) => dynam,
            ControlElement::Tempo(tempo) => tempo,
            ControlElement::Dir(dir) => dir,
        }
    }

    pub fn as_time_spanning(&self) -> Option<&dyn TimeSpanningInterface> {
        match self {
            ControlElement::Slur(slur) => Some(slur),
            ControlElement::Tie(tie) => Some(tie),
            ControlElement::Hairpin(hairpin) => Some(hairpin),
            _ => None,
        }
    }

    pub fn placement(&self) -> Placement {
        match self {
            ControlElement::Slur(Slur {
                curvedir: Some(CurveDir::Below),
                ..
            }) => Placement::Below,
            ControlElement::Dynam(_) | ControlElement::Hairpin(_) => Placement::Below,
            _ => Placement::Above,
        }
    }
}
