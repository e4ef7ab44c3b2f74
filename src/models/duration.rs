//! Durations and onset arithmetic
//!
//! Time is measured in whole notes and kept as an exact rational so that
//! tuplets and dotted values never accumulate rounding drift.

use num_rational::Ratio;
use num_traits::{CheckedDiv, CheckedMul, CheckedSub};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::DurationError;

/// Time offset (or length) in whole notes
pub type Onset = Ratio<i64>;

/// Zero onset
pub fn zero() -> Onset {
    Ratio::from_integer(0)
}

/// Onset as a float, for spacing computations only
pub fn onset_to_f64(onset: Onset) -> f64 {
    *onset.numer() as f64 / *onset.denom() as f64
}

/// Length from `from` to `to` as a float, exact while the difference fits
pub fn span_f64(from: Onset, to: Onset) -> f64 {
    match to.checked_sub(&from) {
        Some(span) => onset_to_f64(span),
        None => onset_to_f64(to) - onset_to_f64(from),
    }
}

/// Written duration, encoded with the same numeric codes as the score model
#[derive(Serialize_repr, Deserialize_repr, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DurationBase {
    Long = 0,
    Breve = 1,
    Whole = 2,
    Half = 3,
    Quarter = 4,
    Eighth = 5,
    N16 = 6,
    N32 = 7,
    N64 = 8,
    N128 = 9,
    N256 = 10,
}

impl DurationBase {
    pub fn from_code(code: u8) -> Option<Self> {
        use DurationBase::*;
        Some(match code {
            0 => Long,
            1 => Breve,
            2 => Whole,
            3 => Half,
            4 => Quarter,
            5 => Eighth,
            6 => N16,
            7 => N32,
            8 => N64,
            9 => N128,
            10 => N256,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Undotted length in whole notes
    pub fn whole_notes(self) -> Onset {
        let exp = 2 - self.code() as i32;
        if exp >= 0 {
            Ratio::from_integer(1 << exp)
        } else {
            Ratio::new(1, 1 << (-exp))
        }
    }

    /// Durations drawn with a stem
    pub fn has_stem(self) -> bool {
        self >= DurationBase::Half
    }
}

/// Product of the enclosing tuplet ratios (`num` notes in the time of `numbase`)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TupletRatio {
    pub num: i64,
    pub numbase: i64,
}

impl Default for TupletRatio {
    fn default() -> Self {
        Self { num: 1, numbase: 1 }
    }
}

impl TupletRatio {
    pub fn new(num: i64, numbase: i64) -> Self {
        Self { num, numbase }
    }

    /// Nest another ratio inside this one
    pub fn combine(self, num: i64, numbase: i64) -> Result<Self, DurationError> {
        match (self.num.checked_mul(num), self.numbase.checked_mul(numbase)) {
            (Some(num), Some(numbase)) => Ok(Self { num, numbase }),
            _ => Err(DurationError::Overflow),
        }
    }

    /// Multiplier applied to written durations
    pub fn factor(&self) -> Result<Onset, DurationError> {
        if self.num == 0 || self.numbase == 0 {
            return Err(DurationError::ZeroRatio {
                num: self.num,
                numbase: self.numbase,
            });
        }
        Ok(Ratio::new(self.numbase, self.num))
    }
}

/// Duration attributes shared by every timed element
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct DurationAttrs {
    /// Written duration (`None` when missing or unparseable in the source)
    pub base: Option<DurationBase>,

    /// Augmentation dots
    #[serde(default)]
    pub dots: u8,

    /// Element-level ratio (`num` in the time of `numbase`)
    #[serde(default)]
    pub num: Option<u32>,
    #[serde(default)]
    pub numbase: Option<u32>,

    /// Performed duration in whole notes, overriding the written one
    #[serde(default)]
    pub dur_ges: Option<Onset>,

    /// Grace notes never advance time
    #[serde(default)]
    pub grace: bool,
}

impl DurationAttrs {
    pub fn new(base: DurationBase) -> Self {
        Self {
            base: Some(base),
            ..Self::default()
        }
    }

    pub fn with_dots(mut self, dots: u8) -> Self {
        self.dots = dots;
        self
    }

    pub fn with_ratio(mut self, num: u32, numbase: u32) -> Self {
        self.num = Some(num);
        self.numbase = Some(numbase);
        self
    }

    pub fn with_gestural(mut self, dur_ges: Onset) -> Self {
        self.dur_ges = Some(dur_ges);
        self
    }

    pub fn as_grace(mut self) -> Self {
        self.grace = true;
        self
    }

    /// Time this element occupies inside the given tuplet context
    pub fn alignment_duration(&self, tuplet: TupletRatio) -> Result<Onset, DurationError> {
        if let Some(ges) = self.dur_ges {
            if ges < zero() {
                return Err(DurationError::Negative(ges));
            }
            return Ok(ges);
        }
        let base = self.base.ok_or(DurationError::Missing)?;
        let ratio = tuplet.combine(
            self.num.map(i64::from).unwrap_or(1),
            self.numbase.map(i64::from).unwrap_or(1),
        )?;
        let duration = base
            .whole_notes()
            .checked_mul(&ratio.factor()?)
            .ok_or(DurationError::Overflow)?;
        if self.dots == 0 {
            return Ok(duration);
        }
        let dots = self.dots.min(8) as u32;
        let doubled = duration.checked_mul(&Ratio::from_integer(2));
        let last_dot = duration.checked_div(&Ratio::from_integer(1i64 << dots));
        doubled
            .zip(last_dot)
            .and_then(|(doubled, last_dot)| doubled.checked_sub(&last_dot))
            .ok_or(DurationError::Overflow)
    }
}
