//! Layout engine
//!
//! The passes run in a fixed order. Each one records the stage it reached on
//! the document, and each one asserts that the stage it depends on has been
//! reached; running a pass out of order is a caller bug and panics.

pub mod display_list;
pub mod engine;
pub mod finalize;
pub mod metrics;
pub mod options;
pub mod query;

pub use display_list::DisplayList;
pub use engine::{LayoutEngine, LayoutResult};
pub use metrics::{DefaultMetrics, GlyphMetrics};
pub use options::{BreakMode, JustificationMode, LayoutOptions};
pub use query::ElementPosition;

/// Last layout pass completed on a document
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LayoutStage {
    /// Built or edited since the last layout
    #[default]
    Built,
    /// Engine state cleared and anchors resolved
    Prepared,
    /// Every measure has its time grid
    Aligned,
    /// Ideal x positions computed
    Spaced,
    /// Measures distributed over systems
    CastOff,
    /// Staves stacked in every system
    Stacked,
    /// Systems distributed over pages
    Paginated,
    /// Horizontal and vertical justification done
    Justified,
    /// Absolute positions available
    Finalized,
}

impl LayoutStage {
    pub fn name(self) -> &'static str {
        match self {
            LayoutStage::Built => "build",
            LayoutStage::Prepared => "prepare",
            LayoutStage::Aligned => "horizontal alignment",
            LayoutStage::Spaced => "x positioning",
            LayoutStage::CastOff => "system cast-off",
            LayoutStage::Stacked => "vertical alignment",
            LayoutStage::Paginated => "page cast-off",
            LayoutStage::Justified => "justification",
            LayoutStage::Finalized => "finalize",
        }
    }
}

/// Panic unless `doc` has completed at least `required`
pub(crate) fn require_stage(current: LayoutStage, required: LayoutStage, pass: &str) {
    assert!(
        current >= required,
        "{} requires {} to have run (document is at '{}')",
        pass,
        required.name(),
        current.name()
    );
}
