//! Horizontal and vertical alignment
//!
//! `horizontal` holds the per-measure time grid, `vertical` the per-system
//! staff stacking, and `functors` the passes that fill both from the tree.

pub mod functors;
pub mod horizontal;
pub mod vertical;

pub use horizontal::{AlignmentKey, AlignmentType, MeasureAligner, SpacingParams};
pub use vertical::{StaffAlignment, SystemAligner};
