//! Music Engraving Layout Engine
//!
//! Turns a score tree (measures, staves, layers, notes, slurs) into a
//! paginated, justified layout: every element ends up with absolute
//! coordinates and a bounding box an exporter can draw from.
//!
//! Importers build a `Document` with one unbroken content system, then
//! `LayoutEngine::layout` runs the pass sequence: prepare, horizontal
//! alignment, x positioning, system cast-off, vertical alignment, page
//! cast-off, justification and finalize.

pub mod align;
pub mod castoff;
pub mod diagnostics;
pub mod errors;
pub mod functor;
pub mod justify;
pub mod layout;
pub mod models;
pub mod tree;

// Re-export commonly used types
pub use diagnostics::{DiagnosticMark, DiagnosticSeverity, Diagnostics};
pub use errors::{EngraverError, OptionsError, TreeError};
pub use functor::{ConstFunctor, Functor, VisitResult};
pub use layout::{
    BreakMode, DisplayList, ElementPosition, JustificationMode, LayoutEngine, LayoutOptions,
    LayoutResult, LayoutStage,
};
pub use models::*;
pub use tree::{Document, Node, NodeId, NodeKind, NodeTag};
