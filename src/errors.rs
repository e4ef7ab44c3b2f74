//! Error types for the engraving engine
//!
//! Only caller misuse surfaces as an error. Problems in the score itself
//! (dangling anchors, impossible durations, over-wide measures) are reported
//! as diagnostics and never abort layout.

use thiserror::Error;

use crate::models::duration::Onset;
use crate::tree::NodeId;

/// Top-level error type
#[derive(Debug, Error)]
pub enum EngraverError {
    /// Invalid tree edit
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Options could not be read
    #[error(transparent)]
    Options(#[from] OptionsError),
}

/// Errors raised by edits on the document tree
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    /// The handle does not point to a node of this document
    #[error("Unknown node handle: {0:?}")]
    UnknownNode(NodeId),

    /// Another node already uses this identifier
    #[error("Duplicate identifier: {0}")]
    DuplicateId(String),

    /// The parent kind does not accept the child kind
    #[error("A {parent} cannot contain a {child}")]
    InvalidChild {
        parent: &'static str,
        child: &'static str,
    },

    /// The node is not a direct child of the given parent
    #[error("Node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// The document root can never be detached
    #[error("The document root cannot be removed")]
    RootRemoval,
}

/// Errors raised while reading layout options
#[derive(Debug, Error)]
pub enum OptionsError {
    /// The options document is not valid JSON (or has a mistyped value)
    #[error("Invalid options JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a duration could not be turned into a time advance
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    /// Neither a written nor a gestural duration is present
    #[error("missing duration")]
    Missing,

    /// A tuplet ratio has a zero term
    #[error("tuplet ratio with a zero term ({num}:{numbase})")]
    ZeroRatio { num: i64, numbase: i64 },

    /// A gestural duration below zero
    #[error("negative duration {0}")]
    Negative(Onset),

    /// The exact value no longer fits a 64-bit rational
    #[error("duration arithmetic overflow")]
    Overflow,
}
