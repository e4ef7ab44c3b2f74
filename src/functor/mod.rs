//! Functor traversal
//!
//! Every layout pass is a `Functor`: a context object with an `enter` and a
//! `leave` callback. `process` walks the tree depth-first in document order,
//! threading the functor by reference so that siblings observe the state
//! accumulated before them.
//!
//! Passes dispatch on `NodeTag` with a `match`; adding a node kind makes every
//! exhaustive pass fail to compile until it decides what to do with it.

use crate::tree::{Document, Node, NodeId};

/// Outcome of a callback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisitResult {
    /// Keep walking
    Continue,
    /// Do not visit the children (nor call `leave` for this node)
    SkipChildren,
    /// Abort the whole traversal
    Stop,
}

/// A pass over a mutable document
pub trait Functor {
    fn enter(&mut self, doc: &mut Document, node: NodeId) -> VisitResult;

    /// Called after all children; top-down-only passes keep the default
    fn leave(&mut self, _doc: &mut Document, _node: NodeId) -> VisitResult {
        VisitResult::Continue
    }
}

/// A read-only pass
pub trait ConstFunctor {
    fn enter(&mut self, doc: &Document, node: NodeId) -> VisitResult;

    fn leave(&mut self, _doc: &Document, _node: NodeId) -> VisitResult {
        VisitResult::Continue
    }
}

/// Run `functor` over the subtree rooted at `node`
///
/// Children are snapshotted before they are visited, so a callback may move
/// nodes around without invalidating the walk of its siblings.
pub fn process<F>(doc: &mut Document, node: NodeId, functor: &mut F) -> VisitResult
where
    F: Functor + ?Sized,
{
    match functor.enter(doc, node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => return VisitResult::Continue,
        VisitResult::Continue => {}
    }

    let children = doc.children(node).to_vec();
    for child in children {
        if process(doc, child, functor) == VisitResult::Stop {
            return VisitResult::Stop;
        }
    }

    functor.leave(doc, node)
}

/// Read-only counterpart of `process`
pub fn process_const<F>(doc: &Document, node: NodeId, functor: &mut F) -> VisitResult
where
    F: ConstFunctor + ?Sized,
{
    match functor.enter(doc, node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => return VisitResult::Continue,
        VisitResult::Continue => {}
    }

    for &child in doc.children(node) {
        if process_const(doc, child, functor) == VisitResult::Stop {
            return VisitResult::Stop;
        }
    }

    functor.leave(doc, node)
}

/// Find-first query: `visit` returns `Stop` on the node it is looking for
pub struct FindFirst<V> {
    visit: V,
    pub found: Option<NodeId>,
}

impl<V> FindFirst<V>
where
    V: FnMut(&Node) -> VisitResult,
{
    pub fn new(visit: V) -> Self {
        Self { visit, found: None }
    }
}

impl<V> ConstFunctor for FindFirst<V>
where
    V: FnMut(&Node) -> VisitResult,
{
    fn enter(&mut self, doc: &Document, node: NodeId) -> VisitResult {
        let result = (self.visit)(&doc[node]);
        if result == VisitResult::Stop {
            self.found = Some(node);
        }
        result
    }
}

/// Run a `FindFirst` query from `from` (included)
pub fn find_first<V>(doc: &Document, from: NodeId, visit: V) -> Option<NodeId>
where
    V: FnMut(&Node) -> VisitResult,
{
    let mut functor = FindFirst::new(visit);
    process_const(doc, from, &mut functor);
    functor.found
}
