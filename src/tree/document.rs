//! Arena-backed document
//!
//! Nodes live in a `Slab`; the identifier map resolves string ids (used by
//! control-element anchors) to handles. Removing a child only detaches it:
//! the subtree stays addressable by id until `collect_garbage` runs.

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use slab::Slab;

use super::{Node, NodeId, NodeKind, NodeTag, Page, System};
use crate::errors::TreeError;
use crate::functor::{find_first, VisitResult};
use crate::layout::LayoutStage;
use crate::models::score_def::ScoreDef;

/// Identifier of the page holding the unbroken content
pub const CONTENT_PAGE_ID: &str = "page-content";
/// Identifier of the system holding the unbroken content
pub const CONTENT_SYSTEM_ID: &str = "system-content";

/// The root of a score: node arena plus global score definition
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Slab<Node>,
    root: NodeId,
    ids: HashMap<String, NodeId>,
    /// Inheritance fallback for clefs, keys and meters
    pub score_def: ScoreDef,
    next_auto_id: u64,
    pub(crate) stage: LayoutStage,
}

impl Document {
    pub fn new(score_def: ScoreDef) -> Self {
        let mut nodes = Slab::new();
        let root = NodeId(nodes.insert(Node::new("doc".to_string(), NodeKind::Document)));
        let mut ids = HashMap::new();
        ids.insert("doc".to_string(), root);
        Self {
            nodes,
            root,
            ids,
            score_def,
            next_auto_id: 0,
            stage: LayoutStage::Built,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Last layout pass completed since the last edit
    pub fn stage(&self) -> LayoutStage {
        self.stage
    }

    /// Number of nodes in the arena, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn try_get(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id).ok_or(TreeError::UnknownNode(id))
    }

    /// Append a child with a generated identifier
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, TreeError> {
        let id = self.generate_id(kind.name());
        self.add_child_with_id(parent, id, kind)
    }

    /// Append a child with an explicit identifier
    pub fn add_child_with_id(
        &mut self,
        parent: NodeId,
        id: impl Into<String>,
        kind: NodeKind,
    ) -> Result<NodeId, TreeError> {
        let id = id.into();
        let parent_node = self.try_get(parent)?;
        if !parent_node.kind.accepts(&kind) {
            return Err(TreeError::InvalidChild {
                parent: parent_node.kind.name(),
                child: kind.name(),
            });
        }
        if self.ids.contains_key(&id) {
            return Err(TreeError::DuplicateId(id));
        }

        let mut node = Node::new(id.clone(), kind);
        node.parent = Some(parent);
        let handle = NodeId(self.nodes.insert(node));
        self.ids.insert(id, handle);
        self.nodes[parent.0].children.push(handle);
        self.mark_dirty(parent);
        self.stage = LayoutStage::Built;
        Ok(handle)
    }

    /// Detach `child` from `parent`; the subtree stays resolvable until
    /// `collect_garbage`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.try_get(child)?;
        let parent_node = self
            .nodes
            .get_mut(parent.0)
            .ok_or(TreeError::UnknownNode(parent))?;
        let position = parent_node
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NotAChild { parent, child })?;
        parent_node.children.remove(position);
        self.nodes[child.0].parent = None;
        self.mark_dirty(parent);
        self.stage = LayoutStage::Built;
        Ok(())
    }

    /// Detach a node from wherever it is attached
    pub fn detach(&mut self, node: NodeId) -> Result<(), TreeError> {
        if node == self.root {
            return Err(TreeError::RootRemoval);
        }
        match self.try_get(node)?.parent {
            Some(parent) => self.remove_child(parent, node),
            None => Ok(()),
        }
    }

    /// Destroy every node no longer reachable from the root.
    /// Returns the number of nodes destroyed.
    pub fn collect_garbage(&mut self) -> usize {
        let dead: Vec<NodeId> = self
            .nodes
            .iter()
            .map(|(key, _)| NodeId(key))
            .filter(|&id| !self.is_live(id))
            .collect();
        for &id in &dead {
            let node = self.nodes.remove(id.0);
            self.ids.remove(&node.id);
        }
        if !dead.is_empty() {
            log::debug!("Garbage collection: {} nodes destroyed", dead.len());
        }
        dead.len()
    }

    /// Resolve an identifier; detached nodes still resolve until collected
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    /// Whether the node is reachable from the root
    pub fn is_live(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = match self.get(node) {
                Some(n) => n.parent,
                None => return false,
            };
        }
        false
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Position of the node among its siblings
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Closest ancestor (the node itself excluded) of the given kind
    pub fn ancestor_of_kind(&self, id: NodeId, tag: NodeTag) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if self[node].tag() == tag {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Depth-first, document-order descendants (the node itself excluded)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// First node at or below `from` (in document order) matching `predicate`
    pub fn find_descendant<P>(&self, from: NodeId, predicate: P) -> Option<NodeId>
    where
        P: Fn(&Node) -> bool,
    {
        find_first(self, from, |node| {
            if predicate(node) {
                VisitResult::Stop
            } else {
                VisitResult::Continue
            }
        })
    }

    /// Live descendants of the root of one kind, in document order
    pub fn nodes_of_kind(&self, tag: NodeTag) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self[id].tag() == tag)
            .collect()
    }

    pub fn pages(&self) -> Vec<NodeId> {
        self.children(self.root).to_vec()
    }

    pub fn systems(&self) -> Vec<NodeId> {
        self.pages()
            .into_iter()
            .flat_map(|page| self.children(page).to_vec())
            .collect()
    }

    pub fn measures(&self) -> Vec<NodeId> {
        self.nodes_of_kind(NodeTag::Measure)
    }

    /// The system importers fill; created on first use
    pub fn content_system(&mut self) -> NodeId {
        if let Some(system) = self.find_by_id(CONTENT_SYSTEM_ID) {
            if self.is_live(system) {
                return system;
            }
        }
        let page = match self.find_by_id(CONTENT_PAGE_ID) {
            Some(page) if self.is_live(page) => page,
            _ => self.insert_engine_node(self.root, CONTENT_PAGE_ID, NodeKind::Page(Page::default())),
        };
        self.insert_engine_node(page, CONTENT_SYSTEM_ID, NodeKind::System(System::default()))
    }

    pub fn mark_dirty(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.dirty = true;
        }
    }

    /// Append an engine-owned node (page, system); a clashing identifier gets
    /// a numeric suffix
    pub(crate) fn insert_engine_node(&mut self, parent: NodeId, base: &str, kind: NodeKind) -> NodeId {
        let mut id = base.to_string();
        let mut suffix = 1;
        while self.ids.contains_key(&id) {
            suffix += 1;
            id = format!("{}-{}", base, suffix);
        }
        let mut node = Node::new(id.clone(), kind);
        node.parent = Some(parent);
        let handle = NodeId(self.nodes.insert(node));
        self.ids.insert(id, handle);
        self.nodes[parent.0].children.push(handle);
        handle
    }

    /// Move a node to the end of `new_parent`'s children
    pub(crate) fn reparent(&mut self, node: NodeId, new_parent: NodeId) {
        debug_assert!(self[new_parent].kind.accepts(&self[node].kind));
        if let Some(old) = self.nodes[node.0].parent {
            self.nodes[old.0].children.retain(|&c| c != node);
        }
        self.nodes[node.0].parent = Some(new_parent);
        self.nodes[new_parent.0].children.push(node);
    }

    /// Remove a childless engine node right away
    pub(crate) fn destroy(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
        for child in std::mem::take(&mut self.nodes[node.0].children) {
            self.nodes[child.0].parent = None;
        }
        let removed = self.nodes.remove(node.0);
        self.ids.remove(&removed.id);
    }

    fn generate_id(&mut self, name: &str) -> String {
        loop {
            self.next_auto_id += 1;
            let id = format!("{}-{:04}", name, self.next_auto_id);
            if !self.ids.contains_key(&id) {
                return id;
            }
        }
    }
}

impl Index<NodeId> for Document {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for Document {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}
