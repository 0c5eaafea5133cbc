// ABOUTME: Arena-indexed mutable document tree used as the rendering target
// ABOUTME: Provides node creation, structural mutation, traversal, and serialization

pub mod error;
pub mod parser;

pub use error::{DomError, Result};

use indexmap::IndexMap;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Handle into a [`Document`]'s node arena.
///
/// Ids are stable across structural mutation: detaching or reparenting a node
/// never invalidates handles to it or to any other node. A `NodeId` is only
/// meaningful for the `Document` that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// The payload of a tree node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Container root for parsed or cloned fragments; never nested.
    Fragment,
    /// An element with a tag name and attributes in source order.
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
    },
    /// A text node. Empty text nodes serve as slot boundary markers.
    Text(String),
}

#[derive(Debug)]
struct NodeEntry {
    kind: NodeKind,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

/// An owned tree of elements and text nodes backed by a node arena.
///
/// Detached nodes stay allocated until the document is dropped; callers that
/// churn heavily should build into a fresh document rather than rely on
/// reclamation.
#[derive(Default)]
pub struct Document {
    nodes: Vec<NodeEntry>,
    expandos: HashMap<NodeId, Box<dyn Any>>,
}

pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        });
        id
    }

    // Panics on a NodeId from another document; ids are not transferable.
    fn entry(&self, id: NodeId) -> &NodeEntry {
        &self.nodes[id.0]
    }

    fn entry_mut(&mut self, id: NodeId) -> &mut NodeEntry {
        &mut self.nodes[id.0]
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeKind::Fragment)
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_string(),
            attrs: IndexMap::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.entry(id).kind
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.entry(id).kind, NodeKind::Element { .. })
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.entry(id).kind, NodeKind::Text(_))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.entry(id).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.entry(id).kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            _ => None,
        }
    }

    /// Iterate an element's attributes in source order.
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> {
        match &self.entry(id).kind {
            NodeKind::Element { attrs, .. } => Some(attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
            _ => None,
        }
        .into_iter()
        .flatten()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        match &mut self.entry_mut(id).kind {
            NodeKind::Element { attrs, .. } => {
                attrs.insert(name.to_string(), value.to_string());
                Ok(())
            }
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<()> {
        match &mut self.entry_mut(id).kind {
            NodeKind::Element { attrs, .. } => {
                attrs.shift_remove(name);
                Ok(())
            }
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.entry(id).kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<()> {
        match &mut self.entry_mut(id).kind {
            NodeKind::Text(existing) => {
                *existing = text.to_string();
                Ok(())
            }
            _ => Err(DomError::NotText(id)),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).last_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).next_sibling
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).prev_sibling
    }

    /// Unlink a node from its parent and siblings. The node and its subtree
    /// remain allocated and can be reinserted elsewhere.
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let entry = self.entry(id);
            (entry.parent, entry.prev_sibling, entry.next_sibling)
        };
        if let Some(prev) = prev {
            self.entry_mut(prev).next_sibling = next;
        }
        if let Some(next) = next {
            self.entry_mut(next).prev_sibling = prev;
        }
        if let Some(parent) = parent {
            let entry = self.entry_mut(parent);
            if entry.first_child == Some(id) {
                entry.first_child = next;
            }
            if entry.last_child == Some(id) {
                entry.last_child = prev;
            }
        }
        let entry = self.entry_mut(id);
        entry.parent = None;
        entry.prev_sibling = None;
        entry.next_sibling = None;
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous position first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let last = self.entry(parent).last_child;
        if let Some(last) = last {
            self.entry_mut(last).next_sibling = Some(child);
        } else {
            self.entry_mut(parent).first_child = Some(child);
        }
        self.entry_mut(parent).last_child = Some(child);
        let entry = self.entry_mut(child);
        entry.parent = Some(parent);
        entry.prev_sibling = last;
        entry.next_sibling = None;
    }

    /// Insert `new` immediately before `reference` under the same parent.
    pub fn insert_before(&mut self, new: NodeId, reference: NodeId) -> Result<()> {
        let parent = self
            .entry(reference)
            .parent
            .ok_or(DomError::Detached(reference))?;
        self.detach(new);
        let prev = self.entry(reference).prev_sibling;
        if let Some(prev) = prev {
            self.entry_mut(prev).next_sibling = Some(new);
        } else {
            self.entry_mut(parent).first_child = Some(new);
        }
        self.entry_mut(reference).prev_sibling = Some(new);
        let entry = self.entry_mut(new);
        entry.parent = Some(parent);
        entry.prev_sibling = prev;
        entry.next_sibling = Some(reference);
        Ok(())
    }

    /// Detach every child of `parent`.
    pub fn remove_children(&mut self, parent: NodeId) {
        while let Some(child) = self.first_child(parent) {
            self.detach(child);
        }
    }

    /// Detach every sibling strictly between `start` and `end` (both are kept).
    pub fn remove_between(&mut self, start: NodeId, end: NodeId) {
        let mut next = self.next_sibling(start);
        while let Some(node) = next {
            if node == end {
                break;
            }
            next = self.next_sibling(node);
            self.detach(node);
        }
    }

    /// Pre-order (document order) traversal of a subtree, excluding `root`
    /// itself. Template parsing and instance binding both index nodes with
    /// this single walk so their positions can never diverge.
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root,
            next: self.first_child(root),
        }
    }

    /// Iterate the direct children of a node.
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(parent),
        }
    }

    /// Deep-clone a subtree from another document into this one, returning
    /// the root of the copy. Expandos are not copied.
    pub fn import(&mut self, source: &Document, node: NodeId) -> NodeId {
        let copy = self.alloc(source.entry(node).kind.clone());
        let mut child = source.first_child(node);
        while let Some(c) = child {
            let imported = self.import(source, c);
            self.append_child(copy, imported);
            child = source.next_sibling(c);
        }
        copy
    }

    /// Associate an opaque value with a node, replacing any previous one.
    pub fn set_expando(&mut self, id: NodeId, value: Box<dyn Any>) {
        self.expandos.insert(id, value);
    }

    /// Remove and return the opaque value associated with a node.
    pub fn take_expando(&mut self, id: NodeId) -> Option<Box<dyn Any>> {
        self.expandos.remove(&id)
    }

    /// Serialize a subtree to markup. Fragment roots serialize as their
    /// children; empty text nodes (slot markers) contribute nothing.
    pub fn markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        match &self.entry(node).kind {
            NodeKind::Fragment => {
                for child in self.children(node) {
                    self.write_markup(child, out);
                }
            }
            NodeKind::Text(text) => out.push_str(&escape_text(text)),
            NodeKind::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) && self.first_child(node).is_none() {
                    return;
                }
                for child in self.children(node) {
                    self.write_markup(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("expandos", &self.expandos.len())
            .finish()
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.next_in_walk(current);
        Some(current)
    }
}

impl Descendants<'_> {
    fn next_in_walk(&self, current: NodeId) -> Option<NodeId> {
        if let Some(child) = self.doc.first_child(current) {
            return Some(child);
        }
        let mut node = current;
        loop {
            if node == self.root {
                return None;
            }
            if let Some(sibling) = self.doc.next_sibling(node) {
                return Some(sibling);
            }
            node = self.doc.parent(node)?;
        }
    }
}

pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}
