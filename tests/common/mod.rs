// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides document setup and tree inspection shorthands

#![allow(dead_code)]

use weft::{Document, NodeId};

/// A fresh document with a detached `<div>` render target.
pub fn setup() -> (Document, NodeId) {
    init_tracing();
    let mut doc = Document::new();
    let container = doc.create_element("div");
    (doc, container)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Concatenated text of every text node under `root`, markers included
/// (markers are empty, so they contribute nothing).
pub fn text_content(doc: &Document, root: NodeId) -> String {
    doc.descendants(root)
        .filter_map(|node| doc.text(node))
        .collect()
}

/// Total number of nodes under `root`, markers included.
pub fn node_count(doc: &Document, root: NodeId) -> usize {
    doc.descendants(root).count()
}

/// First descendant element with the given tag.
pub fn find_element(doc: &Document, root: NodeId, tag: &str) -> Option<NodeId> {
    doc.descendants(root).find(|node| doc.tag(*node) == Some(tag))
}

/// Ids of the text nodes under `root` whose content is non-empty, in
/// document order.
pub fn content_text_nodes(doc: &Document, root: NodeId) -> Vec<NodeId> {
    doc.descendants(root)
        .filter(|node| doc.text(*node).is_some_and(|t| !t.is_empty()))
        .collect()
}
