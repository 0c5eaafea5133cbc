// ABOUTME: Live parts binding expression values to tree locations
// ABOUTME: NodePart implements value-shape dispatch and index-keyed sequence reconciliation

use std::mem;
use std::rc::Rc;

use crate::dom::{Document, NodeId};

use super::error::Result;
use super::instance::TemplateInstance;
use super::value::{resolve, scalar_text, Binding, Resolved, Value};

/// A live binding from an expression value to one tree location. Closed over
/// the two built-in kinds; instances dispatch by exhaustive match.
#[derive(Debug)]
pub enum Part {
    Attribute(AttributePart),
    Node(NodePart),
}

impl Part {
    /// How many values this part consumes per update.
    pub fn arity(&self) -> usize {
        match self {
            Part::Attribute(attribute) => attribute.arity(),
            Part::Node(_) => 1,
        }
    }
}

/// Binds one element attribute whose value interleaves literal segments with
/// dynamic gaps. However many gaps it has, an update is a single attribute
/// write.
#[derive(Debug)]
pub struct AttributePart {
    element: NodeId,
    name: String,
    raw_name: String,
    strings: Vec<String>,
}

impl AttributePart {
    pub(crate) fn new(
        element: NodeId,
        name: String,
        raw_name: String,
        strings: Vec<String>,
    ) -> Self {
        Self {
            element,
            name,
            raw_name,
            strings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn arity(&self) -> usize {
        self.strings.len() - 1
    }

    /// Apply one value per gap, in order, and write the joined attribute.
    pub fn set_values(&self, doc: &mut Document, values: &[Value]) -> Result<()> {
        let mut text = String::new();
        for (i, segment) in self.strings.iter().enumerate() {
            text.push_str(segment);
            if i < self.strings.len() - 1 {
                let binding = Binding::Attribute {
                    element: self.element,
                    name: &self.name,
                };
                match resolve(values[i].clone(), &binding) {
                    Resolved::Nothing => {}
                    Resolved::Text(s) => text.push_str(&s),
                    Resolved::List(items) => {
                        for item in &items {
                            text.push_str(&scalar_text(item));
                        }
                    }
                    Resolved::Node(_) | Resolved::Template(_) => {
                        tracing::warn!(
                            attribute = %self.name,
                            "tree content in attribute position rendered as empty"
                        );
                    }
                }
            }
        }
        doc.set_attribute(self.element, &self.name, &text)?;
        Ok(())
    }
}

/// What a node part rendered last time, kept to decide reuse on the next
/// update. Only the shapes that carry per-slot bookkeeping are remembered;
/// scalar and foreign-node renders reset to `Empty` (a lone text node is
/// still patched in place by content inspection).
#[derive(Debug, Default)]
enum Rendered {
    #[default]
    Empty,
    Instance(TemplateInstance),
    Parts(Vec<NodePart>),
}

/// Binds a dynamic child position: the slot between `start` and `end`
/// markers, whose contents this part owns exclusively.
#[derive(Debug)]
pub struct NodePart {
    start: NodeId,
    end: NodeId,
    rendered: Rendered,
}

impl NodePart {
    pub(crate) fn new(start: NodeId, end: NodeId) -> Self {
        Self {
            start,
            end,
            rendered: Rendered::Empty,
        }
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    /// Apply a new value, mutating only what its shape requires.
    pub fn set_value(&mut self, doc: &mut Document, value: Value) -> Result<()> {
        let binding = Binding::Node {
            start: self.start,
            end: self.end,
        };
        match resolve(value, &binding) {
            Resolved::Nothing => {
                self.clear(doc);
            }
            Resolved::Node(node) => {
                self.clear(doc);
                doc.insert_before(node, self.end)?;
            }
            Resolved::Text(text) => {
                // When the slot already holds exactly one text node, patch
                // it rather than replacing it, so repeated scalar updates
                // mutate no structure.
                let existing = doc
                    .next_sibling(self.start)
                    .filter(|&node| doc.is_text(node) && doc.next_sibling(node) == Some(self.end));
                match existing {
                    Some(node) => {
                        self.rendered = Rendered::Empty;
                        doc.set_text(node, &text)?;
                    }
                    None => {
                        self.clear(doc);
                        let node = doc.create_text(&text);
                        doc.insert_before(node, self.end)?;
                    }
                }
            }
            Resolved::Template(result) => self.set_template(doc, result)?,
            Resolved::List(items) => self.reconcile(doc, items)?,
        }
        Ok(())
    }

    fn set_template(&mut self, doc: &mut Document, result: crate::template::TemplateResult) -> Result<()> {
        let (template, values) = result.into_parts();
        // Nominal identity: the same parsed template object means the same
        // literal site, so the existing instance is just patched.
        let reusable = matches!(
            &self.rendered,
            Rendered::Instance(instance) if Rc::ptr_eq(instance.template(), &template)
        );
        if reusable {
            if let Rendered::Instance(instance) = &mut self.rendered {
                instance.update(doc, values)?;
            }
            return Ok(());
        }
        self.clear(doc);
        let mut instance = TemplateInstance::new(template);
        let fragment = instance.instantiate(doc)?;
        instance.update(doc, values)?;
        while let Some(child) = doc.first_child(fragment) {
            doc.insert_before(child, self.end)?;
        }
        self.rendered = Rendered::Instance(instance);
        Ok(())
    }

    /// Index-keyed reconciliation of a sequence of child values.
    ///
    /// Child parts chain through shared markers: part i's end marker is part
    /// i+1's start marker, and the outer slot's own markers bound the chain.
    /// Reuse is by position, so growth allocates only tail markers, shrink
    /// removes exactly the excess tail, and a same-length update touches no
    /// structure at all. Reordering within the sequence is deliberately not
    /// detected as a move; it patches per position.
    fn reconcile(&mut self, doc: &mut Document, items: Vec<Value>) -> Result<()> {
        let previous = match mem::take(&mut self.rendered) {
            Rendered::Parts(parts) => parts,
            Rendered::Empty => Vec::new(),
            Rendered::Instance(_) => {
                // prior content was not a chain; start from an empty slot
                self.clear(doc);
                Vec::new()
            }
        };

        let total = items.len();
        let mut parts: Vec<NodePart> = Vec::with_capacity(total);
        let mut prev = previous.into_iter();
        let mut boundary = self.start;

        for (i, item) in items.into_iter().enumerate() {
            let last = i + 1 == total;
            let mut part = match prev.next() {
                Some(mut part) => {
                    // The previous tail ends at the outer end marker; when
                    // more items follow it now, split off a fresh boundary.
                    if !last && part.end == self.end {
                        let marker = doc.create_text("");
                        doc.insert_before(marker, self.end)?;
                        part.rebind_end(marker);
                    }
                    part
                }
                None => {
                    let end = if last {
                        self.end
                    } else {
                        let marker = doc.create_text("");
                        doc.insert_before(marker, self.end)?;
                        marker
                    };
                    NodePart::new(boundary, end)
                }
            };
            part.set_value(doc, item)?;
            boundary = part.end;
            parts.push(part);
        }

        // Drop the unconsumed tail of the previous chain. The first
        // unconsumed part's start marker doubles as the kept tail's end
        // marker, so removal starts strictly after it; the outer end marker
        // is never touched.
        if let Some(first_dropped) = prev.next() {
            doc.remove_between(first_dropped.start, self.end);
        }

        self.rendered = Rendered::Parts(parts);
        Ok(())
    }

    /// Move this part's end boundary, cascading into a nested chain whose
    /// tail shared the old marker.
    fn rebind_end(&mut self, new_end: NodeId) {
        let old_end = self.end;
        self.end = new_end;
        if let Rendered::Parts(parts) = &mut self.rendered {
            if let Some(tail) = parts.last_mut() {
                if tail.end == old_end {
                    tail.rebind_end(new_end);
                }
            }
        }
    }

    /// Remove every node strictly between the markers and forget what was
    /// rendered.
    pub fn clear(&mut self, doc: &mut Document) {
        self.rendered = Rendered::Empty;
        doc.remove_between(self.start, self.end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn slot(doc: &mut Document) -> (NodeId, NodePart) {
        let root = doc.create_fragment();
        let start = doc.create_text("");
        let end = doc.create_text("");
        doc.append_child(root, start);
        doc.append_child(root, end);
        (root, NodePart::new(start, end))
    }

    fn slot_markup(doc: &Document, root: NodeId) -> String {
        doc.markup(root)
    }

    #[test]
    fn test_scalar_update_patches_text_in_place() {
        let mut doc = Document::new();
        let (root, mut part) = slot(&mut doc);

        part.set_value(&mut doc, Value::from("a")).unwrap();
        assert_eq!(slot_markup(&doc, root), "a");
        assert_eq!(doc.children(root).count(), 3);
        let text = doc.children(root).nth(1).unwrap();
        assert_eq!(doc.text(text), Some("a"));

        part.set_value(&mut doc, Value::from("b")).unwrap();
        assert_eq!(slot_markup(&doc, root), "b");
        // the same text node carries the new content
        assert_eq!(doc.children(root).nth(1), Some(text));
        assert_eq!(doc.text(text), Some("b"));
    }

    #[test]
    fn test_scalar_after_foreign_node_replaces() {
        let mut doc = Document::new();
        let (root, mut part) = slot(&mut doc);
        let em = doc.create_element("em");
        part.set_value(&mut doc, Value::Node(em)).unwrap();

        part.set_value(&mut doc, Value::from("plain")).unwrap();
        assert_eq!(slot_markup(&doc, root), "plain");
        assert_eq!(doc.children(root).count(), 3);
        assert_eq!(doc.parent(em), None);
    }

    #[test]
    fn test_nothing_clears_slot() {
        let mut doc = Document::new();
        let (root, mut part) = slot(&mut doc);
        part.set_value(&mut doc, Value::from("gone soon")).unwrap();
        part.set_value(&mut doc, Value::Nothing).unwrap();
        assert_eq!(slot_markup(&doc, root), "");
        assert_eq!(doc.children(root).count(), 2);
    }

    #[test]
    fn test_foreign_node_is_inserted() {
        let mut doc = Document::new();
        let (root, mut part) = slot(&mut doc);
        let em = doc.create_element("em");
        part.set_value(&mut doc, Value::Node(em)).unwrap();
        assert_eq!(slot_markup(&doc, root), "<em></em>");
    }

    #[test]
    fn test_attribute_part_joins_segments() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let part = AttributePart::new(
            el,
            "class".into(),
            "class".into(),
            vec!["".into(), "-".into(), "".into()],
        );
        part.set_values(&mut doc, &[Value::from("x"), Value::from("y")])
            .unwrap();
        assert_eq!(doc.attribute(el, "class"), Some("x-y"));

        part.set_values(&mut doc, &[Value::from("p"), Value::from("q")])
            .unwrap();
        assert_eq!(doc.attribute(el, "class"), Some("p-q"));
    }

    #[test]
    fn test_attribute_part_nothing_and_list() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let part = AttributePart::new(el, "data".into(), "data".into(), vec!["".into(), "".into()]);

        part.set_values(&mut doc, &[Value::Nothing]).unwrap();
        assert_eq!(doc.attribute(el, "data"), Some(""));

        let list = Value::List(vec![Value::from("a"), Value::from(1)]);
        part.set_values(&mut doc, &[list]).unwrap();
        assert_eq!(doc.attribute(el, "data"), Some("a1"));
    }

    #[test]
    fn test_sequence_growth_allocates_only_tail_markers() {
        let mut doc = Document::new();
        let (root, mut part) = slot(&mut doc);

        let items: Vec<Value> = (1..=3).map(Value::from).collect();
        part.set_value(&mut doc, Value::List(items)).unwrap();
        assert_eq!(slot_markup(&doc, root), "123");
        // outer pair + 3 texts + 2 inner markers
        assert_eq!(doc.children(root).count(), 7);
        let before: Vec<NodeId> = doc.children(root).collect();

        let items: Vec<Value> = (1..=5).map(Value::from).collect();
        part.set_value(&mut doc, Value::List(items)).unwrap();
        assert_eq!(slot_markup(&doc, root), "12345");
        // two more texts and two more markers
        assert_eq!(doc.children(root).count(), 11);
        let after: Vec<NodeId> = doc.children(root).collect();
        // the first three item texts survive in place
        for kept in &before[..4] {
            assert!(after.contains(kept));
        }
    }

    #[test]
    fn test_sequence_shrink_removes_exact_tail() {
        let mut doc = Document::new();
        let (root, mut part) = slot(&mut doc);

        let items: Vec<Value> = (1..=5).map(Value::from).collect();
        part.set_value(&mut doc, Value::List(items)).unwrap();
        assert_eq!(doc.children(root).count(), 11);

        let items: Vec<Value> = (1..=2).map(Value::from).collect();
        part.set_value(&mut doc, Value::List(items)).unwrap();
        assert_eq!(slot_markup(&doc, root), "12");
        // outer pair + 2 texts + the kept tail boundary marker + 1 inner marker
        assert_eq!(doc.children(root).count(), 6);
    }

    #[test]
    fn test_sequence_same_length_mutates_no_structure() {
        let mut doc = Document::new();
        let (root, mut part) = slot(&mut doc);

        let items: Vec<Value> = (1..=3).map(Value::from).collect();
        part.set_value(&mut doc, Value::List(items)).unwrap();
        let markers: Vec<NodeId> = doc
            .children(root)
            .filter(|n| doc.text(*n) == Some(""))
            .collect();

        let items: Vec<Value> = (4..=6).map(Value::from).collect();
        part.set_value(&mut doc, Value::List(items)).unwrap();
        assert_eq!(slot_markup(&doc, root), "456");
        let markers_after: Vec<NodeId> = doc
            .children(root)
            .filter(|n| doc.text(*n) == Some(""))
            .collect();
        assert_eq!(markers, markers_after);
    }

    #[test]
    fn test_sequence_to_empty_clears_span() {
        let mut doc = Document::new();
        let (root, mut part) = slot(&mut doc);
        let items: Vec<Value> = (1..=3).map(Value::from).collect();
        part.set_value(&mut doc, Value::List(items)).unwrap();

        part.set_value(&mut doc, Value::List(Vec::new())).unwrap();
        assert_eq!(slot_markup(&doc, root), "");
        assert_eq!(doc.children(root).count(), 2);

        // and can grow again from empty
        let items: Vec<Value> = (7..=8).map(Value::from).collect();
        part.set_value(&mut doc, Value::List(items)).unwrap();
        assert_eq!(slot_markup(&doc, root), "78");
    }

    #[test]
    fn test_sequence_regrow_after_shrink() {
        let mut doc = Document::new();
        let (root, mut part) = slot(&mut doc);

        for len in [5usize, 2, 4] {
            let items: Vec<Value> = (1..=len as i64).map(Value::from).collect();
            part.set_value(&mut doc, Value::List(items)).unwrap();
        }
        assert_eq!(slot_markup(&doc, root), "1234");
    }

    #[test]
    fn test_scalar_then_sequence_then_scalar() {
        let mut doc = Document::new();
        let (root, mut part) = slot(&mut doc);

        part.set_value(&mut doc, Value::from("solo")).unwrap();
        let items: Vec<Value> = (1..=2).map(Value::from).collect();
        part.set_value(&mut doc, Value::List(items)).unwrap();
        assert_eq!(slot_markup(&doc, root), "12");

        part.set_value(&mut doc, Value::from("solo")).unwrap();
        assert_eq!(slot_markup(&doc, root), "solo");
        assert_eq!(doc.children(root).count(), 3);
    }
}
