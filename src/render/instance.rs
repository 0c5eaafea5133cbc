// ABOUTME: TemplateInstance clones a template skeleton and binds live parts to it
// ABOUTME: Routes each update's values to the bound parts in document order

use std::rc::Rc;

use tracing::debug;

use crate::dom::{Document, NodeId};
use crate::template::{Template, TemplatePart};

use super::error::{RenderError, Result};
use super::part::{AttributePart, NodePart, Part};
use super::value::Value;

/// One live realization of a template: an owned clone of its skeleton plus
/// the parts bound to the clone's dynamic positions, 1:1 and in the same
/// order as the template's descriptors.
#[derive(Debug)]
pub struct TemplateInstance {
    template: Rc<Template>,
    parts: Vec<Part>,
}

impl TemplateInstance {
    pub fn new(template: Rc<Template>) -> Self {
        Self {
            template,
            parts: Vec::new(),
        }
    }

    pub fn template(&self) -> &Rc<Template> {
        &self.template
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Clone the skeleton into `doc` and bind one live part per descriptor.
    ///
    /// Binding replays the same document-order walk that parsing indexed, so
    /// a descriptor's `index` lands exactly on its node in the clone. With no
    /// descriptors, cloning is the entire cost. Returns the fragment root;
    /// the caller adopts its children.
    pub fn instantiate(&mut self, doc: &mut Document) -> Result<NodeId> {
        let template = self.template.clone();
        let fragment = doc.import(template.skeleton(), template.root());
        let descriptors = template.parts();
        if descriptors.is_empty() {
            return Ok(fragment);
        }

        let mut next = 0;
        for (index, node) in doc.descendants(fragment).enumerate() {
            if next == descriptors.len() {
                break;
            }
            if index != descriptors[next].index() {
                continue;
            }
            let part = match &descriptors[next] {
                TemplatePart::Attribute {
                    name,
                    raw_name,
                    strings,
                    ..
                } => {
                    if !doc.is_element(node) {
                        return Err(RenderError::CorruptTemplate(
                            "attribute part bound to a non-element node",
                        ));
                    }
                    Part::Attribute(AttributePart::new(
                        node,
                        name.clone(),
                        raw_name.clone(),
                        strings.clone(),
                    ))
                }
                TemplatePart::Node { .. } => {
                    let end = doc.next_sibling(node).ok_or(RenderError::CorruptTemplate(
                        "node part start marker has no end sibling",
                    ))?;
                    Part::Node(NodePart::new(node, end))
                }
            };
            self.parts.push(part);
            next += 1;
        }

        if next != descriptors.len() {
            return Err(RenderError::CorruptTemplate(
                "clone walk ended before every part was bound",
            ));
        }
        debug!(parts = self.parts.len(), "instantiated template");
        Ok(fragment)
    }

    /// Route one update's values to the parts in document order. Attribute
    /// parts consume their declared arity as a group, node parts consume one
    /// value each; extra trailing values are ignored.
    pub fn update(&mut self, doc: &mut Document, values: Vec<Value>) -> Result<()> {
        let needed: usize = self.parts.iter().map(Part::arity).sum();
        if values.len() < needed {
            return Err(RenderError::ArityMismatch {
                needed,
                supplied: values.len(),
            });
        }
        let mut values = values.into_iter();
        for part in &mut self.parts {
            match part {
                Part::Attribute(attribute) => {
                    let group: Vec<Value> = values.by_ref().take(attribute.arity()).collect();
                    attribute.set_values(doc, &group)?;
                }
                Part::Node(node) => {
                    let value = values.next().unwrap_or(Value::Nothing);
                    node.set_value(doc, value)?;
                }
            }
        }
        debug!(values = needed, "applied update");
        Ok(())
    }
}
