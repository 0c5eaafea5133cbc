// ABOUTME: TemplateResult pairs a cached template with one evaluation's values
// ABOUTME: Implements render_to, which installs or updates an instance on a container

use std::rc::Rc;

use crate::dom::{Document, NodeId};
use crate::render::{TemplateInstance, Value};

use super::compile::Template;
use super::error::Result;

/// A template paired with the expression values from one evaluation.
///
/// Transient: produced per evaluation and consumed by [`render_to`]
/// (or by a node position when nested inside another result).
///
/// [`render_to`]: TemplateResult::render_to
#[derive(Debug, Clone)]
pub struct TemplateResult {
    template: Rc<Template>,
    values: Vec<Value>,
}

impl TemplateResult {
    pub fn new(template: Rc<Template>, values: Vec<Value>) -> Self {
        Self { template, values }
    }

    pub fn template(&self) -> &Rc<Template> {
        &self.template
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub(crate) fn into_parts(self) -> (Rc<Template>, Vec<Value>) {
        (self.template, self.values)
    }

    /// Render this result into a container node.
    ///
    /// The container caches its live instance. When the cached instance came
    /// from the same template (nominal identity, the same parsed object),
    /// only the values are pushed through `update`; content produced by a
    /// *different* template is torn down and rebuilt from a fresh clone.
    pub fn render_to(self, doc: &mut Document, container: NodeId) -> Result<()> {
        let cached = doc
            .take_expando(container)
            .and_then(|value| value.downcast::<TemplateInstance>().ok())
            .map(|boxed| *boxed);

        let mut instance = match cached {
            Some(instance) if Rc::ptr_eq(instance.template(), &self.template) => instance,
            other => {
                if other.is_some() {
                    doc.remove_children(container);
                }
                let mut instance = TemplateInstance::new(self.template.clone());
                let fragment = instance.instantiate(doc)?;
                // Update while still detached, then adopt the children.
                instance.update(doc, self.values)?;
                while let Some(child) = doc.first_child(fragment) {
                    doc.append_child(container, child);
                }
                doc.set_expando(container, Box::new(instance));
                return Ok(());
            }
        };

        instance.update(doc, self.values)?;
        doc.set_expando(container, Box::new(instance));
        Ok(())
    }
}
