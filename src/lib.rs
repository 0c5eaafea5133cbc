// ABOUTME: Main library module for the weft templating engine
// ABOUTME: Exports the document tree, template, and render modules

//! weft turns tagged string literals with embedded expressions into cached
//! template skeletons, instantiates them as live document-tree fragments,
//! and patches those fragments in place as values change, performing the
//! minimum structural mutation necessary.
//!
//! ```
//! use weft::{html, Document};
//!
//! let mut doc = Document::new();
//! let container = doc.create_element("div");
//!
//! let counter = |n: i64| html!(["<p>count: ", "</p>"], [n]).unwrap();
//! counter(1).render_to(&mut doc, container).unwrap();
//! counter(2).render_to(&mut doc, container).unwrap();
//!
//! assert_eq!(doc.markup(container), "<div><p>count: 2</p></div>");
//! ```

pub mod dom;
pub mod render;
pub mod template;

// Re-export commonly used types
pub use dom::{Document, NodeId, NodeKind};
pub use render::{Binding, Part, TemplateInstance, Value, ValueProducer};
pub use template::{html, Template, TemplateCache, TemplatePart, TemplateResult, TemplateStrings};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
