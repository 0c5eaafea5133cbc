// ABOUTME: Live rendering pipeline for template instances
// ABOUTME: Exposes values, producers, parts, and instance update machinery

pub mod error;
pub mod instance;
pub mod part;
pub mod value;

pub use error::{RenderError, Result};
pub use instance::TemplateInstance;
pub use part::{AttributePart, NodePart, Part};
pub use value::{Binding, Value, ValueProducer};
