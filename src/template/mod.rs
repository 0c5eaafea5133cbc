// ABOUTME: Template compilation, caching, and result types
// ABOUTME: Turns literal string segments into cached skeletons plus part descriptors

pub mod cache;
pub mod compile;
pub mod error;
pub mod result;

pub use cache::{html, TemplateCache};
pub use compile::{Template, TemplatePart, TemplateStrings};
pub use error::{Result, TemplateError};
pub use result::TemplateResult;
