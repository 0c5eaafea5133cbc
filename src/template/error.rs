// ABOUTME: Error types for template parsing and rendering entry points
// ABOUTME: Wraps document tree and render errors behind one template-level enum

use thiserror::Error;

use crate::dom::DomError;
use crate::render::RenderError;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("dynamic attribute value is not preceded by an attribute name in segment {segment:?}")]
    MalformedAttribute { segment: String },

    #[error("document tree error: {0}")]
    Dom(#[from] DomError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

pub type Result<T> = std::result::Result<T, TemplateError>;
