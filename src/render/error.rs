// ABOUTME: Error types for instance construction and the update protocol
// ABOUTME: Distinguishes corrupted templates from caller-side arity mistakes

use thiserror::Error;

use crate::dom::DomError;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("corrupt template: {0}")]
    CorruptTemplate(&'static str),

    #[error("update needs {needed} values but {supplied} were supplied")]
    ArityMismatch { needed: usize, supplied: usize },

    #[error("document tree error: {0}")]
    Dom(#[from] DomError),
}

pub type Result<T> = std::result::Result<T, RenderError>;
