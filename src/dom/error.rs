// ABOUTME: Error types for document tree operations
// ABOUTME: Covers markup parsing failures and invalid node handle usage

use thiserror::Error;

use super::NodeId;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("markup parse error at byte {pos}: {message}")]
    Parse { pos: usize, message: String },

    #[error("node {0:?} is detached and cannot be used as an insertion reference")]
    Detached(NodeId),

    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("node {0:?} is not a text node")]
    NotText(NodeId),
}

pub type Result<T> = std::result::Result<T, DomError>;
