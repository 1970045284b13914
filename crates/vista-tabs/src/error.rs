//! Tab error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabError {
    #[error("Tab not found: {0}")]
    NotFound(String),

    #[error("Tab name cannot be empty")]
    EmptyName,

    #[error("Invalid session snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}
