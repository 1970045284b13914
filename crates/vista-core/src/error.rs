//! Core error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] vista_storage::StorageError),

    #[error("Tab error: {0}")]
    Tab(#[from] vista_tabs::TabError),

    #[error("Process error: {0}")]
    Process(#[from] vista_process::ProcessError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to install launcher at {path}: {source}")]
    Install {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Usage: {0}")]
    Usage(String),
}
