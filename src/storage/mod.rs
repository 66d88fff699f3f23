//! Storage module for persisting downloaded books
//!
//! This module handles everything that touches the output directories:
//! - Sanitizing titles into safe filenames
//! - Creating output directories on demand
//! - Writing book texts and cover images

mod artifacts;
mod sanitize;

pub use artifacts::{image_extension, ArtifactPaths, ArtifactStore, TEXT_EXTENSION};
pub use sanitize::{sanitize_filename, FALLBACK_FILENAME};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
