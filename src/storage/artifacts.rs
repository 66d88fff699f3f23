//! Artifact store for downloaded book texts and covers

use crate::crawler::BookRecord;
use crate::storage::sanitize::sanitize_filename;
use crate::storage::{StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Extension used for book texts
pub const TEXT_EXTENSION: &str = "txt";

/// Paths of the files written for one book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub text: PathBuf,
    pub image: PathBuf,
}

/// Writes book texts and cover images into two output directories
///
/// Files are named after the sanitized book title. Writing a second book with
/// the same sanitized title replaces the earlier file.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    books_dir: PathBuf,
    images_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(books_dir: impl Into<PathBuf>, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            books_dir: books_dir.into(),
            images_dir: images_dir.into(),
        }
    }

    pub fn books_dir(&self) -> &Path {
        &self.books_dir
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Writes the raw text body as `<books_dir>/<title>.txt`
    ///
    /// The bytes are written as received, without re-encoding.
    pub fn write_text(&self, record: &BookRecord, body: &[u8]) -> StorageResult<PathBuf> {
        let filename = format!("{}.{}", sanitize_filename(&record.title), TEXT_EXTENSION);
        write_file(&self.books_dir, &filename, body)
    }

    /// Writes the cover bytes as `<images_dir>/<title><.ext>`
    ///
    /// The extension comes from the last path segment of `source_url`; if that
    /// segment has none, the file gets no extension.
    pub fn write_image(
        &self,
        record: &BookRecord,
        image: &[u8],
        source_url: &Url,
    ) -> StorageResult<PathBuf> {
        let stem = sanitize_filename(&record.title);
        let filename = match image_extension(source_url) {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem,
        };
        write_file(&self.images_dir, &filename, image)
    }
}

/// Extracts the file extension from a URL's last path segment
///
/// Query strings and fragments are ignored. Extensions containing characters
/// that are unsafe in filenames are dropped.
pub fn image_extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    let ext = Path::new(segment).extension()?.to_str()?;

    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    Some(ext.to_string())
}

fn write_file(dir: &Path, filename: &str, contents: &[u8]) -> StorageResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|source| StorageError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(filename);
    fs::write(&path, contents).map_err(|source| StorageError::Write {
        path: path.clone(),
        source,
    })?;

    tracing::debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(path)
}
