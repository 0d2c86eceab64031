//! Schema sources
//!
//! A [`SchemaSource`] turns a policy name into raw schema text. The cache
//! calls it at most once per cold key and never holds a lock while it runs,
//! so implementations are free to block.

use std::error::Error as StdError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures a schema source may report
#[derive(Debug, Error)]
pub enum SourceError {
    /// No schema exists for the name
    #[error("schema not found")]
    NotFound,

    /// The fetch pipeline reported a domain failure
    #[error("{0}")]
    Business(String),

    /// Anything else: I/O, transport, decoding
    #[error("{0}")]
    Infrastructure(#[source] Box<dyn StdError + Send + Sync>),
}

/// Fetches raw schema text for a policy name.
pub trait SchemaSource: Send + Sync {
    fn fetch(&self, name: &str) -> Result<String, SourceError>;
}

impl<F> SchemaSource for F
where
    F: Fn(&str) -> Result<String, SourceError> + Send + Sync,
{
    fn fetch(&self, name: &str) -> Result<String, SourceError> {
        self(name)
    }
}

/// Reads `<dir>/<name>.json`.
///
/// Names are request data: anything that could escape the directory is
/// reported as not found rather than touching the filesystem.
#[derive(Debug, Clone)]
pub struct DirectorySchemaSource {
    dir: PathBuf,
}

impl DirectorySchemaSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the schema directory path.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the schema file for `name`, or None if the name is not a plain file stem.
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        let plain = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains("..")
            && !name.contains(['/', '\\', '\0']);
        plain.then(|| self.dir.join(format!("{}.json", name)))
    }
}

impl SchemaSource for DirectorySchemaSource {
    fn fetch(&self, name: &str) -> Result<String, SourceError> {
        let path = self.path_for(name).ok_or(SourceError::NotFound)?;
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound,
            _ => SourceError::Infrastructure(Box::new(e)),
        })
    }
}
