//! Opaque handle to a user-selected manual file.

use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::{FsmcError, Result};

/// Extension accepted by the file picker
pub const ACCEPTED_EXTENSION: &str = "txt";

#[derive(Debug, Clone, PartialEq, Eq)]
enum FileSource {
    /// Read lazily when a compile needs the bytes
    Path(PathBuf),
    /// Contents already in memory (drag-and-drop, tests)
    Memory(Bytes),
}

/// A manual selected through the file picker.
///
/// The handle carries a display name and knows how to produce its bytes; the
/// rest of the crate never looks inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualFile {
    name: String,
    source: FileSource,
}

impl ManualFile {
    /// Handle for a file on disk. No I/O happens until [`ManualFile::read`].
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                FsmcError::InputValidation(format!("'{}' is not a file path", path.display()))
            })?;

        Ok(Self {
            name,
            source: FileSource::Path(path),
        })
    }

    /// Handle for contents that are already in memory.
    pub fn from_bytes(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            source: FileSource::Memory(content.into()),
        }
    }

    /// Display name shown next to the picker.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            FileSource::Path(path) => Some(path),
            FileSource::Memory(_) => None,
        }
    }

    /// Whether the picker's `.txt` filter would offer this file.
    pub fn has_accepted_extension(&self) -> bool {
        Path::new(&self.name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(ACCEPTED_EXTENSION))
    }

    /// Raw file contents.
    pub async fn read(&self) -> Result<Bytes> {
        match &self.source {
            FileSource::Memory(content) => Ok(content.clone()),
            FileSource::Path(path) => {
                let content = tokio::fs::read(path).await?;
                tracing::debug!(path = %path.display(), bytes = content.len(), "Read manual file");
                Ok(Bytes::from(content))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_path_uses_file_name() {
        let file = ManualFile::from_path("/tmp/manuals/pump.txt").unwrap();
        assert_eq!(file.name(), "pump.txt");
        assert_eq!(file.path(), Some(Path::new("/tmp/manuals/pump.txt")));
    }

    #[test]
    fn test_from_path_rejects_directory_like_paths() {
        assert!(ManualFile::from_path("/").is_err());
        assert!(ManualFile::from_path("..").is_err());
    }

    #[test]
    fn test_accepted_extension() {
        assert!(ManualFile::from_bytes("manual.txt", "x").has_accepted_extension());
        assert!(ManualFile::from_bytes("MANUAL.TXT", "x").has_accepted_extension());
        assert!(!ManualFile::from_bytes("manual.pdf", "x").has_accepted_extension());
        assert!(!ManualFile::from_bytes("manual", "x").has_accepted_extension());
    }

    #[tokio::test]
    async fn test_read_from_memory() {
        let file = ManualFile::from_bytes("manual.txt", "Step 1...");
        assert_eq!(file.read().await.unwrap(), Bytes::from("Step 1..."));
        assert!(file.path().is_none());
    }

    #[tokio::test]
    async fn test_read_from_disk() {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        write!(temp, "Step 1: press start").unwrap();

        let file = ManualFile::from_path(temp.path()).unwrap();
        assert_eq!(file.read().await.unwrap(), Bytes::from("Step 1: press start"));
    }

    #[tokio::test]
    async fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = ManualFile::from_path(dir.path().join("gone.txt")).unwrap();
        assert!(matches!(file.read().await, Err(FsmcError::Io(_))));
    }
}
