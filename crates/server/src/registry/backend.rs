//! Whole-document storage for the registry.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

/// Reads and writes the registry document as a single text blob.
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    /// Human-readable location, used in logs and errors.
    fn location(&self) -> String;

    /// Read the whole document. `Ok(None)` means it does not exist yet.
    async fn read(&self) -> io::Result<Option<String>>;

    /// Replace the whole document.
    async fn write(&self, contents: &str) -> io::Result<()>;
}

/// Registry document stored in a single file on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the new contents are staged in before the rename.
    fn staging_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl RegistryBackend for FileBackend {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Writes to a temp file and renames it over the registry, so readers
    /// never observe a half-written document.
    async fn write(&self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let staging = self.staging_path();
        fs::write(&staging, contents).await?;
        fs::rename(&staging, &self.path).await
    }
}
