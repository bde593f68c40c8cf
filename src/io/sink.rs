use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{ArchiveError, Result};

/// Destination for a finished archive
#[async_trait]
pub trait SaveSink: Send + Sync {
    /// Persist `bytes` under `file_name`, returning where they ended up
    ///
    /// # Errors
    ///
    /// Fails with [`ArchiveError::SaveFailure`] when the data could not be
    /// persisted. A failed save leaves nothing behind.
    async fn save(&self, bytes: &[u8], file_name: &str, mime_type: &str) -> Result<PathBuf>;
}

/// Writes archives into a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    overwrite: bool,
}

impl DirectorySink {
    /// Sink writing into `dir`, refusing to replace existing files
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overwrite: false,
        }
    }

    /// Sink writing into the system temporary directory, replacing files
    pub fn temp() -> Self {
        Self::new(std::env::temp_dir()).overwrite(true)
    }

    pub fn overwrite(mut self, yes: bool) -> Self {
        self.overwrite = yes;
        self
    }

    async fn write_new(&self, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let mut options = fs::OpenOptions::new();
        options.write(true);
        if self.overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(target).await?;
        let written = async {
            file.write_all(bytes).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;

        if written.is_err() {
            drop(file);
            let _ = fs::remove_file(target).await;
        }
        written
    }
}

#[async_trait]
impl SaveSink for DirectorySink {
    async fn save(&self, bytes: &[u8], file_name: &str, mime_type: &str) -> Result<PathBuf> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(ArchiveError::save_failure(
                file_name,
                "file name must not be empty or contain path separators",
            ));
        }

        let target = self.dir.join(file_name);
        self.write_new(&target, bytes)
            .await
            .map_err(|e| ArchiveError::save_failure(file_name, e))?;

        tracing::debug!(path = %target.display(), mime_type, size = bytes.len(), "saved");
        Ok(target)
    }
}
