use super::EntrySource;
use crate::error::{ArchiveError, Result};
use crate::request::Entry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A file discovered on disk but not read yet
struct PendingFile {
    disk_path: PathBuf,
    archive_path: String,
}

/// Local files and folders
///
/// A file input becomes one entry named after the file. A folder input is
/// walked recursively (in file-name order) and every regular file inside it
/// becomes an entry named relative to the folder's parent, so the folder's
/// own name is the first path segment.
///
/// Discovery happens up front; file contents are read lazily, one entry at
/// a time.
pub struct LocalSource {
    pending: VecDeque<PendingFile>,
}

impl LocalSource {
    pub fn new<I, P>(inputs: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut pending = VecDeque::new();
        for input in inputs {
            discover(input.as_ref(), &mut pending)?;
        }
        Ok(Self { pending })
    }
}

fn discover(given: &Path, pending: &mut VecDeque<PendingFile>) -> Result<()> {
    let read_err = |e: std::io::Error| ArchiveError::read_failure(given.display().to_string(), e);

    let resolved = std::fs::canonicalize(given).map_err(read_err)?;
    let metadata = std::fs::metadata(&resolved).map_err(read_err)?;

    // Named after the path as typed; `.` and `..` only have a name once resolved
    let name = given
        .file_name()
        .or_else(|| resolved.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| resolved.display().to_string());

    if !metadata.is_dir() {
        pending.push_back(PendingFile {
            disk_path: resolved,
            archive_path: name,
        });
        return Ok(());
    }

    let walker = WalkDir::new(&resolved).follow_links(true).sort_by_file_name();
    for dir_entry in walker {
        let dir_entry = dir_entry
            .map_err(|e| ArchiveError::read_failure(resolved.display().to_string(), e))?;
        let file_type = dir_entry.file_type();
        if !file_type.is_file() {
            if !file_type.is_dir() {
                debug!(path = %dir_entry.path().display(), "skipping non-regular file");
            }
            continue;
        }

        let relative = dir_entry.path().strip_prefix(&resolved).unwrap_or(dir_entry.path());
        pending.push_back(PendingFile {
            disk_path: dir_entry.path().to_path_buf(),
            archive_path: format!("{name}/{}", archive_name(relative)),
        });
    }
    Ok(())
}

/// Join the normal components of `path` with `/`
fn archive_name(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl EntrySource for LocalSource {
    async fn next_entry(&mut self) -> Result<Option<Entry>> {
        let Some(file) = self.pending.pop_front() else {
            return Ok(None);
        };

        let read_err =
            |e: std::io::Error| ArchiveError::read_failure(file.disk_path.display().to_string(), e);

        let metadata = tokio::fs::metadata(&file.disk_path).await.map_err(read_err)?;
        let modified_at = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        let content = tokio::fs::read(&file.disk_path).await.map_err(read_err)?;

        Entry::new(&file.archive_path, content, modified_at).map(Some)
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.pending.len())
    }
}
