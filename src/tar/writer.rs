use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::request::Entry;

use super::header::{BLOCK_SIZE, Header};

/// Incremental USTAR encoder.
///
/// Ancestor directories are synthesized on demand: the first file under
/// `a/b/` causes `a/` and `a/b/` headers to be written, and later files
/// under the same directories reuse them.
pub struct TarWriter {
    out: Vec<u8>,
    /// Full directory paths (with trailing `/`) already emitted
    dirs: HashSet<String>,
}

impl TarWriter {
    pub fn new() -> Self {
        Self {
            out: Vec::new(),
            dirs: HashSet::new(),
        }
    }

    /// Create a writer sized for `entries` plus one header per file.
    pub fn for_entries(entries: &[Entry]) -> Self {
        let capacity = entries
            .iter()
            .map(|e| BLOCK_SIZE + padded_len(e.content().len()))
            .sum::<usize>()
            + 2 * BLOCK_SIZE;

        Self {
            out: Vec::with_capacity(capacity),
            dirs: HashSet::new(),
        }
    }

    /// Append the missing ancestor directories of `entry`, then the entry.
    pub fn add(&mut self, entry: &Entry) -> Result<()> {
        let mtime = entry.modified_at().timestamp().max(0) as u64;
        let path = entry.path();

        for (i, _) in path.match_indices('/') {
            let dir = &path[..=i];
            if self.dirs.contains(dir) {
                continue;
            }
            let header = Header::directory(dir, mtime)?;
            self.out.extend_from_slice(header.as_bytes());
            self.dirs.insert(dir.to_string());
            debug!(path = dir, "tar directory");
        }

        let header = Header::file(path, entry.size(), mtime)?;
        self.out.extend_from_slice(header.as_bytes());
        self.out.extend_from_slice(entry.content());
        let pad = padded_len(entry.content().len()) - entry.content().len();
        self.out.resize(self.out.len() + pad, 0);

        debug!(path, size = entry.size(), "tar entry");
        Ok(())
    }

    /// Append the two zero blocks that end the archive.
    pub fn finish(mut self) -> Vec<u8> {
        self.out.resize(self.out.len() + 2 * BLOCK_SIZE, 0);
        self.out
    }
}

impl Default for TarWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Round `len` up to a whole number of blocks.
fn padded_len(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// Encode `entries`, in order, as a USTAR archive.
pub fn encode_tar(entries: &[Entry]) -> Result<Vec<u8>> {
    let mut writer = TarWriter::for_entries(entries);
    for entry in entries {
        writer.add(entry)?;
    }
    Ok(writer.finish())
}
