//! Archive inputs and outputs: entries, formats, requests and finished buffers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, Utc};

use crate::error::{ArchiveError, Result};

/// Name used when neither the caller nor the entries suggest one.
pub const DEFAULT_BASE_NAME: &str = "archive";

/// A named byte payload to be placed in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    path: String,
    content: Vec<u8>,
    modified_at: DateTime<Utc>,
}

impl Entry {
    /// Create an entry, normalizing `path` to a relative forward-slash name.
    ///
    /// Backslashes become `/`, and empty or `.` segments are dropped. A path
    /// that ends in a separator, climbs out with `..`, or has no segments
    /// left is rejected with [`ArchiveError::InvalidPath`].
    pub fn new(
        path: impl AsRef<str>,
        content: impl Into<Vec<u8>>,
        modified_at: DateTime<Utc>,
    ) -> Result<Self> {
        let path = normalize_path(path.as_ref())?;
        Ok(Self {
            path,
            content: content.into(),
            modified_at,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// Uncompressed size in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Last path segment without its final extension.
    ///
    /// Dotfiles such as `.profile` keep their full name.
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        }
    }
}

fn normalize_path(raw: &str) -> Result<String> {
    let unified = raw.replace('\\', "/");
    if unified.ends_with('/') {
        return Err(ArchiveError::InvalidPath(raw.to_string()));
    }

    let segments: Vec<&str> = unified
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect();
    if segments.contains(&"..") {
        return Err(ArchiveError::InvalidPath(raw.to_string()));
    }
    let path = segments.join("/");

    if path.is_empty() {
        return Err(ArchiveError::InvalidPath(raw.to_string()));
    }
    Ok(path)
}

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// Store-only ZIP.
    Zip,
    /// USTAR.
    Tar,
    /// USTAR wrapped in gzip.
    TarGz,
    /// A single file wrapped in gzip.
    Gzip,
}

impl ArchiveFormat {
    /// File-name suffix, including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => ".zip",
            ArchiveFormat::Tar => ".tar",
            ArchiveFormat::TarGz => ".tar.gz",
            ArchiveFormat::Gzip => ".gz",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "application/zip",
            ArchiveFormat::Tar => "application/x-tar",
            ArchiveFormat::TarGz | ArchiveFormat::Gzip => "application/gzip",
        }
    }

    /// Whether the build goes through the gzip codec.
    pub fn needs_codec(&self) -> bool {
        matches!(self, ArchiveFormat::TarGz | ArchiveFormat::Gzip)
    }

    /// Check an entry count against this format before any work is done.
    pub fn check_entry_count(&self, count: usize) -> Result<()> {
        if count == 0 {
            return Err(ArchiveError::EmptySelection);
        }
        if *self == ArchiveFormat::Gzip && count != 1 {
            return Err(ArchiveError::SingleFileRequired(count));
        }
        Ok(())
    }
}

impl FromStr for ArchiveFormat {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar" => Ok(ArchiveFormat::Tar),
            "tar.gz" | "tgz" | "tar+gzip" => Ok(ArchiveFormat::TarGz),
            "gz" | "gzip" => Ok(ArchiveFormat::Gzip),
            _ => Err(ArchiveError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Gzip => "gz",
        };
        f.write_str(tag)
    }
}

/// Per-build settings chosen by the caller, independent of the entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOptions {
    pub format: ArchiveFormat,
    /// Explicit output name without extension; blank means "derive one".
    pub base_name: Option<String>,
    pub append_timestamp: bool,
}

impl ArchiveOptions {
    pub fn new(format: ArchiveFormat) -> Self {
        Self {
            format,
            base_name: None,
            append_timestamp: false,
        }
    }

    pub fn base_name(mut self, name: impl Into<String>) -> Self {
        self.base_name = Some(name.into());
        self
    }

    pub fn append_timestamp(mut self, yes: bool) -> Self {
        self.append_timestamp = yes;
        self
    }
}

/// A validated, immutable description of one archive build.
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    entries: Vec<Entry>,
    options: ArchiveOptions,
}

impl ArchiveRequest {
    /// Validate `entries` against `options.format`.
    ///
    /// Fails with [`ArchiveError::EmptySelection`] for no entries and with
    /// [`ArchiveError::SingleFileRequired`] when gzip-single gets anything
    /// other than exactly one entry.
    pub fn new(entries: Vec<Entry>, options: ArchiveOptions) -> Result<Self> {
        options.format.check_entry_count(entries.len())?;
        Ok(Self { entries, options })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn format(&self) -> ArchiveFormat {
        self.options.format
    }

    pub fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    /// Base name before any timestamp or extension is applied.
    ///
    /// Preference order: explicit name, the folder every entry lives under,
    /// the sole entry's stem, then [`DEFAULT_BASE_NAME`].
    pub fn base_name(&self) -> String {
        let explicit = self
            .options
            .base_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        if let Some(name) = explicit {
            return name.to_string();
        }
        if let Some(folder) = common_folder(&self.entries) {
            return folder.to_string();
        }
        if let [only] = self.entries.as_slice() {
            return only.stem().to_string();
        }
        DEFAULT_BASE_NAME.to_string()
    }

    /// Final file name for this build, using `now` for the optional suffix.
    ///
    /// A base name that already ends in the format's extension has it
    /// removed once, so `notes.gz` never turns into `notes.gz.gz`.
    pub fn output_name(&self, now: DateTime<Local>) -> String {
        let ext = self.options.format.extension();
        let mut base = self.base_name();

        if base.len() > ext.len() && base.to_ascii_lowercase().ends_with(ext) {
            base.truncate(base.len() - ext.len());
        }
        if self.options.append_timestamp {
            base.push_str(&timestamp_suffix(now));
        }
        base.push_str(ext);
        base
    }
}

/// Fixed-width `_YYYYMMDD_HHMMSS` suffix.
pub fn timestamp_suffix(now: DateTime<Local>) -> String {
    now.format("_%Y%m%d_%H%M%S").to_string()
}

/// First path segment shared by every entry, if every entry sits inside it.
fn common_folder(entries: &[Entry]) -> Option<&str> {
    let mut folder: Option<&str> = None;
    for entry in entries {
        let (top, _) = entry.path().split_once('/')?;
        match folder {
            None => folder = Some(top),
            Some(seen) if seen == top => {}
            Some(_) => return None,
        }
    }
    folder
}

/// A finished archive ready to be handed to a save sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveBuffer {
    bytes: Vec<u8>,
    file_name: String,
    format: ArchiveFormat,
}

impl ArchiveBuffer {
    pub(crate) fn new(bytes: Vec<u8>, file_name: String, format: ArchiveFormat) -> Self {
        Self {
            bytes,
            file_name,
            format,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
