use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Boxed cause attached to I/O-facing failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Every way an archive build can fail.
///
/// Any of these aborts the build in progress; no partial output is ever
/// handed to a save sink.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// No entries were provided.
    #[error("no files selected: pick at least one file or folder")]
    EmptySelection,

    /// The requested format tag is not one of zip, tar, tar.gz or gz.
    #[error("unsupported archive format: {0:?} (expected zip, tar, tar.gz or gz)")]
    UnsupportedFormat(String),

    /// gzip-single was requested with a number of entries other than one.
    #[error("gz requires exactly one file but {0} were selected; use tar.gz for several")]
    SingleFileRequired(usize),

    /// The host build carries no gzip codec.
    #[error("gzip compression is not available in this build")]
    CodecUnavailable,

    /// The gzip codec itself failed.
    #[error("gzip compression failed: {0}")]
    Codec(#[source] std::io::Error),

    /// An entry's bytes could not be retrieved from its source.
    #[error("failed to read {path}: {source}")]
    ReadFailure {
        path: String,
        #[source]
        source: BoxError,
    },

    /// The save sink rejected the finished archive.
    #[error("failed to save {file_name}: {source}")]
    SaveFailure {
        file_name: String,
        #[source]
        source: BoxError,
    },

    /// An entry path is empty or names a directory.
    #[error("invalid entry path: {0:?}")]
    InvalidPath(String),

    /// A size, offset or count does not fit the target format's fields.
    #[error("{what} exceeds the {format} limit")]
    TooLarge {
        what: String,
        format: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    pub(crate) fn read_failure(path: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ArchiveError::ReadFailure {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn save_failure(file_name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ArchiveError::SaveFailure {
            file_name: file_name.into(),
            source: source.into(),
        }
    }

    pub(crate) fn too_large(what: impl Into<String>, format: &'static str) -> Self {
        ArchiveError::TooLarge {
            what: what.into(),
            format,
        }
    }
}
