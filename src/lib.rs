//! # autozip
//!
//! Build ZIP, TAR, TAR.GZ and single-file GZ archives entirely in memory.
//!
//! Entries come from an [`EntrySource`] (local files and folders, HTTP URLs, or
//! plain in-memory data). The [`Archiver`] validates them, encodes them with a
//! self-contained ZIP (stored) or USTAR encoder, optionally gzips the result and
//! hands the finished bytes to a [`SaveSink`].
//!
//! ## Features
//!
//! - Store-only ZIP with CRC-32 and DOS timestamps
//! - USTAR TAR with synthesized, de-duplicated directory headers
//! - gzip through a pluggable [`Compressor`] (the `gzip` feature, on by default)
//! - Archive naming from the selection, with an optional timestamp suffix
//! - Monotonic progress events for every phase of a build
//!
//! ## Example
//!
//! ```no_run
//! use autozip::{Archiver, ArchiveFormat, ArchiveOptions, DirectorySink, LocalSource};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Pack a folder and a loose file into one tarball
//!     let mut source = LocalSource::new(["./docs", "./README.md"])?;
//!     let options = ArchiveOptions::new(ArchiveFormat::TarGz).base_name("bundle");
//!
//!     let report = Archiver::new()
//!         .run(&mut source, options, &DirectorySink::new("out"), None)
//!         .await?;
//!     println!("{} ({} bytes)", report.location.display(), report.size);
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod checksum;
pub mod cli;
pub mod codec;
pub mod error;
pub mod io;
pub mod progress;
pub mod request;
pub mod tar;
pub mod zip;

pub use archive::{Archiver, SaveReport};
pub use checksum::{Crc32, crc32};
pub use cli::Cli;
#[cfg(feature = "gzip")]
pub use codec::FlateGzip;
pub use codec::{Compressor, NoCodec, default_compressor};
pub use error::{ArchiveError, Result};
pub use io::{ChainSource, DirectorySink, EntrySource, HttpSource, LocalSource, MemorySource, SaveSink};
pub use progress::{NoProgress, Phase, Progress, ProgressObserver};
pub use request::{ArchiveBuffer, ArchiveFormat, ArchiveOptions, ArchiveRequest, Entry};
pub use tar::encode_tar;
pub use zip::encode_zip;
