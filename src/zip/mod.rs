//! Store-only ZIP archive encoding.
//!
//! ## Architecture
//!
//! - [`structures`]: fixed-size ZIP records (local header, central directory
//!   header, end record) and DOS timestamp packing
//! - [`writer`]: the incremental encoder that lays entries out and tracks
//!   offsets for the central directory
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers followed by the raw data of each file
//! 2. Central Directory with metadata and header offsets for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! All integers are little-endian.
//!
//! ## Limitations
//!
//! - STORED method only; data is never compressed
//! - No ZIP64: entries, offsets and sizes must fit the 16/32-bit fields
//! - No encryption, comments or extra fields

mod structures;
mod writer;

pub use structures::*;
pub use writer::{ZipWriter, encode_zip};
