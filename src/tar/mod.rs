//! USTAR archive encoding.
//!
//! ## Archive Layout
//!
//! A tar stream is a sequence of 512-byte blocks:
//! 1. A header block per directory and per file
//! 2. For files, the data padded with zeros to the next block boundary
//! 3. Two all-zero blocks marking the end of the archive
//!
//! Numeric header fields are NUL-terminated octal ASCII. Directories implied
//! by entry paths get their own header, written once, before the first file
//! inside them.
//!
//! ## Limitations
//!
//! - No GNU long-name or PAX records; names beyond 255 bytes are truncated
//! - Files must be smaller than 8 GiB (11 octal digits)

mod header;
mod writer;

pub use header::{BLOCK_SIZE, EntryType, Header, checksum, split_name, stored_checksum};
pub use writer::{TarWriter, encode_tar};
