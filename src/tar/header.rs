use crate::error::{ArchiveError, Result};

/// Size of every header and data block.
pub const BLOCK_SIZE: usize = 512;

pub const NAME_LEN: usize = 100;
pub const PREFIX_LEN: usize = 155;

/// Field offsets within a USTAR header block.
mod field {
    use std::ops::Range;

    pub const NAME: Range<usize> = 0..100;
    pub const MODE: Range<usize> = 100..108;
    pub const UID: Range<usize> = 108..116;
    pub const GID: Range<usize> = 116..124;
    pub const SIZE: Range<usize> = 124..136;
    pub const MTIME: Range<usize> = 136..148;
    pub const CHECKSUM: Range<usize> = 148..156;
    pub const TYPEFLAG: usize = 156;
    pub const MAGIC: Range<usize> = 257..263;
    pub const VERSION: Range<usize> = 263..265;
    pub const UNAME: Range<usize> = 265..297;
    pub const GNAME: Range<usize> = 297..329;
    pub const DEVMAJOR: Range<usize> = 329..337;
    pub const DEVMINOR: Range<usize> = 337..345;
    pub const PREFIX: Range<usize> = 345..500;
}

const MAGIC: &[u8] = b"ustar\0";
const VERSION: &[u8] = b"00";
const OWNER_NAME: &[u8] = b"user";
const GROUP_NAME: &[u8] = b"group";

/// USTAR entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    File,
    Directory,
}

impl EntryType {
    pub fn flag(&self) -> u8 {
        match self {
            EntryType::File => b'0',
            EntryType::Directory => b'5',
        }
    }

    pub fn mode(&self) -> u64 {
        match self {
            EntryType::File => 0o644,
            EntryType::Directory => 0o777,
        }
    }
}

/// One 512-byte USTAR header block.
#[derive(Clone)]
pub struct Header {
    block: [u8; BLOCK_SIZE],
}

impl Header {
    /// Header for a regular file of `size` bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`ArchiveError::TooLarge`] when `size` needs more than the
    /// 11 octal digits of the size field.
    pub fn file(path: &str, size: u64, mtime: u64) -> Result<Self> {
        Self::build(path, EntryType::File, size, mtime)
    }

    /// Header for a directory; `path` should end in `/`.
    pub fn directory(path: &str, mtime: u64) -> Result<Self> {
        Self::build(path, EntryType::Directory, 0, mtime)
    }

    fn build(path: &str, kind: EntryType, size: u64, mtime: u64) -> Result<Self> {
        let mut block = [0u8; BLOCK_SIZE];

        let (name, prefix) = split_name(path.as_bytes());
        block[field::NAME][..name.len()].copy_from_slice(name);
        block[field::PREFIX][..prefix.len()].copy_from_slice(prefix);

        write_octal(&mut block[field::MODE], kind.mode(), "mode")?;
        write_octal(&mut block[field::UID], 0, "uid")?;
        write_octal(&mut block[field::GID], 0, "gid")?;
        write_octal(&mut block[field::SIZE], size, path)?;
        write_octal(&mut block[field::MTIME], mtime, "modification time")?;
        block[field::TYPEFLAG] = kind.flag();
        block[field::MAGIC].copy_from_slice(MAGIC);
        block[field::VERSION].copy_from_slice(VERSION);
        block[field::UNAME][..OWNER_NAME.len()].copy_from_slice(OWNER_NAME);
        block[field::GNAME][..GROUP_NAME.len()].copy_from_slice(GROUP_NAME);
        write_octal(&mut block[field::DEVMAJOR], 0, "devmajor")?;
        write_octal(&mut block[field::DEVMINOR], 0, "devminor")?;

        // Checksum is taken with the field itself filled with spaces.
        block[field::CHECKSUM].fill(b' ');
        let sum = checksum(&block);
        let digits = format!("{sum:06o}");
        block[field::CHECKSUM][..6].copy_from_slice(digits.as_bytes());
        block[field::CHECKSUM][6] = 0;
        block[field::CHECKSUM][7] = b' ';

        Ok(Self { block })
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.block
    }
}

/// Unsigned byte sum of `block` with the checksum field read as spaces.
pub fn checksum(block: &[u8; BLOCK_SIZE]) -> u32 {
    block
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            if field::CHECKSUM.contains(&i) {
                b' ' as u32
            } else {
                b as u32
            }
        })
        .sum()
}

/// Parse the 6-digit octal value stored in a header's checksum field.
pub fn stored_checksum(block: &[u8; BLOCK_SIZE]) -> Option<u32> {
    let digits = std::str::from_utf8(&block[field::CHECKSUM][..6]).ok()?;
    u32::from_str_radix(digits, 8).ok()
}

/// Split a path over the USTAR `name` and `prefix` fields.
///
/// Paths of at most 100 bytes go entirely into `name`. Longer paths are cut at
/// the first `/` that leaves at most 100 bytes (and a non-empty remainder) for
/// `name`, provided the part before it fits the 155-byte `prefix`. Anything
/// else keeps only its last 100 bytes.
pub fn split_name(path: &[u8]) -> (&[u8], &[u8]) {
    if path.len() <= NAME_LEN {
        return (path, &[]);
    }

    let cut = path
        .iter()
        .enumerate()
        .find(|&(i, &b)| b == b'/' && path.len() - i - 1 <= NAME_LEN)
        .map(|(i, _)| i);

    if let Some(i) = cut {
        let (prefix, name) = (&path[..i], &path[i + 1..]);
        if prefix.len() <= PREFIX_LEN && !name.is_empty() && name != b"/" {
            return (name, prefix);
        }
    }

    (&path[path.len() - NAME_LEN..], &[])
}

/// Write `value` as zero-padded octal digits followed by a NUL.
fn write_octal(field: &mut [u8], value: u64, what: &str) -> Result<()> {
    let width = field.len() - 1;
    let digits = format!("{value:0width$o}");
    if digits.len() > width {
        return Err(ArchiveError::too_large(format!("{what} ({value})"), "tar"));
    }
    field[..width].copy_from_slice(digits.as_bytes());
    field[width] = 0;
    Ok(())
}
