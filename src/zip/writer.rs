use chrono::Local;
use tracing::debug;

use crate::checksum::crc32;
use crate::error::{ArchiveError, Result};
use crate::request::Entry;

use super::structures::*;

const FORMAT: &str = "zip";

/// Most entries a non-ZIP64 archive can hold; 0xFFFF in the end record means ZIP64.
const MAX_ENTRIES: usize = u16::MAX as usize - 1;

/// Per-entry metadata remembered until the central directory is written.
struct ZipRecord {
    name: Vec<u8>,
    crc32: u32,
    size: u32,
    modified: DosDateTime,
    lfh_offset: u32,
}

/// Incremental store-only ZIP encoder.
///
/// Each [`add`](ZipWriter::add) appends a local header, the name and the raw
/// content; [`finish`](ZipWriter::finish) appends the central directory and
/// the end record. The archive is built entirely in memory.
///
/// ## Example
///
/// ```ignore
/// let mut writer = ZipWriter::new();
/// for entry in &entries {
///     writer.add(entry)?;
/// }
/// let bytes = writer.finish()?;
/// ```
pub struct ZipWriter {
    /// Archive bytes written so far; its length is the running offset
    out: Vec<u8>,
    records: Vec<ZipRecord>,
}

impl ZipWriter {
    pub fn new() -> Self {
        Self {
            out: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Create a writer sized for `entries`, avoiding reallocation.
    pub fn for_entries(entries: &[Entry]) -> Self {
        let capacity = entries
            .iter()
            .map(|e| {
                LocalFileHeader::SIZE
                    + CentralDirectoryHeader::SIZE
                    + 2 * e.path().len()
                    + e.content().len()
            })
            .sum::<usize>()
            + EndOfCentralDirectory::SIZE;

        Self {
            out: Vec::with_capacity(capacity),
            records: Vec::with_capacity(entries.len()),
        }
    }

    /// Append one entry's local header and data.
    ///
    /// # Errors
    ///
    /// Fails with [`ArchiveError::TooLarge`] when the name, the content or the
    /// header offset does not fit the 16/32-bit ZIP fields.
    pub fn add(&mut self, entry: &Entry) -> Result<()> {
        if self.records.len() >= MAX_ENTRIES {
            return Err(ArchiveError::too_large("entry count", FORMAT));
        }

        let name = entry.path().as_bytes().to_vec();
        let file_name_length = u16::try_from(name.len())
            .map_err(|_| ArchiveError::too_large(format!("name of {}", entry.path()), FORMAT))?;
        let size = u32::try_from(entry.content().len())
            .map_err(|_| ArchiveError::too_large(format!("size of {}", entry.path()), FORMAT))?;
        let lfh_offset = offset_u32(self.out.len())?;

        let crc32 = crc32(entry.content());
        let modified = DosDateTime::from_naive(&entry.modified_at().with_timezone(&Local).naive_local());

        LocalFileHeader {
            modified,
            crc32,
            compressed_size: size,
            uncompressed_size: size,
            file_name_length,
        }
        .write_to(&mut self.out)?;
        self.out.extend_from_slice(&name);
        self.out.extend_from_slice(entry.content());

        debug!(
            path = entry.path(),
            size,
            crc32 = %format!("{crc32:08x}"),
            offset = lfh_offset,
            "zip entry"
        );

        self.records.push(ZipRecord {
            name,
            crc32,
            size,
            modified,
            lfh_offset,
        });
        Ok(())
    }

    /// Append the central directory and end record, returning the archive.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cd_offset = offset_u32(self.out.len())?;

        for record in &self.records {
            CentralDirectoryHeader {
                modified: record.modified,
                crc32: record.crc32,
                compressed_size: record.size,
                uncompressed_size: record.size,
                file_name_length: record.name.len() as u16,
                lfh_offset: record.lfh_offset,
            }
            .write_to(&mut self.out)?;
            self.out.extend_from_slice(&record.name);
        }

        let cd_end = offset_u32(self.out.len())?;
        EndOfCentralDirectory {
            total_entries: self.records.len() as u16,
            cd_size: cd_end - cd_offset,
            cd_offset,
        }
        .write_to(&mut self.out)?;

        Ok(self.out)
    }
}

impl Default for ZipWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn offset_u32(offset: usize) -> Result<u32> {
    u32::try_from(offset).map_err(|_| ArchiveError::too_large("archive offset", FORMAT))
}

/// Encode `entries`, in order, as a store-only ZIP archive.
pub fn encode_zip(entries: &[Entry]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::for_entries(entries);
    for entry in entries {
        writer.add(entry)?;
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(path: &str, content: &[u8]) -> Entry {
        Entry::new(path, content.to_vec(), Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
            .unwrap()
    }

    fn u16_at(buf: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([buf[at], buf[at + 1]])
    }

    fn u32_at(buf: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
    }

    #[test]
    fn single_entry_layout() {
        let out = encode_zip(&[entry("a.txt", b"hello")]).unwrap();

        assert_eq!(&out[..4], &[0x50, 0x4B, 0x03, 0x04]);
        assert_eq!(u16_at(&out, 4), 20);
        assert_eq!(u16_at(&out, 8), 0);
        assert_eq!(u32_at(&out, 14), crc32(b"hello"));
        assert_eq!(u32_at(&out, 18), 5);
        assert_eq!(u32_at(&out, 22), 5);
        assert_eq!(u16_at(&out, 26), 5);
        assert_eq!(&out[30..35], b"a.txt");
        assert_eq!(&out[35..40], b"hello");

        let cd = 40;
        assert_eq!(&out[cd..cd + 4], CentralDirectoryHeader::SIGNATURE);
        assert_eq!(u32_at(&out, cd + 42), 0);
        assert_eq!(&out[cd + 46..cd + 51], b"a.txt");

        let eocd = out.len() - EndOfCentralDirectory::SIZE;
        assert_eq!(eocd, cd + 51);
        assert_eq!(&out[eocd..eocd + 4], EndOfCentralDirectory::SIGNATURE);
        assert_eq!(u16_at(&out, eocd + 8), 1);
        assert_eq!(u16_at(&out, eocd + 10), 1);
        assert_eq!(u32_at(&out, eocd + 12), 51);
        assert_eq!(u32_at(&out, eocd + 16), 40);
    }

    #[test]
    fn central_offsets_point_at_matching_local_headers() {
        let entries = vec![
            entry("one.txt", b"first"),
            entry("dir/two.bin", &[0u8; 300]),
            entry("empty", b""),
        ];
        let out = encode_zip(&entries).unwrap();

        let eocd = out.len() - EndOfCentralDirectory::SIZE;
        let mut cd = u32_at(&out, eocd + 16) as usize;
        for e in &entries {
            let name_len = u16_at(&out, cd + 28) as usize;
            let lfh = u32_at(&out, cd + 42) as usize;
            assert_eq!(&out[cd + 46..cd + 46 + name_len], e.path().as_bytes());

            assert_eq!(&out[lfh..lfh + 4], LocalFileHeader::SIGNATURE);
            assert_eq!(u32_at(&out, lfh + 14), crc32(e.content()));
            assert_eq!(&out[lfh + 30..lfh + 30 + name_len], e.path().as_bytes());
            assert_eq!(u32_at(&out, cd + 16), u32_at(&out, lfh + 14));

            cd += CentralDirectoryHeader::SIZE + name_len;
        }
        assert_eq!(cd, eocd);
    }

    #[test]
    fn incremental_writer_matches_one_shot() {
        let entries = vec![entry("a", b"1"), entry("b", b"22")];
        let mut writer = ZipWriter::new();
        for e in &entries {
            writer.add(e).unwrap();
        }
        assert_eq!(writer.finish().unwrap(), encode_zip(&entries).unwrap());
    }

    #[test]
    fn entry_count_stops_short_of_zip64_marker() {
        let empty = entry("e", b"");
        let mut writer = ZipWriter::new();
        for _ in 0..MAX_ENTRIES {
            writer.add(&empty).unwrap();
        }
        let err = writer.add(&empty).unwrap_err();
        assert!(matches!(err, ArchiveError::TooLarge { format: "zip", .. }));

        let out = writer.finish().unwrap();
        let eocd = out.len() - EndOfCentralDirectory::SIZE;
        assert_eq!(u16::from_le_bytes([out[eocd + 10], out[eocd + 11]]), 0xFFFE);
    }

    #[test]
    fn overlong_name_is_rejected() {
        let long = "n".repeat(u16::MAX as usize + 1);
        let err = encode_zip(&[entry(&long, b"")]).unwrap_err();
        assert!(matches!(err, ArchiveError::TooLarge { format: "zip", .. }));
    }
}
