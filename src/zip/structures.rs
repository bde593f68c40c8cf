use byteorder::{LittleEndian, WriteBytesExt};
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::io::{self, Write};

/// Version 2.0: the minimum for store-only archives with directories.
pub const VERSION: u16 = 20;

/// Compression method 0 (stored).
pub const METHOD_STORED: u16 = 0;

/// Packed MS-DOS modification timestamp.
///
/// `time` holds 5 bits of hour, 6 bits of minute and 5 bits of half-seconds;
/// `date` holds 7 bits of years since 1980, 4 bits of month and 5 bits of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable instant.
    pub const MIN: DosDateTime = DosDateTime {
        time: 0,
        date: (1 << 5) | 1,
    };

    /// 2107-12-31 23:59:58, the latest representable instant.
    pub const MAX: DosDateTime = DosDateTime {
        time: (23 << 11) | (59 << 5) | 29,
        date: (127 << 9) | (12 << 5) | 31,
    };

    /// Pack a wall-clock time, clamping to the DOS range.
    pub fn from_naive(dt: &NaiveDateTime) -> Self {
        let year = dt.year();
        if year < 1980 {
            return Self::MIN;
        }
        if year > 2107 {
            return Self::MAX;
        }

        let time = (dt.hour() << 11) | (dt.minute() << 5) | (dt.second() / 2);
        let date = (((year - 1980) as u32) << 9) | (dt.month() << 5) | dt.day();
        Self {
            time: time as u16,
            date: date as u16,
        }
    }
}

/// Local File Header (LFH) - 30 bytes, followed by the name and the data
pub struct LocalFileHeader {
    pub modified: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
}

impl LocalFileHeader {
    pub const SIGNATURE: &'static [u8] = b"PK\x03\x04";
    pub const SIZE: usize = 30;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(Self::SIGNATURE)?;
        w.write_u16::<LittleEndian>(VERSION)?;
        w.write_u16::<LittleEndian>(0)?; // flags
        w.write_u16::<LittleEndian>(METHOD_STORED)?;
        w.write_u16::<LittleEndian>(self.modified.time)?;
        w.write_u16::<LittleEndian>(self.modified.date)?;
        w.write_u32::<LittleEndian>(self.crc32)?;
        w.write_u32::<LittleEndian>(self.compressed_size)?;
        w.write_u32::<LittleEndian>(self.uncompressed_size)?;
        w.write_u16::<LittleEndian>(self.file_name_length)?;
        w.write_u16::<LittleEndian>(0)?; // extra field length
        Ok(())
    }
}

/// Central Directory File Header (CDFH) - 46 bytes, followed by the name
pub struct CentralDirectoryHeader {
    pub modified: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub lfh_offset: u32,
}

impl CentralDirectoryHeader {
    pub const SIGNATURE: &'static [u8] = b"PK\x01\x02";
    pub const SIZE: usize = 46;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(Self::SIGNATURE)?;
        w.write_u16::<LittleEndian>(VERSION)?; // version made by
        w.write_u16::<LittleEndian>(VERSION)?; // version needed
        w.write_u16::<LittleEndian>(0)?; // flags
        w.write_u16::<LittleEndian>(METHOD_STORED)?;
        w.write_u16::<LittleEndian>(self.modified.time)?;
        w.write_u16::<LittleEndian>(self.modified.date)?;
        w.write_u32::<LittleEndian>(self.crc32)?;
        w.write_u32::<LittleEndian>(self.compressed_size)?;
        w.write_u32::<LittleEndian>(self.uncompressed_size)?;
        w.write_u16::<LittleEndian>(self.file_name_length)?;
        w.write_u16::<LittleEndian>(0)?; // extra field length
        w.write_u16::<LittleEndian>(0)?; // file comment length
        w.write_u16::<LittleEndian>(0)?; // disk number start
        w.write_u16::<LittleEndian>(0)?; // internal attributes
        w.write_u32::<LittleEndian>(0)?; // external attributes
        w.write_u32::<LittleEndian>(self.lfh_offset)?;
        Ok(())
    }
}

/// End of Central Directory (EOCD) - 22 bytes, no comment
pub struct EndOfCentralDirectory {
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(Self::SIGNATURE)?;
        w.write_u16::<LittleEndian>(0)?; // this disk
        w.write_u16::<LittleEndian>(0)?; // disk holding the central directory
        w.write_u16::<LittleEndian>(self.total_entries)?; // entries on this disk
        w.write_u16::<LittleEndian>(self.total_entries)?;
        w.write_u32::<LittleEndian>(self.cd_size)?;
        w.write_u32::<LittleEndian>(self.cd_offset)?;
        w.write_u16::<LittleEndian>(0)?; // comment length
        Ok(())
    }
}
