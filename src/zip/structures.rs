use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{DateTime, NaiveDate, Utc};
use std::io::Cursor;

use anyhow::{bail, Result};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            bail!("Invalid End of Central Directory");
        }

        // Verify signature
        if &data[0..4] != Self::SIGNATURE {
            bail!("Invalid End of Central Directory");
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EOCDLocator {
    pub disk_with_eocd64: u32,
    pub eocd64_offset: u64,
    pub total_disks: u32,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            bail!("Invalid ZIP64 format");
        }

        if &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 format");
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_with_eocd64: cursor.read_u32::<LittleEndian>()?,
            eocd64_offset: cursor.read_u64::<LittleEndian>()?,
            total_disks: cursor.read_u32::<LittleEndian>()?,
        })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub eocd64_size: u64,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub disk_number: u32,
    pub disk_with_cd: u32,
    pub disk_entries: u64,
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE {
            bail!("Invalid ZIP64 format");
        }

        if &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 format");
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            eocd64_size: cursor.read_u64::<LittleEndian>()?,
            version_made_by: cursor.read_u16::<LittleEndian>()?,
            version_needed: cursor.read_u16::<LittleEndian>()?,
            disk_number: cursor.read_u32::<LittleEndian>()?,
            disk_with_cd: cursor.read_u32::<LittleEndian>()?,
            disk_entries: cursor.read_u64::<LittleEndian>()?,
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// General purpose flag: entry is encrypted.
pub const FLAG_ENCRYPTED: u16 = 0x0001;
/// General purpose flag: file name and comment are UTF-8 (language encoding flag).
pub const FLAG_UTF8: u16 = 0x0800;

/// Extra field IDs understood by the parser.
pub const EXTRA_ZIP64: u16 = 0x0001;
pub const EXTRA_EXTENDED_TIMESTAMP: u16 = 0x5455;
pub const EXTRA_UNICODE_PATH: u16 = 0x7075;

/// "Version made by" host system for Unix.
const HOST_UNIX: u8 = 3;
const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub is_directory: bool,
    pub flags: u16,
    pub version_made_by: u16,
    pub external_attrs: u32,
    /// Modification time from the extended timestamp extra field, in Unix seconds.
    pub mtime: Option<i64>,
}

impl ZipFileEntry {
    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }

    /// Modification time, preferring the extended timestamp over the DOS fields.
    ///
    /// DOS times carry no zone and are reported as UTC. Invalid DOS values
    /// (month 0 and the like) fall back to the Unix epoch.
    pub fn modified(&self) -> DateTime<Utc> {
        if let Some(ts) = self.mtime.and_then(|secs| DateTime::from_timestamp(secs, 0)) {
            return ts;
        }
        let (year, month, day) = self.mod_date();
        let (hour, minute, second) = self.mod_time();
        NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
            .and_then(|d| d.and_hms_opt(hour as u32, minute as u32, second as u32))
            .map(|dt| dt.and_utc())
            .unwrap_or(DateTime::UNIX_EPOCH)
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    /// Unix permission and type bits, when the entry was made on Unix.
    pub fn unix_mode(&self) -> Option<u32> {
        ((self.version_made_by >> 8) as u8 == HOST_UNIX).then_some(self.external_attrs >> 16)
    }

    pub fn is_symlink(&self) -> bool {
        self.unix_mode().is_some_and(|mode| mode & S_IFMT == S_IFLNK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ZipFileEntry {
        ZipFileEntry {
            file_name: "a.txt".to_string(),
            compression_method: CompressionMethod::Stored,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset: 0,
            // 2023-06-15 12:30:20
            last_mod_time: (12 << 11) | (30 << 5) | 10,
            last_mod_date: ((2023 - 1980) << 9) | (6 << 5) | 15,
            is_directory: false,
            flags: 0,
            version_made_by: 0,
            external_attrs: 0,
            mtime: None,
        }
    }

    #[test]
    fn dos_time_is_decoded_as_utc() {
        let modified = entry().modified();
        assert_eq!(modified.to_rfc3339(), "2023-06-15T12:30:20+00:00");
    }

    #[test]
    fn extended_timestamp_wins_over_dos_time() {
        let mut e = entry();
        e.mtime = Some(1_700_000_000);
        assert_eq!(e.modified().timestamp(), 1_700_000_000);
    }

    #[test]
    fn invalid_dos_date_falls_back_to_epoch() {
        let mut e = entry();
        e.last_mod_date = 0;
        assert_eq!(e.modified(), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn symlinks_need_a_unix_host() {
        let mut e = entry();
        e.external_attrs = 0o120777u32 << 16;
        assert!(!e.is_symlink());
        e.version_made_by = (3 << 8) | 20;
        assert!(e.is_symlink());
        e.external_attrs = 0o100644u32 << 16;
        assert!(!e.is_symlink());
    }
}
