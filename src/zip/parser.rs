//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory in a single ranged read
//! 4. Decode its headers one at a time as the caller iterates
//! 5. For extraction, read each file's Local File Header and data
//!
//! Step 4 is lazy: a caller that stops after the entry it wants never pays
//! for decoding the headers behind it.

use byteorder::{LittleEndian, ReadBytesExt};
use bytes::Bytes;
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level ZIP file parser.
///
/// Generic over the reader type so the same code serves remote and
/// in-memory archives. Typically used through
/// [`ZipExtractor`](super::ZipExtractor) rather than directly.
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// The EOCD is located at the end of the ZIP file. This method
    /// handles both the simple case (no comment) and archives with
    /// comments by searching backwards for the signature.
    ///
    /// Returns the record and its offset in the file.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        // Common case first: no archive comment.
        if self.size >= EndOfCentralDirectory::SIZE as u64 {
            let offset = self.size - EndOfCentralDirectory::SIZE as u64;
            let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
            self.reader.read_exact_at(offset, &mut buf).await?;

            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
                let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
                return Ok((eocd, offset));
            }
        }

        // The EOCD sits before a comment of up to 64 KiB; search backwards.
        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf).await?;

        if buf.len() >= EndOfCentralDirectory::SIZE {
            for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
                if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                    // The comment length must account for every remaining byte.
                    let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                    if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                        let eocd = EndOfCentralDirectory::from_bytes(
                            &buf[i..i + EndOfCentralDirectory::SIZE],
                        )?;
                        return Ok((eocd, search_start + i as u64));
                    }
                }
            }
        }

        bail!("Not a valid ZIP file")
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD indicates ZIP64 extensions are needed
    /// (fields set to 0xFFFF or 0xFFFFFFFF).
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        // The ZIP64 EOCD Locator is located immediately before the regular EOCD
        let Some(locator_offset) = eocd_offset.checked_sub(Zip64EOCDLocator::SIZE as u64) else {
            bail!("Invalid ZIP64 format");
        };
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader
            .read_exact_at(locator_offset, &mut locator_buf)
            .await?;

        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.reader
            .read_exact_at(locator.eocd64_offset, &mut eocd64_buf)
            .await?;

        Zip64EOCD::from_bytes(&eocd64_buf)
    }

    /// Fetch the Central Directory.
    ///
    /// The whole directory is read with one request; its headers are decoded
    /// as the returned [`CentralDirectory`] is iterated.
    pub async fn central_directory(&self) -> Result<CentralDirectory> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        if cd_offset.saturating_add(cd_size) > self.size {
            bail!("Central Directory lies outside the archive");
        }

        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset, &mut cd_data).await?;

        Ok(CentralDirectory {
            cursor: Cursor::new(Bytes::from(cd_data)),
            remaining: total_entries,
        })
    }

    /// Get the actual data offset for a file entry.
    ///
    /// The Local File Header (LFH) has variable-length fields (filename,
    /// extra field) that may differ from the Central Directory entry, so the
    /// LFH itself has to be read to find where the data begins.
    pub async fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.reader
            .read_exact_at(entry.lfh_offset, &mut lfh_buf)
            .await?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            bail!("Invalid Local File Header");
        }

        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26); // Offset to filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        let data_offset =
            entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length;

        if data_offset.saturating_add(entry.compressed_size) > self.size {
            bail!("Entry data for {} lies outside the archive", entry.file_name);
        }

        Ok(data_offset)
    }

    /// Get a reference to the underlying reader.
    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}

/// The Central Directory of an archive, decoded lazily.
///
/// Yields entries in the order they are stored, which is the archive's
/// native order.
pub struct CentralDirectory {
    cursor: Cursor<Bytes>,
    remaining: u64,
}

impl CentralDirectory {
    /// Number of entries not yet yielded.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Iterator for CentralDirectory {
    type Item = Result<ZipFileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let entry = parse_cdfh(&mut self.cursor);
        if entry.is_err() {
            // A corrupt header makes every later offset meaningless.
            self.remaining = 0;
        }
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (0, Some(remaining))
    }
}

/// Parse a Central Directory File Header from a cursor.
fn parse_cdfh(cursor: &mut Cursor<Bytes>) -> Result<ZipFileEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        bail!("Invalid Central Directory File Header");
    }

    let version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    let mut file_name = decode_file_name(&file_name_bytes, flags);

    let mut mtime = None;
    let extra_field_end = cursor.position() + extra_field_length as u64;
    if extra_field_end > cursor.get_ref().len() as u64 {
        bail!("Truncated Central Directory File Header");
    }

    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()?;
        let field_end = (cursor.position() + field_size as u64).min(extra_field_end);

        match header_id {
            EXTRA_ZIP64 => {
                // Fields are present only if the header field is saturated
                if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    uncompressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    compressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    lfh_offset = cursor.read_u64::<LittleEndian>()?;
                }
            }
            EXTRA_EXTENDED_TIMESTAMP => {
                // flags byte; bit 0 means the modification time follows
                if cursor.position() + 5 <= field_end {
                    let ts_flags = cursor.read_u8()?;
                    if ts_flags & 1 != 0 {
                        mtime = Some(cursor.read_i32::<LittleEndian>()? as i64);
                    }
                }
            }
            EXTRA_UNICODE_PATH => {
                let start = cursor.position() as usize;
                let end = field_end as usize;
                if let Some(name) = unicode_path(&cursor.get_ref()[start..end], &file_name_bytes)
                {
                    file_name = name;
                }
            }
            _ => {}
        }
        cursor.set_position(field_end);
    }

    cursor.set_position(extra_field_end + file_comment_length as u64);

    // Directory entries end with '/'
    let is_directory = file_name.ends_with('/');

    Ok(ZipFileEntry {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        last_mod_time,
        last_mod_date,
        is_directory,
        flags,
        version_made_by,
        external_attrs,
        mtime,
    })
}

/// Decode an entry name.
///
/// Names flagged UTF-8, or that happen to be valid UTF-8, are taken as is.
/// Anything else was written by a tool using the legacy code page of a
/// Chinese-locale Windows, so it is decoded as GBK instead of being mangled
/// into replacement characters. Backslash separators are normalised to `/`.
pub fn decode_file_name(bytes: &[u8], flags: u16) -> String {
    let name = match std::str::from_utf8(bytes) {
        Ok(name) => name.to_string(),
        Err(_) if flags & FLAG_UTF8 != 0 => String::from_utf8_lossy(bytes).into_owned(),
        Err(_) => {
            let (name, _, _) = encoding_rs::GBK.decode(bytes);
            name.into_owned()
        }
    };
    name.replace('\\', "/")
}

/// Info-ZIP Unicode Path extra field: version 1, CRC-32 of the header name,
/// then the UTF-8 name. Ignored when the CRC shows the header name changed.
fn unicode_path(field: &[u8], header_name: &[u8]) -> Option<String> {
    if field.len() < 5 || field[0] != 1 {
        return None;
    }
    let crc = u32::from_le_bytes([field[1], field[2], field[3], field[4]]);
    let mut hasher = flate2::Crc::new();
    hasher.update(header_name);
    if hasher.sum() != crc {
        return None;
    }
    std::str::from_utf8(&field[5..])
        .ok()
        .map(|name| name.replace('\\', "/"))
}
