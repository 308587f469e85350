use std::sync::Arc;
use tokio::io::AsyncReadExt;

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::parser::{CentralDirectory, ZipParser};
use super::reader::{self, EntryReader};
use super::structures::{CompressionMethod, ZipFileEntry};

/// Longest symlink target read back from an entry's data.
const MAX_LINK_TARGET: u64 = 4096;

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt + 'static> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// Iterate the archive's entries in stored order.
    pub async fn entries(&self) -> Result<CentralDirectory> {
        self.parser.central_directory().await
    }

    /// Open a streaming reader over the entry's decompressed contents.
    pub async fn open(&self, entry: &ZipFileEntry) -> Result<EntryReader> {
        Self::check_supported(entry)?;
        let data_offset = self.parser.get_data_offset(entry).await?;
        let reader = self.parser.reader().clone();

        Ok(match entry.compression_method {
            CompressionMethod::Stored => {
                reader::stored(reader, data_offset, entry.uncompressed_size)
            }
            _ => reader::deflated(
                reader,
                data_offset,
                entry.compressed_size,
                entry.uncompressed_size,
            ),
        })
    }

    /// Open a reader over `len` decompressed bytes starting at `start`, if the
    /// entry allows seeking without decompressing.
    ///
    /// Only STORED entries qualify; `Ok(None)` means the caller has to read
    /// from the start and discard.
    pub async fn open_at(
        &self,
        entry: &ZipFileEntry,
        start: u64,
        len: u64,
    ) -> Result<Option<EntryReader>> {
        Self::check_supported(entry)?;
        if entry.compression_method != CompressionMethod::Stored {
            return Ok(None);
        }
        if start.saturating_add(len) > entry.uncompressed_size {
            bail!(
                "range {}+{} exceeds {} ({} bytes)",
                start,
                len,
                entry.file_name,
                entry.uncompressed_size
            );
        }
        let data_offset = self.parser.get_data_offset(entry).await?;
        Ok(Some(reader::stored(
            self.parser.reader().clone(),
            data_offset + start,
            len,
        )))
    }

    /// Read the target path stored as a symlink entry's contents.
    pub async fn read_link_target(&self, entry: &ZipFileEntry) -> Result<String> {
        if entry.uncompressed_size > MAX_LINK_TARGET {
            bail!("symlink target of {} is too long", entry.file_name);
        }
        let mut target = Vec::with_capacity(entry.uncompressed_size as usize);
        self.open(entry).await?.read_to_end(&mut target).await?;
        Ok(String::from_utf8_lossy(&target).into_owned())
    }

    fn check_supported(entry: &ZipFileEntry) -> Result<()> {
        if entry.is_directory {
            bail!("{} is a directory", entry.file_name);
        }
        if entry.is_encrypted() {
            bail!("{} is encrypted", entry.file_name);
        }
        match entry.compression_method {
            CompressionMethod::Stored | CompressionMethod::Deflate => Ok(()),
            CompressionMethod::Unknown(method) => {
                bail!("Unsupported compression method: {}", method)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use std::io::{Cursor, Write};
    use zip::CompressionMethod as ZipMethod;
    use zip::write::SimpleFileOptions;

    fn payload() -> Vec<u8> {
        (0..5000u32).map(|i| (i % 97) as u8).collect()
    }

    fn archive() -> Arc<MemoryReader> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(
                "stored.bin",
                SimpleFileOptions::default().compression_method(ZipMethod::Stored),
            )
            .unwrap();
        writer.write_all(&payload()).unwrap();
        writer
            .start_file(
                "deflated.bin",
                SimpleFileOptions::default().compression_method(ZipMethod::Deflated),
            )
            .unwrap();
        writer.write_all(&payload()).unwrap();
        writer
            .add_symlink("link", "stored.bin", SimpleFileOptions::default())
            .unwrap();
        writer.add_directory("dir/", SimpleFileOptions::default()).unwrap();
        Arc::new(MemoryReader::new(writer.finish().unwrap().into_inner()))
    }

    async fn entry(extractor: &ZipExtractor<MemoryReader>, name: &str) -> ZipFileEntry {
        extractor
            .entries()
            .await
            .unwrap()
            .map(Result::unwrap)
            .find(|e| e.file_name == name)
            .unwrap()
    }

    #[tokio::test]
    async fn opens_stored_and_deflated_entries() {
        let extractor = ZipExtractor::new(archive());
        for name in ["stored.bin", "deflated.bin"] {
            let e = entry(&extractor, name).await;
            let mut out = Vec::new();
            extractor.open(&e).await.unwrap().read_to_end(&mut out).await.unwrap();
            assert_eq!(out, payload(), "{name}");
        }
    }

    #[tokio::test]
    async fn stored_entries_seek_directly() {
        let extractor = ZipExtractor::new(archive());
        let e = entry(&extractor, "stored.bin").await;

        let mut out = Vec::new();
        extractor
            .open_at(&e, 4000, 100)
            .await
            .unwrap()
            .unwrap()
            .read_to_end(&mut out)
            .await
            .unwrap();
        assert_eq!(out, &payload()[4000..4100]);

        let deflated = entry(&extractor, "deflated.bin").await;
        assert!(extractor.open_at(&deflated, 0, 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reads_symlink_targets() {
        let extractor = ZipExtractor::new(archive());
        let link = entry(&extractor, "link").await;
        assert!(link.is_symlink());
        assert_eq!(extractor.read_link_target(&link).await.unwrap(), "stored.bin");
    }

    #[tokio::test]
    async fn directories_cannot_be_opened() {
        let extractor = ZipExtractor::new(archive());
        let dir = entry(&extractor, "dir/").await;
        assert!(extractor.open(&dir).await.is_err());
    }
}
