//! Path-addressable access to an opened archive.
//!
//! An [`ArchiveHandle`] pairs one byte source with the format detected in it.
//! It lives for a single request: every lookup made while answering the
//! request reads through the same source, and nothing is kept afterwards.

mod filter;
mod format;
mod stream;

pub use filter::{EntryFilter, Visit, walk};
pub use format::{Format, HEADER_LEN};
pub use stream::read_range;

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::io::ReadAt;
use crate::zip::{EntryReader, ZipExtractor, ZipFileEntry};

/// One file or directory inside an archive.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Archive-relative, `/`-separated, no leading slash; directories end in `/`.
    pub name_in_archive: String,
    pub is_dir: bool,
    /// Decompressed size; 0 for directories.
    pub size: u64,
    pub modified: DateTime<Utc>,
    /// Target path for symbolic links, empty otherwise.
    pub link_target: String,
    record: ZipFileEntry,
}

impl Entry {
    /// Base name, without any trailing slash.
    pub fn name(&self) -> &str {
        let trimmed = self.name_in_archive.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    pub fn is_symlink(&self) -> bool {
        self.record.is_symlink()
    }
}

impl From<ZipFileEntry> for Entry {
    fn from(record: ZipFileEntry) -> Self {
        Self {
            name_in_archive: record.file_name.clone(),
            is_dir: record.is_directory,
            size: if record.is_directory {
                0
            } else {
                record.uncompressed_size
            },
            modified: record.modified(),
            link_target: String::new(),
            record,
        }
    }
}

/// An archive opened over a random-access byte source.
pub struct ArchiveHandle<R: ReadAt> {
    format: Format,
    zip: ZipExtractor<R>,
}

impl<R: ReadAt + 'static> ArchiveHandle<R> {
    /// Identify the container in `source` and prepare it for lookups.
    ///
    /// `name` is the archive's URL or file name and only matters when the
    /// leading bytes are inconclusive. Formats that can only be read front
    /// to back are refused.
    pub async fn open(name: &str, source: Arc<R>) -> Result<Self> {
        let len = (HEADER_LEN as u64).min(source.size()) as usize;
        let mut header = vec![0u8; len];
        source
            .read_exact_at(0, &mut header)
            .await
            .map_err(Error::RemoteFetch)?;

        let format = Format::detect(name, &header);
        tracing::debug!(%format, "detected archive format");
        if !format.is_random_access() {
            return Err(Error::UnsupportedFormat(format.to_string()));
        }

        Ok(Self {
            format,
            zip: ZipExtractor::new(source),
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Run `filter` over the archive's entries in stored order.
    pub async fn extract(&self, filter: &EntryFilter) -> Result<Vec<Entry>> {
        let directory = self.zip.entries().await.map_err(Error::Extract)?;
        let mut found = walk(directory.map(|e| e.map(Entry::from)), filter)
            .map_err(Error::Extract)?;

        for entry in found.iter_mut().filter(|e| e.is_symlink()) {
            match self.zip.read_link_target(&entry.record).await {
                Ok(target) => entry.link_target = target,
                Err(err) => {
                    tracing::warn!(entry = %entry.name_in_archive, "unreadable symlink: {err:#}")
                }
            }
        }

        tracing::debug!(?filter, matched = found.len(), "extracted entries");
        Ok(found)
    }

    /// Immediate children of the directory `dir`.
    pub async fn extract_dirs(&self, dir: &str) -> Result<Vec<Entry>> {
        self.extract(&EntryFilter::Directory(dir.to_string())).await
    }

    /// Every entry below the directory `dir`.
    pub async fn cascade_extract_dirs(&self, dir: &str) -> Result<Vec<Entry>> {
        self.extract(&EntryFilter::Cascade(dir.to_string())).await
    }

    /// The file at `path`.
    pub async fn extract_file(&self, path: &str) -> Result<Entry> {
        self.extract(&EntryFilter::File(path.to_string()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    /// Stream the whole (decompressed) contents of `entry`.
    pub async fn open_entry(&self, entry: &Entry) -> Result<EntryReader> {
        self.zip.open(&entry.record).await.map_err(Error::Extract)
    }

    /// Stream `len` bytes of `entry` starting at `start`.
    ///
    /// Stored entries are read from the right offset directly; compressed ones
    /// are decompressed from the beginning and the prefix discarded.
    pub async fn read_range(&self, entry: &Entry, start: u64, len: u64) -> Result<EntryReader> {
        if let Some(reader) = self
            .zip
            .open_at(&entry.record, start, len)
            .await
            .map_err(Error::Extract)?
        {
            return Ok(reader);
        }
        let reader = self.open_entry(entry).await?;
        read_range(reader, start, len)
            .await
            .map_err(|err| Error::Extract(err.into()))
    }
}

#[cfg(test)]
impl Entry {
    /// A bare entry carrying only a name.
    pub(crate) fn named(name: &str) -> Self {
        Entry::from(ZipFileEntry {
            file_name: name.to_string(),
            compression_method: crate::zip::CompressionMethod::Stored,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset: 0,
            last_mod_time: 0,
            last_mod_date: 0,
            is_directory: name.ends_with('/'),
            flags: 0,
            version_made_by: 0,
            external_attrs: 0,
            mtime: None,
        })
    }
}
