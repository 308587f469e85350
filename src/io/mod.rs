//! Random-access byte sources.
//!
//! Everything the ZIP parser reads goes through [`ReadAt`]. A remote archive
//! is opened as a stack of three sources:
//!
//! ```text
//! SectionReader        bounded 0..size view
//!   BufferedReader     1 MiB windows, coalesces small parser reads
//!     HttpRangeReader  one `Range: bytes=a-b` GET per window
//! ```

mod buffered;
mod http;
mod memory;
mod section;

pub use buffered::BufferedReader;
pub use http::{HttpRangeReader, RemoteOptions};
pub use memory::MemoryReader;
pub use section::SectionReader;

use anyhow::{Result, bail};
use async_trait::async_trait;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer.
    ///
    /// May return fewer bytes than requested; `Ok(0)` means the offset is at
    /// or past the end of the source.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Fill `buf` completely, failing if the source ends first.
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                bail!(
                    "unexpected end of source at offset {} (wanted {} more bytes)",
                    offset + filled as u64,
                    buf.len() - filled
                );
            }
            filled += n;
        }
        Ok(())
    }
}

/// The byte source stack used for a remote archive.
pub type RemoteSource = SectionReader<BufferedReader<HttpRangeReader>>;

/// Size of the windows [`BufferedReader`] fetches from the remote.
pub const DEFAULT_WINDOW_SIZE: usize = 1024 * 1024;

/// Open `url` as a bounded, buffered, range-backed byte source.
pub async fn open_remote(
    url: &str,
    options: RemoteOptions,
    window_size: usize,
) -> Result<RemoteSource> {
    let http = HttpRangeReader::new(url.to_string(), options).await?;
    let size = http.size();
    Ok(SectionReader::new(
        BufferedReader::new(http, window_size),
        0,
        size,
    ))
}
