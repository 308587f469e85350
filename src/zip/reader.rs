//! Streaming access to a single entry's contents.
//!
//! Compressed bytes are pulled from the archive in fixed-size chunks as the
//! consumer reads, so serving a large entry never buffers it whole. STORED
//! data is a plain byte range of the archive; DEFLATE data is inflated in a
//! single forward pass with `flate2`.

use bytes::{Buf, Bytes};
use flate2::{Decompress, FlushDecompress, Status};
use futures::stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;

use crate::io::ReadAt;
use anyhow::{Result, bail};

/// Size of each compressed read issued against the archive.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Capacity of each inflated block handed to the consumer.
const OUTPUT_SIZE: usize = 64 * 1024;

/// A one-pass reader over an entry's (decompressed) contents.
pub type EntryReader = Pin<Box<dyn AsyncRead + Send>>;

/// Sequential chunks of a byte range of the archive.
struct RawChunks<R: ReadAt> {
    reader: Arc<R>,
    offset: u64,
    remaining: u64,
}

impl<R: ReadAt> RawChunks<R> {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let len = self.remaining.min(CHUNK_SIZE as u64) as usize;
        let mut buf = vec![0u8; len];
        self.reader.read_exact_at(self.offset, &mut buf).await?;
        self.offset += len as u64;
        self.remaining -= len as u64;
        Ok(Some(Bytes::from(buf)))
    }
}

/// Incremental raw-DEFLATE decoder fed from [`RawChunks`].
struct Inflater<R: ReadAt> {
    raw: RawChunks<R>,
    input: Bytes,
    decompress: Decompress,
    done: bool,
}

impl<R: ReadAt> Inflater<R> {
    async fn next_block(&mut self) -> Result<Option<Bytes>> {
        loop {
            if self.done {
                return Ok(None);
            }
            if self.input.is_empty() {
                if let Some(chunk) = self.raw.next_chunk().await? {
                    self.input = chunk;
                }
            }

            let exhausted = self.input.is_empty() && self.raw.remaining == 0;
            let flush = if exhausted {
                FlushDecompress::Finish
            } else {
                FlushDecompress::None
            };

            let mut out = Vec::with_capacity(OUTPUT_SIZE);
            let before = self.decompress.total_in();
            let status = self.decompress.decompress_vec(&self.input, &mut out, flush)?;
            let consumed = (self.decompress.total_in() - before) as usize;
            self.input.advance(consumed);

            if status == Status::StreamEnd {
                self.done = true;
            }
            if !out.is_empty() {
                return Ok(Some(Bytes::from(out)));
            }
            if self.done {
                return Ok(None);
            }
            if exhausted {
                bail!("truncated DEFLATE stream");
            }
        }
    }
}

fn into_io_error(err: anyhow::Error) -> std::io::Error {
    std::io::Error::other(format!("{err:#}"))
}

/// Reader over `len` bytes of the archive starting at `offset`.
pub fn stored<R: ReadAt + 'static>(reader: Arc<R>, offset: u64, len: u64) -> EntryReader {
    let raw = RawChunks {
        reader,
        offset,
        remaining: len,
    };
    let chunks = stream::try_unfold(raw, |mut raw| async move {
        let chunk = raw.next_chunk().await.map_err(into_io_error)?;
        Ok::<_, std::io::Error>(chunk.map(|chunk| (chunk, raw)))
    });
    Box::pin(StreamReader::new(chunks))
}

/// Reader inflating `compressed_len` bytes of raw DEFLATE data at `offset`,
/// cut off at `uncompressed_len`.
pub fn deflated<R: ReadAt + 'static>(
    reader: Arc<R>,
    offset: u64,
    compressed_len: u64,
    uncompressed_len: u64,
) -> EntryReader {
    let inflater = Inflater {
        raw: RawChunks {
            reader,
            offset,
            remaining: compressed_len,
        },
        input: Bytes::new(),
        decompress: Decompress::new(false),
        done: false,
    };
    let blocks = stream::try_unfold(inflater, |mut inflater| async move {
        let block = inflater.next_block().await.map_err(into_io_error)?;
        Ok::<_, std::io::Error>(block.map(|block| (block, inflater)))
    });
    Box::pin(StreamReader::new(blocks).take(uncompressed_len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use flate2::Compression;
    use flate2::write::DeflateEncoder;
    use std::io::Write;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 256) as u8).collect()
    }

    #[tokio::test]
    async fn stored_reader_streams_the_range() {
        let data = sample(3 * CHUNK_SIZE + 17);
        let source = Arc::new(MemoryReader::new(data.clone()));

        let mut out = Vec::new();
        stored(source, 5, data.len() as u64 - 10)
            .read_to_end(&mut out)
            .await
            .unwrap();
        assert_eq!(out, &data[5..data.len() - 5]);
    }

    #[tokio::test]
    async fn deflated_reader_inflates_across_chunks() {
        let plain = sample(5 * CHUNK_SIZE);
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(&plain).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut archive = b"HEADER".to_vec();
        archive.extend_from_slice(&compressed);
        let source = Arc::new(MemoryReader::new(archive));

        let mut out = Vec::new();
        deflated(source, 6, compressed.len() as u64, plain.len() as u64)
            .read_to_end(&mut out)
            .await
            .unwrap();
        assert_eq!(out, plain);
    }

    #[tokio::test]
    async fn truncated_deflate_data_is_an_error() {
        let plain = sample(10_000);
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&plain).unwrap();
        let compressed = encoder.finish().unwrap();
        let half = compressed.len() / 2;
        let source = Arc::new(MemoryReader::new(compressed));

        let mut out = Vec::new();
        let result = deflated(source, 0, half as u64, plain.len() as u64)
            .read_to_end(&mut out)
            .await;
        assert!(result.is_err());
    }
}
