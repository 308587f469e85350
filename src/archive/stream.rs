//! Byte ranges out of one-pass entry readers.

use std::io;
use tokio::io::AsyncReadExt;

use crate::zip::EntryReader;

/// Position `reader` at `start` and limit it to `len` bytes.
///
/// A decompressing reader cannot seek, so reaching `start` costs reading and
/// dropping `start` bytes. The discard keeps reading until exactly `start`
/// bytes are gone, however small the individual reads are; a reader that ends
/// first is an [`io::ErrorKind::UnexpectedEof`]. Formats that can seek open
/// the range directly instead of coming through here.
pub async fn read_range(
    mut reader: EntryReader,
    start: u64,
    len: u64,
) -> io::Result<EntryReader> {
    if start > 0 {
        let mut prefix = (&mut reader).take(start);
        let skipped = tokio::io::copy(&mut prefix, &mut tokio::io::sink()).await?;
        if skipped < start {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("entry ended after {skipped} bytes, before offset {start}"),
            ));
        }
    }
    Ok(Box::pin(reader.take(len)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;
    use tokio_util::io::StreamReader;

    /// A reader that hands out at most three bytes per read.
    fn trickle(data: &[u8]) -> EntryReader {
        let chunks: Vec<io::Result<Bytes>> = data
            .chunks(3)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        Box::pin(StreamReader::new(stream::iter(chunks)))
    }

    fn data() -> Vec<u8> {
        (0..1000u32).map(|i| (i % 256) as u8).collect()
    }

    async fn collect(reader: EntryReader) -> Vec<u8> {
        let mut out = Vec::new();
        let mut reader = reader;
        reader.read_to_end(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn discards_exactly_the_prefix_from_short_reads() {
        let reader = read_range(trickle(&data()), 900, 100).await.unwrap();
        assert_eq!(collect(reader).await, &data()[900..1000]);
    }

    #[tokio::test]
    async fn zero_offset_is_a_no_op() {
        let reader = read_range(trickle(&data()), 0, 100).await.unwrap();
        assert_eq!(collect(reader).await, &data()[..100]);
    }

    #[tokio::test]
    async fn offset_past_the_end_is_an_error() {
        let err = read_range(trickle(&data()), 2000, 10).await.err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
