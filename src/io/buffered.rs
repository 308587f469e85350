use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use super::ReadAt;
use anyhow::Result;

/// Coalesces small reads into fixed-size windows.
///
/// The ZIP parser issues many tiny reads (signatures, 30-byte local headers).
/// Each miss fetches a whole window starting at the requested offset and
/// keeps it, so neighbouring reads are served from memory. Reads at least as
/// large as a window bypass the cache.
pub struct BufferedReader<R: ReadAt> {
    inner: R,
    window_size: usize,
    window: Mutex<Option<(u64, Bytes)>>,
}

impl<R: ReadAt> BufferedReader<R> {
    pub fn new(inner: R, window_size: usize) -> Self {
        Self {
            inner,
            window_size: window_size.max(1),
            window: Mutex::new(None),
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: ReadAt> ReadAt for BufferedReader<R> {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size() {
            return Ok(0);
        }
        if buf.len() >= self.window_size {
            return self.inner.read_at(offset, buf).await;
        }

        let mut window = self.window.lock().await;

        let cached = matches!(
            &*window,
            Some((start, data)) if offset >= *start && offset < *start + data.len() as u64
        );
        if !cached {
            let len = (self.size() - offset).min(self.window_size as u64) as usize;
            let mut data = vec![0u8; len];
            self.inner.read_exact_at(offset, &mut data).await?;
            *window = Some((offset, Bytes::from(data)));
        }

        let Some((start, data)) = &*window else {
            return Ok(0);
        };
        let from = (offset - start) as usize;
        let n = buf.len().min(data.len() - from);
        buf[..n].copy_from_slice(&data[from..from + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        inner: MemoryReader,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl ReadAt for Counting {
        async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
            self.reads.fetch_add(1, Ordering::Relaxed);
            self.inner.read_at(offset, buf).await
        }

        fn size(&self) -> u64 {
            self.inner.size()
        }
    }

    fn counting(len: usize) -> Counting {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        Counting {
            inner: MemoryReader::new(data),
            reads: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn small_reads_share_one_window() {
        let reader = BufferedReader::new(counting(4096), 1024);

        let mut a = [0u8; 4];
        let mut b = [0u8; 16];
        reader.read_exact_at(100, &mut a).await.unwrap();
        reader.read_exact_at(200, &mut b).await.unwrap();

        assert_eq!(reader.get_ref().reads.load(Ordering::Relaxed), 1);
        assert_eq!(a, [100, 101, 102, 103]);
        assert_eq!(b[0], 200);
    }

    #[tokio::test]
    async fn read_spanning_window_edge_is_completed() {
        let reader = BufferedReader::new(counting(4096), 1024);

        // First window covers 100..1124.
        let mut first = [0u8; 1];
        reader.read_exact_at(100, &mut first).await.unwrap();

        let mut buf = [0u8; 64];
        reader.read_exact_at(1120, &mut buf).await.unwrap();

        let expected: Vec<u8> = (1120..1184).map(|i| (i % 251) as u8).collect();
        assert_eq!(buf.to_vec(), expected);
        assert_eq!(reader.get_ref().reads.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn large_reads_bypass_the_window() {
        let reader = BufferedReader::new(counting(4096), 256);

        let mut buf = vec![0u8; 512];
        reader.read_exact_at(0, &mut buf).await.unwrap();
        let mut small = [0u8; 1];
        reader.read_exact_at(10, &mut small).await.unwrap();

        assert_eq!(reader.get_ref().reads.load(Ordering::Relaxed), 2);
        assert_eq!(small[0], 10);
    }

    #[tokio::test]
    async fn window_is_clamped_at_end_of_source() {
        let reader = BufferedReader::new(counting(100), 1024);

        let mut buf = [0u8; 10];
        reader.read_exact_at(95, &mut buf[..5]).await.unwrap();
        assert_eq!(reader.read_at(100, &mut buf).await.unwrap(), 0);
    }
}
