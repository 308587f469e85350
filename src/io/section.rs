use async_trait::async_trait;

use super::ReadAt;
use anyhow::Result;

/// A bounded `base..base + len` view over another source.
///
/// Offsets are relative to `base`; reads past `len` are cut short, so
/// whatever consumes the view cannot observe bytes outside it.
pub struct SectionReader<R: ReadAt> {
    inner: R,
    base: u64,
    len: u64,
}

impl<R: ReadAt> SectionReader<R> {
    pub fn new(inner: R, base: u64, len: u64) -> Self {
        Self { inner, base, len }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: ReadAt> ReadAt for SectionReader<R> {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if offset >= self.len {
            return Ok(0);
        }
        let max = (self.len - offset).min(buf.len() as u64) as usize;
        self.inner.read_at(self.base + offset, &mut buf[..max]).await
    }

    fn size(&self) -> u64 {
        self.len
    }
}
