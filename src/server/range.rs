//! Serving one entry's bytes, whole or as a single byte range.

use futures::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use tokio_util::io::ReaderStream;

use super::response::Body;
use crate::archive::{ArchiveHandle, Entry};
use crate::error::{Error, Result};
use crate::io::ReadAt;
use crate::zip::EntryReader;

/// Read size used when copying an entry into the response.
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Inclusive byte range `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a resource of `size` bytes.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

fn unsatisfiable(header: &str) -> Error {
    Error::RangeNotSatisfiable(format!("Invalid Range Header: {header}"))
}

/// Parse a `Range` header against a resource of `size` bytes.
///
/// Accepts `bytes=a-b`, `bytes=a-` and `bytes=-n` (the last `n` bytes).
/// Only one range is served; a list of ranges is refused, as is anything
/// not satisfying `start <= end < size`.
pub fn parse_range(header: &str, size: u64) -> Result<ByteRange> {
    let set = header
        .trim()
        .strip_prefix("bytes")
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('='))
        .map(str::trim)
        .ok_or_else(|| unsatisfiable(header))?;

    if set.contains(',') {
        return Err(Error::RangeNotSatisfiable(format!(
            "Multiple ranges are not supported: {header}"
        )));
    }

    let (first, last) = set.split_once('-').ok_or_else(|| unsatisfiable(header))?;
    let number = |s: &str| s.trim().parse::<u64>().map_err(|_| unsatisfiable(header));

    if size == 0 {
        return Err(unsatisfiable(header));
    }
    let (start, end) = match (first.trim(), last.trim()) {
        ("", "") => return Err(unsatisfiable(header)),
        ("", suffix) => {
            let suffix = number(suffix)?;
            if suffix == 0 {
                return Err(unsatisfiable(header));
            }
            (size.saturating_sub(suffix), size - 1)
        }
        (start, "") => (number(start)?, size - 1),
        (start, end) => (number(start)?, number(end)?),
    };

    if start > end || end >= size {
        return Err(unsatisfiable(header));
    }
    Ok(ByteRange { start, end })
}

/// MIME type by file name suffix.
pub fn content_type(name: &str) -> &'static str {
    const TYPES: &[(&str, &str)] = &[
        (".zip", "application/zip"),
        (".7z", "application/x-7z-compressed"),
        (".rar", "application/x-rar-compressed"),
        (".tar", "application/x-tar"),
        (".gz", "application/gzip"),
        (".bz2", "application/x-bzip2"),
        (".xz", "application/x-xz"),
        (".lz4", "application/x-lz4"),
        (".zst", "application/zstd"),
        (".mkv", "video/x-matroska"),
        (".mp4", "video/mp4"),
        (".mp3", "audio/mpeg"),
        (".flac", "audio/flac"),
        (".wav", "audio/wav"),
        (".ogg", "audio/ogg"),
        (".jpg", "image/jpeg"),
        (".jpeg", "image/jpeg"),
        (".png", "image/png"),
        (".gif", "image/gif"),
        (".webp", "image/webp"),
        (".pdf", "application/pdf"),
    ];

    TYPES
        .iter()
        .find(|(suffix, _)| name.ends_with(suffix))
        .map(|(_, mime)| *mime)
        .unwrap_or("application/octet-stream")
}

/// `attachment; filename=<name>`, with bytes a header cannot carry replaced.
pub fn content_disposition(name: &str) -> HeaderValue {
    let name: String = name
        .chars()
        .map(|c| if c.is_control() || c == '"' { '_' } else { c })
        .collect();
    HeaderValue::from_bytes(format!("attachment; filename={name}").as_bytes())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn stream_body(reader: EntryReader) -> Body {
    let frames = ReaderStream::with_capacity(reader, COPY_BUFFER_SIZE).map_ok(Frame::data);
    StreamBody::new(frames).boxed_unsync()
}

/// Answer a download of `entry`.
///
/// Without `range`, or with a blank one, the whole entry is streamed with
/// `200`. With a valid single range, `206` carries just those bytes. All
/// positioning happens before the response starts, so a failure there still
/// produces an error envelope rather than a truncated body.
pub async fn stream_entry<R: ReadAt + 'static>(
    archive: &ArchiveHandle<R>,
    entry: &Entry,
    range: Option<&str>,
) -> Result<Response<Body>> {
    let size = entry.size;
    let builder = Response::builder()
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_TYPE, content_type(entry.name()))
        .header(header::CONTENT_DISPOSITION, content_disposition(entry.name()))
        .header(header::EXPIRES, "0")
        .header(header::CACHE_CONTROL, "must-revalidate")
        .header(header::PRAGMA, "public");

    let response = match range.map(str::trim).filter(|r| !r.is_empty()) {
        Some(range) => {
            let range = parse_range(range, size)?;
            let reader = archive.read_range(entry, range.start, range.length()).await?;
            tracing::debug!(start = range.start, end = range.end, size, "serving partial content");
            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_RANGE, range.content_range(size))
                .header(header::CONTENT_LENGTH, range.length())
                .body(stream_body(reader))
        }
        None => {
            let reader = archive.open_entry(entry).await?;
            builder
                .status(StatusCode::OK)
                .header(header::CONTENT_LENGTH, size)
                .body(stream_body(reader))
        }
    };

    response.map_err(|err| Error::Extract(err.into()))
}
