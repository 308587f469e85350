//! # rarchive
//!
//! An HTTP service for browsing and downloading files inside remote archives
//! without fetching the whole archive.
//!
//! The archive behind a `link` URL is read with HTTP Range requests: the
//! end-of-central-directory record, the central directory, then only the bytes
//! of the entries a request actually touches.
//!
//! ## Features
//!
//! - List a directory, or a whole subtree, of a remote ZIP archive
//! - Per-entry metadata including symlink targets and UTF-8 or GBK names
//! - Stream an entry's contents, whole or as a single byte range
//! - ZIP64 archives, STORED and DEFLATE entries
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rarchive::{ArchiveHandle, RemoteOptions, open_remote};
//! use rarchive::io::DEFAULT_WINDOW_SIZE;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let link = "https://example.com/archive.zip";
//!     let source = open_remote(link, RemoteOptions::default(), DEFAULT_WINDOW_SIZE).await?;
//!     let archive = ArchiveHandle::open(link, Arc::new(source)).await?;
//!
//!     for entry in archive.extract_dirs("/").await? {
//!         println!("{}", entry.name_in_archive);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod error;
pub mod io;
pub mod page;
pub mod path;
pub mod server;
pub mod zip;

pub use archive::{ArchiveHandle, Entry, EntryFilter, Format};
pub use cli::{Cli, ServerConfig};
pub use error::{Error, Result};
pub use io::{HttpRangeReader, ReadAt, RemoteOptions, open_remote};
pub use zip::{ZipExtractor, ZipFileEntry};
