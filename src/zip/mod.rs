//! Random-access ZIP support.
//!
//! Only the tail of an archive is needed to enumerate it: the end record
//! (classic or ZIP64) points at the central directory, which carries every
//! entry's name, sizes and data offset. Entry data is then fetched on demand.
//!
//! - [`structures`]: fixed-layout records and per-entry metadata
//! - [`parser`]: locating and decoding the central directory
//! - [`reader`]: streaming an entry's bytes, inflating as needed
//! - [`extractor`]: the entry point used by the archive layer
//!
//! Entries are STORED or DEFLATE. Names are UTF-8, the Info-ZIP Unicode Path
//! field, or GBK as a last resort. Encrypted entries, split archives and other
//! compression methods are rejected.

mod extractor;
mod parser;
pub mod reader;
mod structures;

pub use extractor::ZipExtractor;
pub use parser::{CentralDirectory, ZipParser, decode_file_name};
pub use reader::EntryReader;
pub use structures::*;
