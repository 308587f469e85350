//! Container format detection.

use std::fmt;

/// Bytes read from the start of the source to identify it.
///
/// Large enough to cover the tar magic at offset 257.
pub const HEADER_LEN: usize = 512;

/// Containers recognised by their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Zip,
    SevenZip,
    Rar,
    Tar,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
    Lz4,
    Unknown,
}

impl Format {
    /// Pick a format from the archive's first bytes, using the name only
    /// when the bytes are inconclusive.
    ///
    /// `name` may be a full URL; its query string is ignored.
    pub fn detect(name: &str, header: &[u8]) -> Self {
        let format = Self::from_magic(header);
        if format == Format::Unknown && has_zip_extension(name) {
            // Self-extracting and prefixed ZIPs still end in a central directory.
            return Format::Zip;
        }
        format
    }

    fn from_magic(header: &[u8]) -> Self {
        const MAGIC: &[(&[u8], Format)] = &[
            (b"PK\x03\x04", Format::Zip),
            (b"PK\x05\x06", Format::Zip),
            (b"PK\x07\x08", Format::Zip),
            (b"7z\xbc\xaf\x27\x1c", Format::SevenZip),
            (b"Rar!\x1a\x07", Format::Rar),
            (b"\x1f\x8b", Format::Gzip),
            (b"BZh", Format::Bzip2),
            (b"\xfd7zXZ\x00", Format::Xz),
            (b"\x28\xb5\x2f\xfd", Format::Zstd),
            (b"\x04\x22\x4d\x18", Format::Lz4),
        ];

        if let Some((_, format)) = MAGIC.iter().find(|(magic, _)| header.starts_with(magic)) {
            return *format;
        }
        if header.len() >= 262 && &header[257..262] == b"ustar" {
            return Format::Tar;
        }
        Format::Unknown
    }

    /// Whether a single entry can be located and decompressed without
    /// reading the entries before it.
    pub fn is_random_access(self) -> bool {
        matches!(self, Format::Zip)
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Zip => "zip",
            Format::SevenZip => "7z",
            Format::Rar => "rar",
            Format::Tar => "tar",
            Format::Gzip => "gz",
            Format::Bzip2 => "bz2",
            Format::Xz => "xz",
            Format::Zstd => "zst",
            Format::Lz4 => "lz4",
            Format::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn has_zip_extension(name: &str) -> bool {
    let path = match url::Url::parse(name) {
        Ok(url) => url.path().to_string(),
        Err(_) => name.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.to_ascii_lowercase().ends_with(".zip")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_zip_by_magic() {
        assert_eq!(Format::detect("x", b"PK\x03\x04rest"), Format::Zip);
        assert_eq!(Format::detect("x", b"PK\x05\x06\0\0"), Format::Zip);
        assert!(Format::Zip.is_random_access());
    }

    #[test]
    fn sequential_formats_are_not_random_access() {
        let cases: [(&[u8], Format); 5] = [
            (b"\x1f\x8b\x08\0", Format::Gzip),
            (b"BZh91AY", Format::Bzip2),
            (b"\xfd7zXZ\x00\x00", Format::Xz),
            (b"7z\xbc\xaf\x27\x1c\0\x04", Format::SevenZip),
            (b"Rar!\x1a\x07\x01\x00", Format::Rar),
        ];
        for (header, format) in cases {
            let detected = Format::detect("archive.zip", header);
            assert_eq!(detected, format);
            assert!(!detected.is_random_access(), "{detected}");
        }
    }

    #[test]
    fn detects_tar_by_ustar_magic() {
        let mut header = vec![0u8; HEADER_LEN];
        header[257..262].copy_from_slice(b"ustar");
        assert_eq!(Format::detect("a.tar", &header), Format::Tar);
    }

    #[test]
    fn falls_back_to_url_extension() {
        let sfx = b"MZ\x90\x00self-extracting stub";
        assert_eq!(
            Format::detect("https://host/files/setup.ZIP?token=abc", sfx),
            Format::Zip
        );
        assert_eq!(Format::detect("https://host/files/setup.exe", sfx), Format::Unknown);
        assert_eq!(Format::detect("local/setup.zip#frag", sfx), Format::Zip);
    }
}
