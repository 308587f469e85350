//! Errors visible to API callers.
//!
//! Internal layers report failures as [`anyhow::Error`]; they are sorted into
//! these kinds where a request is answered. Format, lookup and extraction
//! failures all read `"not support"` to callers; [`Error::detail`] keeps the
//! real cause for the logs.

use hyper::StatusCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required parameter is missing or malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The requested path climbs out of the archive root.
    #[error("access using relative path is not allowed")]
    RelativePath,

    /// The archive URL could not be opened as a ranged byte source.
    #[error("{0:#}")]
    RemoteFetch(anyhow::Error),

    /// The container cannot be read without downloading it whole.
    #[error("not support")]
    UnsupportedFormat(String),

    /// No entry matched the requested file path.
    #[error("not support")]
    NotFound(String),

    /// Reading the archive's index or an entry failed.
    #[error("not support")]
    Extract(anyhow::Error),

    #[error("{0}")]
    RangeNotSatisfiable(String),
}

impl Error {
    /// Status code reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::RangeNotSatisfiable(_) => StatusCode::RANGE_NOT_SATISFIABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Internal detail worth logging but not returning.
    pub fn detail(&self) -> String {
        match self {
            Error::UnsupportedFormat(format) => format!("unsupported format: {format}"),
            Error::NotFound(path) => format!("no entry matches {path}"),
            Error::Extract(err) => format!("{err:#}"),
            other => other.to_string(),
        }
    }
}
