//! Configuration Error Types

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An explicitly requested configuration file does not exist.
    #[display("configuration file not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The file extension doesn't name a format we can read.
    #[display("unsupported configuration format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// A layer could not be read or doesn't match the expected shape.
    #[display("could not parse configuration")]
    Parse,
    /// Parsed fine, but the values don't make sense together.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
}
