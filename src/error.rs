//! Application Error Types

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    /// A configured resource could not be turned into backends.
    #[display("could not set up resource `{_0}`")]
    Resource(#[error(not(source))] String),
    #[cfg(not(feature = "s3"))]
    #[display("resource `{_0}` needs support that was not compiled in")]
    Unsupported(#[error(not(source))] String),
    #[display("could not write output")]
    Output,
}
