use core::result;
use std::io;

use nix::errno::Errno;
use thiserror::Error;

/// A helper type for wrapping a [result::Result] such that we can reduce noise in our signatures.
pub type Result<T> = result::Result<T, Error>;

/// An error representing a failure to set up or drive a socket endpoint.
///
/// None of these ever cross the [super::Socket] boundary directly; the capability methods degrade
/// them to their boolean/empty sentinels and report the detail through [tracing]. The `try_*`
/// variants on the concrete socket types surface them as-is.
#[derive(Debug, Error)]
pub enum Error {
    #[error("encountered unexpected IO error: {0}")]
    IO(
        #[from]
        #[source]
        io::Error,
    ),
    #[error("failed to resolve remote endpoint {0:?}")]
    InvalidAddress(String),
    #[error("socket is not open")]
    NotOpen,
    #[error("connection closed by peer")]
    Disconnected,
}

impl From<Errno> for Error {
    fn from(value: Errno) -> Self {
        Self::IO(io::Error::from(value))
    }
}
