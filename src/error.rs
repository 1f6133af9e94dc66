//! Error type for copy operations.

use std::io;
use std::path::PathBuf;

/// Error returned when a copy cannot be completed.
///
/// Each variant names the operation that failed. Advisory conditions such as
/// a failed page-size or filesystem metadata query never produce an `Error`;
/// they are logged and a fallback value is used instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input file could not be opened.
    #[error("open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The transfer buffer could not be allocated.
    #[error("align_alloc: {0}")]
    Allocate(#[source] io::Error),

    /// Reading from the input failed.
    #[error("read: {0}")]
    Read(#[source] io::Error),

    /// Writing to the output failed.
    #[error("write: {0}")]
    Write(#[source] io::Error),

    /// Closing the input descriptor failed.
    #[error("close: {0}")]
    Close(#[source] io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
