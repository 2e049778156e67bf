//! Crate-wide error taxonomy for the ambient I/O and configuration layers.
//!
//! The numerical core (selector, distance transform, ICP, BnB) has no fallible
//! operations and never returns a `Result`; only the edges that touch the
//! filesystem do.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum GoIcpError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed point cloud '{path}' at byte offset {offset}: {reason}")]
    PointCloudParse {
        path: PathBuf,
        offset: usize,
        reason: String,
    },

    #[error("config file '{path}' is invalid: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, GoIcpError>;
