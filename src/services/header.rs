//! Archive header version reader.
//!
//! Both BSA and BA2 archives start with a 4-byte magic followed by the format
//! version. Every shipping version fits in a single byte, so the version is
//! taken as the sum of the four bytes at offsets 4..8 rather than decoded as
//! an integer. Only the first [`HEADER_PREFIX_LEN`] bytes are ever read.

use crate::models::UNREADABLE_VERSION;
use camino::Utf8Path;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Number of bytes read from the start of an archive.
pub const HEADER_PREFIX_LEN: usize = 9;

/// Byte range holding the version field.
const VERSION_FIELD: std::ops::Range<usize> = 4..8;

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("Failed to open archive {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read header of {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive {path} is too short for a header")]
    Truncated { path: String },
}

/// Version encoded in a header prefix, or `None` when fewer than
/// [`HEADER_PREFIX_LEN`] bytes are available.
pub fn version_from_prefix(prefix: &[u8]) -> Option<u32> {
    if prefix.len() < HEADER_PREFIX_LEN {
        return None;
    }

    Some(prefix[VERSION_FIELD].iter().map(|b| u32::from(*b)).sum())
}

/// Read the declared format version of the archive at `path`.
///
/// The file handle is dropped on every return path.
pub async fn try_read_version(path: &Utf8Path) -> Result<u32, HeaderError> {
    let mut file = File::open(path).await.map_err(|source| HeaderError::Open {
        path: path.to_string(),
        source,
    })?;

    let mut prefix = [0u8; HEADER_PREFIX_LEN];
    file.read_exact(&mut prefix).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::UnexpectedEof {
            HeaderError::Truncated {
                path: path.to_string(),
            }
        } else {
            HeaderError::Read {
                path: path.to_string(),
                source,
            }
        }
    })?;

    // read_exact filled the whole prefix
    Ok(version_from_prefix(&prefix).unwrap_or(UNREADABLE_VERSION))
}

/// Read the declared format version, returning [`UNREADABLE_VERSION`] instead
/// of an error when the archive cannot be opened or is truncated.
pub async fn read_version(path: &Utf8Path) -> u32 {
    match try_read_version(path).await {
        Ok(version) => {
            tracing::debug!("Archive {} reports version {}", path, version);
            version
        }
        Err(e) => {
            tracing::warn!("{}; treating as version {}", e, UNREADABLE_VERSION);
            UNREADABLE_VERSION
        }
    }
}
