//! Error types for the store layer.

use std::path::PathBuf;

/// Errors that can occur while reading or writing persisted session markers.
///
/// None of these are fatal to a navigation. The layers above treat an
/// unreadable store as "no session" and keep going.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be serialized for storage (the cached user).
    #[error("serialize failed: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The backing file exists but does not hold a JSON string map.
    #[error("storage file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
