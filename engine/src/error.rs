//! Error types for the wallpaper engine.
//!
//! All errors are serializable so an embedding shell can forward them over
//! IPC or persist them in diagnostics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing playback resources for a media slot.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum MediaError {
    /// The source file is missing or cannot be opened.
    #[error("source unreadable: {0}")]
    SourceUnreadable(String),

    /// The platform failed to create a playback handle for the source.
    #[error("handle creation failed: {0}")]
    HandleCreationFailed(String),

    /// The platform failed to create a render layer for the handle.
    #[error("layer creation failed: {0}")]
    LayerCreationFailed(String),
}

/// Top-level engine error taxonomy.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum WallpaperError {
    #[error(transparent)]
    Media(#[from] MediaError),

    /// The file extension maps to neither a known video nor image format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A display identifier did not resolve to a connected display.
    #[error("display not found: {0}")]
    DisplayNotFound(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for WallpaperError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
