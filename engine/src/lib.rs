//! Fluxwall engine: per-display video and image wallpapers with seamless
//! loop transitions.
//!
//! The engine drives borderless desktop-level windows supplied by an
//! embedding shell through the [`backend`] seams. Each display gets an
//! overlay surface holding two media slots loaded with the same source;
//! shortly before the media ends, the standby slot restarts from zero and a
//! transition swaps the roles, hiding the decoder's loop seam.
//!
//! # Examples
//!
//! ```no_run
//! use fluxwall_engine::{CropSpec, TransitionSpec, WallpaperEngine};
//! use std::path::Path;
//!
//! # async fn demo<P: fluxwall_engine::backend::Platform>(
//! #     platform: P,
//! # ) -> Result<(), fluxwall_engine::WallpaperError> {
//! let mut engine = WallpaperEngine::new(platform);
//! engine.set_video_wallpaper(
//!     Path::new("/wallpapers/ocean.mp4"),
//!     None,
//!     TransitionSpec::default(),
//!     CropSpec::default(),
//! )?;
//! engine.run().await;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod crop;
pub mod engine;
pub mod error;
pub mod transition;
pub mod types;

mod slot;
mod surface;

#[cfg(feature = "video")]
pub mod gst;

#[cfg(test)]
pub(crate) mod mock;

pub use crate::engine::WallpaperEngine;
pub use crate::error::{MediaError, WallpaperError};
pub use crate::surface::{OverlaySurface, PROGRESS_INTERVAL, SurfaceState};
pub use crate::types::{
    CropSpec, DisplayId, DisplayInfo, EngineStatus, Rect, SourceKind, TransitionKind,
    TransitionSpec,
};
