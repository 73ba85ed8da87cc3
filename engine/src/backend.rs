//! Platform seams.
//!
//! The engine never talks to a compositor or media framework directly; the
//! embedding shell injects implementations of these traits. None of the
//! traits are `Send`: compositor objects are main-thread affine, and all
//! engine mutation happens on the embedder's main task.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::crop::LayerPlacement;
use crate::error::{MediaError, WallpaperError};
use crate::types::{DisplayId, DisplayInfo, Rect};

/// Token identifying a registered progress observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(pub u64);

/// Playback handle for one media source.
///
/// Transport calls are infallible at this seam; implementations log failures.
/// Errors on the teardown path must never abort teardown ordering.
pub trait MediaHandle {
    fn play(&mut self);
    fn pause(&mut self);
    /// Rewind to the start of the media.
    fn seek_to_start(&mut self);

    /// Current playback position. `None` while the position is not yet
    /// queryable.
    fn position(&self) -> Option<Duration>;

    /// Total media duration. `None` until the backend has discovered it;
    /// duration discovery is asynchronous and polled, never awaited.
    fn duration(&self) -> Option<Duration>;

    /// Register a periodic progress observer with the given interval.
    fn add_progress_observer(&mut self, interval: Duration) -> ObserverId;
    fn remove_progress_observer(&mut self, id: ObserverId);
}

/// Render layer bound to a media handle.
pub trait Layer {
    /// Insert the layer into the window's layer tree with the given frame and
    /// placement. Idempotent: re-attaching an attached layer only updates
    /// geometry.
    fn attach(&mut self, frame: Rect, placement: LayerPlacement);

    /// Remove the layer from the tree. Contract: the handle binding is
    /// cleared before tree removal, and both happen in one atomic
    /// transaction so no frame renders a half-detached layer.
    fn detach(&mut self);

    fn set_opacity(&mut self, opacity: f32);
    fn set_placement(&mut self, placement: LayerPlacement);
}

/// Borderless desktop-level window covering one display.
pub trait OverlayWindow {
    fn frame(&self) -> Rect;

    /// Create a playback handle and its render layer as a pair. Construction
    /// is atomic: on error nothing is left allocated.
    fn create_media_layer(
        &mut self,
        source: &Path,
    ) -> Result<(Box<dyn MediaHandle>, Box<dyn Layer>), MediaError>;

    fn show(&mut self);
    fn close(&mut self);
}

/// Display enumeration.
pub trait DisplayRegistry {
    fn list_displays(&self) -> Vec<DisplayInfo>;
    fn display_frame(&self, id: DisplayId) -> Option<Rect>;
}

/// Full platform surface the engine is constructed over.
pub trait Platform: DisplayRegistry {
    /// Create a desktop-level overlay window covering the given frame.
    fn create_window(
        &mut self,
        display: DisplayId,
        frame: Rect,
    ) -> Result<Box<dyn OverlayWindow>, WallpaperError>;

    /// Set the static desktop picture of a display.
    fn set_desktop_picture(&mut self, display: DisplayId, path: &Path)
    -> Result<(), WallpaperError>;

    /// Path of the system's default wallpaper, if the platform exposes one.
    fn system_default_picture(&self) -> Option<PathBuf>;
}
