//! A media slot: one playback handle paired with one render layer.

use std::path::Path;
use std::time::Duration;

use crate::backend::{Layer, MediaHandle, ObserverId, OverlayWindow};
use crate::crop;
use crate::error::MediaError;
use crate::types::{CropSpec, Rect};

/// One of the two playback units of an overlay surface. The handle and layer
/// are created together by the backend and only ever torn down together.
pub struct MediaSlot {
    handle: Box<dyn MediaHandle>,
    layer: Box<dyn Layer>,
    attached: bool,
}

impl MediaSlot {
    /// Load a source into a fresh slot. Fails with `SourceUnreadable` before
    /// touching the backend if the file does not exist.
    pub fn load(window: &mut dyn OverlayWindow, source: &Path) -> Result<Self, MediaError> {
        if !source.exists() {
            return Err(MediaError::SourceUnreadable(source.display().to_string()));
        }

        let (handle, layer) = window.create_media_layer(source)?;
        log::debug!("Loaded media slot for {}", source.display());

        Ok(Self {
            handle,
            layer,
            attached: false,
        })
    }

    /// Attach the layer to the window with the surface's crop. Idempotent:
    /// an already-attached slot only has its placement refreshed.
    pub fn attach(&mut self, frame: Rect, crop: &CropSpec) {
        let placement = crop::layer_placement(crop);
        if self.attached {
            self.layer.set_placement(placement);
        } else {
            self.layer.attach(frame, placement);
            self.attached = true;
        }
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.layer.set_opacity(opacity);
    }

    pub fn set_placement(&mut self, crop: &CropSpec) {
        self.layer.set_placement(crop::layer_placement(crop));
    }

    pub fn play(&mut self) {
        self.handle.play();
    }

    pub fn pause(&mut self) {
        self.handle.pause();
    }

    pub fn seek_to_start(&mut self) {
        self.handle.seek_to_start();
    }

    pub fn position(&self) -> Option<Duration> {
        self.handle.position()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.handle.duration()
    }

    pub fn add_progress_observer(&mut self, interval: Duration) -> ObserverId {
        self.handle.add_progress_observer(interval)
    }

    pub fn remove_progress_observer(&mut self, id: ObserverId) {
        self.handle.remove_progress_observer(id);
    }

    /// Detach the layer and consume the slot. The returned carcass keeps the
    /// handle and layer alive until dropped, so a surface can detach both of
    /// its layers before releasing either pair.
    pub fn teardown(mut self) -> DetachedSlot {
        if self.attached {
            self.layer.detach();
            self.attached = false;
        }
        DetachedSlot {
            _handle: self.handle,
            _layer: self.layer,
        }
    }
}

/// A torn-down slot: the layer is out of the tree, the native resources are
/// released when this value drops.
pub struct DetachedSlot {
    _handle: Box<dyn MediaHandle>,
    _layer: Box<dyn Layer>,
}
