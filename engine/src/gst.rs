//! GStreamer-backed media handle.
//!
//! Wraps a `playbin` element behind the [`MediaHandle`] seam. The element is
//! prerolled paused at load so duration discovery starts immediately; the
//! duration stays unqueryable until preroll finishes, which is why the seam
//! reports it as an `Option`. The embedding shell routes video output into
//! its compositor by installing a video sink.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use gstreamer as gst;
use gstreamer::prelude::*;

use crate::backend::{MediaHandle, ObserverId};
use crate::error::MediaError;

pub struct GstMediaHandle {
    playbin: gst::Element,
    next_observer: u64,
    observers: Vec<u64>,
}

impl GstMediaHandle {
    /// Load a video file into a prerolled pipeline.
    pub fn open(path: &Path) -> Result<Self, MediaError> {
        Self::open_inner(path).map_err(|e| MediaError::HandleCreationFailed(format!("{e:#}")))
    }

    fn open_inner(path: &Path) -> Result<Self> {
        gst::init().context("Failed to initialize GStreamer")?;

        let path = path
            .canonicalize()
            .with_context(|| format!("Failed to resolve video path: {}", path.display()))?;
        log::info!("Loading video: {}", path.display());

        let uri = format!("file://{}", path.display());
        let playbin = gst::ElementFactory::make("playbin")
            .property("uri", &uri)
            .build()
            .context("Failed to create playbin")?;

        // Preroll so position/duration become queryable without playing.
        playbin
            .set_state(gst::State::Paused)
            .context("Failed to preroll pipeline")?;

        Ok(Self {
            playbin,
            next_observer: 0,
            observers: Vec::new(),
        })
    }

    /// Install the compositor-facing video sink. The layer half of a media
    /// slot renders whatever this sink produces.
    pub fn set_video_sink(&self, sink: &gst::Element) {
        self.playbin.set_property("video-sink", sink);
    }
}

impl MediaHandle for GstMediaHandle {
    fn play(&mut self) {
        if let Err(e) = self.playbin.set_state(gst::State::Playing) {
            log::warn!("Failed to start playback: {e}");
        }
    }

    fn pause(&mut self) {
        if let Err(e) = self.playbin.set_state(gst::State::Paused) {
            log::warn!("Failed to pause playback: {e}");
        }
    }

    fn seek_to_start(&mut self) {
        if let Err(e) = self
            .playbin
            .seek_simple(
                gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT,
                gst::ClockTime::ZERO,
            )
        {
            log::warn!("Failed to seek to start: {e}");
        }
    }

    fn position(&self) -> Option<Duration> {
        self.playbin
            .query_position::<gst::ClockTime>()
            .map(|t| Duration::from_nanos(t.nseconds()))
    }

    fn duration(&self) -> Option<Duration> {
        self.playbin
            .query_duration::<gst::ClockTime>()
            .map(|t| Duration::from_nanos(t.nseconds()))
    }

    fn add_progress_observer(&mut self, _interval: Duration) -> ObserverId {
        // Progress is polled on the engine cadence; the token only tracks
        // which slot is armed.
        self.next_observer += 1;
        self.observers.push(self.next_observer);
        ObserverId(self.next_observer)
    }

    fn remove_progress_observer(&mut self, id: ObserverId) {
        self.observers.retain(|o| *o != id.0);
    }
}

impl Drop for GstMediaHandle {
    fn drop(&mut self) {
        log::debug!("Stopping video pipeline");
        let _ = self.playbin.set_state(gst::State::Null);
    }
}
