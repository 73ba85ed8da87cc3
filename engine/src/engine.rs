//! Fleet controller: one wallpaper engine driving a surface per display.
//!
//! The engine owns the platform seam and a map of overlay surfaces. Video
//! wallpapers run on individual displays; image wallpapers go through the
//! platform's static desktop-picture API and are mutually exclusive with
//! video on the displays they cover. Published state (`current_source_name`,
//! `is_video_active`, `is_paused`) is updated only after the side effects of
//! an operation have landed, so a failed operation leaves the snapshot
//! untouched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::backend::Platform;
use crate::crop;
use crate::error::{MediaError, WallpaperError};
use crate::surface::{OverlaySurface, PROGRESS_INTERVAL};
use crate::types::{CropSpec, DisplayId, EngineStatus, SourceKind, TransitionSpec};

const DEFAULT_SOURCE_NAME: &str = "System Default";

/// Dark gray used when the platform cannot name a default wallpaper.
const FALLBACK_COLOR: [u8; 4] = [38, 38, 38, 255];
const FALLBACK_SIZE: (u32, u32) = (1920, 1080);

pub struct WallpaperEngine<P: Platform> {
    platform: P,
    surfaces: HashMap<DisplayId, OverlaySurface>,
    transition: TransitionSpec,
    current_source_name: String,
    is_video_active: bool,
    is_paused: bool,
    restoring_default: bool,
}

impl<P: Platform> WallpaperEngine<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            surfaces: HashMap::new(),
            transition: TransitionSpec::default(),
            current_source_name: DEFAULT_SOURCE_NAME.to_string(),
            is_video_active: false,
            is_paused: false,
            restoring_default: false,
        }
    }

    pub fn current_source_name(&self) -> &str {
        &self.current_source_name
    }

    pub fn is_video_active(&self) -> bool {
        self.is_video_active
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Displays currently carrying a video surface.
    pub fn active_displays(&self) -> Vec<DisplayId> {
        let mut displays: Vec<DisplayId> = self.surfaces.keys().copied().collect();
        displays.sort_by_key(|d| d.0);
        displays
    }

    /// Transition settings applied at upcoming loop boundaries.
    pub fn transition_settings(&self) -> TransitionSpec {
        self.transition
    }

    /// Snapshot of the published state.
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            current_source_name: self.current_source_name.clone(),
            is_video_active: self.is_video_active,
            is_paused: self.is_paused,
            active_displays: self.active_displays(),
            transition: self.transition,
        }
    }

    /// Start a looping video wallpaper on one display.
    ///
    /// With no display given, the primary display is used. An existing
    /// surface on that display is retargeted in place, so the window never
    /// drops to the desktop between sources.
    pub fn set_video_wallpaper(
        &mut self,
        source: &Path,
        display: Option<DisplayId>,
        transition: TransitionSpec,
        crop: CropSpec,
    ) -> Result<(), WallpaperError> {
        if SourceKind::classify(source)? != SourceKind::Video {
            return Err(WallpaperError::UnsupportedFormat(
                source.display().to_string(),
            ));
        }
        let crop = self.sanitize_crop(crop);
        let display = self.resolve_display(display)?;

        if let Some(surface) = self.surfaces.get_mut(&display) {
            if let Err(e) = surface.set_source(source, transition, crop) {
                // The reload consumed the old slot pair, so the surface no
                // longer shows anything; unpublish it instead of leaving a
                // zombie entry behind.
                self.stop_video_wallpaper(Some(display));
                return Err(e.into());
            }
        } else {
            let frame = self
                .platform
                .display_frame(display)
                .ok_or_else(|| WallpaperError::DisplayNotFound(display.to_string()))?;
            let window = self.platform.create_window(display, frame)?;
            let mut surface = OverlaySurface::new(display, window);
            if let Err(e) = surface.set_source(source, transition, crop) {
                surface.close();
                return Err(e.into());
            }
            self.surfaces.insert(display, surface);
        }

        self.transition = transition;
        self.current_source_name = source_display_name(source);
        self.is_video_active = true;
        self.is_paused = false;
        log::info!(
            "Video wallpaper {} active on {}",
            self.current_source_name,
            display
        );
        Ok(())
    }

    /// Set a static image wallpaper.
    ///
    /// With no display given, every display is covered. Video surfaces on the
    /// affected displays are torn down first. A non-identity crop is
    /// rasterized per display (in parallel) before the platform call; an
    /// identity crop passes the source file straight through. Per-display
    /// failures are logged and skipped; the call fails only when no display
    /// could be set.
    pub fn set_image_wallpaper(
        &mut self,
        source: &Path,
        display: Option<DisplayId>,
        crop: CropSpec,
    ) -> Result<(), WallpaperError> {
        if SourceKind::classify(source)? != SourceKind::Image {
            return Err(WallpaperError::UnsupportedFormat(
                source.display().to_string(),
            ));
        }
        if !source.exists() {
            return Err(MediaError::SourceUnreadable(source.display().to_string()).into());
        }
        let crop = self.sanitize_crop(crop);

        let targets: Vec<(DisplayId, u32, u32)> = match display {
            Some(id) => {
                let info = self
                    .platform
                    .list_displays()
                    .into_iter()
                    .find(|d| d.id == id)
                    .ok_or_else(|| WallpaperError::DisplayNotFound(id.to_string()))?;
                vec![(info.id, info.width, info.height)]
            }
            None => self
                .platform
                .list_displays()
                .into_iter()
                .map(|d| (d.id, d.width, d.height))
                .collect(),
        };
        if targets.is_empty() {
            return Err(WallpaperError::DisplayNotFound(
                "no displays connected".to_string(),
            ));
        }

        // Image and video are mutually exclusive per display.
        self.stop_video_wallpaper(display);

        let pictures: Vec<(DisplayId, Result<PathBuf, WallpaperError>)> = if crop.is_identity() {
            targets
                .iter()
                .map(|(id, _, _)| (*id, Ok(source.to_path_buf())))
                .collect()
        } else {
            targets
                .par_iter()
                .map(|(id, width, height)| {
                    let rendered = crop::render_cropped_to_temp(source, &crop, *width, *height)
                        .map_err(|e| WallpaperError::Image(e.to_string()));
                    (*id, rendered)
                })
                .collect()
        };

        let mut applied = 0usize;
        let mut last_error = None;
        for (id, picture) in pictures {
            let result = picture.and_then(|path| self.platform.set_desktop_picture(id, &path));
            match result {
                Ok(()) => applied += 1,
                Err(e) => {
                    log::warn!("Failed to set image wallpaper on {id}: {e}");
                    last_error = Some(e);
                }
            }
        }

        if applied == 0 {
            return Err(last_error.unwrap_or_else(|| {
                WallpaperError::Image("no display accepted the wallpaper".to_string())
            }));
        }

        self.current_source_name = source_display_name(source);
        self.is_video_active = !self.surfaces.is_empty();
        log::info!(
            "Image wallpaper {} applied to {} display(s)",
            self.current_source_name,
            applied
        );
        Ok(())
    }

    /// Tear down video wallpaper on one display, or on all displays when none
    /// is given. Idempotent: displays without a surface are ignored.
    pub fn stop_video_wallpaper(&mut self, display: Option<DisplayId>) {
        match display {
            Some(id) => {
                if let Some(surface) = self.surfaces.remove(&id) {
                    surface.close();
                }
            }
            None => {
                for (_, surface) in self.surfaces.drain() {
                    surface.close();
                }
            }
        }
        self.is_video_active = !self.surfaces.is_empty();
        // A pause flag with nothing left to pause would stick to the next
        // wallpaper.
        if self.surfaces.is_empty() {
            self.is_paused = false;
        }
    }

    /// Stop all video playback and restore the platform's default desktop
    /// picture on every display. Reentrancy-guarded: a restore triggered
    /// while one is already running is a no-op.
    pub fn restore_system_default(&mut self) -> Result<(), WallpaperError> {
        if self.restoring_default {
            log::debug!("Restore already in progress, ignoring");
            return Ok(());
        }
        self.restoring_default = true;
        let result = self.restore_system_default_inner();
        self.restoring_default = false;
        result
    }

    fn restore_system_default_inner(&mut self) -> Result<(), WallpaperError> {
        self.stop_video_wallpaper(None);

        let picture = match self.platform.system_default_picture() {
            Some(path) if path.exists() => path,
            _ => {
                log::info!("No system default picture available, synthesizing fallback");
                crop::flat_color_picture(FALLBACK_SIZE.0, FALLBACK_SIZE.1, FALLBACK_COLOR)
                    .map_err(|e| WallpaperError::Image(e.to_string()))?
            }
        };

        let mut applied = 0usize;
        let mut last_error = None;
        for info in self.platform.list_displays() {
            match self.platform.set_desktop_picture(info.id, &picture) {
                Ok(()) => applied += 1,
                Err(e) => {
                    log::warn!("Failed to restore default on {}: {e}", info.id);
                    last_error = Some(e);
                }
            }
        }
        if applied == 0
            && let Some(e) = last_error
        {
            return Err(e);
        }

        self.current_source_name = DEFAULT_SOURCE_NAME.to_string();
        self.is_video_active = false;
        self.is_paused = false;
        log::info!("Restored system default wallpaper on {applied} display(s)");
        Ok(())
    }

    /// Pause playback on every surface.
    pub fn pause_all(&mut self) {
        for surface in self.surfaces.values_mut() {
            surface.pause();
        }
        self.is_paused = true;
    }

    /// Resume playback on every surface.
    pub fn resume_all(&mut self) {
        for surface in self.surfaces.values_mut() {
            surface.resume();
        }
        self.is_paused = false;
    }

    /// Live-update the crop on one display's surface, or on all surfaces
    /// when none is given. Layers are repositioned in place; playback is
    /// untouched.
    pub fn update_crop(&mut self, display: Option<DisplayId>, crop: CropSpec) {
        let crop = self.sanitize_crop(crop);
        match display {
            Some(id) => {
                if let Some(surface) = self.surfaces.get_mut(&id) {
                    surface.set_crop(crop);
                }
            }
            None => {
                for surface in self.surfaces.values_mut() {
                    surface.set_crop(crop);
                }
            }
        }
    }

    /// Retarget transition settings for every active surface. In-flight
    /// animations finish with their original settings; the next loop boundary
    /// uses the new ones.
    pub fn update_transition(&mut self, transition: TransitionSpec) {
        self.transition = transition;
        for surface in self.surfaces.values_mut() {
            surface.set_transition(transition);
        }
    }

    /// Drive every surface forward one step.
    pub fn tick(&mut self) {
        for surface in self.surfaces.values_mut() {
            surface.tick();
        }
    }

    /// Drive loop: ticks every surface on the loop-observer cadence. Runs
    /// until the future is dropped; the embedder selects or cancels it.
    pub async fn run(&mut self) {
        let mut interval = tokio::time::interval(PROGRESS_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            self.tick();
        }
    }

    fn resolve_display(&self, requested: Option<DisplayId>) -> Result<DisplayId, WallpaperError> {
        let displays = self.platform.list_displays();
        match requested {
            Some(id) => displays
                .iter()
                .find(|d| d.id == id)
                .map(|d| d.id)
                .ok_or_else(|| WallpaperError::DisplayNotFound(id.to_string())),
            None => displays
                .iter()
                .find(|d| d.is_primary)
                .or_else(|| displays.first())
                .map(|d| d.id)
                .ok_or_else(|| {
                    WallpaperError::DisplayNotFound("no displays connected".to_string())
                }),
        }
    }

    fn sanitize_crop(&self, crop: CropSpec) -> CropSpec {
        if crop.is_valid() {
            crop
        } else {
            log::warn!("Rejecting invalid crop {crop:?}, using identity");
            CropSpec::default()
        }
    }
}

fn source_display_name(source: &Path) -> String {
    source
        .file_stem()
        .or_else(|| source.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string())
}
