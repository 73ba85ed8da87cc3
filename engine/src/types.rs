//! Shared value types for the wallpaper engine.
//!
//! Everything here is serializable so an embedding shell can persist crop and
//! transition settings in its own configuration layer.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WallpaperError;

/// Opaque identifier for a connected display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayId(pub u32);

impl std::fmt::Display for DisplayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "display-{}", self.0)
    }
}

/// Axis-aligned rectangle in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Display (monitor) information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub id: DisplayId,
    pub width: u32,
    pub height: u32,
    pub is_primary: bool,
}

/// User crop adjustment applied on top of the automatic aspect-fill.
///
/// Offsets are expressed in target-display points with Y pointing down, the
/// convention the adjustment UI uses. Rendering layers use a Y-up transform
/// space, so the vertical offset is sign-inverted on that path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropSpec {
    /// Zoom multiplier on top of aspect-fill. Must be positive.
    pub scale: f64,
    /// Horizontal pan in display points (positive = right).
    pub offset_x: f64,
    /// Vertical pan in display points (positive = down).
    pub offset_y: f64,
}

impl Default for CropSpec {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl CropSpec {
    /// Whether this crop leaves the aspect-filled content untouched.
    pub fn is_identity(&self) -> bool {
        (self.scale - 1.0).abs() < f64::EPSILON
            && self.offset_x.abs() < f64::EPSILON
            && self.offset_y.abs() < f64::EPSILON
    }

    /// Boundary validation: scale must be a positive finite number and the
    /// offsets finite.
    pub fn is_valid(&self) -> bool {
        self.scale.is_finite()
            && self.scale > 0.0
            && self.offset_x.is_finite()
            && self.offset_y.is_finite()
    }
}

/// Transition effect between the outgoing and incoming media layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Instant switch.
    None,
    /// Cross-fade: outgoing ramps down while incoming ramps up.
    Fade,
    /// Fade through black: outgoing to black, then black to incoming.
    Blackout,
}

/// Transition settings applied at each loop boundary and source swap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub kind: TransitionKind,
    pub duration: Duration,
}

impl Default for TransitionSpec {
    fn default() -> Self {
        Self {
            kind: TransitionKind::Fade,
            duration: Duration::from_secs(1),
        }
    }
}

impl TransitionSpec {
    pub fn new(kind: TransitionKind, duration: Duration) -> Self {
        Self { kind, duration }
    }

    /// A transition with no visible animation degenerates to a hard cut.
    pub fn is_cut(&self) -> bool {
        self.kind == TransitionKind::None || self.duration.is_zero()
    }
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "m4v", "mkv"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "heic"];

/// Classification of a wallpaper source file by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Video,
    Image,
}

impl SourceKind {
    /// Classify a source path by its extension (case-insensitive).
    pub fn classify(path: &Path) -> Result<Self, WallpaperError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Ok(Self::Video)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Ok(Self::Image)
        } else {
            Err(WallpaperError::UnsupportedFormat(
                path.display().to_string(),
            ))
        }
    }
}

/// Snapshot of the engine's published state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Display name of the current wallpaper source.
    pub current_source_name: String,
    /// Whether any display is running a video wallpaper.
    pub is_video_active: bool,
    /// Whether playback is globally paused.
    pub is_paused: bool,
    /// Displays currently carrying a video surface.
    pub active_displays: Vec<DisplayId>,
    /// Transition settings applied at the next loop boundary.
    pub transition: TransitionSpec,
}
