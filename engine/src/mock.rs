//! In-memory platform for exercising surface and engine logic.
//!
//! Every backend call appends to a shared ordered trace so teardown ordering
//! is assertable, and per-slot probe state is shared via `Rc` so tests can
//! script positions and durations from outside.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use crate::backend::{
    DisplayRegistry, Layer, MediaHandle, ObserverId, OverlayWindow, Platform,
};
use crate::crop::LayerPlacement;
use crate::error::{MediaError, WallpaperError};
use crate::types::{DisplayId, DisplayInfo, Rect};

pub type Trace = Rc<RefCell<Vec<String>>>;

/// Create a real (empty) media file so source existence checks pass.
pub fn temp_media(suffix: &str) -> tempfile::NamedTempFile {
    tempfile::Builder::new()
        .prefix("fluxwall-test-")
        .suffix(suffix)
        .tempfile()
        .unwrap()
}

#[derive(Debug, Default)]
pub struct MediaState {
    pub playing: bool,
    pub position: Option<Duration>,
    pub duration: Option<Duration>,
    pub seeks: u32,
    pub observers: Vec<u64>,
}

#[derive(Debug, Default)]
pub struct LayerState {
    pub attached: bool,
    pub opacity: f32,
    pub placement: Option<LayerPlacement>,
}

/// Shared view into one created handle/layer pair.
pub struct SlotProbe {
    pub source: PathBuf,
    pub media: Rc<RefCell<MediaState>>,
    pub layer: Rc<RefCell<LayerState>>,
}

struct MockHandle {
    index: usize,
    state: Rc<RefCell<MediaState>>,
    trace: Trace,
    next_observer: u64,
}

impl MediaHandle for MockHandle {
    fn play(&mut self) {
        self.state.borrow_mut().playing = true;
        self.trace
            .borrow_mut()
            .push(format!("handle{}: play", self.index));
    }

    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
        self.trace
            .borrow_mut()
            .push(format!("handle{}: pause", self.index));
    }

    fn seek_to_start(&mut self) {
        let mut state = self.state.borrow_mut();
        state.position = Some(Duration::ZERO);
        state.seeks += 1;
        self.trace
            .borrow_mut()
            .push(format!("handle{}: seek", self.index));
    }

    fn position(&self) -> Option<Duration> {
        self.state.borrow().position
    }

    fn duration(&self) -> Option<Duration> {
        self.state.borrow().duration
    }

    fn add_progress_observer(&mut self, _interval: Duration) -> ObserverId {
        self.next_observer += 1;
        let id = self.next_observer;
        self.state.borrow_mut().observers.push(id);
        self.trace
            .borrow_mut()
            .push(format!("handle{}: observer-add", self.index));
        ObserverId(id)
    }

    fn remove_progress_observer(&mut self, id: ObserverId) {
        self.state.borrow_mut().observers.retain(|o| *o != id.0);
        self.trace
            .borrow_mut()
            .push(format!("handle{}: observer-remove", self.index));
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.trace
            .borrow_mut()
            .push(format!("handle{}: release", self.index));
    }
}

struct MockLayer {
    index: usize,
    state: Rc<RefCell<LayerState>>,
    trace: Trace,
}

impl Layer for MockLayer {
    fn attach(&mut self, _frame: Rect, placement: LayerPlacement) {
        let mut state = self.state.borrow_mut();
        state.attached = true;
        state.placement = Some(placement);
        self.trace
            .borrow_mut()
            .push(format!("layer{}: attach", self.index));
    }

    fn detach(&mut self) {
        self.state.borrow_mut().attached = false;
        self.trace
            .borrow_mut()
            .push(format!("layer{}: detach", self.index));
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.state.borrow_mut().opacity = opacity;
    }

    fn set_placement(&mut self, placement: LayerPlacement) {
        self.state.borrow_mut().placement = Some(placement);
    }
}

impl Drop for MockLayer {
    fn drop(&mut self) {
        self.trace
            .borrow_mut()
            .push(format!("layer{}: release", self.index));
    }
}

pub struct MockWindow {
    frame: Rect,
    trace: Trace,
    slots: Rc<RefCell<Vec<SlotProbe>>>,
    shown: Rc<Cell<bool>>,
    closed: Rc<Cell<bool>>,
    fail_layer_creation_after: Rc<Cell<Option<usize>>>,
}

impl OverlayWindow for MockWindow {
    fn frame(&self) -> Rect {
        self.frame
    }

    fn create_media_layer(
        &mut self,
        source: &Path,
    ) -> Result<(Box<dyn MediaHandle>, Box<dyn Layer>), MediaError> {
        let index = self.slots.borrow().len();
        if let Some(limit) = self.fail_layer_creation_after.get()
            && index >= limit
        {
            return Err(MediaError::LayerCreationFailed(
                source.display().to_string(),
            ));
        }

        let media = Rc::new(RefCell::new(MediaState::default()));
        let layer = Rc::new(RefCell::new(LayerState::default()));
        self.slots.borrow_mut().push(SlotProbe {
            source: source.to_path_buf(),
            media: Rc::clone(&media),
            layer: Rc::clone(&layer),
        });

        Ok((
            Box::new(MockHandle {
                index,
                state: media,
                trace: Rc::clone(&self.trace),
                next_observer: 0,
            }),
            Box::new(MockLayer {
                index,
                state: layer,
                trace: Rc::clone(&self.trace),
            }),
        ))
    }

    fn show(&mut self) {
        self.shown.set(true);
        self.trace.borrow_mut().push("window: show".to_string());
    }

    fn close(&mut self) {
        self.closed.set(true);
        self.trace.borrow_mut().push("window: close".to_string());
    }
}

/// Scriptable platform with shared probes.
pub struct MockPlatform {
    pub displays: Vec<DisplayInfo>,
    pub trace: Trace,
    pub slots: Rc<RefCell<Vec<SlotProbe>>>,
    pub shown: Rc<Cell<bool>>,
    pub closed: Rc<Cell<bool>>,
    pub windows_created: Rc<RefCell<Vec<DisplayId>>>,
    pub desktop_calls: Rc<RefCell<Vec<(DisplayId, PathBuf)>>>,
    pub default_picture: Option<PathBuf>,
    pub fail_layer_creation_after: Rc<Cell<Option<usize>>>,
    pub fail_desktop_picture: bool,
}

impl MockPlatform {
    fn with_displays(displays: Vec<DisplayInfo>) -> Self {
        Self {
            displays,
            trace: Rc::new(RefCell::new(Vec::new())),
            slots: Rc::new(RefCell::new(Vec::new())),
            shown: Rc::new(Cell::new(false)),
            closed: Rc::new(Cell::new(false)),
            windows_created: Rc::new(RefCell::new(Vec::new())),
            desktop_calls: Rc::new(RefCell::new(Vec::new())),
            default_picture: None,
            fail_layer_creation_after: Rc::new(Cell::new(None)),
            fail_desktop_picture: false,
        }
    }

    /// One primary 1920x1080 display.
    pub fn single() -> Self {
        Self::with_displays(vec![DisplayInfo {
            id: DisplayId(1),
            width: 1920,
            height: 1080,
            is_primary: true,
        }])
    }

    /// A primary display plus a portrait secondary.
    pub fn dual() -> Self {
        Self::with_displays(vec![
            DisplayInfo {
                id: DisplayId(1),
                width: 1920,
                height: 1080,
                is_primary: true,
            },
            DisplayInfo {
                id: DisplayId(2),
                width: 1080,
                height: 1920,
                is_primary: false,
            },
        ])
    }
}

impl DisplayRegistry for MockPlatform {
    fn list_displays(&self) -> Vec<DisplayInfo> {
        self.displays.clone()
    }

    fn display_frame(&self, id: DisplayId) -> Option<Rect> {
        self.displays
            .iter()
            .find(|d| d.id == id)
            .map(|d| Rect::new(0, 0, d.width, d.height))
    }
}

impl Platform for MockPlatform {
    fn create_window(
        &mut self,
        display: DisplayId,
        frame: Rect,
    ) -> Result<Box<dyn OverlayWindow>, WallpaperError> {
        self.windows_created.borrow_mut().push(display);
        Ok(Box::new(MockWindow {
            frame,
            trace: Rc::clone(&self.trace),
            slots: Rc::clone(&self.slots),
            shown: Rc::clone(&self.shown),
            closed: Rc::clone(&self.closed),
            fail_layer_creation_after: Rc::clone(&self.fail_layer_creation_after),
        }))
    }

    fn set_desktop_picture(
        &mut self,
        display: DisplayId,
        path: &Path,
    ) -> Result<(), WallpaperError> {
        if self.fail_desktop_picture {
            return Err(WallpaperError::Io(format!(
                "desktop picture rejected for {display}"
            )));
        }
        self.desktop_calls
            .borrow_mut()
            .push((display, path.to_path_buf()));
        Ok(())
    }

    fn system_default_picture(&self) -> Option<PathBuf> {
        self.default_picture.clone()
    }
}
