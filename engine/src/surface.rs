//! Per-display overlay surface with dual media slots and seamless looping.
//!
//! A surface owns one desktop-level window and two media slots (A and B)
//! loaded with the same source. While one slot plays, a progress observer on
//! its handle watches for the loop trigger; near the end of the media the
//! standby slot restarts from zero and a transition swaps the roles. The
//! swap repeats every loop, so playback never shows the decoder's loop seam.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::backend::OverlayWindow;
use crate::error::MediaError;
use crate::slot::MediaSlot;
use crate::transition::TransitionAnimation;
use crate::types::{CropSpec, DisplayId, TransitionSpec};

/// Cadence of the loop progress observer and of the engine drive loop.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Teardown beyond this is considered stuck and logged.
const TEARDOWN_WARN_AFTER: Duration = Duration::from_secs(2);

/// Lifecycle of a surface. Closing is not a state: `close` consumes the
/// surface, so a closed surface cannot be ticked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    /// No source loaded.
    Idle,
    /// Active slot playing, loop observer armed.
    Playing,
    /// Loop or swap transition in flight.
    Transitioning,
}

/// The armed loop observer. `armed_on_a` records which slot the observer was
/// registered on; if the roles flipped since, the observer is stale and its
/// callbacks are ignored until it is re-armed.
struct LoopObserver {
    id: crate::backend::ObserverId,
    armed_on_a: bool,
    /// Position at which the loop transition fires. Computed lazily once the
    /// backend discovers the media duration.
    trigger: Option<Duration>,
}

/// One display's wallpaper surface.
pub struct OverlaySurface {
    display: DisplayId,
    window: Box<dyn OverlayWindow>,
    slot_a: Option<MediaSlot>,
    slot_b: Option<MediaSlot>,
    /// Which slot currently owns playback and full opacity.
    active_is_a: bool,
    source: Option<PathBuf>,
    crop: CropSpec,
    transition: TransitionSpec,
    state: SurfaceState,
    animation: Option<TransitionAnimation>,
    observer: Option<LoopObserver>,
}

impl OverlaySurface {
    pub fn new(display: DisplayId, window: Box<dyn OverlayWindow>) -> Self {
        Self {
            display,
            window,
            slot_a: None,
            slot_b: None,
            active_is_a: true,
            source: None,
            crop: CropSpec::default(),
            transition: TransitionSpec::default(),
            state: SurfaceState::Idle,
            animation: None,
            observer: None,
        }
    }

    pub fn display(&self) -> DisplayId {
        self.display
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn transition(&self) -> TransitionSpec {
        self.transition
    }

    /// Load a source into both slots and start playback on slot A.
    ///
    /// The window is reused, so swapping sources on a live surface does not
    /// flicker through the desktop. Any in-flight transition is cancelled and
    /// the previous slot pair is torn down before the new pair is built; on
    /// failure no partial pair is left behind.
    pub fn set_source(
        &mut self,
        source: &Path,
        transition: TransitionSpec,
        crop: CropSpec,
    ) -> Result<(), MediaError> {
        log::info!("Setting source {} on {}", source.display(), self.display);

        self.animation = None;
        self.detach_observer();
        self.teardown_slots();
        self.state = SurfaceState::Idle;
        self.transition = transition;
        self.crop = crop;

        let mut slot_a = MediaSlot::load(self.window.as_mut(), source)?;
        let mut slot_b = match MediaSlot::load(self.window.as_mut(), source) {
            Ok(slot) => slot,
            Err(e) => {
                // No partial pair: the first slot goes down with the failure.
                drop(slot_a.teardown());
                return Err(e);
            }
        };

        let frame = self.window.frame();
        slot_a.attach(frame, &self.crop);
        slot_a.set_opacity(1.0);
        self.slot_a = Some(slot_a);

        slot_b.attach(frame, &self.crop);
        slot_b.set_opacity(0.0);
        self.slot_b = Some(slot_b);

        self.active_is_a = true;
        if let Some(slot) = self.active_slot_mut() {
            slot.play();
        }
        self.state = SurfaceState::Playing;
        self.arm_observer();
        self.source = Some(source.to_path_buf());
        self.window.show();

        Ok(())
    }

    /// Drive the surface forward. Called on the engine's ~100ms cadence.
    pub fn tick(&mut self) {
        match self.state {
            SurfaceState::Idle => {}
            SurfaceState::Playing => self.poll_loop_trigger(),
            SurfaceState::Transitioning => self.drive_transition(),
        }
    }

    /// Retarget transition settings. An in-flight animation keeps the
    /// settings it started with; the armed trigger is recomputed so the next
    /// loop uses the new duration.
    pub fn set_transition(&mut self, transition: TransitionSpec) {
        self.transition = transition;
        if let Some(observer) = self.observer.as_mut() {
            observer.trigger = None;
        }
    }

    /// Live-update the crop on both layers.
    pub fn set_crop(&mut self, crop: CropSpec) {
        self.crop = crop;
        if let Some(slot) = self.slot_a.as_mut() {
            slot.set_placement(&crop);
        }
        if let Some(slot) = self.slot_b.as_mut() {
            slot.set_placement(&crop);
        }
    }

    pub fn pause(&mut self) {
        if let Some(slot) = self.slot_a.as_mut() {
            slot.pause();
        }
        if let Some(slot) = self.slot_b.as_mut() {
            slot.pause();
        }
    }

    pub fn resume(&mut self) {
        if let Some(slot) = self.active_slot_mut() {
            slot.play();
        }
    }

    /// Tear the surface down. Ordering is load-bearing: observer off first so
    /// no trigger fires into a dying surface, then transport stopped, then
    /// both layers leave the tree, and only then are the handle/layer pairs
    /// released and the window closed.
    pub fn close(mut self) {
        let start = Instant::now();
        log::info!("Closing overlay surface on {}", self.display);

        self.animation = None;
        self.detach_observer();
        self.teardown_slots();

        self.window.close();

        let elapsed = start.elapsed();
        if elapsed > TEARDOWN_WARN_AFTER {
            log::warn!("Surface teardown on {} took {:?}", self.display, elapsed);
        } else {
            log::debug!("Surface teardown on {} took {:?}", self.display, elapsed);
        }
    }

    fn active_slot_mut(&mut self) -> Option<&mut MediaSlot> {
        if self.active_is_a {
            self.slot_a.as_mut()
        } else {
            self.slot_b.as_mut()
        }
    }

    fn standby_slot_mut(&mut self) -> Option<&mut MediaSlot> {
        if self.active_is_a {
            self.slot_b.as_mut()
        } else {
            self.slot_a.as_mut()
        }
    }

    fn arm_observer(&mut self) {
        let armed_on_a = self.active_is_a;
        if let Some(slot) = self.active_slot_mut() {
            let id = slot.add_progress_observer(PROGRESS_INTERVAL);
            self.observer = Some(LoopObserver {
                id,
                armed_on_a,
                trigger: None,
            });
        }
    }

    fn detach_observer(&mut self) {
        if let Some(observer) = self.observer.take() {
            let slot = if observer.armed_on_a {
                self.slot_a.as_mut()
            } else {
                self.slot_b.as_mut()
            };
            if let Some(slot) = slot {
                slot.remove_progress_observer(observer.id);
            }
        }
    }

    /// Tear down the slot pair in order: transport stops first, then both
    /// layers leave the tree, and only then is either pair released. The
    /// caller detaches the observer beforehand.
    fn teardown_slots(&mut self) {
        if let Some(slot) = self.slot_a.as_mut() {
            slot.pause();
        }
        if let Some(slot) = self.slot_b.as_mut() {
            slot.pause();
        }
        let detached_a = self.slot_a.take().map(MediaSlot::teardown);
        let detached_b = self.slot_b.take().map(MediaSlot::teardown);
        drop(detached_a);
        drop(detached_b);
        self.source = None;
    }

    fn poll_loop_trigger(&mut self) {
        let Some(observer) = self.observer.as_mut() else {
            return;
        };
        // A stale observer survived a role flip; ignore it until re-armed.
        if observer.armed_on_a != self.active_is_a {
            return;
        }

        let slot = if self.active_is_a {
            self.slot_a.as_ref()
        } else {
            self.slot_b.as_ref()
        };
        let Some(slot) = slot else {
            return;
        };

        if observer.trigger.is_none()
            && let Some(duration) = slot.duration()
        {
            let trigger = duration.saturating_sub(self.transition.duration);
            log::debug!(
                "Loop trigger on {} armed at {:?} (duration {:?})",
                self.display,
                trigger,
                duration
            );
            observer.trigger = Some(trigger);
        }

        let should_fire = match (observer.trigger, slot.position()) {
            (Some(trigger), Some(position)) => position >= trigger,
            _ => false,
        };

        if should_fire {
            self.begin_transition();
        }
    }

    fn begin_transition(&mut self) {
        if self.state == SurfaceState::Transitioning {
            return;
        }

        log::debug!("Loop transition starting on {}", self.display);

        // The standby slot restarts from zero so the swap lands on frame one.
        if let Some(slot) = self.standby_slot_mut() {
            slot.seek_to_start();
            slot.play();
        }

        self.state = SurfaceState::Transitioning;
        if self.transition.is_cut() {
            self.finish_transition();
        } else {
            self.animation = Some(TransitionAnimation::start(self.transition));
        }
    }

    fn drive_transition(&mut self) {
        let Some(animation) = self.animation.as_ref() else {
            self.finish_transition();
            return;
        };

        let (outgoing, incoming) = animation.layer_opacities();
        let complete = animation.is_complete();

        if let Some(slot) = self.active_slot_mut() {
            slot.set_opacity(outgoing);
        }
        if let Some(slot) = self.standby_slot_mut() {
            slot.set_opacity(incoming);
        }

        if complete {
            self.finish_transition();
        }
    }

    /// Completion handshake: final opacities, observer off the old active
    /// slot, old transport paused, roles flipped, then the observer re-armed
    /// on the new active slot for the next loop.
    fn finish_transition(&mut self) {
        if let Some(slot) = self.standby_slot_mut() {
            slot.set_opacity(1.0);
        }
        if let Some(slot) = self.active_slot_mut() {
            slot.set_opacity(0.0);
        }

        self.detach_observer();
        if let Some(slot) = self.active_slot_mut() {
            slot.pause();
        }
        self.active_is_a = !self.active_is_a;
        self.animation = None;
        self.state = SurfaceState::Playing;
        self.arm_observer();

        log::debug!("Loop transition complete on {}", self.display);
    }
}
