//! Transition curves and the animation driving layer opacities.
//!
//! The curves are pure functions of normalized progress so previews and tests
//! can evaluate them without a clock. [`TransitionAnimation`] binds a curve to
//! wall-clock time and yields the opacity pair to apply to the outgoing and
//! incoming layers.

use std::time::Instant;

use crate::types::{TransitionKind, TransitionSpec};

/// Easing functions for smooth transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    /// Linear interpolation (constant speed)
    Linear,
    /// Ease in (slow start, fast end)
    EaseIn,
    /// Ease out (fast start, slow end)
    EaseOut,
    /// Ease in-out (slow start and end, fast middle)
    EaseInOut,
}

impl Default for Easing {
    fn default() -> Self {
        Self::EaseInOut
    }
}

impl Easing {
    /// Apply easing to a linear progress value (0.0 to 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => t * (2.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

/// Incoming-layer opacity for a cross-fade at progress `p`.
pub fn fade_in_opacity(p: f32) -> f32 {
    p.clamp(0.0, 1.0)
}

/// Outgoing-layer opacity for a cross-fade at progress `p`.
pub fn fade_out_opacity(p: f32) -> f32 {
    1.0 - p.clamp(0.0, 1.0)
}

/// Darkness of the black veil for a blackout at progress `p`: ramps to full
/// black at the midpoint, then back out.
pub fn blackout_opacity(p: f32) -> f32 {
    let p = p.clamp(0.0, 1.0);
    if p < 0.5 { 2.0 * p } else { 2.0 * (1.0 - p) }
}

/// Opacity pair `(outgoing, incoming)` for a transition kind at raw progress
/// `p`, before wall-clock binding. Fade is a single eased cross-ramp;
/// blackout runs two half-duration phases over an opaque black background.
pub fn opacities_at(kind: TransitionKind, p: f32) -> (f32, f32) {
    let p = p.clamp(0.0, 1.0);
    match kind {
        TransitionKind::None => (0.0, 1.0),
        TransitionKind::Fade => {
            let eased = Easing::EaseInOut.apply(p);
            (1.0 - eased, eased)
        }
        TransitionKind::Blackout => {
            if p < 0.5 {
                // First half: outgoing fades into black, incoming stays hidden.
                let phase = Easing::EaseIn.apply(p * 2.0);
                (1.0 - phase, 0.0)
            } else {
                // Second half: incoming emerges from black.
                let phase = Easing::EaseOut.apply(p * 2.0 - 1.0);
                (0.0, phase)
            }
        }
    }
}

/// A transition in flight, bound to wall-clock time.
#[derive(Debug)]
pub struct TransitionAnimation {
    spec: TransitionSpec,
    start_time: Instant,
}

impl TransitionAnimation {
    pub fn start(spec: TransitionSpec) -> Self {
        Self {
            spec,
            start_time: Instant::now(),
        }
    }

    /// Raw progress (0.0 to 1.0), linear in elapsed time.
    pub fn raw_progress(&self) -> f32 {
        let elapsed = self.start_time.elapsed();
        if elapsed >= self.spec.duration {
            1.0
        } else {
            elapsed.as_secs_f32() / self.spec.duration.as_secs_f32()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.start_time.elapsed() >= self.spec.duration
    }

    /// Current `(outgoing, incoming)` layer opacities.
    pub fn layer_opacities(&self) -> (f32, f32) {
        opacities_at(self.spec.kind, self.raw_progress())
    }
}
