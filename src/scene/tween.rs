use crate::color::Rgba;
use std::time::{Duration, Instant};

/// Values that can be blended for transitions
pub trait Interpolate: Clone + PartialEq {
    fn interpolate(&self, to: &Self, t: f64) -> Self;
}

impl Interpolate for Rgba {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        self.lerp(*to, t)
    }
}

impl Interpolate for f64 {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        self + (to - self) * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    #[default]
    CubicInOut,
}

impl Easing {
    #[inline(always)]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u * u / 2.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Running {
    start: Instant,
    duration: Duration,
}

/// A value animating toward a target, advanced by [`Tween::tick`].
///
/// Retargeting mid-flight restarts from the value shown at that instant, so
/// the last requested target always wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween<T> {
    current: T,
    from: T,
    to: T,
    easing: Easing,
    running: Option<Running>,
}

impl<T: Interpolate> Tween<T> {
    pub fn new(value: T) -> Self {
        Self {
            current: value.clone(),
            from: value.clone(),
            to: value,
            easing: Easing::default(),
            running: None,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Value as of the last tick
    pub fn value(&self) -> &T {
        &self.current
    }

    pub fn target(&self) -> &T {
        &self.to
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start a transition to `to`. Always restarts, even toward the same
    /// target, so completion fires one duration after the latest request.
    pub fn animate_to(&mut self, to: T, now: Instant, duration: Duration) {
        if duration.is_zero() {
            self.jump_to(to);
            return;
        }
        self.from = self.current.clone();
        self.to = to;
        self.running = Some(Running {
            start: now,
            duration,
        });
    }

    /// Set immediately, cancelling any running transition
    pub fn jump_to(&mut self, to: T) {
        self.current = to.clone();
        self.from = to.clone();
        self.to = to;
        self.running = None;
    }

    /// Advance to `now`. Returns true on the tick the transition ends.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(run) = &self.running else {
            return false;
        };
        let elapsed = now.saturating_duration_since(run.start).as_secs_f64();
        let progress = elapsed / run.duration.as_secs_f64();
        if progress >= 1.0 {
            self.current = self.to.clone();
            self.running = None;
            return true;
        }
        self.current = self.from.interpolate(&self.to, self.easing.apply(progress));
        false
    }
}
