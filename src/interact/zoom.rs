use super::RegionSelector;
use crate::topology::FeatureKey;
use tracing::{debug, info};

/// Where the map is in its load/drill lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    /// Geometry for `target` is being fetched; the previous map stays live
    Loading { target: String },
    #[default]
    Ready,
    /// Drilling into `target`; region input is ignored until it paints
    Transitioning { target: String },
}

/// Touch-inspect flag: a touch on a region followed by the click the
/// browser-style host synthesizes for it must not drill down.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TouchState {
    #[default]
    Idle,
    TouchPending(FeatureKey),
}

#[derive(Debug, Default)]
pub struct ZoomCoordinator {
    state: ViewState,
    touch: TouchState,
}

impl ZoomCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn touch(&self) -> &TouchState {
        &self.touch
    }

    /// Region input is suppressed while a drill-down is in flight
    pub fn is_locked(&self) -> bool {
        matches!(self.state, ViewState::Transitioning { .. })
    }

    /// A second touch on the same region releases the flag
    pub fn on_touch_start(&mut self, key: &FeatureKey) {
        self.touch = match &self.touch {
            TouchState::TouchPending(pending) if pending == key => TouchState::Idle,
            _ => TouchState::TouchPending(key.clone()),
        };
    }

    pub fn on_leave(&mut self, key: &FeatureKey) {
        if matches!(&self.touch, TouchState::TouchPending(pending) if pending == key) {
            self.touch = TouchState::Idle;
        }
    }

    /// Decide whether a click on `key` drills into `state`. Returns the map
    /// switch target when accepted, after which the coordinator is locked.
    pub fn on_click(&mut self, key: &FeatureKey, state: &str, top_level: bool) -> Option<String> {
        if self.is_locked() || !top_level {
            return None;
        }
        if matches!(&self.touch, TouchState::TouchPending(pending) if pending == key) {
            debug!(%key, "click after touch treated as inspect");
            return None;
        }
        info!(state, "drilling down");
        self.state = ViewState::Transitioning {
            target: state.to_string(),
        };
        Some(state.to_string())
    }

    /// Tap outside every region: back to the whole-area total, except on
    /// state maps where the selection is kept
    pub fn on_background_click(&self, top_level: bool) -> Option<RegionSelector> {
        if self.is_locked() || !top_level {
            return None;
        }
        Some(RegionSelector::total())
    }

    /// A new map was requested. An in-flight drill keeps its lock.
    pub fn begin_loading(&mut self, target: &str) {
        self.touch = TouchState::Idle;
        self.state = match &self.state {
            ViewState::Transitioning { .. } => ViewState::Transitioning {
                target: target.to_string(),
            },
            _ => ViewState::Loading {
                target: target.to_string(),
            },
        };
    }

    /// The requested map (or its absence) has been painted
    pub fn painted(&mut self) {
        self.state = ViewState::Ready;
    }

    /// Map currently being loaded or drilled into, if any
    pub fn target(&self) -> Option<&str> {
        match &self.state {
            ViewState::Loading { target } | ViewState::Transitioning { target } => Some(target),
            ViewState::Ready => None,
        }
    }
}
