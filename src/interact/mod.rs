//! Pointer interaction: which region is active, and when a click drills down.

mod highlight;
mod zoom;

pub use highlight::HighlightController;
pub use zoom::{TouchState, ViewState, ZoomCoordinator};

use crate::stats::TOTAL_KEY;
use crate::topology::RegionProperties;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The region the rest of the application considers selected
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionSelector {
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
}

impl RegionSelector {
    pub fn state(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            district: None,
        }
    }

    pub fn district(state: impl Into<String>, district: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            district: Some(district.into()),
        }
    }

    /// Whole-area total
    pub fn total() -> Self {
        Self::state(TOTAL_KEY)
    }

    pub fn is_total(&self) -> bool {
        self.state == TOTAL_KEY && self.district.is_none()
    }

    /// Selector a shape with these properties stands for
    pub fn of(properties: &RegionProperties) -> Self {
        Self {
            state: properties.state.clone(),
            district: properties.district.clone(),
        }
    }

    /// Exact match: a state selector never matches a district shape
    pub fn matches(&self, properties: &RegionProperties) -> bool {
        self.state == properties.state && self.district == properties.district
    }
}

impl fmt::Display for RegionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.district {
            Some(district) => write!(f, "{district}, {}", self.state),
            None => f.write_str(&self.state),
        }
    }
}
