use super::RegionSelector;
use crate::catalog::MapStatistic;
use crate::color::{case_color, Rgba, DARK};
use crate::scene::Scene;
use crate::stats::Metric;
use tracing::debug;

/// Single owner of the active region.
///
/// Hover and external selection both flow through [`select`](Self::select);
/// re-selecting the current region is a no-op, which is what keeps an
/// external setter that echoes our own events from looping.
#[derive(Debug, Default)]
pub struct HighlightController {
    current: Option<RegionSelector>,
}

impl HighlightController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&RegionSelector> {
        self.current.as_ref()
    }

    /// Record `selector` as authoritative. Returns false if it already was.
    pub fn select(&mut self, selector: RegionSelector) -> bool {
        if self.current.as_ref() == Some(&selector) {
            return false;
        }
        debug!(region = %selector, "region highlighted");
        self.current = Some(selector);
        true
    }

    /// Paint the current selection onto the scene: clear the previous
    /// override, then raise the matching shape and stroke it. Returns whether
    /// a shape matched.
    pub fn apply(&self, scene: &mut Scene, statistic: MapStatistic) -> bool {
        let matched = self.current.as_ref().and_then(|selector| {
            scene
                .regions()
                .iter()
                .find(|r| selector.matches(&r.properties))
                .map(|r| (r.key.clone(), Self::stroke(statistic, r.metric)))
        });
        scene.clear_hover(matched.as_ref().map(|(key, _)| key));
        match matched {
            Some((key, stroke)) => scene.hover(&key, stroke),
            None => false,
        }
    }

    /// Stroke of the hovered shape
    pub fn stroke(statistic: MapStatistic, metric: Metric) -> Rgba {
        match statistic {
            MapStatistic::Zone => DARK,
            MapStatistic::Total => case_color(metric),
        }
    }
}
