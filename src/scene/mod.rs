//! Retained scene: region shapes and border meshes in paint order.
//!
//! Renderers never touch the scene directly. They compute a [`SceneDelta`]
//! against the current contents, and the scene applies it.

mod spatial;
mod tween;

pub use spatial::HitGrid;
pub use tween::{Easing, Interpolate, Tween};

use crate::color::Rgba;
use crate::interact::RegionSelector;
use crate::map::{ProjectedPath, ViewBox};
use crate::stats::Metric;
use crate::topology::{FeatureKey, RegionProperties};
use glam::DVec2;
use std::time::{Duration, Instant};

/// Hit grid cells per ViewBox width
const GRID_DIVISIONS: f64 = 32.0;

/// What a shape does when the pointer interacts with it. Bound once when the
/// shape enters; the engine resolves it against live state at event time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionHandlers {
    /// Selection requested on pointer enter
    pub enter: RegionSelector,
    /// State to drill into on click
    pub drill_state: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionShape {
    pub key: FeatureKey,
    pub properties: RegionProperties,
    pub path: ProjectedPath,
    pub fill: Tween<Rgba>,
    /// Transparent when the shape has no stroke override
    pub stroke: Tween<Rgba>,
    /// Metric the shape was last reconciled for
    pub metric: Metric,
    pub tooltip: Option<String>,
    pub hovered: bool,
    pub pointer_events: bool,
    pub handlers: RegionHandlers,
}

/// Fill, stroke and tooltip targets for an existing shape
#[derive(Debug, Clone, PartialEq)]
pub struct RegionUpdate {
    pub fill: Rgba,
    pub stroke: Rgba,
    pub metric: Metric,
    pub tooltip: Option<String>,
}

/// A mesh overlay drawn as unfilled lines
#[derive(Debug, Clone, PartialEq)]
pub struct BorderPath {
    /// Layer name the mesh came from
    pub id: String,
    pub lines: Vec<Vec<DVec2>>,
    pub stroke_width: f64,
    pub stroke: Tween<Rgba>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderLayer {
    States,
    Districts,
}

/// Add/update/remove result of a keyed data join
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDelta<K, N, U> {
    pub added: Vec<N>,
    pub updated: Vec<(K, U)>,
    pub removed: Vec<K>,
}

impl<K, N, U> Default for SceneDelta<K, N, U> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<K, N, U> SceneDelta<K, N, U> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

pub type RegionDelta = SceneDelta<FeatureKey, RegionShape, RegionUpdate>;
pub type BorderDelta = SceneDelta<String, BorderPath, Rgba>;

#[derive(Debug, Default)]
pub struct Scene {
    regions: Vec<RegionShape>,
    state_borders: Option<BorderPath>,
    district_borders: Option<BorderPath>,
    view_box: Option<ViewBox>,
    /// Surface-level pointer events (background clicks)
    pointer_events: bool,
    zone_styled: bool,
    zone_pending: Option<(Instant, bool)>,
    grid: HitGrid,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            pointer_events: true,
            ..Self::default()
        }
    }

    /// Region shapes, back to front
    pub fn regions(&self) -> &[RegionShape] {
        &self.regions
    }

    pub fn region(&self, key: &FeatureKey) -> Option<&RegionShape> {
        self.regions.iter().find(|r| &r.key == key)
    }

    pub fn hovered(&self) -> Option<&RegionShape> {
        self.regions.iter().find(|r| r.hovered)
    }

    pub fn borders(&self, layer: BorderLayer) -> Option<&BorderPath> {
        match layer {
            BorderLayer::States => self.state_borders.as_ref(),
            BorderLayer::Districts => self.district_borders.as_ref(),
        }
    }

    fn borders_mut(&mut self, layer: BorderLayer) -> &mut Option<BorderPath> {
        match layer {
            BorderLayer::States => &mut self.state_borders,
            BorderLayer::Districts => &mut self.district_borders,
        }
    }

    pub fn view_box(&self) -> Option<ViewBox> {
        self.view_box
    }

    pub fn set_view_box(&mut self, view_box: ViewBox) {
        self.view_box = Some(view_box);
    }

    pub fn pointer_events(&self) -> bool {
        self.pointer_events
    }

    /// Whether zone palette styling is in effect
    pub fn zone_styled(&self) -> bool {
        self.zone_styled
    }

    /// Switch zone styling after `delay`, or immediately when zero
    pub fn schedule_zone_style(&mut self, zone: bool, now: Instant, delay: Duration) {
        if delay.is_zero() {
            self.zone_styled = zone;
            self.zone_pending = None;
        } else {
            self.zone_pending = Some((now + delay, zone));
        }
    }

    /// Block or allow pointer events on the surface and every shape
    pub fn set_pointer_events(&mut self, enabled: bool) {
        self.pointer_events = enabled;
        for region in &mut self.regions {
            region.pointer_events = enabled;
        }
    }

    /// Drop every shape and border
    pub fn clear(&mut self) {
        self.regions.clear();
        self.state_borders = None;
        self.district_borders = None;
        self.zone_pending = None;
        self.grid = HitGrid::default();
    }

    /// Apply a region join. Removed shapes go, updated shapes animate toward
    /// their new targets in place, added shapes append on top. Every shape
    /// stops taking pointer events until its fill transition ends.
    pub fn apply_regions(&mut self, delta: RegionDelta, now: Instant, duration: Duration) {
        if !delta.removed.is_empty() {
            self.regions.retain(|r| !delta.removed.contains(&r.key));
        }

        for (key, update) in delta.updated {
            let Some(region) = self.regions.iter_mut().find(|r| r.key == key) else {
                continue;
            };
            region.fill.animate_to(update.fill, now, duration);
            region.stroke.animate_to(update.stroke, now, duration);
            region.metric = update.metric;
            region.tooltip = update.tooltip;
        }

        for mut shape in delta.added {
            let fill = *shape.fill.target();
            shape.fill.jump_to(Rgba::TRANSPARENT);
            shape.fill.animate_to(fill, now, duration);
            self.regions.push(shape);
        }

        self.pointer_events = true;
        for region in &mut self.regions {
            region.pointer_events = false;
            // A shape whose transition completes instantly is live right away
            if !region.fill.is_running() {
                region.pointer_events = true;
            }
        }
        self.reindex();
    }

    /// Apply a border join for one layer
    pub fn apply_borders(&mut self, layer: BorderLayer, delta: BorderDelta, now: Instant, duration: Duration) {
        let slot = self.borders_mut(layer);
        if slot.as_ref().is_some_and(|p| delta.removed.contains(&p.id)) {
            *slot = None;
        }
        if let Some(mut path) = delta.added.into_iter().last() {
            let stroke = *path.stroke.target();
            path.stroke.jump_to(Rgba::TRANSPARENT);
            path.stroke.animate_to(stroke, now, duration);
            *slot = Some(path);
        }
        if let Some(path) = slot.as_mut() {
            if let Some((_, stroke)) = delta.updated.into_iter().find(|(id, _)| *id == path.id) {
                path.stroke.animate_to(stroke, now, duration);
            }
        }
    }

    /// Drop the hover flag and stroke override of the hovered shape, unless
    /// it is `keep`. Other shapes' stroke transitions are left running.
    pub fn clear_hover(&mut self, keep: Option<&FeatureKey>) {
        for region in self.regions.iter_mut().filter(|r| r.hovered) {
            if Some(&region.key) == keep {
                continue;
            }
            region.hovered = false;
            region.stroke.jump_to(Rgba::TRANSPARENT);
        }
    }

    /// Mark the shape hovered with `stroke` and move it to the top
    pub fn hover(&mut self, key: &FeatureKey, stroke: Rgba) -> bool {
        let Some(idx) = self.regions.iter().position(|r| &r.key == key) else {
            return false;
        };
        let mut shape = self.regions.remove(idx);
        shape.hovered = true;
        // A redraw may already be animating the stroke toward this color
        if *shape.stroke.target() != stroke {
            shape.stroke.jump_to(stroke);
        }
        self.regions.push(shape);
        self.reindex();
        true
    }

    /// Advance every transition. Returns true while anything is animating.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut animating = false;
        for region in &mut self.regions {
            if region.fill.tick(now) {
                region.pointer_events = true;
            }
            region.stroke.tick(now);
            animating |= region.fill.is_running() || region.stroke.is_running();
        }
        for path in [&mut self.state_borders, &mut self.district_borders].into_iter().flatten() {
            path.stroke.tick(now);
            animating |= path.stroke.is_running();
        }
        if let Some((due, zone)) = self.zone_pending {
            if now >= due {
                self.zone_styled = zone;
                self.zone_pending = None;
            } else {
                animating = true;
            }
        }
        animating
    }

    /// Topmost shape whose outline contains a ViewBox-space point
    pub fn hit_test(&self, p: DVec2) -> Option<&RegionShape> {
        self.grid
            .candidates(p)
            .iter()
            .rev()
            .filter_map(|&idx| self.regions.get(idx))
            .find(|r| r.path.contains(p))
    }

    fn reindex(&mut self) {
        let cell_size = self
            .view_box
            .map(|vb| vb.width / GRID_DIVISIONS)
            .unwrap_or(1.0);
        self.grid = HitGrid::build(self.regions.iter().map(|r| r.path.bounds()), cell_size);
    }
}
