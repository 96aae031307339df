//! The choropleth facade hosts drive.

use crate::catalog::{MapMetadata, MapStatistic, MapType};
use crate::color::{ColorScale, ColorScaleEngine};
use crate::interact::{HighlightController, RegionSelector, ViewState, ZoomCoordinator};
use crate::map::{Projection, ProjectionBuilder};
use crate::render::{BorderRenderer, RegionInputs, RegionRenderer};
use crate::scene::{BorderLayer, RegionShape, Scene};
use crate::stats::{Aggregates, Metric, StatisticMapping, UNASSIGNED_DISTRICT};
use crate::topology::{Feature, FeatureKey, Topology, TopologyLoader};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Tunables of the rendering engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Fill and stroke transition length
    pub transition_ms: u64,
    /// Border stroke width is the ViewBox width over this
    pub border_divisor: f64,
    /// Fraction of the hue ramp the sequential scale reaches at its max
    pub ramp_ceiling: f64,
    /// Denominator floor for tooltip percentages
    pub percent_floor: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            transition_ms: 500,
            border_divisor: 250.0,
            ramp_ceiling: 0.85,
            percent_floor: 0.001,
        }
    }
}

impl EngineOptions {
    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

/// Requests the engine sends back to its host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEvent {
    /// The pointer selected a region (or the whole-area total)
    RegionHighlighted(RegionSelector),
    /// A click asked to drill into this state
    MapSwitch { state: String },
}

/// Pointer input, already resolved to the shape under the pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerEvent {
    Enter(FeatureKey),
    Leave(FeatureKey),
    TouchStart(FeatureKey),
    Click(FeatureKey),
    /// Click or tap that hit no region
    BackgroundClick,
}

/// Interactive choropleth over a retained scene
pub struct ChoroplethMap {
    options: EngineOptions,
    projections: ProjectionBuilder,
    colors: ColorScaleEngine,
    regions: RegionRenderer,
    borders: BorderRenderer,
    highlight: HighlightController,
    zoom: ZoomCoordinator,
    scene: Scene,

    /// Map being shown
    meta: Option<MapMetadata>,
    /// Map most recently requested; installs for anything else are stale
    requested: Option<MapMetadata>,
    topology: Option<Arc<Topology>>,
    features: Vec<Feature>,
    projection: Option<Projection>,

    mapping: StatisticMapping,
    aggregates: Aggregates,
    metric: Metric,
    scale: ColorScale,
    viewport: DVec2,
    events: Vec<MapEvent>,
}

impl ChoroplethMap {
    pub fn new(options: EngineOptions, viewport: DVec2) -> Self {
        let colors = ColorScaleEngine {
            ceiling: options.ramp_ceiling,
        };
        let aggregates = Aggregates::new();
        let scale = colors.build(MapStatistic::Total, Metric::Confirmed, &aggregates);
        Self {
            projections: ProjectionBuilder::new(),
            regions: RegionRenderer::new(options.percent_floor),
            borders: BorderRenderer::new(options.border_divisor),
            highlight: HighlightController::new(),
            zoom: ZoomCoordinator::new(),
            scene: Scene::new(),
            meta: None,
            requested: None,
            topology: None,
            features: Vec::new(),
            projection: None,
            mapping: StatisticMapping::new(),
            aggregates,
            metric: Metric::Confirmed,
            scale,
            viewport,
            events: Vec::new(),
            colors,
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Map currently painted
    pub fn meta(&self) -> Option<&MapMetadata> {
        self.meta.as_ref()
    }

    pub fn view_state(&self) -> &ViewState {
        self.zoom.state()
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn scale(&self) -> &ColorScale {
        &self.scale
    }

    pub fn highlighted(&self) -> Option<&RegionSelector> {
        self.highlight.current()
    }

    pub fn is_top_level(&self) -> bool {
        self.meta.as_ref().is_some_and(MapMetadata::is_top_level)
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }

    /// Announce the map to show next. The current map stays visible until
    /// [`install_topology`](Self::install_topology) delivers the new one.
    pub fn request_map(&mut self, meta: MapMetadata) {
        info!(map = %meta.name, view = ?meta.view, statistic = ?meta.statistic, "map requested");
        self.zoom.begin_loading(&meta.name);
        self.requested = Some(meta);
    }

    /// Deliver geometry for a requested map. `None` means the load failed and
    /// the map renders empty. Returns false when `meta` is no longer the
    /// latest request.
    pub fn install_topology(&mut self, meta: &MapMetadata, topology: Option<Arc<Topology>>, now: Instant) -> bool {
        if self.requested.as_ref() != Some(meta) {
            debug!(map = %meta.name, "ignoring stale topology");
            return false;
        }

        self.features = match &topology {
            Some(topology) => topology
                .features(&meta.name, meta.region_layer())
                .unwrap_or_else(|e| {
                    warn!(map = %meta.name, error = %e, "region layer unavailable");
                    Vec::new()
                }),
            None => Vec::new(),
        };
        self.topology = topology;
        self.meta = Some(meta.clone());
        self.scale = self.colors.build(meta.statistic, self.metric, &self.aggregates);

        if self.topology.is_some() {
            self.redraw(now);
        } else {
            self.scene.clear();
            self.projection = None;
        }
        self.zoom.painted();
        true
    }

    /// Request `meta`, load its geometry and install it
    pub async fn load_map(&mut self, loader: &TopologyLoader, meta: MapMetadata) -> bool {
        self.request_map(meta.clone());
        let topology = loader.load(&meta.geometry_path).await;
        self.install_topology(&meta, topology, Instant::now())
    }

    /// Give up on a drill-down the host cannot serve
    pub fn cancel_switch(&mut self) {
        self.zoom.painted();
        self.scene.set_pointer_events(true);
    }

    /// New statistics from the host; triggers a reconcile
    pub fn set_data(&mut self, mapping: StatisticMapping, aggregates: Aggregates, now: Instant) {
        self.mapping = mapping;
        self.aggregates = aggregates;
        self.rebuild_scale();
        self.redraw(now);
    }

    pub fn set_metric(&mut self, metric: Metric, now: Instant) {
        if self.metric == metric {
            return;
        }
        self.metric = metric;
        self.rebuild_scale();
        self.redraw(now);
    }

    /// Externally driven selection. Emits nothing; returns whether it changed.
    pub fn set_region_highlighted(&mut self, selector: RegionSelector) -> bool {
        if !self.highlight.select(selector) {
            return false;
        }
        let statistic = self.statistic();
        self.highlight.apply(&mut self.scene, statistic);
        true
    }

    /// Viewport used when a map is first fitted. Maps already shown keep
    /// their ViewBox; hosts rescale it with [`crate::map::ViewBox::fit_into`].
    pub fn resize(&mut self, viewport: DVec2) {
        self.viewport = viewport;
    }

    fn statistic(&self) -> MapStatistic {
        self.meta.as_ref().map_or(MapStatistic::Total, |m| m.statistic)
    }

    fn rebuild_scale(&mut self) {
        self.scale = self.colors.build(self.statistic(), self.metric, &self.aggregates);
    }

    /// Reconcile regions and borders against current inputs
    pub fn redraw(&mut self, now: Instant) {
        let (Some(meta), Some(topology)) = (self.meta.clone(), self.topology.clone()) else {
            return;
        };
        let duration = self.options.transition();

        let projection = self
            .projections
            .project(&meta.name, self.viewport, &self.features, meta.is_top_level());
        self.projection = Some(projection);
        self.scene.set_view_box(projection.view_box);

        let inputs = RegionInputs {
            statistic: meta.statistic,
            mapping: &self.mapping,
            aggregates: &self.aggregates,
            metric: self.metric,
            scale: &self.scale,
        };
        let delta = self.regions.reconcile(&self.scene, &self.features, &projection, &inputs);
        self.scene.apply_regions(delta, now, duration);

        for layer in [BorderLayer::States, BorderLayer::Districts] {
            let mesh = if BorderRenderer::is_present(layer, &meta) {
                let name = match layer {
                    BorderLayer::States => &meta.states_layer,
                    BorderLayer::Districts => &meta.districts_layer,
                };
                topology.mesh(&meta.name, name).ok()
            } else {
                None
            };
            let delta = self
                .borders
                .reconcile(&self.scene, layer, mesh.as_ref(), &projection, &meta, self.metric);
            self.scene.apply_borders(layer, delta, now, duration);
        }

        let delay = match meta.map_type {
            MapType::State => duration / 2,
            MapType::Country => Duration::ZERO,
        };
        self.scene
            .schedule_zone_style(meta.statistic == MapStatistic::Zone, now, delay);

        self.highlight.apply(&mut self.scene, meta.statistic);
    }

    /// Advance transitions. Returns true while anything is animating.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.scene.tick(now)
    }

    /// Topmost region under a ViewBox-space point
    pub fn hit_test(&self, point: DVec2) -> Option<&RegionShape> {
        self.scene.hit_test(point)
    }

    /// Shape that may receive region input right now
    fn interactive(&self, key: &FeatureKey) -> Option<&RegionShape> {
        if self.zoom.is_locked() {
            return None;
        }
        self.scene.region(key).filter(|r| r.pointer_events)
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Enter(key) => {
                let Some(selector) = self.interactive(&key).map(|r| r.handlers.enter.clone()) else {
                    return;
                };
                self.select_internal(selector);
            }
            PointerEvent::Leave(key) => {
                if self.interactive(&key).is_some() {
                    self.zoom.on_leave(&key);
                }
            }
            PointerEvent::TouchStart(key) => {
                if self.interactive(&key).is_some() {
                    self.zoom.on_touch_start(&key);
                }
            }
            PointerEvent::Click(key) => {
                let Some(state) = self.interactive(&key).map(|r| r.handlers.drill_state.clone()) else {
                    return;
                };
                let top_level = self.is_top_level();
                if let Some(target) = self.zoom.on_click(&key, &state, top_level) {
                    self.scene.set_pointer_events(false);
                    self.events.push(MapEvent::MapSwitch { state: target });
                }
            }
            PointerEvent::BackgroundClick => {
                if !self.scene.pointer_events() {
                    return;
                }
                if let Some(selector) = self.zoom.on_background_click(self.is_top_level()) {
                    self.select_internal(selector);
                }
            }
        }
    }

    fn select_internal(&mut self, selector: RegionSelector) {
        if self.highlight.select(selector.clone()) {
            let statistic = self.statistic();
            self.highlight.apply(&mut self.scene, statistic);
            self.events.push(MapEvent::RegionHighlighted(selector));
        }
    }

    /// On state maps, the active metric when part of its count is not yet
    /// attributed to any district
    pub fn unassigned_notice(&self) -> Option<Metric> {
        let meta = self.meta.as_ref()?;
        if meta.map_type != MapType::State {
            return None;
        }
        let unknown = self.mapping.value(&meta.name, Some(UNASSIGNED_DISTRICT), self.metric);
        (unknown != 0.0).then_some(self.metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{case_color, ramp, Rgba, DARK};
    use crate::fixtures::{self, CountingSource};
    use crate::stats::RegionStats;
    use proptest::prelude::*;

    const SETTLE: Duration = Duration::from_millis(600);

    fn kerala_data() -> (StatisticMapping, Aggregates) {
        let mut mapping = StatisticMapping::new();
        mapping.insert("Kerala", RegionStats::default().with(Metric::Confirmed, 500.0));
        (mapping, Aggregates::new().with(Metric::Confirmed, 1000.0, 1000.0))
    }

    /// Country map installed, data set, transitions finished
    fn country_map(now: Instant) -> ChoroplethMap {
        let mut map = ChoroplethMap::new(EngineOptions::default(), DVec2::new(400.0, 300.0));
        let meta = fixtures::catalog().country();
        map.request_map(meta.clone());
        assert!(map.install_topology(&meta, Some(fixtures::topology()), now));
        let (mapping, aggregates) = kerala_data();
        map.set_data(mapping, aggregates, now);
        map.tick(now + SETTLE);
        map
    }

    fn key(state: &str) -> FeatureKey {
        FeatureKey::new("India", state, None)
    }

    #[test]
    fn test_kerala_fill_and_tooltip() {
        let now = Instant::now();
        let map = country_map(now);
        let kerala = map.scene().region(&key("Kerala")).unwrap();
        assert_eq!(*kerala.fill.value(), ramp(Metric::Confirmed, 0.5 * 0.85));
        assert_eq!(kerala.tooltip.as_deref(), Some("50% from Kerala"));

        let tamil_nadu = map.scene().region(&key("Tamil Nadu")).unwrap();
        assert_eq!(*tamil_nadu.fill.value(), Rgba::TRANSPARENT);
        assert_eq!(tamil_nadu.tooltip.as_deref(), Some("0% from Tamil Nadu"));
    }

    #[test]
    fn test_country_map_borders() {
        let map = country_map(Instant::now());
        let states = map.scene().borders(BorderLayer::States).unwrap();
        assert_eq!(states.id, "India-states");
        assert_eq!(*states.stroke.value(), case_color(Metric::Confirmed).with_alpha(0x30));
        assert!(map.scene().borders(BorderLayer::Districts).is_none());
    }

    #[test]
    fn test_pointer_blocked_until_fill_settles() {
        let now = Instant::now();
        let mut map = ChoroplethMap::new(EngineOptions::default(), DVec2::new(400.0, 300.0));
        let meta = fixtures::catalog().country();
        map.request_map(meta.clone());
        map.install_topology(&meta, Some(fixtures::topology()), now);

        map.handle_pointer(PointerEvent::Enter(key("Kerala")));
        assert!(map.drain_events().is_empty());

        map.tick(now + SETTLE);
        map.handle_pointer(PointerEvent::Enter(key("Kerala")));
        assert_eq!(
            map.drain_events(),
            vec![MapEvent::RegionHighlighted(RegionSelector::state("Kerala"))]
        );
        assert!(map.scene().region(&key("Kerala")).unwrap().hovered);
    }

    #[test]
    fn test_hover_raises_and_strokes() {
        let mut map = country_map(Instant::now());
        map.handle_pointer(PointerEvent::Enter(key("Kerala")));
        let top = map.scene().regions().last().unwrap();
        assert_eq!(top.key, key("Kerala"));
        assert_eq!(*top.stroke.value(), case_color(Metric::Confirmed));
    }

    #[test]
    fn test_external_highlight_is_silent_and_idempotent() {
        let now = Instant::now();
        let mut map = country_map(now);
        assert!(map.set_region_highlighted(RegionSelector::state("Tamil Nadu")));
        assert!(!map.set_region_highlighted(RegionSelector::state("Tamil Nadu")));
        assert!(map.drain_events().is_empty());

        // Survives leaving and a data refresh
        map.handle_pointer(PointerEvent::Leave(key("Tamil Nadu")));
        let (mapping, aggregates) = kerala_data();
        map.set_data(mapping, aggregates, now + SETTLE);
        assert_eq!(map.scene().hovered().unwrap().key, key("Tamil Nadu"));

        // Echo of our own event does not bounce back
        map.tick(now + SETTLE * 2);
        map.handle_pointer(PointerEvent::Enter(key("Kerala")));
        assert_eq!(map.drain_events().len(), 1);
        assert!(!map.set_region_highlighted(RegionSelector::state("Kerala")));
    }

    #[test]
    fn test_click_drills_down_and_locks() {
        let now = Instant::now();
        let mut map = country_map(now);
        map.handle_pointer(PointerEvent::Click(key("Kerala")));
        assert_eq!(
            map.drain_events(),
            vec![MapEvent::MapSwitch {
                state: "Kerala".to_string()
            }]
        );
        assert!(matches!(map.view_state(), ViewState::Transitioning { .. }));
        assert!(!map.scene().pointer_events());

        map.handle_pointer(PointerEvent::Enter(key("Tamil Nadu")));
        map.handle_pointer(PointerEvent::BackgroundClick);
        assert!(map.drain_events().is_empty());

        let kerala = fixtures::catalog().drill_target("Kerala").unwrap();
        map.request_map(kerala.clone());
        assert!(map.install_topology(&kerala, Some(fixtures::topology()), now + SETTLE));
        assert_eq!(map.view_state(), &ViewState::Ready);
        assert!(!map.is_top_level());
        assert!(map
            .scene()
            .regions()
            .iter()
            .all(|r| r.key.as_str().starts_with("Kerala-")));
        assert!(map.scene().borders(BorderLayer::States).is_none());
        let districts = map.scene().borders(BorderLayer::Districts).unwrap();
        assert!((districts.stroke_width - map.scene().view_box().unwrap().width / 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_state_map_click_does_not_switch() {
        let now = Instant::now();
        let mut map = ChoroplethMap::new(EngineOptions::default(), DVec2::new(300.0, 300.0));
        let kerala = fixtures::catalog().drill_target("Kerala").unwrap();
        map.request_map(kerala.clone());
        map.install_topology(&kerala, Some(fixtures::topology()), now);
        map.tick(now + SETTLE);

        map.handle_pointer(PointerEvent::Click(FeatureKey::new("Kerala", "Kerala", Some("Ernakulam"))));
        map.handle_pointer(PointerEvent::BackgroundClick);
        assert!(map.drain_events().is_empty());
        assert_eq!(map.view_state(), &ViewState::Ready);
    }

    #[test]
    fn test_touch_inspect_does_not_switch() {
        let mut map = country_map(Instant::now());
        map.handle_pointer(PointerEvent::TouchStart(key("Kerala")));
        map.handle_pointer(PointerEvent::Enter(key("Kerala")));
        map.handle_pointer(PointerEvent::Click(key("Kerala")));
        assert_eq!(
            map.drain_events(),
            vec![MapEvent::RegionHighlighted(RegionSelector::state("Kerala"))]
        );
    }

    #[test]
    fn test_background_click_resets_to_total() {
        let mut map = country_map(Instant::now());
        map.handle_pointer(PointerEvent::Enter(key("Kerala")));
        map.handle_pointer(PointerEvent::BackgroundClick);
        let events = map.drain_events();
        assert_eq!(events.last(), Some(&MapEvent::RegionHighlighted(RegionSelector::total())));
        assert!(map.scene().hovered().is_none());
    }

    #[test]
    fn test_failed_load_renders_empty() {
        let now = Instant::now();
        let mut map = country_map(now);
        let kerala = fixtures::catalog().drill_target("Kerala").unwrap();
        map.request_map(kerala.clone());
        assert!(map.install_topology(&kerala, None, now));
        assert!(map.scene().regions().is_empty());
        assert_eq!(map.view_state(), &ViewState::Ready);
    }

    #[test]
    fn test_stale_install_ignored() {
        let now = Instant::now();
        let mut map = country_map(now);
        let catalog = fixtures::catalog();
        let kerala = catalog.drill_target("Kerala").unwrap();
        map.request_map(kerala.clone());
        map.request_map(catalog.country());
        assert!(!map.install_topology(&kerala, Some(fixtures::topology()), now));
        assert_eq!(map.meta().unwrap().name, "India");
    }

    #[test]
    fn test_metric_switch_recolors() {
        let now = Instant::now();
        let mut map = country_map(now);
        let mut mapping = StatisticMapping::new();
        mapping.insert("Kerala", RegionStats::default().with(Metric::Active, 10.0));
        map.set_data(mapping, Aggregates::new().with(Metric::Active, 10.0, 10.0), now);
        map.set_metric(Metric::Active, now);
        map.tick(now + SETTLE);

        let kerala = map.scene().region(&key("Kerala")).unwrap();
        assert_eq!(kerala.metric, Metric::Active);
        assert_eq!(*kerala.fill.value(), ramp(Metric::Active, 0.85));
    }

    #[test]
    fn test_zone_mode_styles_surface() {
        let now = Instant::now();
        let mut map = country_map(now);
        let zone = fixtures::catalog().country().with_statistic(MapStatistic::Zone);
        map.request_map(zone.clone());
        map.install_topology(&zone, Some(fixtures::topology()), now);
        assert!(map.scene().zone_styled());
        assert_eq!(map.scale(), &ColorScale::Categorical);
        let districts = map.scene().borders(BorderLayer::Districts).unwrap();
        assert_eq!(districts.stroke_width, 0.0);
    }

    /// Country map in zone mode, transitions finished
    fn zone_country_map(now: Instant) -> ChoroplethMap {
        let mut map = country_map(now);
        let zone = fixtures::catalog().country().with_statistic(MapStatistic::Zone);
        map.request_map(zone.clone());
        map.install_topology(&zone, Some(fixtures::topology()), now);
        map.tick(now + SETTLE);
        map
    }

    #[test]
    fn test_zone_drill_redraws_district_mesh() {
        let now = Instant::now();
        let mut map = zone_country_map(now);
        let districts = map.scene().borders(BorderLayer::Districts).unwrap();
        assert_eq!(districts.id, "India-districts");
        assert_eq!(districts.stroke_width, 0.0);

        let ernakulam = FeatureKey::new("India", "Kerala", Some("Ernakulam"));
        map.handle_pointer(PointerEvent::Click(ernakulam));
        assert_eq!(
            map.drain_events(),
            vec![MapEvent::MapSwitch {
                state: "Kerala".to_string()
            }]
        );

        let kerala = fixtures::catalog().drill_target("Kerala").unwrap();
        map.request_map(kerala.clone());
        assert!(map.install_topology(&kerala, Some(fixtures::topology()), now + SETTLE));
        let width = map.scene().view_box().unwrap().width;
        let districts = map.scene().borders(BorderLayer::Districts).unwrap();
        assert_eq!(districts.id, "Kerala-districts");
        assert!(districts.stroke_width > 0.0);
        assert!((districts.stroke_width - width / 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_zone_hover_strokes_dark() {
        let mut map = zone_country_map(Instant::now());
        let chennai = FeatureKey::new("India", "Tamil Nadu", Some("Chennai"));
        map.handle_pointer(PointerEvent::Enter(chennai.clone()));

        let hovered = map.scene().hovered().unwrap();
        assert_eq!(hovered.key, chennai);
        assert_eq!(*hovered.stroke.value(), DARK);
        assert_eq!(hovered.stroke.value().to_string(), "#343a40");
    }

    #[test]
    fn test_hover_stroke_animates_on_metric_switch() {
        let now = Instant::now();
        let mut map = country_map(now);
        map.handle_pointer(PointerEvent::Enter(key("Kerala")));
        map.set_metric(Metric::Active, now + SETTLE);

        let kerala = map.scene().region(&key("Kerala")).unwrap();
        assert!(kerala.hovered);
        assert!(kerala.stroke.is_running());
        assert_eq!(*kerala.stroke.value(), case_color(Metric::Confirmed));
        assert_eq!(*kerala.stroke.target(), case_color(Metric::Active));

        map.tick(now + SETTLE * 2);
        let kerala = map.scene().region(&key("Kerala")).unwrap();
        assert_eq!(*kerala.stroke.value(), case_color(Metric::Active));
        let tamil_nadu = map.scene().region(&key("Tamil Nadu")).unwrap();
        assert_eq!(*tamil_nadu.stroke.value(), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_unassigned_notice() {
        let now = Instant::now();
        let mut map = ChoroplethMap::new(EngineOptions::default(), DVec2::new(300.0, 300.0));
        let kerala = fixtures::catalog().drill_target("Kerala").unwrap();
        map.request_map(kerala.clone());
        map.install_topology(&kerala, Some(fixtures::topology()), now);

        let mut stats = RegionStats::default();
        stats.districts.insert(
            UNASSIGNED_DISTRICT.to_string(),
            RegionStats::default().with(Metric::Confirmed, 4.0),
        );
        let mut mapping = StatisticMapping::new();
        mapping.insert("Kerala", stats);
        map.set_data(mapping, Aggregates::new(), now);
        assert_eq!(map.unassigned_notice(), Some(Metric::Confirmed));

        map.set_metric(Metric::Deceased, now);
        assert_eq!(map.unassigned_notice(), None);
    }

    #[test]
    fn test_hit_test_finds_region() {
        let map = country_map(Instant::now());
        let height = map.scene().view_box().unwrap().height;
        let hit = map.hit_test(DVec2::new(300.0, height / 2.0)).unwrap();
        assert_eq!(hit.key, key("Tamil Nadu"));
        assert!(map.hit_test(DVec2::new(-10.0, -10.0)).is_none());
    }

    #[tokio::test]
    async fn test_refreshes_share_one_fetch() {
        let source = Arc::new(CountingSource::default());
        let loader = TopologyLoader::new(source.clone());
        let mut map = ChoroplethMap::new(EngineOptions::default(), DVec2::new(400.0, 300.0));
        let meta = fixtures::catalog().country();

        assert!(map.load_map(&loader, meta.clone()).await);
        assert!(map.load_map(&loader, meta).await);
        assert_eq!(source.count(), 1);
        assert_eq!(map.scene().regions().len(), 2);
    }

    proptest! {
        #[test]
        fn test_at_most_one_highlight(steps in prop::collection::vec((0..4u8, any::<bool>()), 1..24)) {
            let mut map = country_map(Instant::now());
            let names = ["Kerala", "Tamil Nadu", "Goa", "Total"];
            for (i, external) in steps {
                let name = names[i as usize];
                if external {
                    map.set_region_highlighted(RegionSelector::state(name));
                } else {
                    map.handle_pointer(PointerEvent::Enter(key(name)));
                    map.handle_pointer(PointerEvent::Leave(key(name)));
                }
                let hovered = map.scene().regions().iter().filter(|r| r.hovered).count();
                prop_assert!(hovered <= 1);
            }
        }
    }
}
