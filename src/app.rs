use crate::config::{Config, GeometrySource};
use anyhow::{Context, Result};
use glam::DVec2;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tui_choropleth::map::ViewTransform;
use tui_choropleth::topology::{FileSource, HttpSource};
use tui_choropleth::{
    Aggregates, ChoroplethMap, FeatureKey, MapCatalog, MapEvent, MapMetadata, MapStatistic,
    MapType, PointerEvent, StatisticMapping, Topology, TopologyLoader, TopologySource,
};

/// Results of background work, delivered to the frame loop
pub enum AppMessage {
    Loaded {
        meta: MapMetadata,
        topology: Option<Arc<Topology>>,
    },
    Stats(StatisticMapping),
    StatsFailed(String),
}

/// Application state
pub struct App {
    pub map: ChoroplethMap,
    catalog: MapCatalog,
    loader: TopologyLoader,
    tx: mpsc::UnboundedSender<AppMessage>,
    rx: mpsc::UnboundedReceiver<AppMessage>,
    /// Terminal size in characters
    pub width: usize,
    pub height: usize,
    /// Shape currently under the mouse
    hover: Option<FeatureKey>,
    /// Last background failure, shown in the status bar
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: &Config, width: usize, height: usize) -> Result<Self> {
        let catalog = MapCatalog::load(&config.catalog)
            .with_context(|| format!("failed to load catalog {}", config.catalog.display()))?;
        let source: Arc<dyn TopologySource> = match &config.geometry {
            GeometrySource::Dir(dir) => Arc::new(FileSource::new(dir.clone())),
            GeometrySource::Url(url) => Arc::new(HttpSource::new(url.clone())),
        };
        let (tx, rx) = mpsc::unbounded_channel();

        let mut app = Self {
            map: ChoroplethMap::new(config.engine.clone(), DVec2::ZERO),
            catalog,
            loader: TopologyLoader::new(source),
            tx,
            rx,
            width,
            height,
            hover: None,
            status: None,
            should_quit: false,
        };
        let pixels = app.map_pixels();
        app.map.resize(pixels);
        app.map.set_metric(config.metric, Instant::now());

        let first = config
            .map
            .as_deref()
            .and_then(|name| app.catalog.metadata(name, MapStatistic::Total))
            .unwrap_or_else(|| app.catalog.country());
        app.open(first);
        Ok(app)
    }

    /// Braille pixel size of the map area inside the border and above the
    /// status bar
    pub fn map_pixels(&self) -> DVec2 {
        DVec2::new(
            self.width.saturating_sub(2) as f64 * 2.0,
            self.height.saturating_sub(3) as f64 * 4.0,
        )
    }

    /// Scene to map-area pixel transform for the map being shown
    pub fn view_transform(&self) -> Option<ViewTransform> {
        let pixels = self.map_pixels();
        self.map
            .scene()
            .view_box()
            .map(|vb| vb.fit_into(pixels.x, pixels.y))
    }

    /// Request `meta` and load its geometry in the background
    pub fn open(&mut self, meta: MapMetadata) {
        self.hover = None;
        self.map.request_map(meta.clone());
        let loader = self.loader.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let topology = loader.load(&meta.geometry_path).await;
            let _ = tx.send(AppMessage::Loaded { meta, topology });
        });
    }

    /// Re-read the statistics file every `refresh`, starting now
    pub fn spawn_stats_poller(&self, path: PathBuf, refresh: Duration) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(refresh);
            loop {
                interval.tick().await;
                let message = match tokio::fs::read_to_string(&path).await {
                    Ok(text) => match StatisticMapping::from_json(&text) {
                        Ok(mapping) => AppMessage::Stats(mapping),
                        Err(e) => AppMessage::StatsFailed(e.to_string()),
                    },
                    Err(e) => AppMessage::StatsFailed(format!("{}: {e}", path.display())),
                };
                if tx.send(message).is_err() {
                    break;
                }
            }
        });
    }

    /// Drain background results, advance transitions and answer map events
    pub fn update(&mut self, now: Instant) {
        while let Ok(message) = self.rx.try_recv() {
            match message {
                AppMessage::Loaded { meta, topology } => {
                    if topology.is_none() {
                        self.status = Some(format!("could not load {}", meta.name));
                    }
                    self.map.install_topology(&meta, topology, now);
                }
                AppMessage::Stats(mapping) => {
                    debug!(states = mapping.states().count(), "statistics refreshed");
                    let aggregates = Aggregates::from_mapping(&mapping);
                    self.map.set_data(mapping, aggregates, now);
                    self.status = None;
                }
                AppMessage::StatsFailed(error) => {
                    warn!(%error, "statistics refresh failed");
                    self.status = Some(error);
                }
            }
        }

        self.map.tick(now);

        for event in self.map.drain_events() {
            match event {
                MapEvent::RegionHighlighted(selector) => {
                    debug!(%selector, "region highlighted");
                    // Echo back as the selection owner; the map ignores repeats
                    self.map.set_region_highlighted(selector);
                }
                MapEvent::MapSwitch { state } => match self.catalog.drill_target(&state) {
                    Some(meta) => {
                        info!(%state, "drilling down");
                        self.open(meta);
                    }
                    None => {
                        warn!(%state, "no map for state");
                        self.status = Some(format!("no map for {state}"));
                        self.map.cancel_switch();
                    }
                },
            }
        }
    }

    /// Map a terminal cell to scene coordinates
    fn scene_point(&self, col: u16, row: u16) -> Option<DVec2> {
        let (col, row) = (col as usize, row as usize);
        if col == 0 || row == 0 || col > self.width.saturating_sub(2) || row > self.height.saturating_sub(3) {
            return None;
        }
        // Center of the cell, in braille pixels of the map area
        let pixel = DVec2::new((col - 1) as f64 * 2.0 + 1.0, (row - 1) as f64 * 4.0 + 2.0);
        self.view_transform().map(|t| t.to_view(pixel))
    }

    fn key_at(&self, col: u16, row: u16) -> Option<FeatureKey> {
        let point = self.scene_point(col, row)?;
        self.map.hit_test(point).map(|shape| shape.key.clone())
    }

    pub fn mouse_moved(&mut self, col: u16, row: u16) {
        let key = self.key_at(col, row);
        if key == self.hover {
            return;
        }
        if let Some(old) = self.hover.take() {
            self.map.handle_pointer(PointerEvent::Leave(old));
        }
        if let Some(new) = key.clone() {
            self.map.handle_pointer(PointerEvent::Enter(new));
        }
        self.hover = key;
    }

    pub fn clicked(&mut self, col: u16, row: u16) {
        match self.key_at(col, row) {
            Some(key) => self.map.handle_pointer(PointerEvent::Click(key)),
            None => self.map.handle_pointer(PointerEvent::BackgroundClick),
        }
    }

    pub fn cycle_metric(&mut self) {
        let metric = self.map.metric().next();
        self.map.set_metric(metric, Instant::now());
    }

    /// Switch the country map between totals and zones
    pub fn toggle_zone(&mut self) {
        let Some(meta) = self.map.meta().filter(|m| m.map_type == MapType::Country).cloned() else {
            return;
        };
        let statistic = match meta.statistic {
            MapStatistic::Total => MapStatistic::Zone,
            MapStatistic::Zone => MapStatistic::Total,
        };
        self.open(meta.with_statistic(statistic));
    }

    pub fn back_to_country(&mut self) {
        if self.map.is_top_level() {
            return;
        }
        let country = self.catalog.country();
        self.open(country);
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let pixels = self.map_pixels();
        self.map.resize(pixels);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
