//! Interactive choropleth engine.
//!
//! Fuses boundary geometry (TopoJSON or GeoJSON) with live per-region
//! statistics, derives color encodings, and keeps a retained [`scene::Scene`]
//! of region shapes and border meshes consistent across data refreshes,
//! metric switches and drill-down from country to state level.
//!
//! The host owns the frame loop: it feeds inputs into [`ChoroplethMap`],
//! calls [`ChoroplethMap::tick`] every frame, paints the scene and drains
//! [`MapEvent`]s back out.

pub mod catalog;
pub mod color;
pub mod engine;
pub mod error;
pub mod interact;
pub mod map;
pub mod render;
pub mod scene;
pub mod stats;
pub mod topology;

#[cfg(test)]
pub(crate) mod fixtures;

pub use catalog::{MapCatalog, MapMetadata, MapStatistic, MapType, MapView};
pub use color::{ColorScale, ColorScaleEngine, Rgba};
pub use engine::{ChoroplethMap, EngineOptions, MapEvent, PointerEvent};
pub use error::{CatalogError, LoadError, StatsError};
pub use interact::{RegionSelector, ViewState};
pub use stats::{Aggregate, Aggregates, Metric, RegionStats, StatisticMapping, Zone};
pub use topology::{Feature, FeatureKey, Topology, TopologyLoader, TopologySource};
