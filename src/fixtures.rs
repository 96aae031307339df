//! Shared test data: a two-state topology and a counting geometry source.

use crate::catalog::MapCatalog;
use crate::error::LoadError;
use crate::topology::{BoxFuture, Topology, TopologySource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Kerala occupies the unit square at (75..76, 8..9), Tamil Nadu the square
/// east of it; arc 0 is their shared edge.
pub const TOPOLOGY: &str = r#"{
    "type": "Topology",
    "transform": { "scale": [0.01, 0.01], "translate": [75, 8] },
    "arcs": [
        [[100, 0], [0, 100]],
        [[100, 100], [-100, 0], [0, -100], [100, 0]],
        [[100, 0], [100, 0], [0, 100], [-100, 0]]
    ],
    "objects": {
        "states": {
            "type": "GeometryCollection",
            "geometries": [
                { "type": "Polygon", "arcs": [[0, 1]], "properties": { "st_nm": "Kerala" } },
                { "type": "Polygon", "arcs": [[2, -1]], "properties": { "st_nm": "Tamil Nadu" } }
            ]
        },
        "districts": {
            "type": "GeometryCollection",
            "geometries": [
                {
                    "type": "Polygon",
                    "arcs": [[0, 1]],
                    "properties": { "st_nm": "Kerala", "district": "Ernakulam" }
                },
                {
                    "type": "Polygon",
                    "arcs": [[2, -1]],
                    "properties": { "st_nm": "Tamil Nadu", "district": "Chennai" }
                }
            ]
        }
    }
}"#;

pub const GEOJSON: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": { "st_nm": "Goa", "district": "North Goa" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[73.7, 15.5], [74.2, 15.5], [74.2, 15.8], [73.7, 15.8], [73.7, 15.5]]]
            }
        }
    ]
}"#;

/// Serves [`TOPOLOGY`] for every path except `missing.json`, counting calls
#[derive(Default)]
pub struct CountingSource {
    pub fetches: AtomicUsize,
    pub delay: Option<Duration>,
}

impl CountingSource {
    pub fn slow(delay: Duration) -> Self {
        Self {
            fetches: AtomicUsize::new(0),
            delay: Some(delay),
        }
    }

    pub fn count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl TopologySource for CountingSource {
    fn fetch(&self, path: &str) -> BoxFuture<'_, Result<Vec<u8>, LoadError>> {
        let path = path.to_string();
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if path == "missing.json" {
                return Err(LoadError::Io {
                    path,
                    message: "not found".to_string(),
                });
            }
            Ok(TOPOLOGY.as_bytes().to_vec())
        })
    }
}

pub const CATALOG: &str = r#"{
    "country": "India",
    "maps": {
        "India": {
            "map_type": "country",
            "geometry_path": "india.json",
            "states_layer": "states",
            "districts_layer": "districts"
        },
        "Kerala": {
            "map_type": "state",
            "geometry_path": "kerala.json",
            "states_layer": "states",
            "districts_layer": "districts"
        }
    }
}"#;

pub fn catalog() -> MapCatalog {
    MapCatalog::from_json(CATALOG).unwrap()
}

pub fn topology() -> Arc<Topology> {
    Arc::new(Topology::decode(TOPOLOGY.as_bytes()).unwrap())
}
