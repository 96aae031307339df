//! Map identities and the registry that resolves them.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Granularity of the map's own boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapType {
    /// Whole country, drillable into states
    Country,
    /// A single state; leaf of the drill-down tree
    State,
}

/// Which layer of the geometry is painted as regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapView {
    States,
    Districts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapStatistic {
    /// Numeric totals on a sequential scale
    Total,
    /// Categorical zone classification
    Zone,
}

/// Identity of the map being shown. Replaced wholesale on drill in/out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapMetadata {
    pub name: String,
    pub map_type: MapType,
    pub view: MapView,
    pub statistic: MapStatistic,
    pub geometry_path: String,
    pub states_layer: String,
    pub districts_layer: String,
}

impl MapMetadata {
    pub fn is_top_level(&self) -> bool {
        self.map_type == MapType::Country
    }

    /// Name of the layer painted as region shapes
    pub fn region_layer(&self) -> &str {
        match self.view {
            MapView::States => &self.states_layer,
            MapView::Districts => &self.districts_layer,
        }
    }

    /// Same map shown with another statistic. Zone data only exists per
    /// district, so zone mode always uses the districts view.
    pub fn with_statistic(mut self, statistic: MapStatistic) -> Self {
        self.statistic = statistic;
        self.view = match (self.map_type, statistic) {
            (MapType::Country, MapStatistic::Total) => MapView::States,
            _ => MapView::Districts,
        };
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogEntry {
    map_type: MapType,
    geometry_path: String,
    states_layer: String,
    districts_layer: String,
}

impl CatalogEntry {
    fn metadata(&self, name: &str, statistic: MapStatistic) -> MapMetadata {
        MapMetadata {
            name: name.to_string(),
            map_type: self.map_type,
            view: MapView::States,
            statistic,
            geometry_path: self.geometry_path.clone(),
            states_layer: self.states_layer.clone(),
            districts_layer: self.districts_layer.clone(),
        }
        .with_statistic(statistic)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    country: String,
    maps: HashMap<String, CatalogEntry>,
}

/// Registry of every map the host can switch to, keyed by map name.
/// State maps are keyed by the state name used in geometry properties.
#[derive(Debug, Clone)]
pub struct MapCatalog {
    country: MapMetadata,
    maps: HashMap<String, CatalogEntry>,
}

impl MapCatalog {
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(text)?;
        let country = match doc.maps.get(&doc.country) {
            Some(entry) if entry.map_type == MapType::Country => {
                entry.metadata(&doc.country, MapStatistic::Total)
            }
            _ => return Err(CatalogError::MissingCountry(doc.country)),
        };
        Ok(Self {
            country,
            maps: doc.maps,
        })
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Top-level map in its default view
    pub fn country(&self) -> MapMetadata {
        self.country.clone()
    }

    pub fn metadata(&self, name: &str, statistic: MapStatistic) -> Option<MapMetadata> {
        self.maps
            .get(name)
            .map(|entry| entry.metadata(name, statistic))
    }

    /// Metadata for drilling from the country into `state`
    pub fn drill_target(&self, state: &str) -> Option<MapMetadata> {
        self.metadata(state, MapStatistic::Total)
            .filter(|meta| meta.map_type == MapType::State)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }
}
