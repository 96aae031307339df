//! Boundary geometry: TopoJSON / GeoJSON decoding into keyed features and
//! shared-border meshes.

mod loader;
mod source;

pub use loader::TopologyLoader;
pub use source::{BoxFuture, FileSource, HttpSource, TopologySource};

use crate::error::LoadError;
use geojson::GeoJson;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Polygon as exterior ring followed by holes
pub type Polygon = Vec<LineString>;

/// Stable identity of a region shape: map name + state [+ district]
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureKey(String);

impl FeatureKey {
    pub fn new(map: &str, state: &str, district: Option<&str>) -> Self {
        match district {
            Some(district) => Self(format!("{map}-{state}-{district}")),
            None => Self(format!("{map}-{state}")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Descriptive properties every boundary feature carries
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RegionProperties {
    #[serde(rename = "st_nm", default)]
    pub state: String,
    #[serde(default)]
    pub district: Option<String>,
}

impl RegionProperties {
    /// Name shown to users: the district if present, else the state
    pub fn display_name(&self) -> &str {
        self.district.as_deref().unwrap_or(&self.state)
    }
}

/// One renderable region
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub key: FeatureKey,
    pub properties: RegionProperties,
    pub polygons: Vec<Polygon>,
}

/// Shared border lines of one layer, each arc once
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    /// `{map}-{layer}`, used as the border path identity
    pub id: String,
    pub lines: Vec<LineString>,
}

#[derive(Clone, Debug)]
struct LayerFeature {
    properties: RegionProperties,
    polygons: Vec<Polygon>,
}

#[derive(Clone, Debug, Default)]
struct Layer {
    features: Vec<LayerFeature>,
    mesh: Vec<LineString>,
}

/// Decoded boundary file: named layers of polygon features plus meshes
#[derive(Clone, Debug, Default)]
pub struct Topology {
    layers: HashMap<String, Layer>,
    /// Single unnamed layer of a GeoJSON document
    anonymous: Option<Layer>,
}

impl Topology {
    /// Decode a TopoJSON `Topology` or GeoJSON `FeatureCollection`
    pub fn decode(bytes: &[u8]) -> Result<Self, LoadError> {
        let mut scratch = bytes.to_vec();
        let raw: RawTopology = simd_json::serde::from_slice(&mut scratch)
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        match raw.kind.as_str() {
            "Topology" => Ok(raw.into_topology()),
            "FeatureCollection" => {
                let text = std::str::from_utf8(bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
                let geojson = GeoJson::from_str(text).map_err(|e| LoadError::Decode(e.to_string()))?;
                Ok(Self::from_geojson(&geojson))
            }
            other => Err(LoadError::UnknownFormat(other.to_string())),
        }
    }

    fn layer(&self, name: &str) -> Result<&Layer, LoadError> {
        self.layers
            .get(name)
            .or(self.anonymous.as_ref())
            .ok_or_else(|| LoadError::MissingLayer(name.to_string()))
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.layer(name).is_ok()
    }

    /// Features of a layer keyed for `map_name`
    pub fn features(&self, map_name: &str, layer: &str) -> Result<Vec<Feature>, LoadError> {
        let layer = self.layer(layer)?;
        Ok(layer
            .features
            .iter()
            .map(|f| Feature {
                key: FeatureKey::new(map_name, &f.properties.state, f.properties.district.as_deref()),
                properties: f.properties.clone(),
                polygons: f.polygons.clone(),
            })
            .collect())
    }

    /// Border lines of a layer. The id is scoped to the map, so the same
    /// layer name on another map never joins as the same path.
    pub fn mesh(&self, map_name: &str, layer_name: &str) -> Result<Mesh, LoadError> {
        let layer = self.layer(layer_name)?;
        Ok(Mesh {
            id: format!("{map_name}-{layer_name}"),
            lines: layer.mesh.clone(),
        })
    }

    fn from_geojson(geojson: &GeoJson) -> Self {
        let mut layer = Layer::default();
        let features: Vec<&geojson::Feature> = match geojson {
            GeoJson::FeatureCollection(fc) => fc.features.iter().collect(),
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(_) => Vec::new(),
        };

        for feature in features {
            let Some(geometry) = feature.geometry.as_ref() else {
                continue;
            };
            let polygons = geojson_polygons(&geometry.value);
            if polygons.is_empty() {
                continue;
            }
            let props = feature.properties.as_ref();
            let text = |key: &str| {
                props
                    .and_then(|p| p.get(key))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            };
            for polygon in &polygons {
                layer.mesh.extend(polygon.iter().cloned());
            }
            layer.features.push(LayerFeature {
                properties: RegionProperties {
                    state: text("st_nm").unwrap_or_default(),
                    district: text("district"),
                },
                polygons,
            });
        }

        Self {
            layers: HashMap::new(),
            anonymous: Some(layer),
        }
    }
}

fn geojson_polygons(value: &geojson::Value) -> Vec<Polygon> {
    let ring = |coords: &Vec<Vec<f64>>| -> LineString { coords.iter().map(|c| (c[0], c[1])).collect() };
    match value {
        geojson::Value::Polygon(rings) => vec![rings.iter().map(ring).collect()],
        geojson::Value::MultiPolygon(polygons) => polygons
            .iter()
            .map(|rings| rings.iter().map(ring).collect())
            .collect(),
        geojson::Value::GeometryCollection(geometries) => geometries
            .iter()
            .flat_map(|g| geojson_polygons(&g.value))
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct RawTopology {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    transform: Option<Transform>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    objects: HashMap<String, RawGeometry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        properties: RegionProperties,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        properties: RegionProperties,
    },
    GeometryCollection {
        geometries: Vec<RawGeometry>,
    },
    #[serde(other)]
    Unsupported,
}

impl RawTopology {
    fn into_topology(self) -> Topology {
        let arcs = decode_arcs(&self.arcs, self.transform.as_ref());
        let layers = self
            .objects
            .iter()
            .map(|(name, object)| {
                let mut layer = Layer::default();
                let mut used = BTreeSet::new();
                collect_features(object, &arcs, &mut layer.features, &mut used);
                layer.mesh = used.into_iter().filter_map(|i| arcs.get(i).cloned()).collect();
                (name.clone(), layer)
            })
            .collect();

        Topology {
            layers,
            anonymous: None,
        }
    }
}

/// Absolute coordinates of every arc, undoing quantization and delta encoding
fn decode_arcs(raw: &[Vec<Vec<f64>>], transform: Option<&Transform>) -> Vec<LineString> {
    raw.iter()
        .map(|arc| match transform {
            Some(t) => {
                let (mut x, mut y) = (0.0, 0.0);
                arc.iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| {
                        x += p[0];
                        y += p[1];
                        (x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1])
                    })
                    .collect()
            }
            None => arc.iter().filter(|p| p.len() >= 2).map(|p| (p[0], p[1])).collect(),
        })
        .collect()
}

/// Arc index -> position in the arc table; negative indices mean reversed
fn arc_slot(index: i64) -> (usize, bool) {
    if index < 0 {
        ((!index) as usize, true)
    } else {
        (index as usize, false)
    }
}

fn ring(indices: &[i64], arcs: &[LineString], used: &mut BTreeSet<usize>) -> LineString {
    let mut points: LineString = Vec::new();
    for &index in indices {
        let (slot, reversed) = arc_slot(index);
        let Some(arc) = arcs.get(slot) else {
            continue;
        };
        used.insert(slot);
        // Consecutive arcs share their junction point
        points.pop();
        if reversed {
            points.extend(arc.iter().rev().copied());
        } else {
            points.extend(arc.iter().copied());
        }
    }
    if points.len() < 4 {
        if let Some(&first) = points.first() {
            points.push(first);
        }
    }
    points
}

fn collect_features(
    object: &RawGeometry,
    arcs: &[LineString],
    out: &mut Vec<LayerFeature>,
    used: &mut BTreeSet<usize>,
) {
    match object {
        RawGeometry::Polygon { arcs: rings, properties } => out.push(LayerFeature {
            properties: properties.clone(),
            polygons: vec![rings.iter().map(|r| ring(r, arcs, used)).collect()],
        }),
        RawGeometry::MultiPolygon { arcs: polygons, properties } => out.push(LayerFeature {
            properties: properties.clone(),
            polygons: polygons
                .iter()
                .map(|rings| rings.iter().map(|r| ring(r, arcs, used)).collect())
                .collect(),
        }),
        RawGeometry::GeometryCollection { geometries } => {
            for geometry in geometries {
                collect_features(geometry, arcs, out, used);
            }
        }
        RawGeometry::Unsupported => {}
    }
}
