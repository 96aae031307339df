use crate::catalog::{MapMetadata, MapStatistic, MapView};
use crate::color::{case_color, Rgba, DARK};
use crate::map::Projection;
use crate::scene::{BorderDelta, BorderLayer, BorderPath, Scene, Tween};
use crate::stats::Metric;
use crate::topology::Mesh;

/// Joins the state and district meshes against the scene's border paths
#[derive(Debug, Clone)]
pub struct BorderRenderer {
    /// Stroke width is the ViewBox width divided by this
    width_divisor: f64,
}

impl Default for BorderRenderer {
    fn default() -> Self {
        Self::new(250.0)
    }
}

impl BorderRenderer {
    pub fn new(width_divisor: f64) -> Self {
        Self { width_divisor }
    }

    /// The layer whose regions are painted is the active one; the other is
    /// structural
    pub fn is_active(layer: BorderLayer, map: &MapMetadata) -> bool {
        matches!(
            (layer, map.view),
            (BorderLayer::States, MapView::States) | (BorderLayer::Districts, MapView::Districts)
        )
    }

    /// Whether the layer has a mesh at all for this map
    pub fn is_present(layer: BorderLayer, map: &MapMetadata) -> bool {
        match layer {
            BorderLayer::States => map.is_top_level(),
            BorderLayer::Districts => map.view == MapView::Districts,
        }
    }

    pub fn stroke(layer: BorderLayer, map: &MapMetadata, metric: Metric) -> Rgba {
        if !Self::is_active(layer, map) {
            return DARK.with_alpha(0x99);
        }
        match map.statistic {
            MapStatistic::Zone => Rgba::new(0, 0, 0, 0x60),
            MapStatistic::Total => case_color(metric).with_alpha(0x30),
        }
    }

    /// District lines drawn over the whole country are hidden
    pub fn stroke_width(&self, layer: BorderLayer, map: &MapMetadata, view_box_width: f64) -> f64 {
        let hidden = Self::is_active(layer, map) && map.is_top_level() && map.view == MapView::Districts;
        if hidden {
            0.0
        } else {
            view_box_width / self.width_divisor
        }
    }

    /// Compute the join for one layer. `mesh` is `None` when the layer has
    /// no lines on this map; an existing path is then removed. Width is fixed
    /// when a path enters; only its stroke color follows later changes.
    pub fn reconcile(
        &self,
        scene: &Scene,
        layer: BorderLayer,
        mesh: Option<&Mesh>,
        projection: &Projection,
        map: &MapMetadata,
        metric: Metric,
    ) -> BorderDelta {
        let mut delta = BorderDelta::default();
        let current = scene.borders(layer);
        let stroke = Self::stroke(layer, map, metric);

        match (current, mesh) {
            (Some(path), Some(mesh)) if path.id == mesh.id => {
                delta.updated.push((path.id.clone(), stroke));
            }
            (current, mesh) => {
                if let Some(path) = current {
                    delta.removed.push(path.id.clone());
                }
                if let Some(mesh) = mesh {
                    delta.added.push(BorderPath {
                        id: mesh.id.clone(),
                        lines: projection.lines(mesh),
                        stroke_width: self.stroke_width(layer, map, projection.view_box.width),
                        stroke: Tween::new(stroke),
                    });
                }
            }
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MapType;
    use crate::fixtures;
    use crate::map::ProjectionBuilder;
    use crate::topology::Topology;
    use glam::DVec2;
    use std::time::{Duration, Instant};

    fn meta(map_type: MapType, statistic: MapStatistic) -> MapMetadata {
        MapMetadata {
            name: "India".into(),
            map_type,
            view: MapView::States,
            statistic: MapStatistic::Total,
            geometry_path: "india.json".into(),
            states_layer: "states".into(),
            districts_layer: "districts".into(),
        }
        .with_statistic(statistic)
    }

    #[test]
    fn test_district_mesh_hidden_at_country_zoom() {
        let renderer = BorderRenderer::default();
        let country_zone = meta(MapType::Country, MapStatistic::Zone);
        let state = meta(MapType::State, MapStatistic::Total);

        assert_eq!(renderer.stroke_width(BorderLayer::Districts, &country_zone, 500.0), 0.0);
        assert_eq!(renderer.stroke_width(BorderLayer::States, &country_zone, 500.0), 2.0);
        assert_eq!(renderer.stroke_width(BorderLayer::Districts, &state, 500.0), 2.0);
    }

    #[test]
    fn test_layer_presence() {
        let country = meta(MapType::Country, MapStatistic::Total);
        assert!(BorderRenderer::is_present(BorderLayer::States, &country));
        assert!(!BorderRenderer::is_present(BorderLayer::Districts, &country));

        let state = meta(MapType::State, MapStatistic::Total);
        assert!(!BorderRenderer::is_present(BorderLayer::States, &state));
        assert!(BorderRenderer::is_present(BorderLayer::Districts, &state));
    }

    #[test]
    fn test_stroke_colors() {
        let country = meta(MapType::Country, MapStatistic::Total);
        let zone = meta(MapType::Country, MapStatistic::Zone);
        assert_eq!(
            BorderRenderer::stroke(BorderLayer::States, &country, Metric::Confirmed).to_string(),
            "#ff073a30"
        );
        assert_eq!(
            BorderRenderer::stroke(BorderLayer::Districts, &zone, Metric::Confirmed).to_string(),
            "#00000060"
        );
        assert_eq!(
            BorderRenderer::stroke(BorderLayer::States, &zone, Metric::Confirmed).to_string(),
            "#343a4099"
        );
    }

    #[test]
    fn test_join_keyed_by_map_and_layer() {
        let topology = Topology::decode(fixtures::TOPOLOGY.as_bytes()).unwrap();
        let features = topology.features("India", "states").unwrap();
        let projection = ProjectionBuilder::new().project("India", DVec2::new(500.0, 300.0), &features, true);
        let mesh = topology.mesh("India", "states").unwrap();
        let country = meta(MapType::Country, MapStatistic::Total);
        let renderer = BorderRenderer::default();
        let mut scene = Scene::new();

        let delta = renderer.reconcile(&scene, BorderLayer::States, Some(&mesh), &projection, &country, Metric::Active);
        assert_eq!(delta.added.len(), 1);
        assert!((delta.added[0].stroke_width - 2.0).abs() < 1e-9);
        assert_eq!(delta.added[0].lines.len(), 3);
        scene.apply_borders(BorderLayer::States, delta, Instant::now(), Duration::ZERO);

        let delta = renderer.reconcile(&scene, BorderLayer::States, Some(&mesh), &projection, &country, Metric::Deceased);
        assert!(delta.added.is_empty());
        assert_eq!(
            delta.updated,
            vec![("India-states".to_string(), case_color(Metric::Deceased).with_alpha(0x30))]
        );

        // Same layer name on another map replaces the path
        let other = topology.mesh("Kerala", "states").unwrap();
        let delta = renderer.reconcile(&scene, BorderLayer::States, Some(&other), &projection, &country, Metric::Deceased);
        assert_eq!(delta.removed, vec!["India-states".to_string()]);
        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.added[0].id, "Kerala-states");
        assert!(delta.updated.is_empty());

        let delta = renderer.reconcile(&scene, BorderLayer::States, None, &projection, &country, Metric::Deceased);
        assert_eq!(delta.removed, vec!["India-states".to_string()]);
        scene.apply_borders(BorderLayer::States, delta, Instant::now(), Duration::ZERO);
        assert!(scene.borders(BorderLayer::States).is_none());
    }
}
