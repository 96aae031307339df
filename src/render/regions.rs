use crate::catalog::MapStatistic;
use crate::color::{ColorScale, RegionValue, Rgba};
use crate::interact::{HighlightController, RegionSelector};
use crate::map::Projection;
use crate::scene::{RegionDelta, RegionHandlers, RegionShape, RegionUpdate, Scene, Tween};
use crate::stats::{Aggregates, Metric, StatisticMapping};
use crate::topology::{Feature, FeatureKey, RegionProperties};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Everything a region join reads besides geometry
#[derive(Debug, Clone, Copy)]
pub struct RegionInputs<'a> {
    pub statistic: MapStatistic,
    pub mapping: &'a StatisticMapping,
    pub aggregates: &'a Aggregates,
    pub metric: Metric,
    pub scale: &'a ColorScale,
}

impl RegionInputs<'_> {
    fn value(&self, properties: &RegionProperties) -> RegionValue {
        let district = properties.district.as_deref();
        match self.statistic {
            MapStatistic::Zone => self
                .mapping
                .zone(&properties.state, district)
                .map_or(RegionValue::Missing, RegionValue::Zone),
            MapStatistic::Total => {
                RegionValue::Count(self.mapping.value(&properties.state, district, self.metric))
            }
        }
    }
}

/// Joins features against the scene's region shapes by key
#[derive(Debug, Clone)]
pub struct RegionRenderer {
    percent_floor: f64,
}

impl Default for RegionRenderer {
    fn default() -> Self {
        Self::new(0.001)
    }
}

impl RegionRenderer {
    pub fn new(percent_floor: f64) -> Self {
        Self { percent_floor }
    }

    /// Fill for a region; no data is fully transparent whatever the scale
    pub fn fill(scale: &ColorScale, value: RegionValue) -> Rgba {
        if value.is_empty() {
            Rgba::TRANSPARENT
        } else {
            scale.color(value)
        }
    }

    /// `"{pct}% from {Name}"` with the share rounded to two decimals
    pub fn tooltip(&self, value: f64, total: f64, name: &str) -> String {
        let pct = 100.0 * value / total.max(self.percent_floor);
        let pct = (pct * 100.0).round() / 100.0;
        format!("{pct}% from {}", title_case(name))
    }

    /// Compute the join. Only entering features are projected; existing
    /// shapes keep the path they were created with.
    pub fn reconcile(
        &self,
        scene: &Scene,
        features: &[Feature],
        projection: &Projection,
        inputs: &RegionInputs<'_>,
    ) -> RegionDelta {
        let mut delta = RegionDelta::default();
        let mut entering: Vec<&Feature> = Vec::new();
        let total = inputs.aggregates.get(inputs.metric).total;

        let targets = |feature: &Feature| {
            let value = inputs.value(&feature.properties);
            let tooltip = match (inputs.statistic, value) {
                (MapStatistic::Total, RegionValue::Count(n)) => {
                    Some(self.tooltip(n, total, feature.properties.display_name()))
                }
                _ => None,
            };
            (Self::fill(inputs.scale, value), tooltip)
        };

        for feature in features {
            match scene.region(&feature.key) {
                Some(existing) => {
                    let (fill, tooltip) = targets(feature);
                    let stroke = if existing.hovered {
                        HighlightController::stroke(inputs.statistic, inputs.metric)
                    } else {
                        Rgba::TRANSPARENT
                    };
                    delta.updated.push((
                        feature.key.clone(),
                        RegionUpdate {
                            fill,
                            stroke,
                            metric: inputs.metric,
                            tooltip,
                        },
                    ));
                }
                None => entering.push(feature),
            }
        }

        let paths = projection.paths(entering.par_iter().copied());
        for (feature, path) in entering.into_iter().zip(paths) {
            let (fill, tooltip) = targets(feature);
            delta.added.push(RegionShape {
                key: feature.key.clone(),
                properties: feature.properties.clone(),
                path,
                fill: Tween::new(fill),
                stroke: Tween::new(Rgba::TRANSPARENT),
                metric: inputs.metric,
                tooltip,
                hovered: false,
                pointer_events: false,
                handlers: RegionHandlers {
                    enter: RegionSelector::of(&feature.properties),
                    drill_state: feature.properties.state.clone(),
                },
            });
        }

        let live: HashSet<&FeatureKey> = features.iter().map(|f| &f.key).collect();
        delta.removed = scene
            .regions()
            .iter()
            .filter(|r| !live.contains(&r.key))
            .map(|r| r.key.clone())
            .collect();

        debug!(
            added = delta.added.len(),
            updated = delta.updated.len(),
            removed = delta.removed.len(),
            "regions reconciled"
        );
        delta
    }
}

/// Capitalize the first letter of every word
fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ramp, ColorScaleEngine};
    use crate::fixtures;
    use crate::map::ProjectionBuilder;
    use crate::stats::{RegionStats, Zone};
    use crate::topology::Topology;
    use glam::DVec2;
    use std::time::{Duration, Instant};

    fn features(layer: &str) -> Vec<Feature> {
        Topology::decode(fixtures::TOPOLOGY.as_bytes())
            .unwrap()
            .features("India", layer)
            .unwrap()
    }

    fn projection(features: &[Feature]) -> Projection {
        ProjectionBuilder::new().project("India", DVec2::new(400.0, 300.0), features, true)
    }

    #[test]
    fn test_tooltip_format() {
        let renderer = RegionRenderer::default();
        assert_eq!(renderer.tooltip(500.0, 1000.0, "Kerala"), "50% from Kerala");
        assert_eq!(renderer.tooltip(0.0, 0.0, "goa"), "0% from Goa");
        assert_eq!(renderer.tooltip(1.0, 3.0, "tamil nadu"), "33.33% from Tamil Nadu");
    }

    #[test]
    fn test_title_case_keeps_rest() {
        assert_eq!(title_case("north  goa"), "North  Goa");
        assert_eq!(title_case("andaman and Nicobar"), "Andaman And Nicobar");
    }

    #[test]
    fn test_join_adds_updates_removes() {
        let all = features("states");
        let projection = projection(&all);
        let mut mapping = StatisticMapping::new();
        mapping.insert("Kerala", RegionStats::default().with(Metric::Confirmed, 500.0));
        let aggregates = Aggregates::new().with(Metric::Confirmed, 1000.0, 1000.0);
        let scale = ColorScaleEngine::default().build(MapStatistic::Total, Metric::Confirmed, &aggregates);
        let inputs = RegionInputs {
            statistic: MapStatistic::Total,
            mapping: &mapping,
            aggregates: &aggregates,
            metric: Metric::Confirmed,
            scale: &scale,
        };
        let renderer = RegionRenderer::default();
        let mut scene = Scene::new();

        let delta = renderer.reconcile(&scene, &all, &projection, &inputs);
        assert_eq!(delta.added.len(), 2);
        assert!(delta.updated.is_empty() && delta.removed.is_empty());
        let kerala = &delta.added[0];
        assert_eq!(*kerala.fill.target(), ramp(Metric::Confirmed, 0.5 * 0.85));
        assert_eq!(kerala.tooltip.as_deref(), Some("50% from Kerala"));
        assert_eq!(*delta.added[1].fill.target(), Rgba::TRANSPARENT);
        assert_eq!(kerala.handlers.drill_state, "Kerala");

        scene.apply_regions(delta, Instant::now(), Duration::from_millis(500));

        // Tamil Nadu disappears; Kerala updates in place
        let delta = renderer.reconcile(&scene, &all[..1], &projection, &inputs);
        assert!(delta.added.is_empty());
        assert_eq!(delta.updated.len(), 1);
        assert_eq!(delta.removed, vec![all[1].key.clone()]);
    }

    #[test]
    fn test_zone_values_per_district() {
        let districts = features("districts");
        let projection = projection(&districts);
        let mut kerala = RegionStats::default();
        kerala.districts.insert(
            "Ernakulam".to_string(),
            RegionStats {
                zone: Some(Zone::Orange),
                ..RegionStats::default()
            },
        );
        let mut mapping = StatisticMapping::new();
        mapping.insert("Kerala", kerala);
        let aggregates = Aggregates::new();
        let scale = ColorScaleEngine::default().build(MapStatistic::Zone, Metric::Confirmed, &aggregates);
        let inputs = RegionInputs {
            statistic: MapStatistic::Zone,
            mapping: &mapping,
            aggregates: &aggregates,
            metric: Metric::Confirmed,
            scale: &scale,
        };

        let delta = RegionRenderer::default().reconcile(&Scene::new(), &districts, &projection, &inputs);
        assert_eq!(*delta.added[0].fill.target(), Rgba::from_hex("#fee08b").unwrap());
        assert_eq!(delta.added[0].tooltip, None);
        assert_eq!(*delta.added[1].fill.target(), Rgba::TRANSPARENT);
    }
}
