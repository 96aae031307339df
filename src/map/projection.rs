use crate::topology::{Feature, LineString, Mesh};
use geo::{BoundingRect, Contains, Coord, MultiPolygon, Point, Polygon, Rect};
use glam::DVec2;
use rayon::prelude::*;
use std::f64::consts::PI;
use std::fmt::Write;

/// Latitude limit of the Mercator square
const MAX_LAT: f64 = 85.051_128_78;

/// Spherical Mercator with scale and translate in output units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mercator {
    pub scale: f64,
    pub translate: DVec2,
}

impl Default for Mercator {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: DVec2::ZERO,
        }
    }
}

/// Planar bounds of raw (unscaled) Mercator coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min: DVec2,
    max: DVec2,
}

impl Mercator {
    /// Unit-scale Mercator with y growing southwards
    #[inline(always)]
    fn raw(lon: f64, lat: f64) -> DVec2 {
        let lambda = lon * PI / 180.0;
        let phi = lat.clamp(-MAX_LAT, MAX_LAT) * PI / 180.0;
        DVec2::new(lambda, -(PI / 4.0 + phi / 2.0).tan().ln())
    }

    /// Project a geographic coordinate (lon, lat) to output coordinates
    #[inline(always)]
    pub fn project(&self, lon: f64, lat: f64) -> DVec2 {
        Self::raw(lon, lat) * self.scale + self.translate
    }

    /// Inverse of [`Mercator::project`], returning (lon, lat)
    pub fn invert(&self, point: DVec2) -> (f64, f64) {
        let raw = (point - self.translate) / self.scale;
        let lon = raw.x * 180.0 / PI;
        let lat = (2.0 * (-raw.y).exp().atan() - PI / 2.0) * 180.0 / PI;
        (lon, lat)
    }

    fn bounds(features: &[Feature]) -> Option<Bounds> {
        let mut points = features
            .iter()
            .flat_map(|f| f.polygons.iter())
            .flat_map(|p| p.iter())
            .flat_map(|ring| ring.iter())
            .map(|&(lon, lat)| Self::raw(lon, lat));
        let first = points.next()?;
        Some(points.fold(Bounds { min: first, max: first }, |b, p| Bounds {
            min: b.min.min(p),
            max: b.max.max(p),
        }))
    }

    /// Fit the features into a `width` x `height` box, centered
    pub fn fit_size(width: f64, height: f64, features: &[Feature]) -> Self {
        let Some(b) = Self::bounds(features) else {
            return Self::default();
        };
        let extent = b.max - b.min;
        let scale = match (extent.x > 0.0, extent.y > 0.0) {
            (true, true) => (width / extent.x).min(height / extent.y),
            (true, false) => width / extent.x,
            (false, true) => height / extent.y,
            (false, false) => 1.0,
        };
        let size = DVec2::new(width, height);
        Self {
            scale,
            translate: (size - (b.min + b.max) * scale) / 2.0,
        }
    }

    /// Fit the features to `width`, letting the height follow the aspect
    pub fn fit_width(width: f64, features: &[Feature]) -> Self {
        let Some(b) = Self::bounds(features) else {
            return Self::default();
        };
        let extent = b.max - b.min;
        let scale = if extent.x > 0.0 { width / extent.x } else { 1.0 };
        Self {
            scale,
            translate: -b.min * scale,
        }
    }
}

/// Planar canvas box `(0, 0, width, height)` the map is drawn in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Uniform scale and offset placing this box centered inside a
    /// `width` x `height` surface
    pub fn fit_into(&self, width: f64, height: f64) -> ViewTransform {
        if self.width <= 0.0 || self.height <= 0.0 {
            return ViewTransform {
                scale: 1.0,
                offset: DVec2::ZERO,
            };
        }
        let scale = (width / self.width).min(height / self.height);
        let used = DVec2::new(self.width, self.height) * scale;
        ViewTransform {
            scale,
            offset: (DVec2::new(width, height) - used) / 2.0,
        }
    }
}

/// Mapping between ViewBox space and a host surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub offset: DVec2,
}

impl ViewTransform {
    #[inline(always)]
    pub fn to_surface(&self, p: DVec2) -> DVec2 {
        p * self.scale + self.offset
    }

    #[inline(always)]
    pub fn to_view(&self, p: DVec2) -> DVec2 {
        (p - self.offset) / self.scale
    }
}

/// Renderable outline of one feature in ViewBox space
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedPath {
    shape: MultiPolygon<f64>,
    bounds: Option<Rect<f64>>,
}

impl ProjectedPath {
    fn new(shape: MultiPolygon<f64>) -> Self {
        let bounds = shape.bounding_rect();
        Self { shape, bounds }
    }

    /// Every ring, exteriors and holes alike
    pub fn rings(&self) -> impl Iterator<Item = impl Iterator<Item = DVec2> + '_> + '_ {
        self.shape
            .0
            .iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
            .map(|ring| ring.coords().map(|c| DVec2::new(c.x, c.y)))
    }

    pub fn bounds(&self) -> Option<(DVec2, DVec2)> {
        self.bounds
            .map(|r| (DVec2::new(r.min().x, r.min().y), DVec2::new(r.max().x, r.max().y)))
    }

    pub fn contains(&self, p: DVec2) -> bool {
        self.shape.contains(&Point::new(p.x, p.y))
    }

    /// SVG path data: `M x,y L x,y ... Z` per ring
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        for ring in self.rings() {
            let mut coords = ring.peekable();
            if coords.peek().is_none() {
                continue;
            }
            for (i, p) in coords.enumerate() {
                let cmd = if i == 0 { 'M' } else { 'L' };
                let _ = write!(out, "{cmd}{:.3},{:.3}", p.x, p.y);
            }
            out.push('Z');
        }
        out
    }
}

/// Projection fitted to the current map plus its frozen ViewBox
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub mercator: Mercator,
    pub view_box: ViewBox,
}

impl Projection {
    fn ring(&self, ring: &LineString) -> geo::LineString<f64> {
        ring.iter()
            .map(|&(lon, lat)| {
                let p = self.mercator.project(lon, lat);
                Coord { x: p.x, y: p.y }
            })
            .collect()
    }

    /// Path generator: feature geometry to ViewBox-space outline
    pub fn path(&self, feature: &Feature) -> ProjectedPath {
        let polygons = feature
            .polygons
            .iter()
            .filter_map(|rings| {
                let (exterior, holes) = rings.split_first()?;
                Some(Polygon::new(
                    self.ring(exterior),
                    holes.iter().map(|h| self.ring(h)).collect(),
                ))
            })
            .collect();
        ProjectedPath::new(MultiPolygon(polygons))
    }

    /// Paths for many features, in input order
    pub fn paths<'a>(&self, features: impl IntoParallelIterator<Item = &'a Feature>) -> Vec<ProjectedPath> {
        features.into_par_iter().map(|f| self.path(f)).collect()
    }

    /// Mesh lines in ViewBox space
    pub fn lines(&self, mesh: &Mesh) -> Vec<Vec<DVec2>> {
        mesh.lines
            .iter()
            .map(|line| line.iter().map(|&(lon, lat)| self.mercator.project(lon, lat)).collect())
            .collect()
    }
}

/// Fits the projection to the viewport, freezing the ViewBox per map
#[derive(Debug, Default)]
pub struct ProjectionBuilder {
    frozen: Option<(String, ViewBox)>,
}

impl ProjectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projection for `features` of map `map_name`.
    ///
    /// The first call for a map fits to the viewport (width only for the
    /// top-level map) and freezes the resulting ViewBox. Later calls for the
    /// same map refit the features inside that frozen box.
    pub fn project(&mut self, map_name: &str, viewport: DVec2, features: &[Feature], top_level: bool) -> Projection {
        if let Some((name, view_box)) = &self.frozen {
            if name == map_name {
                return Projection {
                    mercator: Mercator::fit_size(view_box.width, view_box.height, features),
                    view_box: *view_box,
                };
            }
        }

        let mercator = if top_level {
            Mercator::fit_width(viewport.x, features)
        } else {
            Mercator::fit_size(viewport.x, viewport.y, features)
        };
        let max = Projection {
            mercator,
            view_box: ViewBox { width: 0.0, height: 0.0 },
        }
        .paths(features)
        .iter()
        .filter_map(ProjectedPath::bounds)
        .fold(DVec2::ZERO, |acc, (_, max)| acc.max(max));
        let view_box = ViewBox {
            width: max.x,
            height: max.y,
        };
        self.frozen = Some((map_name.to_string(), view_box));

        Projection {
            mercator: Mercator::fit_size(view_box.width, view_box.height, features),
            view_box,
        }
    }

    pub fn view_box(&self) -> Option<ViewBox> {
        self.frozen.as_ref().map(|(_, vb)| *vb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::topology::Topology;

    fn states() -> Vec<Feature> {
        Topology::decode(fixtures::TOPOLOGY.as_bytes())
            .unwrap()
            .features("India", "states")
            .unwrap()
    }

    #[test]
    fn test_project_invert() {
        let m = Mercator {
            scale: 100.0,
            translate: DVec2::new(10.0, 20.0),
        };
        let (lon, lat) = m.invert(m.project(76.5, 10.25));
        assert!((lon - 76.5).abs() < 1e-9);
        assert!((lat - 10.25).abs() < 1e-9);
        // North is up
        assert!(m.project(0.0, 10.0).y < m.project(0.0, 0.0).y);
    }

    #[test]
    fn test_fit_width_starts_at_origin() {
        let features = states();
        let m = Mercator::fit_width(400.0, &features);
        let west = m.project(75.0, 9.0);
        let east = m.project(77.0, 8.0);
        assert!(west.x.abs() < 1e-9 && west.y.abs() < 1e-9);
        assert!((east.x - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_size_centers() {
        let features = states();
        let m = Mercator::fit_size(400.0, 400.0, &features);
        let west = m.project(75.0, 9.0);
        let east = m.project(77.0, 8.0);
        assert!((west.x - 0.0).abs() < 1e-9);
        assert!((east.x - 400.0).abs() < 1e-9);
        // Two squares wide, one tall: vertically centered
        assert!(((west.y + east.y) / 2.0 - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_view_box_frozen_per_map() {
        let features = states();
        let mut builder = ProjectionBuilder::new();

        let first = builder.project("India", DVec2::new(400.0, 300.0), &features, true);
        assert!((first.view_box.width - 400.0).abs() < 1e-6);
        assert!(first.view_box.height > 190.0 && first.view_box.height < 210.0);

        // Resized viewport on a data-only redraw keeps the box
        let again = builder.project("India", DVec2::new(800.0, 600.0), &features, true);
        assert_eq!(again.view_box, first.view_box);
        assert_eq!(again.mercator, first.mercator);

        let kerala = builder.project("Kerala", DVec2::new(300.0, 300.0), &features[..1], false);
        // A one-degree square near 8.5N is slightly taller than wide, so the
        // fit is height-bound and the box ends at the centered outline's edge
        assert!((kerala.view_box.height - 300.0).abs() < 1e-6);
        assert!(kerala.view_box.width > 298.0 && kerala.view_box.width < 299.0);
    }

    #[test]
    fn test_path_contains_and_svg() {
        let features = states();
        let projection = ProjectionBuilder::new().project("India", DVec2::new(400.0, 300.0), &features, true);
        let kerala = projection.path(&features[0]);
        let tamil_nadu = projection.path(&features[1]);

        let center = DVec2::new(100.0, projection.view_box.height / 2.0);
        assert!(kerala.contains(center));
        assert!(!tamil_nadu.contains(center));

        let svg = kerala.to_svg();
        assert!(svg.starts_with('M'));
        assert_eq!(svg.matches('L').count(), 4);
        assert!(svg.ends_with('Z'));
    }

    #[test]
    fn test_fit_into_letterboxes() {
        let vb = ViewBox {
            width: 200.0,
            height: 100.0,
        };
        let t = vb.fit_into(400.0, 400.0);
        assert_eq!(t.scale, 2.0);
        assert_eq!(t.offset, DVec2::new(0.0, 100.0));
        assert_eq!(t.to_view(t.to_surface(DVec2::new(50.0, 25.0))), DVec2::new(50.0, 25.0));
    }
}
