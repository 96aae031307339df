mod projection;

pub use projection::{Mercator, ProjectedPath, Projection, ProjectionBuilder, ViewBox, ViewTransform};
