//! Keyed joins of geometry and statistics against the retained scene.

mod borders;
mod regions;

pub use borders::BorderRenderer;
pub use regions::{RegionInputs, RegionRenderer};
