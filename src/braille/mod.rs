mod canvas;
mod draw;

pub use canvas::{BrailleCanvas, Cell};
pub use draw::{draw_polyline, fill_rings};
