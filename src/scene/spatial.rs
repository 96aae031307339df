use glam::DVec2;
use std::collections::HashMap;

/// Uniform grid over shape bounding boxes for pointer hit testing.
///
/// Each shape is inserted into every cell its bbox overlaps, so a query never
/// misses a shape but may return ones whose outline does not contain the
/// point. Callers confirm candidates with an exact containment test.
#[derive(Debug, Default, Clone)]
pub struct HitGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl HitGrid {
    /// Build from `(min, max)` boxes; indices follow iteration order
    pub fn build(bboxes: impl Iterator<Item = Option<(DVec2, DVec2)>>, cell_size: f64) -> Self {
        let mut grid = Self {
            cells: HashMap::new(),
            cell_size: if cell_size > 0.0 { cell_size } else { 1.0 },
        };
        for (idx, bbox) in bboxes.enumerate() {
            let Some((min, max)) = bbox else {
                continue;
            };
            let (x0, y0) = grid.to_cell(min);
            let (x1, y1) = grid.to_cell(max);
            for y in y0..=y1 {
                for x in x0..=x1 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    #[inline(always)]
    fn to_cell(&self, p: DVec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    /// Indices of shapes whose bbox cell covers `p`, ascending
    pub fn candidates(&self, p: DVec2) -> &[usize] {
        self.cells
            .get(&self.to_cell(p))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
