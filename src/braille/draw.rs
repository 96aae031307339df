use super::BrailleCanvas;
use glam::DVec2;
use tui_choropleth::Rgba;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y, color);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw connected segments through pixel-space points
pub fn draw_polyline(canvas: &mut BrailleCanvas, points: &[DVec2], color: Rgba) {
    for pair in points.windows(2) {
        let (a, b) = (pair[0].round(), pair[1].round());
        draw_line(canvas, a.x as i32, a.y as i32, b.x as i32, b.y as i32, color);
    }
}

/// Paint every cell whose center lies inside the rings (even-odd rule).
/// Rings are in pixel space, 2x4 pixels per cell.
pub fn fill_rings(canvas: &mut BrailleCanvas, rings: &[Vec<DVec2>], color: Rgba) {
    let Some((min_y, max_y)) = rings
        .iter()
        .flatten()
        .fold(None, |acc: Option<(f64, f64)>, p| match acc {
            Some((lo, hi)) => Some((lo.min(p.y), hi.max(p.y))),
            None => Some((p.y, p.y)),
        })
    else {
        return;
    };

    let first_row = ((min_y - 2.0) / 4.0).ceil().max(0.0) as i32;
    let last_row = ((max_y - 2.0) / 4.0).floor().min(canvas.height() as f64 - 1.0) as i32;
    let mut crossings: Vec<f64> = Vec::new();

    for cy in first_row..=last_row {
        let y = cy as f64 * 4.0 + 2.0;
        crossings.clear();
        for ring in rings {
            for edge in ring.windows(2) {
                let (a, b) = (edge[0], edge[1]);
                if (a.y <= y) != (b.y <= y) {
                    crossings.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for span in crossings.chunks_exact(2) {
            let start = ((span[0] - 1.0) / 2.0).ceil() as i32;
            let end = ((span[1] - 1.0) / 2.0).floor() as i32;
            for cx in start..=end {
                canvas.fill_cell(cx, cy, color);
            }
        }
    }
}
