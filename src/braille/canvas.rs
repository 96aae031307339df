use tui_choropleth::Rgba;

/// Braille Unicode canvas with per-cell colors.
/// Each character cell represents a 2x4 pixel grid (8 dots); lines set dots
/// in an ink color, region fills paint the whole cell background.
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    dots: Vec<u8>,
    ink: Vec<Option<Rgba>>,
    paint: Vec<Option<Rgba>>,
}

/// One character cell ready for the terminal buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub ink: Option<Rgba>,
    pub paint: Option<Rgba>,
}

impl BrailleCanvas {
    /// Create a new canvas with the given character dimensions.
    /// Effective pixel resolution: width*2 x height*4
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            dots: vec![0; width * height],
            ink: vec![None; width * height],
            paint: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Set a pixel at the given coordinates.
    /// Braille dot layout per character:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgba) {
        let cx = x / 2;
        let cy = y / 4;

        if cx >= self.width || cy >= self.height {
            return;
        }

        let bit = match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            (1, 3) => 0x80,
            _ => 0,
        };

        let idx = cy * self.width + cx;
        self.dots[idx] |= bit;
        self.ink[idx] = Some(color);
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32, color: Rgba) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    /// Paint a character cell's background
    pub fn fill_cell(&mut self, cx: i32, cy: i32, color: Rgba) {
        if cx < 0 || cy < 0 || cx as usize >= self.width || cy as usize >= self.height {
            return;
        }
        self.paint[cy as usize * self.width + cx as usize] = Some(color);
    }

    pub fn cell(&self, cx: usize, cy: usize) -> Option<Cell> {
        if cx >= self.width || cy >= self.height {
            return None;
        }
        let idx = cy * self.width + cx;
        Some(Cell {
            ch: char::from_u32(0x2800 + self.dots[idx] as u32).unwrap_or(' '),
            ink: self.ink[idx],
            paint: self.paint[idx],
        })
    }

    /// Convert the dots to a string of Braille characters
    #[cfg(test)]
    pub fn to_string(&self) -> String {
        (0..self.height)
            .map(|cy| {
                (0..self.width)
                    .filter_map(|cx| self.cell(cx, cy))
                    .map(|c| c.ch)
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Rgba = Rgba::rgb(0xff, 0x07, 0x3a);

    #[test]
    fn test_single_pixel() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(0, 0, INK);
        assert_eq!(canvas.to_string(), "⠁"); // U+2801
        assert_eq!(canvas.cell(0, 0).unwrap().ink, Some(INK));
    }

    #[test]
    fn test_all_dots() {
        let mut canvas = BrailleCanvas::new(1, 1);
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_pixel(x, y, INK);
            }
        }
        assert_eq!(canvas.to_string(), "⣿"); // U+28FF (all dots)
    }

    #[test]
    fn test_diagonal() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.set_pixel(0, 0, INK);
        canvas.set_pixel(1, 1, INK);
        canvas.set_pixel(2, 2, INK);
        canvas.set_pixel(3, 3, INK);
        // First char: (0,0) and (1,1) = 0x01 | 0x10 = 0x11
        // Second char: (0,2) and (1,3) = 0x04 | 0x80 = 0x84
        assert_eq!(canvas.to_string(), "⠑⢄");
    }

    #[test]
    fn test_fill_cell_bounds() {
        let mut canvas = BrailleCanvas::new(2, 2);
        canvas.fill_cell(1, 1, INK);
        canvas.fill_cell(-1, 0, INK);
        canvas.fill_cell(2, 0, INK);
        assert_eq!(canvas.cell(1, 1).unwrap().paint, Some(INK));
        assert_eq!(canvas.cell(0, 0).unwrap().paint, None);
        assert!(canvas.cell(2, 0).is_none());
    }
}
