use std::collections::VecDeque;

use super::Pos;

/// Marker for walls, padding and body segments
pub const OBSTACLE: f32 = -1.0;
pub const EMPTY: f32 = 0.0;
pub const APPLE: f32 = 1.0;

/// The playing field surrounded by a sentinel border of obstacles
///
/// Positions are grid coordinates; anything within `padding` cells outside the grid is addressable and reads as
/// [`OBSTACLE`], so rays and view patches never leave the buffer.
#[derive(Debug, Clone)]
pub struct Board {
    cells: Vec<f32>,
    width: usize,
    height: usize,
    padding: usize,
}

impl Board {
    pub fn new(width: usize, height: usize, padding: usize) -> Self {
        let padded = (width + 2 * padding) * (height + 2 * padding);
        Self {
            cells: vec![OBSTACLE; padded],
            width,
            height,
            padding,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.0 >= 0 && pos.1 >= 0 && (pos.0 as usize) < self.width && (pos.1 as usize) < self.height
    }

    fn index(&self, pos: Pos) -> usize {
        let stride = self.width + 2 * self.padding;
        let x = pos.0 + self.padding as i32;
        let y = pos.1 + self.padding as i32;
        debug_assert!(
            x >= 0 && y >= 0 && (x as usize) < stride,
            "{pos:?} lies beyond the board padding"
        );
        y as usize * stride + x as usize
    }

    /// **Panics** if `pos` lies further than `padding` cells outside the grid
    pub fn get(&self, pos: Pos) -> f32 {
        self.cells[self.index(pos)]
    }

    fn set(&mut self, pos: Pos, value: f32) {
        let ix = self.index(pos);
        self.cells[ix] = value;
    }

    /// Redraw the grid interior from the body and apple; the padding is left untouched
    pub fn refresh(&mut self, body: &VecDeque<Pos>, apple: Pos) {
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                self.set((x, y), EMPTY);
            }
        }
        for &segment in body {
            self.set(segment, OBSTACLE);
        }
        self.set(apple, APPLE);
    }

    /// The `(2r + 1)²` square of cells centred on `center`, row-major
    pub fn patch(&self, center: Pos, radius: usize) -> Vec<f32> {
        let r = radius as i32;
        let mut cells = Vec::with_capacity((2 * radius + 1).pow(2));
        for y in (center.1 - r)..=(center.1 + r) {
            for x in (center.0 - r)..=(center.0 + r) {
                cells.push(self.get((x, y)));
            }
        }
        cells
    }
}
