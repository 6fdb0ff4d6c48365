use rand::Rng;
use std::fmt;

/// Integer cell coordinate on the simulation grid.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan(&self, other: GridPos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Rounds a floating point coordinate to the nearest cell (halves away from zero).
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self {
            x: x.round() as i32,
            y: y.round() as i32,
        }
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for GridPos {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Circle {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn distance_to_point(&self, x: f64, y: f64) -> f64 {
        let dx = self.x - x;
        let dy = self.y - y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Strict containment: a point exactly on the rim is outside.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.distance_to_point(x, y) < self.radius
    }

    pub fn contains_cell(&self, pos: GridPos) -> bool {
        self.contains_point(pos.x as f64, pos.y as f64)
    }
}

impl Default for Circle {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            radius: 1.0,
        }
    }
}

/// Axis aligned block of cells, `[x, x + width) x [y, y + height)`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct GridRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl GridRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Grid anchored at the origin.
    pub fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x >= self.left() && pos.x < self.right() && pos.y >= self.top() && pos.y < self.bottom()
    }

    pub fn center(&self) -> GridPos {
        GridPos::new(
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }

    /// Row-major index of `pos`, or `None` outside the rectangle.
    pub fn index_of(&self, pos: GridPos) -> Option<usize> {
        if !self.contains(pos) {
            return None;
        }
        let col = (pos.x - self.x) as usize;
        let row = (pos.y - self.y) as usize;
        Some(row * self.width as usize + col)
    }

    pub fn get_random_cell_inside<R: Rng>(&self, margin: u32, rng: &mut R) -> GridPos {
        GridPos::new(
            self._safe_rand_i32(rng, self.left() + margin as i32, self.right() - 1 - margin as i32),
            self._safe_rand_i32(rng, self.top() + margin as i32, self.bottom() - 1 - margin as i32),
        )
    }

    fn _safe_rand_i32<R: Rng>(&self, rng: &mut R, min: i32, max: i32) -> i32 {
        if min > max {
            return min;
        }
        rng.gen_range(min..=max)
    }
}
