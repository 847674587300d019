//! Grid quantization.
//!
//! World coordinates snap down to the top-left corner of the cell that
//! contains them. The same unit is used for marquee growth and for the
//! router's anchor stubs, so one `GridSnapper` is handed to each of them.

use kurbo::{Point, Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSnapper {
    size: f64,
}

impl Default for GridSnapper {
    fn default() -> Self {
        Self { size: 8.0 }
    }
}

impl GridSnapper {
    /// Non-positive or non-finite sizes fall back to `1.0`.
    pub fn new(size: f64) -> Self {
        if size.is_finite() && size > 0.0 {
            Self { size }
        } else {
            log::warn!("invalid grid size {size}, using 1.0");
            Self { size: 1.0 }
        }
    }

    /// World units per cell.
    pub fn unit(&self) -> f64 {
        self.size
    }

    /// Top-left corner of the cell containing `p`.
    pub fn origin(&self, p: Point) -> Point {
        Point::new(
            (p.x / self.size).floor() * self.size,
            (p.y / self.size).floor() * self.size,
        )
    }

    /// Integer cell coordinates of `p`.
    pub fn cell(&self, p: Point) -> (i64, i64) {
        (
            (p.x / self.size).floor() as i64,
            (p.y / self.size).floor() as i64,
        )
    }

    pub fn cell_origin(&self, cell: (i64, i64)) -> Point {
        Point::new(cell.0 as f64 * self.size, cell.1 as f64 * self.size)
    }

    /// One cell diagonally, `(unit, unit)`.
    pub fn step(&self) -> Vec2 {
        Vec2::new(self.size, self.size)
    }

    /// Grid-line coordinates covering `visible`, one cell of margin each side.
    pub fn lines(&self, visible: Rect) -> GridLines {
        GridLines {
            xs: self.span(visible.x0, visible.x1),
            ys: self.span(visible.y0, visible.y1),
        }
    }

    /// Every grid intersection inside `visible` (plus margin), row-major.
    pub fn dots(&self, visible: Rect) -> Vec<Point> {
        let lines = self.lines(visible);
        let mut dots = Vec::with_capacity(lines.xs.len() * lines.ys.len());
        for &y in &lines.ys {
            for &x in &lines.xs {
                dots.push(Point::new(x, y));
            }
        }
        dots
    }

    fn span(&self, from: f64, to: f64) -> Vec<f64> {
        if !(from.is_finite() && to.is_finite()) || to < from {
            return Vec::new();
        }
        let first = (from / self.size).floor() - 1.0;
        let last = (to / self.size).ceil() + 1.0;
        (first as i64..=last as i64)
            .map(|i| i as f64 * self.size)
            .collect()
    }
}

/// Vertical (`xs`) and horizontal (`ys`) grid-line positions in world space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridLines {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}
