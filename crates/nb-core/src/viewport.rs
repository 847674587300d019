//! Pan/zoom state and screen ↔ world transforms.
//!
//! `screen = (world + pan) * zoom` and `world = screen / zoom - pan`.
//! Pan is stored in world units and is unconstrained; zoom is always kept
//! inside [`ZoomLimits`].

use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Changes below this are treated as "no change".
const ZOOM_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
    /// Increment applied per wheel notch.
    pub step: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: 0.25,
            max: 3.0,
            step: 0.25,
        }
    }
}

impl ZoomLimits {
    /// Non-positive or non-finite values fall back to defaults, then
    /// swapped bounds are reordered, so `min <= max` always holds.
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        let d = Self::default();
        let valid = |v: f64| v.is_finite() && v > 0.0;
        let min = if valid(min) { min } else { d.min };
        let max = if valid(max) { max } else { d.max };
        Self {
            min: min.min(max),
            max: min.max(max),
            step: if valid(step) { step } else { d.step },
        }
    }

    pub fn clamp(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.min.max(1.0_f64.min(self.max));
        }
        zoom.clamp(self.min, self.max)
    }
}

/// What a viewport mutation actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportChange {
    pub zoom: bool,
    pub pan: bool,
}

impl ViewportChange {
    pub fn any(&self) -> bool {
        self.zoom || self.pan
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    zoom: f64,
    pan: Vec2,
    limits: ZoomLimits,
    /// Screen size of the canvas in pixels.
    size: Size,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ZoomLimits::default(), Size::new(800.0, 600.0))
    }
}

impl Viewport {
    pub fn new(limits: ZoomLimits, size: Size) -> Self {
        Self {
            zoom: limits.clamp(1.0),
            pan: Vec2::ZERO,
            limits,
            size,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    /// Set the zoom (clamped). Returns `true` if it changed. Tiny changes
    /// are ignored unless they land exactly on a limit.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let z = self.limits.clamp(zoom);
        let on_limit = z == self.limits.min || z == self.limits.max;
        if z == self.zoom || ((z - self.zoom).abs() < ZOOM_EPSILON && !on_limit) {
            return false;
        }
        self.zoom = z;
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.zoom + self.limits.step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.zoom - self.limits.step)
    }

    /// Returns `true` if the pan changed.
    pub fn set_pan(&mut self, pan: Vec2) -> bool {
        if pan == self.pan || !(pan.x.is_finite() && pan.y.is_finite()) {
            return false;
        }
        self.pan = pan;
        true
    }

    /// Pan by a screen-space delta.
    pub fn pan_by_screen(&mut self, delta: Vec2) -> bool {
        self.set_pan(self.pan + delta / self.zoom)
    }

    /// One wheel notch at `anchor` (screen space). Positive `delta_y` zooms
    /// in. The world point under `anchor` stays put.
    pub fn wheel(&mut self, delta_y: f64, anchor: Point) -> ViewportChange {
        let target = if delta_y > 0.0 {
            self.zoom + self.limits.step
        } else if delta_y < 0.0 {
            self.zoom - self.limits.step
        } else {
            return ViewportChange::default();
        };

        let before = self.screen_to_world(anchor);
        if !self.set_zoom(target) {
            return ViewportChange::default();
        }
        let after = self.screen_to_world(anchor);
        let pan = self.set_pan(self.pan + (after - before));
        ViewportChange { zoom: true, pan }
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        (p.to_vec2() / self.zoom - self.pan).to_point()
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        ((p.to_vec2() + self.pan) * self.zoom).to_point()
    }

    /// World → screen as an affine transform for renderers.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.zoom) * Affine::translate(self.pan)
    }

    /// The world-space rectangle currently visible on screen.
    pub fn visible_world(&self) -> Rect {
        Rect::new(
            -self.pan.x,
            -self.pan.y,
            self.size.width / self.zoom - self.pan.x,
            self.size.height / self.zoom - self.pan.y,
        )
    }

    /// Culling predicate: `true` when `bounds` lies entirely off screen.
    pub fn is_off_screen(&self, bounds: Rect) -> bool {
        let b = bounds.abs();
        let v = self.visible_world();
        b.x0 > v.x1 || b.y0 > v.y1 || b.x1 < v.x0 || b.y1 < v.y0
    }
}
