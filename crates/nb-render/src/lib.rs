//! Drawing is delegated: a host implements [`Renderer`] (and optionally
//! [`Measure`]) and this crate decides *what* to draw each frame.

pub mod hit;
pub mod paint;

pub use hit::node_at_screen;
pub use paint::{FrameStats, GridGeometry, Measure, PaintOptions, Renderer, paint_scene};
