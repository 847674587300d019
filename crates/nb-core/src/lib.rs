pub mod config;
pub mod grid;
pub mod id;
pub mod model;
pub mod registry;
pub mod router;
pub mod viewport;

pub use config::{CanvasConfig, GridStyle};
pub use grid::{GridLines, GridSnapper};
pub use id::{LinkId, NodeId};
pub use model::*;
pub use registry::{Registry, RegistryError, RouteStats};
pub use router::Router;
pub use viewport::{Viewport, ViewportChange, ZoomLimits};

// Re-export kurbo geometry so downstream crates share one version.
pub use kurbo::{Affine, Point, Rect, Size, Vec2};
