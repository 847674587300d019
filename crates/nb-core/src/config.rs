//! Canvas configuration.
//!
//! Every tunable that would otherwise be a process-wide constant lives here
//! and is handed to the component that needs it (`GridSnapper`, `Router`,
//! `Viewport`, the scheduler channels).

use crate::grid::GridSnapper;
use crate::router::Router;
use crate::viewport::ZoomLimits;
use serde::{Deserialize, Serialize};

/// How the background grid is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridStyle {
    #[default]
    None,
    Dots,
    Lines,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// World units per grid cell. Also the router's stub length.
    pub grid_size: f64,
    pub grid_style: GridStyle,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom change per wheel notch.
    pub zoom_step: f64,
    /// Screen distance the pointer must travel before a marquee starts.
    pub marquee_threshold: f64,
    /// Minimum spacing between redraw executions.
    pub redraw_delay_ms: u64,
    /// Minimum spacing between coalesced pointer-move executions.
    pub pointer_delay_ms: u64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            grid_size: 8.0,
            grid_style: GridStyle::None,
            min_zoom: 0.25,
            max_zoom: 3.0,
            zoom_step: 0.25,
            marquee_threshold: 16.0,
            redraw_delay_ms: 16,
            pointer_delay_ms: 64,
        }
    }
}

impl CanvasConfig {
    pub fn snapper(&self) -> GridSnapper {
        GridSnapper::new(self.grid_size)
    }

    pub fn router(&self) -> Router {
        Router::new(self.grid_size)
    }

    pub fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits::new(self.min_zoom, self.max_zoom, self.zoom_step)
    }
}
