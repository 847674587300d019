//! Hit testing from screen coordinates.
//!
//! The registry hit-tests in world space; this converts through the
//! viewport first so input code can stay in screen space.

use kurbo::Point;
use nb_core::{NodeId, Registry, Viewport};

/// Topmost node under a screen position.
pub fn node_at_screen(registry: &Registry, viewport: &Viewport, screen: Point) -> Option<NodeId> {
    registry.get_at(viewport.screen_to_world(screen)).map(|n| n.id)
}
