//! Registry → renderer calls for one frame.
//!
//! Order: grid, nodes (oldest first), links, selection rectangle. Nodes and
//! links whose bounds are entirely off screen are skipped. Dirty link
//! routes are recomputed here, at render time, and nowhere else.

use kurbo::{Affine, Rect};
use nb_core::{Entity, EntityRef, GridLines, GridSnapper, GridStyle, Node, Registry, Size, Viewport};

/// Pixel spacing below which the grid is not drawn.
const MIN_GRID_SPACING: f64 = 4.0;

/// Grid geometry in world space, handed to [`Renderer::render_grid`].
#[derive(Debug, Clone, PartialEq)]
pub enum GridGeometry {
    Dots(Vec<kurbo::Point>),
    Lines(GridLines),
}

/// The drawing surface. World-space geometry is passed as-is; apply the
/// frame transform to reach screen space.
pub trait Renderer {
    fn begin_frame(&mut self, _world_to_screen: Affine) {}

    fn render(&mut self, entity: EntityRef<'_>);

    fn render_grid(&mut self, _grid: &GridGeometry) {}

    /// Selection / marquee rectangle in world space.
    fn render_selection(&mut self, _rect: Rect) {}

    fn end_frame(&mut self) {}
}

/// Content measurement, e.g. text layout deciding a card's size.
pub trait Measure {
    /// Preferred size of `node`, or `None` to keep its current size.
    fn measure_bounds(&self, node: &Node) -> Option<Size>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PaintOptions {
    pub grid_style: GridStyle,
    pub snapper: GridSnapper,
    /// Selection rectangle to overlay, if any.
    pub selection: Option<Rect>,
}

/// What one frame drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub nodes_drawn: usize,
    pub nodes_culled: usize,
    pub links_drawn: usize,
    pub links_culled: usize,
    /// Links with no drawable route this frame.
    pub links_empty: usize,
    pub routes_recomputed: usize,
    pub grid_drawn: bool,
}

/// Paint one frame.
pub fn paint_scene(
    registry: &mut Registry,
    viewport: &Viewport,
    options: &PaintOptions,
    renderer: &mut dyn Renderer,
) -> FrameStats {
    let mut stats = FrameStats::default();
    renderer.begin_frame(viewport.transform());

    if let Some(grid) = grid_geometry(viewport, options) {
        renderer.render_grid(&grid);
        stats.grid_drawn = true;
    }

    for node in registry.nodes() {
        if viewport.is_off_screen(node.bounds()) {
            stats.nodes_culled += 1;
            continue;
        }
        renderer.render(EntityRef::Node(node));
        stats.nodes_drawn += 1;
    }

    stats.routes_recomputed = registry.refresh_routes();
    for link in registry.links() {
        if link.path().is_empty() {
            stats.links_empty += 1;
        } else if viewport.is_off_screen(link.bounds()) {
            stats.links_culled += 1;
        } else {
            renderer.render(EntityRef::Link(link));
            stats.links_drawn += 1;
        }
    }

    if let Some(rect) = options.selection
        && (rect.x0, rect.y0) != (rect.x1, rect.y1)
    {
        renderer.render_selection(rect);
    }

    renderer.end_frame();
    log::trace!("frame: {stats:?}");
    stats
}

fn grid_geometry(viewport: &Viewport, options: &PaintOptions) -> Option<GridGeometry> {
    if options.snapper.unit() * viewport.zoom() < MIN_GRID_SPACING {
        return None;
    }
    let visible = viewport.visible_world();
    match options.grid_style {
        GridStyle::None => None,
        GridStyle::Dots => Some(GridGeometry::Dots(options.snapper.dots(visible))),
        GridStyle::Lines => Some(GridGeometry::Lines(options.snapper.lines(visible))),
    }
}
