//! Canvas entities: nodes, containers and links.
//!
//! Nodes are rectangles in world space. A container is a node that also
//! owns an ordered list of child node ids; the children are ordinary
//! registry nodes that follow the container when it moves. Links connect
//! two nodes and cache the orthogonal route computed for them.

use crate::grid::GridSnapper;
use crate::id::{LinkId, NodeId};
use crate::router::Router;
use kurbo::{Point, Rect, Size, Vec2};
use smallvec::SmallVec;

/// Ordered waypoints of a routed link. Six points cover every route shape.
pub type Waypoints = SmallVec<[Point; 6]>;

/// What every drawable, hit-testable canvas entity exposes.
pub trait Entity {
    /// World-space bounds used for culling and selection.
    fn bounds(&self) -> Rect;

    /// Whether `point` (world space) hits this entity.
    fn hit_test(&self, point: Point) -> bool;

    fn is_draggable(&self) -> bool {
        false
    }

    /// Move by `delta` in world space. No-op for entities positioned by others.
    fn translate(&mut self, _delta: Vec2) {}
}

/// Inclusive point-in-rect test (edges count as inside).
pub fn rect_contains(rect: Rect, p: Point) -> bool {
    let r = rect.abs();
    p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
}

/// Whether `inner` lies entirely within `outer` (both corners inside).
pub fn rect_encloses(outer: Rect, inner: Rect) -> bool {
    rect_contains(outer, inner.origin()) && rect_contains(outer, Point::new(inner.x1, inner.y1))
}

// ─── Nodes ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Leaf,
    Container { children: Vec<NodeId> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    origin: Point,
    size: Size,
    pub selected: bool,
    pub draggable: bool,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, origin: Point, size: Size) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Leaf,
            origin,
            size,
            selected: false,
            draggable: true,
        }
    }

    /// A leaf node with a generated `nd-N` id.
    pub fn anonymous(origin: Point, size: Size) -> Self {
        Self::new(NodeId::with_prefix("nd"), origin, size)
    }

    /// A container with a generated `ct-N` id.
    pub fn container(origin: Point, size: Size, children: Vec<NodeId>) -> Self {
        Self {
            kind: NodeKind::Container { children },
            ..Self::new(NodeId::with_prefix("ct"), origin, size)
        }
    }

    pub fn with_children(mut self, children: Vec<NodeId>) -> Self {
        self.kind = NodeKind::Container { children };
        self
    }

    pub fn with_draggable(mut self, draggable: bool) -> Self {
        self.draggable = draggable;
        self
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Returns `true` if the origin changed.
    pub fn set_origin(&mut self, origin: Point) -> bool {
        if self.origin == origin {
            return false;
        }
        self.origin = origin;
        true
    }

    /// Returns `true` if the size changed.
    pub fn set_size(&mut self, size: Size) -> bool {
        if self.size == size {
            return false;
        }
        self.size = size;
        true
    }

    /// Place the node at the grid cell of `drag_origin + delta`.
    /// Returns the applied displacement.
    pub fn drag_to(&mut self, drag_origin: Point, delta: Vec2, snapper: &GridSnapper) -> Vec2 {
        let target = snapper.origin(drag_origin + delta);
        let moved = target - self.origin;
        self.set_origin(target);
        moved
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Container { children } => children,
            NodeKind::Leaf => &[],
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Container { .. })
    }

    /// Drop `child` from this container's children. Returns `true` if present.
    pub fn forget_child(&mut self, child: NodeId) -> bool {
        match &mut self.kind {
            NodeKind::Container { children } => {
                let before = children.len();
                children.retain(|c| *c != child);
                children.len() != before
            }
            NodeKind::Leaf => false,
        }
    }
}

impl Entity for Node {
    fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.origin, self.size)
    }

    fn hit_test(&self, point: Point) -> bool {
        rect_contains(self.bounds(), point)
    }

    fn is_draggable(&self) -> bool {
        self.draggable
    }

    fn translate(&mut self, delta: Vec2) {
        if delta != Vec2::ZERO {
            self.origin += delta;
        }
    }
}

// ─── Links ───────────────────────────────────────────────────────────────

/// A directed connection between two nodes, with its cached route.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: LinkId,
    source: NodeId,
    destination: NodeId,
    path: Waypoints,
    bounds: Rect,
    dirty: bool,
}

impl Link {
    pub fn new(id: LinkId, source: NodeId, destination: NodeId) -> Self {
        Self {
            id,
            source,
            destination,
            path: Waypoints::new(),
            bounds: Rect::ZERO,
            dirty: true,
        }
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn destination(&self) -> NodeId {
        self.destination
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.destination == node
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the cached route stale; it is rebuilt on next access.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Last computed waypoints. Empty means "not drawn".
    pub fn path(&self) -> &[Point] {
        &self.path
    }

    /// Recompute the route if dirty. A missing endpoint yields an empty path.
    /// Returns `true` if a recomputation happened.
    pub fn refresh(&mut self, router: &Router, source: Option<Rect>, destination: Option<Rect>) -> bool {
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        self.path = match (source, destination) {
            (Some(src), Some(dst)) => router.route(src, dst),
            _ => Waypoints::new(),
        };
        self.bounds = path_bounds(&self.path);
        log::trace!("route {} -> {} points", self.id, self.path.len());
        true
    }
}

impl Entity for Link {
    /// Bounding box of the last computed route (not of the endpoints).
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn hit_test(&self, _point: Point) -> bool {
        false
    }
}

/// Bounding box of a point list; `Rect::ZERO` for an empty list.
pub fn path_bounds(points: &[Point]) -> Rect {
    let Some((first, rest)) = points.split_first() else {
        return Rect::ZERO;
    };
    rest.iter()
        .fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p))
}

/// Borrowed view of any entity, in draw order.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Node(&'a Node),
    Link(&'a Link),
}

impl EntityRef<'_> {
    pub fn bounds(&self) -> Rect {
        match self {
            EntityRef::Node(n) => n.bounds(),
            EntityRef::Link(l) => l.bounds(),
        }
    }
}
