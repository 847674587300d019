//! Selection controller: marquee rectangle, membership and group drag.
//!
//! The two corners are not kept ordered while a marquee grows (dragging up
//! or left puts `bottom_right` above or left of `top_left`), so every
//! geometric query goes through min/max.

use kurbo::{Point, Rect, Vec2};
use nb_core::{Entity, GridSnapper, NodeId, Registry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Idle,
    Marquee,
    DraggingGroup,
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    top_left: Point,
    bottom_right: Point,
    members: Vec<NodeId>,
    state: SelectionState,
    /// `top_left` when the group drag started.
    drag_origin: Point,
    /// Pointer world position minus `top_left` at press time.
    click_offset: Vec2,
    /// Corner pair last reported by `notify_bounds_changed`.
    reported: (Point, Point),
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top_left(&self) -> Point {
        self.top_left
    }

    pub fn bottom_right(&self) -> Point {
        self.bottom_right
    }

    /// Normalized bounds.
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.top_left, self.bottom_right)
    }

    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_member(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state == SelectionState::DraggingGroup
    }

    /// Inclusive containment test against the (unordered) corners.
    pub fn contains(&self, p: Point) -> bool {
        let r = self.rect();
        p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
    }

    /// Deselect every member and collapse the bounds onto `anchor`.
    pub fn clear(&mut self, registry: &mut Registry, anchor: Point) {
        for id in self.members.drain(..) {
            registry.set_selected(id, false);
        }
        self.top_left = anchor;
        self.bottom_right = anchor;
        self.state = SelectionState::Idle;
    }

    /// Mark `id` selected and add it to the members. With `adjust`, the
    /// bounds grow to include it. Unknown ids are ignored.
    pub fn add_member(&mut self, registry: &mut Registry, id: NodeId, adjust: bool) -> bool {
        let Some(bounds) = registry.get(id).map(|n| n.bounds()) else {
            return false;
        };
        registry.set_selected(id, true);
        if self.is_member(id) {
            return false;
        }
        if adjust {
            let grown = if self.members.is_empty() {
                bounds
            } else {
                self.rect().union(bounds)
            };
            self.top_left = grown.origin();
            self.bottom_right = Point::new(grown.x1, grown.y1);
        }
        self.members.push(id);
        true
    }

    /// Drop `id` from the members, clearing its flag if the node still exists.
    /// Bounds are left as they are; call [`Selection::update_bounds`].
    pub fn remove_member(&mut self, registry: &mut Registry, id: NodeId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| *m != id);
        registry.set_selected(id, false);
        self.members.len() != before
    }

    /// Modifier-click: flip `id` in or out without starting a marquee. An
    /// empty selection first seeds its bounds from the node.
    pub fn toggle(&mut self, registry: &mut Registry, id: NodeId) -> bool {
        let Some(bounds) = registry.get(id).map(|n| n.bounds()) else {
            return false;
        };
        if self.members.is_empty() {
            self.top_left = bounds.origin();
            self.bottom_right = self.top_left;
        }
        if !self.remove_member(registry, id) {
            self.add_member(registry, id, false);
        }
        self.update_bounds(registry);
        true
    }

    /// Replace the selection with exactly `id`.
    pub fn select_only(&mut self, registry: &mut Registry, id: NodeId) -> bool {
        let anchor = self.top_left;
        self.clear(registry, anchor);
        self.add_member(registry, id, true)
    }

    /// Recompute bounds as the bounding box of the members. An empty
    /// selection collapses onto its top-left corner.
    pub fn update_bounds(&mut self, registry: &Registry) {
        let bounds = self
            .members
            .iter()
            .filter_map(|id| registry.get(*id))
            .map(|n| n.bounds())
            .reduce(|acc, b| acc.union(b));
        match bounds {
            Some(b) => {
                self.top_left = b.origin();
                self.bottom_right = Point::new(b.x1, b.y1);
            }
            None => self.bottom_right = self.top_left,
        }
    }

    /// Set the marquee's far corner and recompute membership: exactly the
    /// nodes whose bounds lie entirely inside it. Members do not grow the
    /// marquee.
    pub fn marquee_to(&mut self, registry: &mut Registry, bottom_right: Point) {
        self.state = SelectionState::Marquee;
        self.bottom_right = bottom_right;

        let inside = registry.contained_in(self.rect());
        let stale: Vec<NodeId> = self.members.iter().filter(|m| !inside.contains(m)).copied().collect();
        for id in stale {
            self.remove_member(registry, id);
        }
        for id in inside {
            self.add_member(registry, id, false);
        }
    }

    /// Start a group drag from the world position `at`.
    pub fn begin_drag(&mut self, at: Point) {
        self.state = SelectionState::DraggingGroup;
        self.drag_origin = self.top_left;
        self.click_offset = at - self.top_left;
    }

    /// Move the group so its grabbed point follows `total_delta` (world units
    /// since the press), snapped to the grid. Bounds move with it without a
    /// rescan. Returns the displacement applied this call.
    pub fn drag(&mut self, registry: &mut Registry, total_delta: Vec2, snapper: &GridSnapper) -> Vec2 {
        if !self.is_dragging() {
            return Vec2::ZERO;
        }
        let grabbed = self.drag_origin + total_delta + self.click_offset;
        let new_origin = snapper.origin(grabbed) - snapper.origin(self.click_offset.to_point()).to_vec2();
        let delta = new_origin - self.top_left;
        if delta == Vec2::ZERO {
            return delta;
        }
        registry.translate_nodes(&self.members, delta);
        self.top_left = new_origin;
        self.bottom_right += delta;
        delta
    }

    /// Pointer released: any drag or marquee ends.
    pub fn end(&mut self) {
        self.state = SelectionState::Idle;
    }

    /// Returns the bounds if they differ from the last reported pair, and
    /// records them as reported.
    pub fn notify_bounds_changed(&mut self) -> Option<(Point, Point)> {
        let pair = (self.top_left, self.bottom_right);
        if pair == self.reported {
            return None;
        }
        self.reported = pair;
        Some(pair)
    }
}
