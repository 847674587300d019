//! Orthogonal connector routing.
//!
//! A route leaves the source box horizontally from its left or right edge,
//! turns twice, and enters the destination box horizontally. Each end has a
//! one-unit stub between the box edge and its anchor so the first and last
//! segments are always visible.
//!
//! Anchors sit one unit outside the box edges. Both ends use the *source*
//! box height for their vertical centre, which keeps the entry level of the
//! two horizontal segments consistent.
//!
//! When the horizontal spans of the anchors overlap, the route always goes
//! around the right-hand side of both boxes. Otherwise the closest of the
//! four anchor pairs is joined with a three-segment "Z".

use crate::model::Waypoints;
use kurbo::{Point, Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Router {
    unit: f64,
}

impl Default for Router {
    fn default() -> Self {
        Self { unit: 8.0 }
    }
}

#[derive(Debug, Clone, Copy)]
struct Anchors {
    left: Point,
    right: Point,
}

/// One candidate pairing of a source anchor with a destination anchor.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: Point,
    end: Point,
    /// Offset from `start` back to the source box edge.
    start_stub: Vec2,
    /// Offset from `end` back to the destination box edge.
    end_stub: Vec2,
}

impl Router {
    pub fn new(unit: f64) -> Self {
        let unit = if unit.is_finite() && unit > 0.0 { unit } else { 1.0 };
        Self { unit }
    }

    /// Stub length and anchor offset.
    pub fn unit(&self) -> f64 {
        self.unit
    }

    /// Compute the waypoints joining `source` to `destination`.
    ///
    /// Returns an empty list when no anchor pair is far enough apart to
    /// produce a visible route (e.g. both boxes at the same position).
    pub fn route(&self, source: Rect, destination: Rect) -> Waypoints {
        let (src, dst) = (source.abs(), destination.abs());
        let mid = src.height() / 2.0;
        let a = self.anchors(src, mid);
        let b = self.anchors(dst, mid);

        let spans_overlap = (a.left.x >= b.left.x && a.left.x <= b.right.x)
            || (b.left.x >= a.left.x && b.left.x <= a.right.x);

        if spans_overlap {
            self.route_around_right(a.right, b.right)
        } else {
            self.route_closest(a, b)
        }
    }

    fn anchors(&self, r: Rect, mid: f64) -> Anchors {
        let y = r.y0 + mid;
        Anchors {
            left: Point::new(r.x0 - self.unit, y),
            right: Point::new(r.x1 + self.unit, y),
        }
    }

    /// Overlap case: stub → right anchor → two corners on the outermost
    /// right x → right anchor → stub. The vertical leg runs outside both boxes.
    fn route_around_right(&self, start: Point, end: Point) -> Waypoints {
        let stub = Vec2::new(-self.unit, 0.0);
        let max_x = start.x.max(end.x);
        let (low, high) = (start.y.max(end.y), start.y.min(end.y));

        let mut points = Waypoints::new();
        points.push(start + stub);
        points.push(start);
        if start.y > end.y {
            points.push(Point::new(max_x, low));
            points.push(Point::new(max_x, high));
        } else {
            points.push(Point::new(max_x, high));
            points.push(Point::new(max_x, low));
        }
        points.push(end);
        points.push(end + stub);
        points
    }

    fn route_closest(&self, a: Anchors, b: Anchors) -> Waypoints {
        let inward = Vec2::new(self.unit, 0.0);
        let outward = Vec2::new(-self.unit, 0.0);
        // Fixed order decides ties: left-left, left-right, right-left, right-right.
        let candidates = [
            Candidate { start: a.left, end: b.left, start_stub: inward, end_stub: inward },
            Candidate { start: a.left, end: b.right, start_stub: inward, end_stub: outward },
            Candidate { start: a.right, end: b.left, start_stub: outward, end_stub: inward },
            Candidate { start: a.right, end: b.right, start_stub: outward, end_stub: outward },
        ];

        let mut best: Option<(f64, Candidate)> = None;
        for c in candidates {
            let d = c.start.distance(c.end);
            if !d.is_finite() || d < self.unit {
                continue;
            }
            if best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, c));
            }
        }

        let Some((_, c)) = best else {
            return Waypoints::new();
        };

        let mut points = Waypoints::new();
        points.push(c.start + c.start_stub);
        points.extend(z_path(c.start, c.end));
        points.push(c.end + c.end_stub);
        points
    }
}

/// `start`, two elbows on the horizontal midpoint, `end`. The lower elbow
/// comes first when `start` is below `end`.
fn z_path(start: Point, end: Point) -> [Point; 4] {
    let mid_x = (start.x.min(end.x) + start.x.max(end.x)) / 2.0;
    let high = Point::new(mid_x, start.y.min(end.y));
    let low = Point::new(mid_x, start.y.max(end.y));
    if start.y > end.y {
        [start, low, high, end]
    } else {
        [start, high, low, end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pts(v: &[(f64, f64)]) -> Vec<Point> {
        v.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn side_by_side_uses_right_left_pair() {
        let r = Router::new(1.0);
        let path = r.route(Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(30.0, 0.0, 40.0, 10.0));
        assert_eq!(
            path.to_vec(),
            pts(&[(10.0, 5.0), (11.0, 5.0), (20.0, 5.0), (20.0, 5.0), (29.0, 5.0), (30.0, 5.0)])
        );
    }

    #[test]
    fn destination_to_the_left_uses_left_right_pair() {
        let r = Router::new(1.0);
        let path = r.route(Rect::new(30.0, 0.0, 40.0, 10.0), Rect::new(0.0, 20.0, 10.0, 30.0));
        assert_eq!(path.first(), Some(&Point::new(30.0, 5.0)));
        assert_eq!(path.last(), Some(&Point::new(10.0, 25.0)));
    }

    #[test]
    fn z_elbows_ordered_by_vertical_direction() {
        let r = Router::new(1.0);
        // Source below destination: low elbow first.
        let up = r.route(Rect::new(0.0, 40.0, 10.0, 50.0), Rect::new(30.0, 0.0, 40.0, 10.0));
        assert_eq!(up[2], Point::new(20.0, 45.0));
        assert_eq!(up[3], Point::new(20.0, 5.0));
        // Source above destination: high elbow first.
        let down = r.route(Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(30.0, 40.0, 40.0, 50.0));
        assert_eq!(down[2], Point::new(20.0, 5.0));
        assert_eq!(down[3], Point::new(20.0, 45.0));
    }

    #[test]
    fn destination_anchor_uses_source_height() {
        let r = Router::new(1.0);
        // Source height 10, destination height 30: destination anchor y = 0 + 5.
        let path = r.route(Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(30.0, 0.0, 40.0, 30.0));
        assert_eq!(path[4], Point::new(29.0, 5.0));
    }

    #[test]
    fn overlapping_spans_route_around_right() {
        let r = Router::new(1.0);
        // Source below destination.
        let path = r.route(Rect::new(0.0, 40.0, 20.0, 50.0), Rect::new(5.0, 0.0, 15.0, 10.0));
        assert_eq!(
            path.to_vec(),
            pts(&[(20.0, 45.0), (21.0, 45.0), (21.0, 45.0), (21.0, 5.0), (16.0, 5.0), (15.0, 5.0)])
        );
    }

    #[test]
    fn overlapping_spans_source_above() {
        let r = Router::new(1.0);
        let path = r.route(Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(0.0, 30.0, 30.0, 40.0));
        assert_eq!(path.len(), 6);
        assert_eq!(path[2], Point::new(31.0, 5.0));
        assert_eq!(path[3], Point::new(31.0, 35.0));
    }

    #[test]
    fn identical_boxes_route_around_right() {
        let r = Router::new(1.0);
        let b = Rect::new(0.0, 0.0, 10.0, 10.0);
        let path = r.route(b, b);
        assert_eq!(path.len(), 6);
        assert!(path.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn degenerate_pairs_are_skipped() {
        let r = Router::new(8.0);
        let a = Anchors { left: Point::new(0.0, 0.0), right: Point::new(4.0, 0.0) };
        let b = Anchors { left: Point::new(4.0, 0.0), right: Point::new(7.0, 0.0) };
        // Every pair is closer than one unit.
        assert!(r.route_closest(a, b).is_empty());
    }

    #[test]
    fn shortest_pair_wins() {
        let r = Router::new(1.0);
        let a = Anchors { left: Point::new(0.0, 0.0), right: Point::new(10.0, 0.0) };
        let b = Anchors { left: Point::new(20.0, 0.0), right: Point::new(30.0, 0.0) };
        let path = r.route_closest(a, b);
        assert_eq!(path[1], Point::new(10.0, 0.0));
        assert_eq!(path[4], Point::new(20.0, 0.0));
    }

    #[test]
    fn ties_resolve_in_candidate_order() {
        let r = Router::new(1.0);
        // left-left, left-right and right-right are all 5 apart.
        let a = Anchors { left: Point::new(0.0, 0.0), right: Point::new(10.0, 0.0) };
        let b = Anchors { left: Point::new(-5.0, 0.0), right: Point::new(5.0, 0.0) };
        let path = r.route_closest(a, b);
        assert_eq!(path[0], Point::new(1.0, 0.0));
        assert_eq!(path[1], Point::new(0.0, 0.0));
        assert_eq!(path[4], Point::new(-5.0, 0.0));
        assert_eq!(path[5], Point::new(-4.0, 0.0));
    }
}
