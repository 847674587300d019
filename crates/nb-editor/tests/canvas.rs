use nb_core::{CanvasConfig, Entity, EntityRef, LinkId, Node, NodeId, Point, Rect, Size, Vec2};
use nb_editor::*;
use nb_render::{Measure, Renderer};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
struct Host {
    invalidations: AtomicUsize,
    pointer_ready: AtomicUsize,
}

impl CanvasHost for Host {
    fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }

    fn pointer_move_ready(&self) {
        self.pointer_ready.fetch_add(1, Ordering::SeqCst);
    }
}

fn setup(config: CanvasConfig) -> (Canvas, Arc<Host>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let host = Arc::new(Host::default());
    (Canvas::new(config, host.clone()), host)
}

fn node(id: &str, x: f64, y: f64, w: f64, h: f64) -> Node {
    Node::new(id, Point::new(x, y), Size::new(w, h))
}

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

fn redraws(c: &Canvas) -> u64 {
    c.scheduler().redraw().stats().submitted
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(500)).await;
}

struct Nop;

impl Renderer for Nop {
    fn render(&mut self, _entity: EntityRef<'_>) {}
}

/// Two linked nodes with the route already computed.
fn linked(c: &mut Canvas) -> LinkId {
    c.add_node(node("src", 0.0, 0.0, 40.0, 20.0), false).unwrap();
    c.add_node(node("dst", 100.0, 0.0, 40.0, 20.0), false).unwrap();
    let l = c.add_link(id("src"), id("dst"), None).unwrap();
    assert_eq!(c.render(&mut Nop).routes_recomputed, 1);
    assert!(!c.registry().link(l).unwrap().is_dirty());
    l
}

#[tokio::test(start_paused = true)]
async fn remove_cascades_and_requests_one_redraw() {
    let (mut c, _) = setup(CanvasConfig::default());
    c.add_node(node("a", 0.0, 0.0, 40.0, 20.0), false).unwrap();
    c.add_node(node("b", 100.0, 0.0, 40.0, 20.0), false).unwrap();
    c.add_node(node("c", 0.0, 100.0, 40.0, 20.0), false).unwrap();
    c.add_link(id("a"), id("b"), None).unwrap();
    c.add_link(id("c"), id("a"), None).unwrap();
    c.toggle_selected(id("a"));
    c.toggle_selected(id("b"));
    assert_eq!(c.selection().members(), &[id("a"), id("b")]);

    let before = redraws(&c);
    assert!(c.remove_node(id("a")));
    assert_eq!(redraws(&c) - before, 1);

    assert_eq!(c.registry().link_count(), 0);
    assert_eq!(c.selection().members(), &[id("b")]);
    assert_eq!(c.selection().rect(), Rect::new(100.0, 0.0, 140.0, 20.0));
    assert!(!c.remove_node(id("a")));
}

#[tokio::test(start_paused = true)]
async fn link_then_remove_source() {
    let (mut c, _) = setup(CanvasConfig::default());
    c.add_node(node("a", 0.0, 0.0, 10.0, 10.0), false).unwrap();
    c.add_node(node("b", 50.0, 0.0, 10.0, 10.0), false).unwrap();

    let l = c.add_link(id("a"), id("b"), None).unwrap();
    let link = c.registry().link(l).unwrap();
    assert_eq!(link.source(), id("a"));
    assert_eq!(link.destination(), id("b"));

    assert!(c.add_link(id("a"), id("nowhere"), None).is_none());
    c.remove_node(id("a"));
    assert_eq!(c.registry().link_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn duplicate_add_fails_without_redraw() {
    let (mut c, _) = setup(CanvasConfig::default());
    c.add_node(node("a", 0.0, 0.0, 10.0, 10.0), false).unwrap();
    let before = redraws(&c);
    assert!(c.add_node(node("a", 5.0, 5.0, 10.0, 10.0), false).is_err());
    assert_eq!(redraws(&c), before);
    assert!(c.add_node(node("a", 5.0, 5.0, 10.0, 10.0), true).is_ok());
    assert_eq!(c.node(id("a")).unwrap().origin(), Point::new(5.0, 5.0));
}

#[tokio::test(start_paused = true)]
async fn replacing_a_selected_node_keeps_it_selected() {
    let (mut c, _) = setup(CanvasConfig::default());
    c.add_node(node("a", 0.0, 0.0, 16.0, 16.0), false).unwrap();
    c.add_node(node("b", 64.0, 0.0, 16.0, 16.0), false).unwrap();
    assert!(c.select(id("a")));

    c.add_node(node("a", 32.0, 0.0, 16.0, 16.0), true).unwrap();
    assert!(c.selection().is_member(id("a")));
    assert!(c.node(id("a")).unwrap().selected);
    assert_eq!(c.selection().rect(), Rect::new(32.0, 0.0, 48.0, 16.0));

    // Replacing a non-member cannot sneak a selected flag in.
    let mut flagged = node("b", 64.0, 0.0, 16.0, 16.0);
    flagged.selected = true;
    c.add_node(flagged, true).unwrap();
    assert!(!c.node(id("b")).unwrap().selected);
}

#[tokio::test(start_paused = true)]
async fn marquee_through_pointer_input() {
    let config = CanvasConfig {
        grid_size: 1.0,
        ..CanvasConfig::default()
    };
    let (mut c, _) = setup(config);
    c.add_node(node("a", 0.0, 0.0, 10.0, 10.0), false).unwrap();
    c.add_node(node("b", 20.0, 20.0, 10.0, 10.0), false).unwrap();

    c.pointer_pressed(Point::new(-0.5, -0.5), Buttons::PRIMARY, Modifiers::NONE);
    assert!(c.selection().is_empty());

    c.pointer_moved(Point::new(30.5, 30.5), Buttons::PRIMARY, Modifiers::NONE);
    c.process_pointer_move();
    assert_eq!(c.selection().state(), SelectionState::Marquee);
    assert_eq!(c.selection().rect(), Rect::new(-1.0, -1.0, 31.0, 31.0));
    assert_eq!(c.selection().members(), &[id("a"), id("b")]);

    c.pointer_moved(Point::new(14.5, 14.5), Buttons::PRIMARY, Modifiers::NONE);
    c.process_pointer_move();
    assert_eq!(c.selection().members(), &[id("a")]);
    assert!(!c.node(id("b")).unwrap().selected);

    c.pointer_released(Point::new(14.5, 14.5), Buttons::NONE, Modifiers::NONE);
    assert_eq!(c.selection().state(), SelectionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn group_drag_moves_members_and_reports_bounds() {
    let (mut c, _) = setup(CanvasConfig::default());
    c.add_node(node("a", 0.0, 0.0, 16.0, 16.0), false).unwrap();
    c.add_node(node("b", 32.0, 0.0, 16.0, 16.0), false).unwrap();
    c.toggle_selected(id("a"));
    c.toggle_selected(id("b"));
    c.take_events();

    // Press inside the selection, between the two nodes.
    assert!(c.pointer_pressed(Point::new(24.0, 8.0), Buttons::PRIMARY, Modifiers::NONE));
    assert!(c.selection().is_dragging());
    c.pointer_moved(Point::new(24.0, 40.0), Buttons::PRIMARY, Modifiers::NONE);
    c.process_pointer_move();

    assert_eq!(c.node(id("a")).unwrap().origin(), Point::new(0.0, 32.0));
    assert_eq!(c.node(id("b")).unwrap().origin(), Point::new(32.0, 32.0));
    assert_eq!(
        c.take_events(),
        vec![CanvasEvent::SelectionBoundsChanged {
            top_left: Point::new(0.0, 32.0),
            bottom_right: Point::new(48.0, 48.0),
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn zoom_clamps_without_spurious_events() {
    let (mut c, _) = setup(CanvasConfig::default());
    while c.zoom_in() {}
    assert_eq!(c.viewport().zoom(), 3.0);
    c.take_events();

    let before = redraws(&c);
    assert!(!c.zoom_in());
    assert!(!c.set_zoom(10.0));
    assert!(!c.wheel(1.0, Point::new(100.0, 100.0)));
    assert!(c.take_events().is_empty());
    assert_eq!(redraws(&c), before);
}

#[tokio::test(start_paused = true)]
async fn wheel_zooms_about_cursor() {
    let (mut c, _) = setup(CanvasConfig::default());
    let l = linked(&mut c);
    let cursor = Point::new(300.0, 200.0);
    let before = c.screen_to_world(cursor);
    assert!(c.wheel(1.0, cursor));

    let after = c.screen_to_world(cursor);
    assert!((after - before).hypot() < 1e-9);
    let events = c.take_events();
    assert_eq!(events[0], CanvasEvent::ZoomChanged(1.25));
    assert!(matches!(events[1], CanvasEvent::OffsetChanged(_)));

    assert!(c.registry().link(l).unwrap().is_dirty());
    assert_eq!(c.render(&mut Nop).routes_recomputed, 1);
    assert!(!c.registry().link(l).unwrap().is_dirty());
}

#[tokio::test(start_paused = true)]
async fn middle_drag_pans_incrementally() {
    let (mut c, _) = setup(CanvasConfig::default());
    c.set_zoom(2.0);
    let l = linked(&mut c);
    c.pointer_pressed(Point::new(100.0, 100.0), Buttons::MIDDLE, Modifiers::NONE);

    c.pointer_moved(Point::new(120.0, 100.0), Buttons::MIDDLE, Modifiers::NONE);
    c.process_pointer_move();
    assert_eq!(c.viewport().pan(), Vec2::new(10.0, 0.0));
    assert!(c.registry().link(l).unwrap().is_dirty());
    assert_eq!(c.render(&mut Nop).routes_recomputed, 1);

    c.pointer_moved(Point::new(140.0, 110.0), Buttons::MIDDLE, Modifiers::NONE);
    c.process_pointer_move();
    assert_eq!(c.viewport().pan(), Vec2::new(20.0, 5.0));
    assert!(c.take_events().iter().any(|e| matches!(e, CanvasEvent::OffsetChanged(_))));
}

#[tokio::test(start_paused = true)]
async fn pointer_moves_are_coalesced() {
    let (mut c, host) = setup(CanvasConfig::default());
    c.pointer_pressed(Point::new(0.0, 0.0), Buttons::MIDDLE, Modifiers::NONE);
    for x in 1..=20 {
        c.pointer_moved(Point::new(x as f64, 0.0), Buttons::MIDDLE, Modifiers::NONE);
    }
    settle().await;
    assert_eq!(host.pointer_ready.load(Ordering::SeqCst), 1);

    // The host reacts by processing the newest sample only.
    assert!(c.process_pointer_move());
    assert_eq!(c.viewport().pan(), Vec2::new(20.0, 0.0));
    assert!(!c.process_pointer_move());
}

#[tokio::test(start_paused = true)]
async fn redraws_are_coalesced_and_flushable() {
    let (mut c, host) = setup(CanvasConfig::default());
    for i in 0..10 {
        c.add_node(node(&format!("n{i}"), i as f64 * 20.0, 0.0, 10.0, 10.0), false).unwrap();
    }
    settle().await;
    assert_eq!(host.invalidations.load(Ordering::SeqCst), 1);

    c.move_node(id("n0"), Point::new(0.0, 40.0)).unwrap();
    assert!(c.flush().await);
    assert_eq!(host.invalidations.load(Ordering::SeqCst), 2);
    assert!(!c.flush().await);
}

struct Fixed(Size);

impl Measure for Fixed {
    fn measure_bounds(&self, node: &Node) -> Option<Size> {
        (node.id == NodeId::intern("grow")).then_some(self.0)
    }
}

#[tokio::test(start_paused = true)]
async fn remeasure_resizes_and_reroutes() {
    let (mut c, _) = setup(CanvasConfig::default());
    c.add_node(node("grow", 0.0, 0.0, 10.0, 10.0), false).unwrap();
    c.add_node(node("fixed", 100.0, 0.0, 10.0, 10.0), false).unwrap();
    let l = c.add_link(id("grow"), id("fixed"), Some(LinkId::intern("gf"))).unwrap();

    c.render(&mut Nop);
    assert!(!c.registry().link(l).unwrap().is_dirty());

    assert_eq!(c.remeasure(&Fixed(Size::new(40.0, 30.0))), 1);
    assert_eq!(c.node(id("grow")).unwrap().bounds(), Rect::new(0.0, 0.0, 40.0, 30.0));
    assert!(c.registry().link(l).unwrap().is_dirty());
    assert_eq!(c.remeasure(&Fixed(Size::new(40.0, 30.0))), 0);
}

#[tokio::test(start_paused = true)]
async fn containers_carry_children_once() {
    let (mut c, _) = setup(CanvasConfig::default());
    c.add_node(node("child", 8.0, 8.0, 8.0, 8.0), false).unwrap();
    c.add_node(node("box", 0.0, 0.0, 64.0, 64.0).with_children(vec![id("child")]), false)
        .unwrap();

    // Both selected: the child still moves only once.
    c.toggle_selected(id("box"));
    c.toggle_selected(id("child"));
    c.pointer_pressed(Point::new(4.0, 4.0), Buttons::PRIMARY, Modifiers::NONE);
    c.pointer_moved(Point::new(20.0, 4.0), Buttons::PRIMARY, Modifiers::NONE);
    c.process_pointer_move();

    assert_eq!(c.node(id("box")).unwrap().origin(), Point::new(16.0, 0.0));
    assert_eq!(c.node(id("child")).unwrap().origin(), Point::new(24.0, 8.0));

    c.remove_node(id("child"));
    assert!(c.node(id("box")).unwrap().children().is_empty());
}

#[tokio::test(start_paused = true)]
async fn handle_routes_input_events() {
    let (mut c, _) = setup(CanvasConfig::default());
    c.add_node(node("a", 0.0, 0.0, 16.0, 16.0), false).unwrap();
    assert!(c.handle(InputEvent::PointerDown {
        position: Point::new(4.0, 4.0),
        buttons: Buttons::PRIMARY,
        modifiers: Modifiers::SHIFT,
    }));
    assert!(c.selection().is_member(id("a")));
    assert!(c.handle(InputEvent::Wheel {
        delta_y: -1.0,
        position: Point::ZERO,
    }));
    assert_eq!(c.viewport().zoom(), 0.75);
}
