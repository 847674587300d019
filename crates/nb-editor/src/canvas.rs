//! The application-facing canvas.
//!
//! `Canvas` owns the domain state (registry, selection, viewport) and is
//! driven from a single UI thread. Work that must be rate-limited goes
//! through the scheduler, whose command bodies only call back into the
//! [`CanvasHost`]; they never touch domain state themselves.
//!
//! Every mutating operation requests exactly one redraw on the coarse
//! channel. Selection bound changes are reported through the event outbox
//! and ride on that same redraw.

use crate::input::PointerSample;
use crate::selection::{Selection, SelectionState};
use kurbo::{Point, Size, Vec2};
use nb_core::{CanvasConfig, GridSnapper, Link, LinkId, Node, NodeId, Registry, RegistryError, Viewport};
use nb_render::{FrameStats, Measure, PaintOptions, Renderer, paint_scene};
use nb_sched::{Command, Scheduler, SchedulerConfig};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type UiAction = Box<dyn FnOnce() + Send + 'static>;
pub type UiFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// What the embedding toolkit provides.
pub trait CanvasHost: Send + Sync + 'static {
    /// Repaint the canvas (the host then calls [`Canvas::render`]).
    fn invalidate(&self);

    /// A coalesced pointer move is ready; call
    /// [`Canvas::process_pointer_move`] on the UI thread.
    fn pointer_move_ready(&self);

    /// Run `action` on the UI thread. The default runs it inline, which is
    /// correct for hosts whose scheduler runtime *is* the UI thread.
    fn run_on_ui_thread(&self, action: UiAction) -> UiFuture {
        action();
        Box::pin(std::future::ready(()))
    }
}

/// Change notifications, drained with [`Canvas::take_events`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasEvent {
    ZoomChanged(f64),
    OffsetChanged(Vec2),
    SelectionBoundsChanged { top_left: Point, bottom_right: Point },
}

pub struct Canvas {
    pub(crate) registry: Registry,
    pub(crate) selection: Selection,
    pub(crate) viewport: Viewport,
    pub(crate) snapper: GridSnapper,
    pub(crate) config: CanvasConfig,
    scheduler: Scheduler,
    host: Arc<dyn CanvasHost>,
    events: Vec<CanvasEvent>,
    /// Screen position of the last press (re-based on every middle-button pan step).
    pub(crate) last_pressed: Point,
    pub(crate) pending_move: Option<PointerSample>,
}

impl Canvas {
    /// Build a canvas whose scheduler runs on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(config: CanvasConfig, host: Arc<dyn CanvasHost>) -> Self {
        let scheduler = Scheduler::new(SchedulerConfig::from_millis(
            config.redraw_delay_ms,
            config.pointer_delay_ms,
        ));
        Self::with_scheduler(config, scheduler, host)
    }

    pub fn with_scheduler(config: CanvasConfig, scheduler: Scheduler, host: Arc<dyn CanvasHost>) -> Self {
        Self {
            registry: Registry::new(config.router()),
            selection: Selection::new(),
            viewport: Viewport::new(config.zoom_limits(), Size::new(800.0, 600.0)),
            snapper: config.snapper(),
            config,
            scheduler,
            host,
            events: Vec::new(),
            last_pressed: Point::ZERO,
            pending_move: None,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Drain queued change notifications, oldest first.
    pub fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    // ─── Scheduling ──────────────────────────────────────────────────────

    /// Ask the host to repaint, coalesced on the redraw channel.
    pub fn request_redraw(&self) {
        let host = Arc::clone(&self.host);
        self.scheduler.redraw().submit(Command::new(move || async move {
            let ui = Arc::clone(&host);
            host.run_on_ui_thread(Box::new(move || ui.invalidate())).await;
            Ok(())
        }));
    }

    pub(crate) fn request_pointer_move(&self) {
        let host = Arc::clone(&self.host);
        self.scheduler.pointer().submit(Command::new(move || async move {
            let ui = Arc::clone(&host);
            host.run_on_ui_thread(Box::new(move || ui.pointer_move_ready())).await;
            Ok(())
        }));
    }

    /// Run any pending redraw now. Returns `false` if none was pending.
    pub async fn flush(&self) -> bool {
        self.scheduler.redraw().flush().await
    }

    pub(crate) fn push_event(&mut self, event: CanvasEvent) {
        log::trace!("canvas event: {event:?}");
        self.events.push(event);
    }

    /// Queue a bounds notification if the selection corners moved.
    pub(crate) fn sync_selection(&mut self) {
        if let Some((top_left, bottom_right)) = self.selection.notify_bounds_changed() {
            self.push_event(CanvasEvent::SelectionBoundsChanged { top_left, bottom_right });
        }
    }

    /// Re-fit the selection to its members (not while a marquee is live).
    fn reframe_selection(&mut self) {
        if self.selection.state() != SelectionState::Marquee {
            self.selection.update_bounds(&self.registry);
        }
        self.sync_selection();
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    pub fn add_node(&mut self, node: Node, replace: bool) -> Result<(), RegistryError> {
        let id = node.id;
        self.registry.add(node, replace)?;
        if replace && self.selection.is_member(id) {
            self.reframe_selection();
        }
        self.request_redraw();
        Ok(())
    }

    /// Returns how many nodes were stored.
    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = Node>, replace: bool, clear: bool) -> usize {
        if clear {
            let anchor = self.selection.top_left();
            self.selection.clear(&mut self.registry, anchor);
        }
        let added = self.registry.add_many(nodes, replace, clear);
        self.reframe_selection();
        self.request_redraw();
        added
    }

    /// Remove a node, every link touching it, and its selection membership.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let Some((_, links)) = self.registry.remove(id) else {
            return false;
        };
        log::debug!("canvas: removed {id} with {} link(s)", links.len());
        if self.selection.remove_member(&mut self.registry, id) {
            self.reframe_selection();
        }
        self.request_redraw();
        true
    }

    /// Returns how many nodes were removed.
    pub fn remove_nodes_where(&mut self, pred: impl Fn(&Node) -> bool) -> usize {
        let removed = self.registry.remove_where(pred);
        if removed.is_empty() {
            return 0;
        }
        for (node, _) in &removed {
            self.selection.remove_member(&mut self.registry, node.id);
        }
        self.reframe_selection();
        self.request_redraw();
        removed.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.registry.get(id)
    }

    /// Topmost node at a world position.
    pub fn node_at(&self, world: Point) -> Option<&Node> {
        self.registry.get_at(world)
    }

    pub fn node_at_screen(&self, screen: Point) -> Option<NodeId> {
        nb_render::node_at_screen(&self.registry, &self.viewport, screen)
    }

    pub fn move_node(&mut self, id: NodeId, origin: Point) -> Result<bool, RegistryError> {
        if !self.registry.set_origin(id, origin)? {
            return Ok(false);
        }
        self.reframe_selection();
        self.request_redraw();
        Ok(true)
    }

    pub fn resize_node(&mut self, id: NodeId, size: Size) -> Result<bool, RegistryError> {
        if !self.registry.set_size(id, size)? {
            return Ok(false);
        }
        self.reframe_selection();
        self.request_redraw();
        Ok(true)
    }

    /// Ask `measure` for every node's size and apply the changes. Returns how
    /// many nodes changed size.
    pub fn remeasure(&mut self, measure: &dyn Measure) -> usize {
        let sizes: Vec<(NodeId, Size)> = self
            .registry
            .nodes()
            .filter_map(|n| measure.measure_bounds(n).map(|s| (n.id, s)))
            .collect();
        let changed = sizes
            .into_iter()
            .filter(|(id, size)| self.registry.set_size(*id, *size).unwrap_or(false))
            .count();
        if changed > 0 {
            self.reframe_selection();
            self.request_redraw();
        }
        changed
    }

    // ─── Links ───────────────────────────────────────────────────────────

    /// Connect two nodes. Unknown endpoints are logged and ignored.
    pub fn add_link(&mut self, from: NodeId, to: NodeId, id: Option<LinkId>) -> Option<LinkId> {
        let id = self.registry.add_link(from, to, id)?;
        self.request_redraw();
        Some(id)
    }

    pub fn remove_link(&mut self, id: LinkId) -> bool {
        if self.registry.remove_link(id).is_none() {
            return false;
        }
        self.request_redraw();
        true
    }

    pub fn remove_links_where(&mut self, pred: impl Fn(&Link) -> bool) -> usize {
        let removed = self.registry.remove_links_where(pred).len();
        if removed > 0 {
            self.request_redraw();
        }
        removed
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select exactly `id`.
    pub fn select(&mut self, id: NodeId) -> bool {
        if !self.selection.select_only(&mut self.registry, id) {
            return false;
        }
        self.sync_selection();
        self.request_redraw();
        true
    }

    /// Shift-click semantics without a pointer.
    pub fn toggle_selected(&mut self, id: NodeId) -> bool {
        if !self.selection.toggle(&mut self.registry, id) {
            return false;
        }
        self.sync_selection();
        self.request_redraw();
        true
    }

    pub fn clear_selection(&mut self) {
        let anchor = self.selection.top_left();
        self.selection.clear(&mut self.registry, anchor);
        self.sync_selection();
        self.request_redraw();
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let changed = self.viewport.set_zoom(zoom);
        self.after_zoom(changed)
    }

    pub fn zoom_in(&mut self) -> bool {
        let changed = self.viewport.zoom_in();
        self.after_zoom(changed)
    }

    pub fn zoom_out(&mut self) -> bool {
        let changed = self.viewport.zoom_out();
        self.after_zoom(changed)
    }

    fn after_zoom(&mut self, changed: bool) -> bool {
        if !changed {
            return false;
        }
        self.push_event(CanvasEvent::ZoomChanged(self.viewport.zoom()));
        self.registry.invalidate_routes();
        self.request_redraw();
        true
    }

    pub fn set_pan(&mut self, pan: Vec2) -> bool {
        let changed = self.viewport.set_pan(pan);
        self.after_pan(changed)
    }

    pub(crate) fn after_pan(&mut self, changed: bool) -> bool {
        if !changed {
            return false;
        }
        self.push_event(CanvasEvent::OffsetChanged(self.viewport.pan()));
        self.registry.invalidate_routes();
        self.request_redraw();
        true
    }

    pub fn resize_viewport(&mut self, size: Size) {
        self.viewport.resize(size);
        self.request_redraw();
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        self.viewport.screen_to_world(p)
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        self.viewport.world_to_screen(p)
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Paint one frame. Call from the host's repaint handler.
    pub fn render(&mut self, renderer: &mut dyn Renderer) -> FrameStats {
        let options = PaintOptions {
            grid_style: self.config.grid_style,
            snapper: self.snapper,
            selection: Some(self.selection.rect()),
        };
        paint_scene(&mut self.registry, &self.viewport, &options, renderer)
    }
}
