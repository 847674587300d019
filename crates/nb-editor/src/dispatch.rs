//! Pointer and wheel input → selection / viewport / registry calls.
//!
//! | Input                          | Effect |
//! |--------------------------------|--------|
//! | Shift + primary press on node  | toggle membership |
//! | Primary press inside selection | start group drag |
//! | Primary press on other node    | select it, drag if draggable |
//! | Primary press on background    | clear, anchor marquee |
//! | Primary move                   | drag group, or grow marquee past threshold |
//! | Middle move                    | pan |
//! | Wheel                          | zoom about the cursor |
//!
//! Moves are coalesced: [`Canvas::pointer_moved`] only records the newest
//! sample and schedules a pointer-channel command; the host then calls
//! [`Canvas::process_pointer_move`] on the UI thread.

use crate::canvas::{Canvas, CanvasEvent};
use crate::input::{Buttons, InputEvent, Modifiers, PointerSample};
use crate::selection::SelectionState;
use kurbo::{Point, Vec2};
use nb_core::Entity;

impl Canvas {
    /// Route one input event. Returns whether it was handled.
    pub fn handle(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { position, buttons, modifiers } => {
                self.pointer_pressed(position, buttons, modifiers)
            }
            InputEvent::PointerMove { position, buttons, modifiers } => {
                self.pointer_moved(position, buttons, modifiers)
            }
            InputEvent::PointerUp { position, buttons, modifiers } => {
                self.pointer_released(position, buttons, modifiers)
            }
            InputEvent::Wheel { delta_y, position } => self.wheel(delta_y, position),
        }
    }

    pub fn pointer_pressed(&mut self, position: Point, buttons: Buttons, modifiers: Modifiers) -> bool {
        self.last_pressed = position;
        self.pending_move = None;

        if buttons.primary && modifiers.shift {
            let world = self.viewport.screen_to_world(position);
            if let Some(id) = self.registry.get_at(world).map(|n| n.id)
                && self.selection.toggle(&mut self.registry, id)
            {
                self.sync_selection();
                self.request_redraw();
            }
            return true;
        }

        if buttons.primary {
            return self.press_primary(position);
        }
        // Middle press only anchors a pan.
        buttons.middle
    }

    fn press_primary(&mut self, position: Point) -> bool {
        let world = self.viewport.screen_to_world(position);

        if !self.selection.is_empty() && self.selection.contains(world) {
            self.selection.begin_drag(world);
            return true;
        }

        if let Some((id, draggable)) = self.registry.get_at(world).map(|n| (n.id, n.is_draggable())) {
            self.selection.select_only(&mut self.registry, id);
            if draggable {
                self.selection.begin_drag(world);
            }
        } else {
            let anchor = self.snapper.origin(world);
            self.selection.clear(&mut self.registry, anchor);
        }
        self.sync_selection();
        self.request_redraw();
        true
    }

    /// Record a move and schedule its processing. Returns `false` when no
    /// button that moves anything is held.
    pub fn pointer_moved(&mut self, position: Point, buttons: Buttons, modifiers: Modifiers) -> bool {
        if !(buttons.primary || buttons.middle) {
            return false;
        }
        self.pending_move = Some(PointerSample { position, buttons, modifiers });
        self.request_pointer_move();
        true
    }

    /// Apply the newest recorded move, if any.
    pub fn process_pointer_move(&mut self) -> bool {
        match self.pending_move.take() {
            Some(sample) => self.apply_pointer_move(sample),
            None => false,
        }
    }

    fn apply_pointer_move(&mut self, sample: PointerSample) -> bool {
        let PointerSample { position, buttons, modifiers } = sample;

        if buttons.primary && modifiers.shift {
            return true;
        }
        if buttons.middle {
            self.pan_step(position);
            return true;
        }
        if !buttons.primary {
            return false;
        }

        if self.selection.is_dragging() {
            let total = (position - self.last_pressed) / self.viewport.zoom();
            let moved = self.selection.drag(&mut self.registry, total, &self.snapper);
            if moved != Vec2::ZERO {
                self.sync_selection();
                self.request_redraw();
            }
            return true;
        }

        let marquee_live = self.selection.state() == SelectionState::Marquee;
        if !marquee_live && self.last_pressed.distance(position) < self.config.marquee_threshold {
            return true;
        }

        let anchor = self.snapper.origin(self.viewport.screen_to_world(self.last_pressed));
        self.selection.clear(&mut self.registry, anchor);
        let far = self.snapper.origin(self.viewport.screen_to_world(position)) + self.snapper.step();
        self.selection.marquee_to(&mut self.registry, far);
        self.sync_selection();
        self.request_redraw();
        true
    }

    fn pan_step(&mut self, position: Point) {
        let delta = position - self.last_pressed;
        self.last_pressed = position;
        let changed = self.viewport.pan_by_screen(delta);
        self.after_pan(changed);
    }

    /// Apply any move still pending, then end drag and marquee.
    pub fn pointer_released(&mut self, _position: Point, _buttons: Buttons, _modifiers: Modifiers) -> bool {
        if let Some(sample) = self.pending_move.take() {
            self.apply_pointer_move(sample);
        }
        self.selection.end();
        self.request_redraw();
        true
    }

    /// One wheel notch at a screen position.
    pub fn wheel(&mut self, delta_y: f64, position: Point) -> bool {
        let change = self.viewport.wheel(delta_y, position);
        if !change.zoom {
            return false;
        }
        self.push_event(CanvasEvent::ZoomChanged(self.viewport.zoom()));
        if change.pan {
            self.push_event(CanvasEvent::OffsetChanged(self.viewport.pan()));
        }
        self.registry.invalidate_routes();
        self.request_redraw();
        true
    }
}
