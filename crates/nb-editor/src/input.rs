//! Input abstraction layer.
//!
//! Positions are screen-space pixels relative to the canvas. The host
//! translates its toolkit's pointer events into these.

use kurbo::Point;

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };
}

/// Pointer buttons held during a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buttons {
    pub primary: bool,
    pub middle: bool,
    pub secondary: bool,
}

impl Buttons {
    pub const NONE: Self = Self {
        primary: false,
        middle: false,
        secondary: false,
    };

    pub const PRIMARY: Self = Self {
        primary: true,
        ..Self::NONE
    };

    pub const MIDDLE: Self = Self {
        middle: true,
        ..Self::NONE
    };
}

/// A normalized input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown {
        position: Point,
        buttons: Buttons,
        modifiers: Modifiers,
    },
    PointerMove {
        position: Point,
        buttons: Buttons,
        modifiers: Modifiers,
    },
    PointerUp {
        position: Point,
        buttons: Buttons,
        modifiers: Modifiers,
    },
    /// Wheel notch; positive `delta_y` zooms in.
    Wheel { delta_y: f64, position: Point },
}

/// One pointer-move observation, kept until the pointer channel admits it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub position: Point,
    pub buttons: Buttons,
    pub modifiers: Modifiers,
}
