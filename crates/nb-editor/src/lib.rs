//! Canvas controller: turns pointer input into selection, drag, pan and
//! zoom, and keeps redraw requests coalesced.

pub mod canvas;
pub mod dispatch;
pub mod input;
pub mod selection;

pub use canvas::{Canvas, CanvasEvent, CanvasHost, UiAction, UiFuture};
pub use input::{Buttons, InputEvent, Modifiers, PointerSample};
pub use selection::{Selection, SelectionState};
