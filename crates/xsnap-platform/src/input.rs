use std::time::Instant;

use anyhow::Result;

use crate::screen::WindowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Press,
    Release,
}

/// Which pointer events an exclusive grab should deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabScope {
    /// Button presses only
    Click,
    /// Button presses and releases
    Drag,
}

/// A pointer event delivered while the pointer is grabbed.
/// Coordinates are absolute (root window) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Button {
        button: u8,
        action: ButtonAction,
        x: i32,
        y: i32,
        /// Top-level window under the pointer, if any
        child: Option<WindowId>,
    },
    Motion {
        x: i32,
        y: i32,
    },
}

impl PointerEvent {
    pub fn press(button: u8, x: i32, y: i32) -> Self {
        PointerEvent::Button { button, action: ButtonAction::Press, x, y, child: None }
    }

    pub fn release(button: u8, x: i32, y: i32) -> Self {
        PointerEvent::Button { button, action: ButtonAction::Release, x, y, child: None }
    }
}

/// Exclusive pointer access on the display.
///
/// Only one grab may be held at a time; callers pair every successful
/// `grab` with an `ungrab`.
pub trait PointerDevice {
    /// Grab the pointer and show a crosshair cursor
    fn grab(&mut self, scope: GrabScope) -> Result<()>;

    /// Release the grab and the cursor. Must be safe to call when not grabbed.
    fn ungrab(&mut self);

    /// Block for the next event. Returns `Ok(None)` once `deadline` passes.
    fn next_event(&mut self, deadline: Option<Instant>) -> Result<Option<PointerEvent>>;
}
