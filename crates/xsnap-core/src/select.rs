//! Interactive capture-bounds selection driven by grabbed pointer events.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use xsnap_platform::input::{ButtonAction, GrabScope, PointerDevice, PointerEvent};
use xsnap_platform::screen::{CaptureRegion, WindowId};

/// Drag-selection progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    AwaitingPress,
    AwaitingRelease { x: i32, y: i32, button: u8 },
    Resolved(CaptureRegion),
    Cancelled,
}

/// Press-drag-release state machine.
///
/// Motion events, presses after the first one, and releases of any other
/// button are ignored. A drag that spans no area resolves to `Cancelled`.
#[derive(Debug)]
pub struct RegionSelector {
    state: SelectionState,
}

impl Default for RegionSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionSelector {
    pub fn new() -> Self {
        Self { state: SelectionState::Idle }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, SelectionState::Resolved(_) | SelectionState::Cancelled)
    }

    /// Start listening for the first press
    pub fn begin(&mut self) {
        if self.state == SelectionState::Idle {
            self.state = SelectionState::AwaitingPress;
        }
    }

    /// Abandon an unfinished selection
    pub fn cancel(&mut self) {
        if !self.is_finished() {
            self.state = SelectionState::Cancelled;
        }
    }

    pub fn handle_event(&mut self, event: &PointerEvent) -> SelectionState {
        let PointerEvent::Button { button, action, x, y, .. } = *event else {
            return self.state;
        };

        match (self.state, action) {
            (SelectionState::AwaitingPress, ButtonAction::Press) => {
                debug!("selection anchored at ({}, {}) by button {}", x, y, button);
                self.state = SelectionState::AwaitingRelease { x, y, button };
            }
            (SelectionState::AwaitingRelease { x: x1, y: y1, button: held }, ButtonAction::Release)
                if held == button =>
            {
                self.state = resolve_drag(x1, y1, x, y);
            }
            _ => {}
        }

        self.state
    }
}

fn resolve_drag(x1: i32, y1: i32, x2: i32, y2: i32) -> SelectionState {
    let width = x1.abs_diff(x2);
    let height = y1.abs_diff(y2);
    if width == 0 || height == 0 {
        return SelectionState::Cancelled;
    }

    let x = x1.min(x2).max(0) as u32;
    let y = y1.min(y2).max(0) as u32;
    SelectionState::Resolved(CaptureRegion::new(x, y, width, height))
}

/// Scoped exclusive pointer grab.
///
/// The grab and its crosshair cursor are released when this guard drops,
/// whichever way the selection ends.
pub struct PointerGrab<'a> {
    device: &'a mut dyn PointerDevice,
}

impl<'a> PointerGrab<'a> {
    pub fn acquire(device: &'a mut dyn PointerDevice, scope: GrabScope) -> Result<Self> {
        device.grab(scope).context("failed to grab pointer")?;
        debug!("pointer grabbed ({:?})", scope);
        Ok(Self { device })
    }

    pub fn next_event(&mut self, deadline: Option<Instant>) -> Result<Option<PointerEvent>> {
        self.device.next_event(deadline)
    }
}

impl Drop for PointerGrab<'_> {
    fn drop(&mut self) {
        self.device.ungrab();
        debug!("pointer grab released");
    }
}

/// Result of a drag selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Region(CaptureRegion),
    Cancelled,
}

/// Result of a click-to-pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPick {
    Window(WindowId),
    /// Clicked on the desktop itself
    Root,
    Cancelled,
}

/// Grab the pointer and let the user drag out a rectangle.
///
/// Blocks until the drag completes, or until `timeout` passes when one is set.
pub fn select_region(device: &mut dyn PointerDevice, timeout: Option<Duration>) -> Result<Selection> {
    let mut selector = RegionSelector::new();
    let mut grab = PointerGrab::acquire(device, GrabScope::Drag)?;
    let deadline = timeout.map(|t| Instant::now() + t);

    selector.begin();
    while !selector.is_finished() {
        match grab.next_event(deadline)? {
            Some(event) => {
                selector.handle_event(&event);
            }
            None => {
                warn!("region selection timed out");
                selector.cancel();
            }
        }
    }
    drop(grab);

    match selector.state() {
        SelectionState::Resolved(region) => {
            info!(
                "selected {}x{} region at ({}, {})",
                region.width, region.height, region.x, region.y
            );
            Ok(Selection::Region(region))
        }
        _ => {
            info!("region selection cancelled");
            Ok(Selection::Cancelled)
        }
    }
}

/// Grab the pointer and return the window under the first button press.
pub fn pick_window(device: &mut dyn PointerDevice, timeout: Option<Duration>) -> Result<WindowPick> {
    let mut grab = PointerGrab::acquire(device, GrabScope::Click)?;
    let deadline = timeout.map(|t| Instant::now() + t);

    loop {
        match grab.next_event(deadline)? {
            Some(PointerEvent::Button { action: ButtonAction::Press, child, x, y, .. }) => {
                debug!("click at ({}, {}) on {:?}", x, y, child);
                return Ok(child.map_or(WindowPick::Root, WindowPick::Window));
            }
            Some(_) => continue,
            None => {
                warn!("window pick timed out");
                return Ok(WindowPick::Cancelled);
            }
        }
    }
}
