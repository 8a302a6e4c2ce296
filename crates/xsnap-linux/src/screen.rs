//! Display server detection.

use anyhow::{bail, Result};

pub use crate::screen_x11::X11Session;

/// Connect to the X server named by `DISPLAY` (X11 or XWayland).
pub fn connect_display() -> Result<X11Session> {
    if std::env::var_os("DISPLAY").is_some() {
        tracing::info!("detected X11 display, using xcb capture");
        return X11Session::connect(None);
    }

    if std::env::var_os("WAYLAND_DISPLAY").is_some() {
        bail!("Wayland session without XWayland: set DISPLAY to an X server to capture");
    }

    bail!("no display server detected: set DISPLAY for X11");
}
