//! Exclusive pointer grab with a crosshair cursor on the X11 root window.

use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use xcb::{x, Xid};
use xsnap_platform::input::{ButtonAction, GrabScope, PointerDevice, PointerEvent};
use xsnap_platform::screen::WindowId;

use crate::screen_x11::X11Session;

/// Glyph index of the crosshair in the standard X cursor font
const XC_CROSSHAIR: u16 = 34;

/// How often to poll for events when a selection deadline is set
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Pointer access on an X11 session.
///
/// Holds the grab and its cursor between `grab` and `ungrab`; dropping the
/// pointer releases both.
pub struct X11Pointer<'s> {
    session: &'s X11Session,
    cursor: Option<x::Cursor>,
}

impl<'s> X11Pointer<'s> {
    pub fn new(session: &'s X11Session) -> Self {
        Self { session, cursor: None }
    }

    fn create_crosshair(&self) -> Result<x::Cursor> {
        let conn = self.session.conn();

        let font: x::Font = conn.generate_id();
        conn.send_and_check_request(&x::OpenFont { fid: font, name: b"cursor" })
            .context("failed to open X cursor font")?;

        let cursor: x::Cursor = conn.generate_id();
        let created = conn.send_and_check_request(&x::CreateGlyphCursor {
            cid: cursor,
            source_font: font,
            mask_font: font,
            source_char: XC_CROSSHAIR,
            mask_char: XC_CROSSHAIR + 1,
            fore_red: 0,
            fore_green: 0,
            fore_blue: 0,
            back_red: 0xffff,
            back_green: 0xffff,
            back_blue: 0xffff,
        });
        conn.send_request(&x::CloseFont { font });
        created.context("failed to create crosshair cursor")?;

        Ok(cursor)
    }

    fn free_cursor(&self, cursor: x::Cursor) {
        let conn = self.session.conn();
        conn.send_request(&x::FreeCursor { cursor });
        if let Err(e) = conn.flush() {
            tracing::warn!("failed to flush X11 connection: {}", e);
        }
    }
}

impl PointerDevice for X11Pointer<'_> {
    fn grab(&mut self, scope: GrabScope) -> Result<()> {
        if self.cursor.is_some() {
            bail!("pointer is already grabbed by this session");
        }

        let cursor = self.create_crosshair()?;
        let event_mask = match scope {
            GrabScope::Click => x::EventMask::BUTTON_PRESS,
            GrabScope::Drag => x::EventMask::BUTTON_PRESS | x::EventMask::BUTTON_RELEASE,
        };

        let conn = self.session.conn();
        let cookie = conn.send_request(&x::GrabPointer {
            owner_events: false,
            grab_window: self.session.root(),
            event_mask,
            pointer_mode: x::GrabMode::Async,
            keyboard_mode: x::GrabMode::Async,
            confine_to: x::Window::none(),
            cursor,
            time: x::CURRENT_TIME,
        });

        let status = match conn.wait_for_reply(cookie) {
            Ok(reply) => reply.status(),
            Err(e) => {
                self.free_cursor(cursor);
                return Err(e).context("GrabPointer failed");
            }
        };
        if status != x::GrabStatus::Success {
            self.free_cursor(cursor);
            bail!("pointer grab refused: {:?}", status);
        }

        tracing::debug!("pointer grabbed for {:?}", scope);
        self.cursor = Some(cursor);
        Ok(())
    }

    fn ungrab(&mut self) {
        let Some(cursor) = self.cursor.take() else {
            return;
        };
        self.session
            .conn()
            .send_request(&x::UngrabPointer { time: x::CURRENT_TIME });
        self.free_cursor(cursor);
        tracing::debug!("pointer ungrabbed");
    }

    fn next_event(&mut self, deadline: Option<Instant>) -> Result<Option<PointerEvent>> {
        let conn = self.session.conn();

        loop {
            let event = match deadline {
                None => conn.wait_for_event().context("failed to read X11 event")?,
                Some(deadline) => match conn.poll_for_event().context("failed to read X11 event")? {
                    Some(event) => event,
                    None if Instant::now() >= deadline => return Ok(None),
                    None => {
                        std::thread::sleep(POLL_INTERVAL);
                        continue;
                    }
                },
            };

            if let Some(event) = translate(event) {
                return Ok(Some(event));
            }
        }
    }
}

impl Drop for X11Pointer<'_> {
    fn drop(&mut self) {
        self.ungrab();
    }
}

fn translate(event: xcb::Event) -> Option<PointerEvent> {
    match event {
        xcb::Event::X(x::Event::ButtonPress(ev)) => Some(PointerEvent::Button {
            button: ev.detail(),
            action: ButtonAction::Press,
            x: ev.root_x() as i32,
            y: ev.root_y() as i32,
            child: window_id(ev.child()),
        }),
        xcb::Event::X(x::Event::ButtonRelease(ev)) => Some(PointerEvent::Button {
            button: ev.detail(),
            action: ButtonAction::Release,
            x: ev.root_x() as i32,
            y: ev.root_y() as i32,
            child: window_id(ev.child()),
        }),
        xcb::Event::X(x::Event::MotionNotify(ev)) => Some(PointerEvent::Motion {
            x: ev.root_x() as i32,
            y: ev.root_y() as i32,
        }),
        _ => None,
    }
}

fn window_id(window: x::Window) -> Option<WindowId> {
    if window.is_none() {
        None
    } else {
        Some(WindowId(window.resource_id()))
    }
}
