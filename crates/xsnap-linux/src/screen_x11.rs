//! X11 session handle and pixel capture over xcb `GetImage`.

use anyhow::{Context, Result};
use xcb::{x, XidNew};
use xsnap_platform::screen::{
    ByteOrder, CaptureRegion, PixelBuffer, PixelFormat, PixelSource, Surface, WindowId,
};

/// One connection to the X server, passed explicitly to every X11 component.
pub struct X11Session {
    conn: xcb::Connection,
    screen_num: i32,
    root: x::Window,
    root_visual: x::Visualid,
}

impl X11Session {
    /// Connect to `display`, or to `$DISPLAY` when `None`
    pub fn connect(display: Option<&str>) -> Result<Self> {
        let (conn, screen_num) = xcb::Connection::connect(display)
            .context("failed to connect to X11 display")?;

        let setup = conn.get_setup();
        let screen = setup
            .roots()
            .nth(screen_num as usize)
            .context("no X11 screen found")?;

        let root = screen.root();
        let root_visual = screen.root_visual();

        tracing::info!(
            "connected to X11 screen {}: {}x{}, depth {}",
            screen_num,
            screen.width_in_pixels(),
            screen.height_in_pixels(),
            screen.root_depth()
        );

        Ok(Self { conn, screen_num, root, root_visual })
    }

    pub(crate) fn conn(&self) -> &xcb::Connection {
        &self.conn
    }

    pub(crate) fn root(&self) -> x::Window {
        self.root
    }

    fn geometry(&self, window: x::Window) -> Result<CaptureRegion> {
        let cookie = self.conn.send_request(&x::GetGeometry {
            drawable: x::Drawable::Window(window),
        });
        let reply = self.conn.wait_for_reply(cookie).context("GetGeometry failed")?;
        Ok(CaptureRegion::sized(reply.width() as u32, reply.height() as u32))
    }

    /// Describe the layout of a `GetImage` reply with the given depth and visual.
    fn pixel_format(&self, depth: u8, visual: x::Visualid) -> Result<PixelFormat> {
        let setup = self.conn.get_setup();
        let format = setup
            .pixmap_formats()
            .iter()
            .find(|f| f.depth() == depth)
            .with_context(|| format!("server has no pixmap format for depth {}", depth))?;

        // pixmaps report visual 0; they share the root visual's layout
        let visual = if visual == 0 { self.root_visual } else { visual };
        let (red_mask, green_mask, blue_mask) = self
            .visual_masks(visual)
            .with_context(|| format!("visual {:#x} not found on screen", visual))?;

        Ok(PixelFormat {
            depth,
            bits_per_pixel: format.bits_per_pixel(),
            red_mask,
            green_mask,
            blue_mask,
            byte_order: byte_order(setup.image_byte_order()),
        })
    }

    fn visual_masks(&self, id: x::Visualid) -> Option<(u32, u32, u32)> {
        let setup = self.conn.get_setup();
        let screen = setup.roots().nth(self.screen_num as usize)?;
        for depth in screen.allowed_depths() {
            for visual in depth.visuals() {
                if visual.visual_id() == id {
                    return Some((visual.red_mask(), visual.green_mask(), visual.blue_mask()));
                }
            }
        }
        None
    }

    fn scanline_pad(&self, depth: u8) -> u8 {
        self.conn
            .get_setup()
            .pixmap_formats()
            .iter()
            .find(|f| f.depth() == depth)
            .map(|f| f.scanline_pad())
            .unwrap_or(32)
    }
}

impl PixelSource for X11Session {
    fn display_bounds(&self) -> Result<CaptureRegion> {
        self.geometry(self.root)
    }

    fn window_bounds(&self, window: WindowId) -> Result<CaptureRegion> {
        self.geometry(x11_window(window))
            .with_context(|| format!("failed to query window {:#x}", window.0))
    }

    fn capture(&self, surface: Surface, region: CaptureRegion) -> Result<PixelBuffer> {
        let drawable = match surface {
            Surface::Root => x::Drawable::Window(self.root),
            Surface::Window(id) => x::Drawable::Window(x11_window(id)),
        };

        let origin_x = i16::try_from(region.x).context("capture x out of range")?;
        let origin_y = i16::try_from(region.y).context("capture y out of range")?;
        let width = u16::try_from(region.width).context("capture width out of range")?;
        let height = u16::try_from(region.height).context("capture height out of range")?;

        let cookie = self.conn.send_request(&x::GetImage {
            format: x::ImageFormat::ZPixmap,
            drawable,
            x: origin_x,
            y: origin_y,
            width,
            height,
            plane_mask: u32::MAX,
        });
        let reply = self
            .conn
            .wait_for_reply(cookie)
            .context("GetImage failed")?;

        let format = self.pixel_format(reply.depth(), reply.visual())?;
        let stride = row_stride(region.width, format.bits_per_pixel, self.scanline_pad(reply.depth()));

        tracing::debug!(
            "GetImage {}x{} at ({}, {}): depth {}, {} bpp, {} bytes",
            width,
            height,
            origin_x,
            origin_y,
            format.depth,
            format.bits_per_pixel,
            reply.data().len()
        );

        PixelBuffer::new(region.width, region.height, stride, format, reply.data().to_vec())
            .context("malformed GetImage reply")
    }
}

fn x11_window(id: WindowId) -> x::Window {
    // SAFETY: WindowId values are only minted from window ids the server sent us
    unsafe { x::Window::new(id.0) }
}

fn byte_order(order: x::ImageOrder) -> ByteOrder {
    match order {
        x::ImageOrder::LsbFirst => ByteOrder::LsbFirst,
        x::ImageOrder::MsbFirst => ByteOrder::MsbFirst,
    }
}

/// Bytes per ZPixmap row: `width * bpp` bits rounded up to the scanline pad.
fn row_stride(width: u32, bits_per_pixel: u8, scanline_pad: u8) -> usize {
    let pad = scanline_pad.max(8) as usize;
    let bits = width as usize * bits_per_pixel as usize;
    bits.div_ceil(pad) * pad / 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_stride_32bpp() {
        assert_eq!(row_stride(1920, 32, 32), 7680);
        assert_eq!(row_stride(1, 32, 32), 4);
    }

    #[test]
    fn test_row_stride_pads_24bpp_rows() {
        // 5 * 24 = 120 bits, padded to 128
        assert_eq!(row_stride(5, 24, 32), 16);
        assert_eq!(row_stride(4, 24, 32), 12);
    }

    #[test]
    fn test_byte_order_mapping() {
        assert_eq!(byte_order(x::ImageOrder::LsbFirst), ByteOrder::LsbFirst);
        assert_eq!(byte_order(x::ImageOrder::MsbFirst), ByteOrder::MsbFirst);
    }
}
