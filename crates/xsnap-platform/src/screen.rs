use anyhow::Result;
use thiserror::Error;

/// Opaque handle to a top-level or child window on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

/// Drawable a capture region is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// The root window, coordinates in absolute screen space
    Root,
    /// A specific window, coordinates relative to its origin
    Window(WindowId),
}

/// Rectangle to capture, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Region anchored at the origin of its surface
    pub fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LsbFirst,
    MsbFirst,
}

/// Native layout of the pixels in a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    /// Significant bits per pixel (24 for truecolor)
    pub depth: u8,
    /// Storage bits per pixel, including padding
    pub bits_per_pixel: u8,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
    pub byte_order: ByteOrder,
}

impl PixelFormat {
    /// 24-bit truecolor stored in 32-bit little-endian words (the usual X server layout)
    pub const XRGB8888: PixelFormat = PixelFormat {
        depth: 24,
        bits_per_pixel: 32,
        red_mask: 0x00ff_0000,
        green_mask: 0x0000_ff00,
        blue_mask: 0x0000_00ff,
        byte_order: ByteOrder::LsbFirst,
    };

    fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel as usize / 8
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PixelBufferError {
    #[error("unsupported storage size of {0} bits per pixel")]
    BitsPerPixel(u8),
    #[error("stride {stride} too small for {width} pixels at {bits_per_pixel} bpp")]
    Stride {
        stride: usize,
        width: u32,
        bits_per_pixel: u8,
    },
    #[error("buffer too short: need {need} bytes, have {have}")]
    TooShort { need: usize, have: usize },
}

/// A captured grid of native-format pixels.
///
/// Immutable once constructed. Coordinates passed to [`PixelBuffer::pixel`]
/// must lie inside `width x height`.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, PixelBufferError> {
        if !matches!(format.bits_per_pixel, 8 | 16 | 24 | 32) {
            return Err(PixelBufferError::BitsPerPixel(format.bits_per_pixel));
        }
        if stride < width as usize * format.bytes_per_pixel() {
            return Err(PixelBufferError::Stride {
                stride,
                width,
                bits_per_pixel: format.bits_per_pixel,
            });
        }
        let need = stride * height as usize;
        if data.len() < need {
            return Err(PixelBufferError::TooShort { need, have: data.len() });
        }

        Ok(Self { width, height, stride, format, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw native pixel value at `(x, y)`, honouring the buffer's byte order.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        debug_assert!(x < self.width && y < self.height);
        let bpp = self.format.bytes_per_pixel();
        let offset = y as usize * self.stride + x as usize * bpp;
        let bytes = &self.data[offset..offset + bpp];

        match self.format.byte_order {
            ByteOrder::LsbFirst => bytes
                .iter()
                .rev()
                .fold(0u32, |acc, &b| (acc << 8) | b as u32),
            ByteOrder::MsbFirst => bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32),
        }
    }
}

/// Display-side pixel capture.
///
/// Implementations carry their own session handle; nothing here assumes a
/// global display connection.
pub trait PixelSource {
    /// Full bounds of the root surface
    fn display_bounds(&self) -> Result<CaptureRegion>;

    /// Size of a window, as a region anchored at the window's own origin
    fn window_bounds(&self, window: WindowId) -> Result<CaptureRegion>;

    /// Capture `region` of `surface` into a dense pixel buffer
    fn capture(&self, surface: Surface, region: CaptureRegion) -> Result<PixelBuffer>;
}
