//! Channel extraction from native capture pixels.

use xsnap_platform::screen::{PixelBuffer, PixelFormat};

use crate::error::EncodeError;

const RED_MASK: u32 = 0x00ff_0000;
const GREEN_MASK: u32 = 0x0000_ff00;
const BLUE_MASK: u32 = 0x0000_00ff;

/// Reads 8-bit red/green/blue triples out of a 24-bit truecolor buffer.
///
/// Construction validates the buffer's layout once, so `rgb` can stay a
/// plain shift-and-mask.
pub struct RgbAccessor<'a> {
    buffer: &'a PixelBuffer,
}

impl<'a> RgbAccessor<'a> {
    pub fn new(buffer: &'a PixelBuffer) -> Result<Self, EncodeError> {
        check_format(buffer.format())?;
        Ok(Self { buffer })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// `[r, g, b]` at `(x, y)`
    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let pixel = self.buffer.pixel(x, y);
        [
            ((pixel >> 16) & 0xff) as u8,
            ((pixel >> 8) & 0xff) as u8,
            (pixel & 0xff) as u8,
        ]
    }
}

fn check_format(format: &PixelFormat) -> Result<(), EncodeError> {
    if !matches!(format.depth, 24 | 32) || !matches!(format.bits_per_pixel, 24 | 32) {
        return Err(EncodeError::UnsupportedPixelFormat(format!(
            "depth {} at {} bits per pixel",
            format.depth, format.bits_per_pixel
        )));
    }
    if (format.red_mask, format.green_mask, format.blue_mask) != (RED_MASK, GREEN_MASK, BLUE_MASK) {
        return Err(EncodeError::UnsupportedPixelFormat(format!(
            "channel masks r={:#08x} g={:#08x} b={:#08x}",
            format.red_mask, format.green_mask, format.blue_mask
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use xsnap_platform::screen::ByteOrder;

    fn xrgb_buffer(pixels: &[u32], width: u32) -> PixelBuffer {
        let data = pixels.iter().flat_map(|p| p.to_le_bytes()).collect();
        let height = pixels.len() as u32 / width;
        PixelBuffer::new(width, height, width as usize * 4, PixelFormat::XRGB8888, data).unwrap()
    }

    #[test]
    fn test_extracts_channels() {
        let buf = xrgb_buffer(&[0x00ff_8001, 0xff12_3456], 2);
        let acc = RgbAccessor::new(&buf).unwrap();
        assert_eq!(acc.rgb(0, 0), [0xff, 0x80, 0x01]);
        // padding byte is ignored
        assert_eq!(acc.rgb(1, 0), [0x12, 0x34, 0x56]);
    }

    #[test]
    fn test_accepts_packed_24bpp() {
        let format = PixelFormat {
            bits_per_pixel: 24,
            byte_order: ByteOrder::MsbFirst,
            ..PixelFormat::XRGB8888
        };
        let buf = PixelBuffer::new(1, 1, 3, format, vec![0x0a, 0x0b, 0x0c]).unwrap();
        let acc = RgbAccessor::new(&buf).unwrap();
        assert_eq!(acc.rgb(0, 0), [0x0a, 0x0b, 0x0c]);
    }

    #[test]
    fn test_rejects_16bit_depth() {
        let format = PixelFormat {
            depth: 16,
            bits_per_pixel: 16,
            red_mask: 0xf800,
            green_mask: 0x07e0,
            blue_mask: 0x001f,
            byte_order: ByteOrder::LsbFirst,
        };
        let buf = PixelBuffer::new(1, 1, 2, format, vec![0, 0]).unwrap();
        let err = RgbAccessor::new(&buf).err().unwrap();
        assert!(matches!(err, EncodeError::UnsupportedPixelFormat(_)));
    }

    #[test]
    fn test_rejects_swapped_masks() {
        let format = PixelFormat {
            red_mask: 0x0000_00ff,
            blue_mask: 0x00ff_0000,
            ..PixelFormat::XRGB8888
        };
        let buf = PixelBuffer::new(1, 1, 4, format, vec![0; 4]).unwrap();
        assert!(matches!(
            RgbAccessor::new(&buf),
            Err(EncodeError::UnsupportedPixelFormat(_))
        ));
    }
}
