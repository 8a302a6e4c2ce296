//! Streaming PNG encoder for captured pixel buffers.
//!
//! Output is always 8-bit RGB, non-interlaced, unfiltered, at a fixed
//! compression level, so identical buffers encode to identical bytes.

use std::io::Write;
use std::num::NonZeroU32;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use xsnap_platform::screen::PixelBuffer;

use crate::error::{EncodeError, EncodeStage};
use crate::pixel::RgbAccessor;
use crate::thumbnail::StagedFile;

/// Integer downsampling divisor. Output dimensions are `floor(dim / scale)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFactor(NonZeroU32);

impl ScaleFactor {
    pub const FULL: ScaleFactor = ScaleFactor(NonZeroU32::MIN);
    pub const THUMBNAIL: ScaleFactor = match NonZeroU32::new(16) {
        Some(n) => ScaleFactor(n),
        None => unreachable!(),
    };

    pub fn new(divisor: u32) -> Option<Self> {
        NonZeroU32::new(divisor).map(ScaleFactor)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub fn scaled(self, width: u32, height: u32) -> (u32, u32) {
        (width / self.get(), height / self.get())
    }

    /// This scale, reduced where needed so a `width x height` source keeps
    /// at least one output pixel per axis.
    pub fn fitting(self, width: u32, height: u32) -> Self {
        let limit = width.min(height).max(1);
        ScaleFactor::new(self.get().min(limit)).unwrap_or(ScaleFactor::FULL)
    }
}

/// zlib effort used for the IDAT stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    #[default]
    Fast,
    Default,
    Best,
}

impl From<CompressionLevel> for png::Compression {
    fn from(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::Fast => png::Compression::Fast,
            CompressionLevel::Default => png::Compression::Default,
            CompressionLevel::Best => png::Compression::Best,
        }
    }
}

/// Where encoded bytes go
pub enum EncodeTarget<'a> {
    /// Written beside the path and renamed into place once complete
    File(&'a Path),
    /// Written straight through, rows in order
    Stream(&'a mut dyn Write),
}

/// Dimensions declared in the emitted IHDR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
}

/// Encode `buffer`, downsampled by `scale`, as a PNG into `target`.
///
/// Nothing is written, and no file is created, when the scaled image would
/// have a zero dimension.
pub fn encode(
    buffer: &PixelBuffer,
    scale: ScaleFactor,
    target: EncodeTarget<'_>,
    compression: CompressionLevel,
) -> Result<EncodedImage, EncodeError> {
    let (width, height) = scale.scaled(buffer.width(), buffer.height());
    if width == 0 || height == 0 {
        return Err(EncodeError::DegenerateImage {
            width: buffer.width(),
            height: buffer.height(),
            scale: scale.get(),
        });
    }
    let accessor = RgbAccessor::new(buffer)?;

    match target {
        EncodeTarget::Stream(sink) => write_png(&accessor, scale, width, height, sink, compression),
        EncodeTarget::File(path) => {
            let mut staged = StagedFile::create(path).map_err(|source| {
                EncodeError::SinkWriteFailure { stage: EncodeStage::Open, source }
            })?;
            let image = write_png(&accessor, scale, width, height, &mut staged, compression)?;
            staged.persist().map_err(|source| EncodeError::SinkWriteFailure {
                stage: EncodeStage::Persist,
                source,
            })?;
            Ok(image)
        }
    }
}

fn write_png<W: Write>(
    accessor: &RgbAccessor<'_>,
    scale: ScaleFactor,
    width: u32,
    height: u32,
    sink: W,
    compression: CompressionLevel,
) -> Result<EncodedImage, EncodeError> {
    let row_len = width as usize * 3;
    let mut row: Vec<u8> = Vec::new();
    row.try_reserve_exact(row_len)
        .map_err(|_| EncodeError::AllocationFailure { bytes: row_len })?;

    let mut encoder = png::Encoder::new(sink, width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(compression.into());
    encoder.set_filter(png::FilterType::NoFilter);
    encoder.set_adaptive_filter(png::AdaptiveFilterType::NonAdaptive);

    let mut writer = encoder
        .write_header()
        .map_err(|e| EncodeError::from_png(EncodeStage::Header, e))?;

    {
        let mut stream = writer
            .stream_writer()
            .map_err(|e| EncodeError::from_png(EncodeStage::Header, e))?;

        let step = scale.get();
        for y in 0..height {
            row.clear();
            for x in 0..width {
                row.extend_from_slice(&accessor.rgb(x * step, y * step));
            }
            stream
                .write_all(&row)
                .map_err(|source| EncodeError::SinkWriteFailure { stage: EncodeStage::Row(y), source })?;
        }

        stream
            .finish()
            .map_err(|e| EncodeError::from_png(EncodeStage::Finish, e))?;
    }

    writer
        .finish()
        .map_err(|e| EncodeError::from_png(EncodeStage::Finish, e))?;

    debug!(
        "encoded {}x{} png from {}x{} source (scale 1/{})",
        width,
        height,
        accessor.width(),
        accessor.height(),
        scale.get()
    );

    Ok(EncodedImage { width, height })
}
