use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Point in an encode pass where a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStage {
    /// Creating the output file
    Open,
    /// PNG signature and IHDR
    Header,
    /// Writing output row `n`
    Row(u32),
    /// Compressed data flush and IEND
    Finish,
    /// Moving the finished file into place
    Persist,
}

impl fmt::Display for EncodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeStage::Open => f.write_str("open"),
            EncodeStage::Header => f.write_str("header"),
            EncodeStage::Row(y) => write!(f, "row {}", y),
            EncodeStage::Finish => f.write_str("finish"),
            EncodeStage::Persist => f.write_str("persist"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("{width}x{height} image degenerates to nothing at scale 1/{scale}")]
    DegenerateImage { width: u32, height: u32, scale: u32 },
    #[error("failed to allocate {bytes} byte row buffer")]
    AllocationFailure { bytes: usize },
    #[error("sink write failed at {stage}: {source}")]
    SinkWriteFailure {
        stage: EncodeStage,
        #[source]
        source: io::Error,
    },
    #[error("unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),
    #[error("png encoder failed at {stage}: {message}")]
    Encoder { stage: EncodeStage, message: String },
}

impl EncodeError {
    pub(crate) fn from_png(stage: EncodeStage, err: png::EncodingError) -> Self {
        match err {
            png::EncodingError::IoError(source) => EncodeError::SinkWriteFailure { stage, source },
            other => EncodeError::Encoder { stage, message: other.to_string() },
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to resolve capture bounds: {0:#}")]
    Bounds(anyhow::Error),
    #[error("pointer selection failed: {0:#}")]
    Selection(anyhow::Error),
    #[error("display capture failed: {0:#}")]
    Capture(anyhow::Error),
    #[error("display returned an empty {width}x{height} capture")]
    EmptyCapture { width: u32, height: u32 },
}

/// Which of the two encodings of a capture failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodePass {
    Thumbnail,
    Clipboard,
}

impl fmt::Display for EncodePass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodePass::Thumbnail => f.write_str("thumbnail"),
            EncodePass::Clipboard => f.write_str("clipboard"),
        }
    }
}

/// Fatal outcome of one capture run
#[derive(Debug, Error)]
pub enum SnapError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("encoding {pass} image failed: {source}")]
    Encode {
        pass: EncodePass,
        #[source]
        source: EncodeError,
    },
    #[error("clipboard delivery failed: {0:#}")]
    Clipboard(anyhow::Error),
    #[error("failed to write thumbnail {}: {source}", path.display())]
    Thumbnail {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
