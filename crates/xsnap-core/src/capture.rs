//! One capture run: resolve bounds, grab pixels, encode twice, deliver, notify.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use xsnap_platform::delivery::{ClipboardSink, Notifier, MIME_PNG};
use xsnap_platform::input::PointerDevice;
use xsnap_platform::screen::{CaptureRegion, PixelBuffer, PixelSource, Surface};

use crate::config::SnapConfig;
use crate::encoder::{encode, EncodeTarget, ScaleFactor};
use crate::error::{CaptureError, EncodePass, SnapError};
use crate::select::{pick_window, select_region, Selection, WindowPick};
use crate::thumbnail::StagedFile;

pub const TAKEN_MESSAGE: &str = "Screenshot taken";
pub const CANCELLED_MESSAGE: &str = "Screenshot has been cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Whole display, right away
    Immediate,
    /// Whole display after the given number of seconds
    Delayed(u64),
    /// The window under the next click
    ActiveWindow,
    /// A rectangle dragged out with the pointer
    InteractiveSelect,
}

/// Non-error end states of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    Captured {
        width: u32,
        height: u32,
        thumbnail: PathBuf,
    },
    Cancelled,
}

/// Blocking wait, swappable in tests
pub trait Clock {
    fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Sequences one capture against injected platform collaborators.
pub struct Orchestrator<'a> {
    config: &'a SnapConfig,
    source: &'a dyn PixelSource,
    pointer: &'a mut dyn PointerDevice,
    clipboard: &'a mut dyn ClipboardSink,
    notifier: &'a dyn Notifier,
    clock: &'a dyn Clock,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a SnapConfig,
        source: &'a dyn PixelSource,
        pointer: &'a mut dyn PointerDevice,
        clipboard: &'a mut dyn ClipboardSink,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            config,
            source,
            pointer,
            clipboard,
            notifier,
            clock: &SystemClock,
        }
    }

    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn run(&mut self, mode: CaptureMode) -> Result<ExitOutcome, SnapError> {
        info!("starting {:?} capture", mode);

        if let CaptureMode::Delayed(secs) = mode {
            info!("waiting {}s before capture", secs);
            self.clock.sleep(Duration::from_secs(secs));
        }

        let Some((surface, region)) = self.resolve(mode)? else {
            self.notify(CANCELLED_MESSAGE);
            return Ok(ExitOutcome::Cancelled);
        };
        if region.is_empty() {
            return Err(CaptureError::EmptyCapture { width: region.width, height: region.height }.into());
        }

        let buffer = self
            .source
            .capture(surface, region)
            .map_err(CaptureError::Capture)?;
        if buffer.is_empty() {
            return Err(CaptureError::EmptyCapture { width: buffer.width(), height: buffer.height() }.into());
        }
        info!("captured {}x{} from {:?}", buffer.width(), buffer.height(), surface);

        let thumbnail = self.deliver(&buffer)?;
        let (width, height) = (buffer.width(), buffer.height());
        drop(buffer);

        self.notify(TAKEN_MESSAGE);
        Ok(ExitOutcome::Captured { width, height, thumbnail })
    }

    /// `None` when the user backs out of an interactive selection
    fn resolve(&mut self, mode: CaptureMode) -> Result<Option<(Surface, CaptureRegion)>, CaptureError> {
        let timeout = self.config.selection_timeout();

        match mode {
            CaptureMode::Immediate | CaptureMode::Delayed(_) => {
                Ok(Some((Surface::Root, self.display_bounds()?)))
            }
            CaptureMode::ActiveWindow => {
                match pick_window(&mut *self.pointer, timeout).map_err(CaptureError::Selection)? {
                    WindowPick::Window(window) => {
                        let bounds = self
                            .source
                            .window_bounds(window)
                            .map_err(CaptureError::Bounds)?;
                        Ok(Some((Surface::Window(window), bounds)))
                    }
                    WindowPick::Root => Ok(Some((Surface::Root, self.display_bounds()?))),
                    WindowPick::Cancelled => Ok(None),
                }
            }
            CaptureMode::InteractiveSelect => {
                match select_region(&mut *self.pointer, timeout).map_err(CaptureError::Selection)? {
                    Selection::Region(region) => Ok(Some((Surface::Root, region))),
                    Selection::Cancelled => Ok(None),
                }
            }
        }
    }

    fn display_bounds(&self) -> Result<CaptureRegion, CaptureError> {
        self.source.display_bounds().map_err(CaptureError::Bounds)
    }

    /// Thumbnail is staged first and only replaces the previous one after the
    /// clipboard has accepted the full image.
    fn deliver(&mut self, buffer: &PixelBuffer) -> Result<PathBuf, SnapError> {
        let path = &self.config.thumbnail_path;
        let compression = self.config.compression;
        let thumbnail_io = |source: io::Error| SnapError::Thumbnail { path: path.clone(), source };

        let scale = self
            .config
            .thumbnail_scale()
            .fitting(buffer.width(), buffer.height());
        let mut staged = StagedFile::create(path).map_err(thumbnail_io)?;
        let thumb = encode(buffer, scale, EncodeTarget::Stream(&mut staged), compression)
            .map_err(|source| SnapError::Encode { pass: EncodePass::Thumbnail, source })?;
        debug!("thumbnail encoded at {}x{}", thumb.width, thumb.height);

        let mut transfer = self.clipboard.begin(MIME_PNG).map_err(SnapError::Clipboard)?;
        encode(buffer, ScaleFactor::FULL, EncodeTarget::Stream(&mut transfer), compression)
            .map_err(|source| SnapError::Encode { pass: EncodePass::Clipboard, source })?;
        transfer.commit().map_err(SnapError::Clipboard)?;
        debug!("clipboard transfer committed");

        staged.persist().map_err(thumbnail_io)
    }

    /// Notification failures never fail the run
    fn notify(&self, message: &str) {
        let icon = Some(self.config.thumbnail_path.as_path()).filter(|p| p.exists());
        if let Err(e) = self.notifier.notify(message, icon) {
            warn!("notification failed: {:#}", e);
        }
    }
}
