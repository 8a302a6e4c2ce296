use std::io::Write;
use std::path::Path;

use anyhow::Result;

/// MIME type announced for encoded screenshots
pub const MIME_PNG: &str = "image/png";

/// Clipboard publisher that accepts a complete byte stream.
pub trait ClipboardSink {
    /// Open a transfer announced with `mime`
    fn begin(&mut self, mime: &str) -> Result<Box<dyn ClipboardTransfer>>;
}

/// One in-flight clipboard write.
///
/// Dropping a transfer without calling `commit` must discard whatever was
/// written so far.
pub trait ClipboardTransfer: Write {
    /// Finish the stream and hand it to the clipboard owner
    fn commit(self: Box<Self>) -> Result<()>;
}

/// User-visible notification channel.
pub trait Notifier {
    fn notify(&self, message: &str, icon: Option<&Path>) -> Result<()>;
}
