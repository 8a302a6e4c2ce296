//! Clipboard publishing through `xclip`.

use std::io::{self, Write};
use std::process::{Child, ChildStdin, Command, Stdio};

use anyhow::{bail, Context, Result};
use xsnap_platform::delivery::{ClipboardSink, ClipboardTransfer};

/// Hands encoded images to `xclip`, which keeps serving the X selection
/// after this process exits.
pub struct XclipClipboard {
    selection: String,
}

impl XclipClipboard {
    pub fn new(selection: impl Into<String>) -> Self {
        Self { selection: selection.into() }
    }
}

impl ClipboardSink for XclipClipboard {
    fn begin(&mut self, mime: &str) -> Result<Box<dyn ClipboardTransfer>> {
        let mut child = Command::new("xclip")
            .args(["-selection", &self.selection, "-t", mime])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .context("failed to start xclip (is it installed?)")?;

        let stdin = child.stdin.take().context("xclip stdin unavailable")?;
        tracing::debug!("xclip started (pid {}) for {} on {}", child.id(), mime, self.selection);

        Ok(Box::new(XclipTransfer { child: Some(child), stdin: Some(stdin) }))
    }
}

struct XclipTransfer {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl Write for XclipTransfer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.write(buf),
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "xclip stdin closed")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.flush(),
            None => Ok(()),
        }
    }
}

impl ClipboardTransfer for XclipTransfer {
    fn commit(mut self: Box<Self>) -> Result<()> {
        // closing stdin tells xclip the image is complete
        drop(self.stdin.take());
        let mut child = self.child.take().context("xclip transfer already finished")?;
        let status = child.wait().context("failed to wait for xclip")?;
        if !status.success() {
            bail!("xclip exited with {}", status);
        }
        Ok(())
    }
}

impl Drop for XclipTransfer {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            // killed before stdin closes, so the partial image is never published
            let _ = child.kill();
            drop(self.stdin.take());
            let _ = child.wait();
            tracing::debug!("xclip transfer aborted");
        }
    }
}
