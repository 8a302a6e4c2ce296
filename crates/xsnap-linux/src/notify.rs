use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use xsnap_platform::delivery::Notifier;

const SUMMARY: &str = "Screenshot";

/// Desktop notifications through `notify-send`
pub struct NotifySend {
    timeout_ms: u32,
}

impl NotifySend {
    pub fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }
}

impl Notifier for NotifySend {
    fn notify(&self, message: &str, icon: Option<&Path>) -> Result<()> {
        let mut cmd = Command::new("notify-send");
        cmd.args(["-u", "low", "-t", &self.timeout_ms.to_string()]);
        if let Some(icon) = icon {
            cmd.arg("-i").arg(icon);
        }
        cmd.arg(SUMMARY).arg(message);

        let status = cmd
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("failed to run notify-send")?;
        if !status.success() {
            bail!("notify-send exited with {}", status);
        }
        Ok(())
    }
}
