use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::encoder::{CompressionLevel, ScaleFactor};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapConfig {
    /// Single persisted thumbnail slot, overwritten by every capture
    #[serde(default = "default_thumbnail_path")]
    pub thumbnail_path: PathBuf,

    /// Thumbnail downsampling divisor
    #[serde(default = "default_thumbnail_scale")]
    pub thumbnail_scale: u32,

    /// zlib effort for both encodings
    #[serde(default)]
    pub compression: CompressionLevel,

    /// Give up on an unfinished pointer selection after this many seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_timeout_secs: Option<u64>,

    /// How long the notification stays on screen
    #[serde(default = "default_notify_timeout")]
    pub notify_timeout_ms: u32,

    /// X selection the PNG is published on
    #[serde(default = "default_clipboard_selection")]
    pub clipboard_selection: String,
}

fn default_thumbnail_path() -> PathBuf {
    PathBuf::from("/tmp/thumb.png")
}
fn default_thumbnail_scale() -> u32 {
    ScaleFactor::THUMBNAIL.get()
}
fn default_notify_timeout() -> u32 {
    1500
}
fn default_clipboard_selection() -> String {
    "clipboard".to_string()
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            thumbnail_path: default_thumbnail_path(),
            thumbnail_scale: default_thumbnail_scale(),
            compression: CompressionLevel::default(),
            selection_timeout_secs: None,
            notify_timeout_ms: default_notify_timeout(),
            clipboard_selection: default_clipboard_selection(),
        }
    }
}

impl SnapConfig {
    /// Default config file path for this platform
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("", "", "xsnap") {
            dirs.config_dir().join("config.json")
        } else {
            PathBuf::from("xsnap-config.json")
        }
    }

    /// Load config from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse config JSON in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config dir {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.thumbnail_scale == 0 {
            bail!("thumbnail_scale must be at least 1");
        }
        if self.thumbnail_path.file_name().is_none() {
            bail!("thumbnail_path {} does not name a file", self.thumbnail_path.display());
        }
        Ok(())
    }

    pub fn thumbnail_scale(&self) -> ScaleFactor {
        ScaleFactor::new(self.thumbnail_scale).unwrap_or(ScaleFactor::THUMBNAIL)
    }

    pub fn selection_timeout(&self) -> Option<Duration> {
        self.selection_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gets_defaults() {
        let config: SnapConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.thumbnail_path, PathBuf::from("/tmp/thumb.png"));
        assert_eq!(config.thumbnail_scale(), ScaleFactor::THUMBNAIL);
        assert_eq!(config.compression, CompressionLevel::Fast);
        assert_eq!(config.selection_timeout(), None);
        assert_eq!(config.notify_timeout_ms, 1500);
        assert_eq!(config.clipboard_selection, "clipboard");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = SnapConfig {
            thumbnail_scale: 8,
            compression: CompressionLevel::Best,
            selection_timeout_secs: Some(30),
            ..SnapConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = SnapConfig::load(&path).unwrap();
        assert_eq!(loaded.thumbnail_scale, 8);
        assert_eq!(loaded.compression, CompressionLevel::Best);
        assert_eq!(loaded.selection_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_rejects_zero_scale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"thumbnail_scale": 0}"#).unwrap();

        let err = SnapConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("thumbnail_scale"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SnapConfig::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.thumbnail_scale, 16);
    }

    #[test]
    fn test_unknown_compression_is_a_parse_error() {
        assert!(serde_json::from_str::<SnapConfig>(r#"{"compression": "ultra"}"#).is_err());
    }
}
