use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Write a config that points the thumbnail into `dir`.
fn config_in(dir: &Path) -> (PathBuf, PathBuf) {
    let thumb = dir.join("thumb.png");
    let config = dir.join("config.json");
    let body = format!(
        "{{\"thumbnail_path\": {:?}}}",
        thumb.to_str().expect("temp path is utf-8")
    );
    std::fs::write(&config, body).unwrap();
    (config, thumb)
}

fn xsnap(dir: &TempDir, args: &[&str]) -> (Output, PathBuf) {
    let (config, thumb) = config_in(dir.path());
    let output = Command::new(env!("CARGO_BIN_EXE_xsnap"))
        .args(args)
        .env("XSNAP_CONFIG_PATH", &config)
        .env_remove("DISPLAY")
        .env_remove("WAYLAND_DISPLAY")
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    (output, thumb)
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn no_arguments_prints_usage() {
    let dir = TempDir::new().unwrap();
    let (output, thumb) = xsnap(&dir, &[]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "stdout: {stdout}");
    assert!(stdout.contains("--select"));
    assert!(!thumb.exists());
}

#[test]
fn help_exits_cleanly() {
    let dir = TempDir::new().unwrap();
    let (output, _) = xsnap(&dir, &["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--active"));
}

#[test]
fn conflicting_modes_capture_nothing() {
    let dir = TempDir::new().unwrap();
    let (output, thumb) = xsnap(&dir, &["--now", "--select"]);

    assert_eq!(output.status.code(), Some(2));
    let err = stderr(&output);
    assert!(err.starts_with("error:"), "stderr: {err}");
    assert_eq!(err.trim_end().lines().count(), 1, "stderr: {err}");
    assert!(!thumb.exists());
}

#[test]
fn zero_delay_is_rejected() {
    let dir = TempDir::new().unwrap();
    for args in [&["--in0"][..], &["--in", "0"][..]] {
        let (output, thumb) = xsnap(&dir, args);
        assert_eq!(output.status.code(), Some(2), "args: {args:?}");
        assert!(stderr(&output).starts_with("error:"));
        assert!(!thumb.exists());
    }
}

#[test]
fn unknown_flag_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (output, _) = xsnap(&dir, &["--fullscreen"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn missing_display_is_a_runtime_error() {
    let dir = TempDir::new().unwrap();
    let (output, thumb) = xsnap(&dir, &["--now"]);

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.starts_with("error:"), "stderr: {err}");
    assert_eq!(err.trim_end().lines().count(), 1, "stderr: {err}");
    assert!(!thumb.exists());
}

#[test]
fn malformed_config_is_a_runtime_error() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("broken.json");
    std::fs::write(&config, "{ not json").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_xsnap"))
        .arg("--now")
        .env("XSNAP_CONFIG_PATH", &config)
        .env_remove("DISPLAY")
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("config"));
}
