use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{ArgGroup, CommandFactory, Parser};
use tracing::{debug, info};

use xsnap_core::{CaptureMode, ExitOutcome, SnapConfig};

/// Exit status for bad flags, bad delays and conflicting modes
const USAGE_EXIT: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "xsnap")]
#[command(about = "Screenshot the screen, a window, or a selected area to the clipboard")]
#[command(version)]
#[command(group(ArgGroup::new("mode").args(["now", "delay", "active", "select"]).multiple(false)))]
struct Cli {
    /// Take screenshot immediately
    #[arg(short = 'n', long)]
    now: bool,

    /// Take screenshot after SECONDS seconds (also accepted as --inSECONDS)
    #[arg(long = "in", value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    delay: Option<u64>,

    /// Take screenshot of the window clicked next
    #[arg(long)]
    active: bool,

    /// Select the area of the screen to capture using the mouse
    #[arg(long)]
    select: bool,

    /// Path to config file
    #[arg(long, env = "XSNAP_CONFIG_PATH")]
    config_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "XSNAP_LOG_LEVEL")]
    log_level: String,
}

impl Cli {
    fn mode(&self) -> Option<CaptureMode> {
        if self.now {
            Some(CaptureMode::Immediate)
        } else if let Some(secs) = self.delay {
            Some(CaptureMode::Delayed(secs))
        } else if self.active {
            Some(CaptureMode::ActiveWindow)
        } else if self.select {
            Some(CaptureMode::InteractiveSelect)
        } else {
            None
        }
    }
}

/// Rewrite the compact `--in5` spelling into `--in 5`.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let mut out = Vec::new();
    for arg in args {
        match arg.to_str().and_then(|s| s.strip_prefix("--in")) {
            Some(secs) if !secs.is_empty() && !secs.starts_with('=') => {
                out.push(OsString::from("--in"));
                out.push(OsString::from(secs));
            }
            _ => out.push(arg),
        }
    }
    out
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => return usage_error(e),
    };

    let Some(mode) = cli.mode() else {
        let _ = Cli::command().print_help();
        println!();
        return ExitCode::SUCCESS;
    };

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(
        "xsnap v{} starting (os={}, arch={})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    );

    match run(&cli, mode) {
        Ok(ExitOutcome::Captured { width, height, thumbnail }) => {
            info!("captured {}x{}, thumbnail at {}", width, height, thumbnail.display());
            ExitCode::SUCCESS
        }
        Ok(ExitOutcome::Cancelled) => {
            info!("capture cancelled");
            ExitCode::SUCCESS
        }
        Err(e) => {
            debug!("capture failed: {:?}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Help and version go to stdout with status 0; anything else is a
/// one-line diagnostic.
fn usage_error(e: clap::Error) -> ExitCode {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = e.print();
            ExitCode::SUCCESS
        }
        _ => {
            let rendered = e.to_string();
            eprintln!("{}", rendered.lines().next().unwrap_or("error: invalid arguments"));
            ExitCode::from(USAGE_EXIT)
        }
    }
}

fn load_config(cli: &Cli) -> Result<SnapConfig> {
    let config_path = cli
        .config_path
        .clone()
        .unwrap_or_else(SnapConfig::default_path);
    info!("using config {}", config_path.display());
    SnapConfig::load_or_default(&config_path)
}

#[cfg(target_os = "linux")]
fn run(cli: &Cli, mode: CaptureMode) -> Result<ExitOutcome> {
    use xsnap_core::Orchestrator;
    use xsnap_linux::clipboard::XclipClipboard;
    use xsnap_linux::input_x11::X11Pointer;
    use xsnap_linux::notify::NotifySend;

    let config = load_config(cli)?;

    let session = xsnap_linux::screen::connect_display()?;
    let mut pointer = X11Pointer::new(&session);
    let mut clipboard = XclipClipboard::new(config.clipboard_selection.clone());
    let notifier = NotifySend::new(config.notify_timeout_ms);

    let outcome = Orchestrator::new(&config, &session, &mut pointer, &mut clipboard, &notifier)
        .run(mode)?;
    Ok(outcome)
}

#[cfg(not(target_os = "linux"))]
fn run(cli: &Cli, _mode: CaptureMode) -> Result<ExitOutcome> {
    load_config(cli)?;
    anyhow::bail!("xsnap needs an X11 display and only runs on Linux");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(normalize_args(args.iter().map(OsString::from)))
    }

    #[test]
    fn test_mode_flags() {
        assert_eq!(parse(&["xsnap", "--now"]).unwrap().mode(), Some(CaptureMode::Immediate));
        assert_eq!(parse(&["xsnap", "-n"]).unwrap().mode(), Some(CaptureMode::Immediate));
        assert_eq!(parse(&["xsnap", "--in", "4"]).unwrap().mode(), Some(CaptureMode::Delayed(4)));
        assert_eq!(parse(&["xsnap", "--active"]).unwrap().mode(), Some(CaptureMode::ActiveWindow));
        assert_eq!(parse(&["xsnap", "--select"]).unwrap().mode(), Some(CaptureMode::InteractiveSelect));
        assert_eq!(parse(&["xsnap"]).unwrap().mode(), None);
    }

    #[test]
    fn test_compact_delay_spelling() {
        assert_eq!(parse(&["xsnap", "--in3"]).unwrap().mode(), Some(CaptureMode::Delayed(3)));
        assert_eq!(
            normalize_args(["xsnap", "--in12", "--active"].map(OsString::from)),
            ["xsnap", "--in", "12", "--active"].map(OsString::from).to_vec()
        );
        // --in=5 is left to clap
        assert_eq!(parse(&["xsnap", "--in=5"]).unwrap().mode(), Some(CaptureMode::Delayed(5)));
    }

    #[test]
    fn test_rejects_non_positive_delay() {
        assert_eq!(parse(&["xsnap", "--in0"]).unwrap_err().kind(), ErrorKind::ValueValidation);
        assert!(parse(&["xsnap", "--in", "-2"]).is_err());
        assert_eq!(parse(&["xsnap", "--inabc"]).unwrap_err().kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_rejects_conflicting_modes() {
        for args in [
            ["xsnap", "--now", "--select"],
            ["xsnap", "--in3", "--active"],
            ["xsnap", "--active", "--select"],
        ] {
            assert_eq!(parse(&args).unwrap_err().kind(), ErrorKind::ArgumentConflict);
        }
    }

    #[test]
    fn test_rejects_unknown_flag() {
        assert_eq!(parse(&["xsnap", "--everything"]).unwrap_err().kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
