//! Capture core: pixel conversion, PNG encoding, pointer selection and the
//! capture orchestration that ties them to platform collaborators.

pub mod capture;
pub mod config;
pub mod encoder;
pub mod error;
pub mod pixel;
pub mod select;
pub mod thumbnail;

pub use capture::{CaptureMode, ExitOutcome, Orchestrator};
pub use config::SnapConfig;
pub use error::{CaptureError, EncodeError, SnapError};
