//! Platform-neutral types and traits shared by the capture core and the
//! display backends.

pub mod delivery;
pub mod input;
pub mod screen;
