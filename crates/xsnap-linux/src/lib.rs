// Linux platform implementations

#[cfg(target_os = "linux")]
pub mod screen_x11;
#[cfg(target_os = "linux")]
pub mod screen;

#[cfg(target_os = "linux")]
pub mod input_x11;

#[cfg(target_os = "linux")]
pub mod clipboard;

#[cfg(target_os = "linux")]
pub mod notify;
