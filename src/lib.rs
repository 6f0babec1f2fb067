//! BusyLight presence indicator control.
//!
//! Kuando BusyLights turn off when they do not receive any HID traffic for 30
//! seconds. A [`DeviceSession`] owns the device handle and keeps the light on
//! by re-sending the last color until it is closed.

pub mod busylight_lync;
pub mod busylight_uc;
pub mod color;
pub mod controller;
pub mod error;
pub mod registry;
pub mod session;

pub use crate::color::Rgb;
pub use crate::controller::{HidController, SharedController};
pub use crate::error::{Error, Result};
pub use crate::registry::Registry;
pub use crate::session::{DeviceSession, HidWrite, Indicator, SessionConfig, KEEP_ALIVE_INTERVAL};
