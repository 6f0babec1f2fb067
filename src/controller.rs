//! Busylight controller abstraction.

use std::sync::Arc;

use bytes::Bytes;

use crate::color::Rgb;

/// HID busylight controller.
pub trait HidController {
    /// Human readable model name.
    fn name(&self) -> &'static str;

    /// HID vendor ID.
    fn vendor_id(&self) -> u16;

    /// HID product ID.
    fn product_id(&self) -> u16;

    /// Convert a color to the controller-specific packets, in write order.
    fn color_bytes(&self, color: Rgb) -> Vec<Bytes>;

    /// Secondary frame that is only logged, never written.
    fn diagnostic_bytes(&self, _color: Rgb) -> Option<Bytes> {
        None
    }
}

/// Controller shared between the registry and running sessions.
pub type SharedController = Arc<dyn HidController + Send + Sync>;
