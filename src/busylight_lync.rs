//! Kuando BusyLight Lync control.
//!
//! The Lync model accepts the same color frame as the UC. A larger report
//! layout is known as well, but it has not been confirmed against the
//! hardware and is therefore only exposed for logging.

use bytes::{BufMut, Bytes, BytesMut};

use crate::busylight_uc;
use crate::color::Rgb;
use crate::controller::HidController;

/// Size of the diagnostic report.
const DIAGNOSTIC_LEN: usize = 67;

/// Trailer of the diagnostic report.
const DIAGNOSTIC_TRAILER: [u8; 6] = [0xff, 0xff, 0xff, 0xff, 0x04, 0xab];

pub struct BusylightLync;

impl HidController for BusylightLync {
    fn name(&self) -> &'static str {
        "BusyLight Lync"
    }

    fn vendor_id(&self) -> u16 {
        0x04d8
    }

    fn product_id(&self) -> u16 {
        0xf848
    }

    fn color_bytes(&self, color: Rgb) -> Vec<Bytes> {
        vec![busylight_uc::color_frame(color)]
    }

    fn diagnostic_bytes(&self, color: Rgb) -> Option<Bytes> {
        Some(diagnostic_frame(color))
    }
}

/// Build the 67-byte diagnostic report.
fn diagnostic_frame(color: Rgb) -> Bytes {
    let mut buf = BytesMut::with_capacity(DIAGNOSTIC_LEN);

    // Report header.
    buf.put_u8(0x01);
    buf.put_u8(0x00);

    buf.put_u8(color.r);
    buf.put_u8(color.g);
    buf.put_u8(color.b);

    // Unknown, the middle pair possibly controls sound.
    buf.put_slice(&[0x00; 6]);

    // Padding.
    buf.put_slice(&[0x00; 50]);

    buf.put_slice(&DIAGNOSTIC_TRAILER);

    buf.freeze()
}
