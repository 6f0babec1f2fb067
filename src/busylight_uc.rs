//! Kuando BusyLight UC control.

use bytes::{BufMut, Bytes, BytesMut};

use crate::color::Rgb;
use crate::controller::HidController;

/// Size of the color frame.
const FRAME_LEN: usize = 9;

pub struct BusylightUc;

impl HidController for BusylightUc {
    fn name(&self) -> &'static str {
        "BusyLight UC"
    }

    fn vendor_id(&self) -> u16 {
        0x27bb
    }

    fn product_id(&self) -> u16 {
        0x3bcb
    }

    fn color_bytes(&self, color: Rgb) -> Vec<Bytes> {
        vec![color_frame(color)]
    }
}

/// Build the 9-byte color frame shared by the UC and Lync models.
pub(crate) fn color_frame(color: Rgb) -> Bytes {
    let mut buf = BytesMut::with_capacity(FRAME_LEN);

    // Padding.
    buf.put_slice(&[0x00; 3]);

    buf.put_u8(color.r);
    buf.put_u8(color.g);
    buf.put_u8(color.b);

    // Padding.
    buf.put_slice(&[0x00; 3]);

    buf.freeze()
}
