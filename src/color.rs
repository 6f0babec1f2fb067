//! Indicator color.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::Error;

/// RGB color.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Initial color of every session.
    pub const OFF: Rgb = Rgb::new(0x00, 0x00, 0x00);

    /// Color written when a session is closed.
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert from 16 bits per channel, keeping the high byte.
    ///
    /// Alpha is never sent to the hardware.
    pub const fn from_rgba16(r: u16, g: u16, b: u16, _alpha: u16) -> Self {
        Self::new((r >> 8) as u8, (g >> 8) as u8, (b >> 8) as u8)
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Rgb, Error> {
        match s.to_lowercase().as_str() {
            "off" | "black" => return Ok(Rgb::OFF),
            "white" => return Ok(Rgb::WHITE),
            _ => (),
        }

        let chars = match s.strip_prefix("0x").or_else(|| s.strip_prefix('#')) {
            Some(chars) if chars.len() == 6 => chars,
            _ => return Err(Error::InvalidColor(s.into())),
        };

        match u32::from_str_radix(chars, 16) {
            Ok(mut color) => {
                let b = (color & 0xff) as u8;
                color >>= 8;
                let g = (color & 0xff) as u8;
                color >>= 8;
                let r = color as u8;
                Ok(Rgb { r, g, b })
            },
            Err(_) => Err(Error::InvalidColor(s.into())),
        }
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
