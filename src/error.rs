//! Busylight error type.

use std::fmt::{self, Display, Formatter};
use std::io;

/// Busylight device errors.
#[derive(Debug)]
pub enum Error {
    /// The device family has no keep-active mode.
    KeepActiveNotSupported,
    /// Writing a packet to the HID handle failed.
    WriteFailed(String),
    /// The session was already closed.
    UseAfterClose,
    /// Opening the HID handle failed.
    OpenFailed(String),
    /// No controller is registered for this vendor/product pair.
    UnknownDevice { vendor_id: u16, product_id: u16 },
    /// Color string could not be parsed.
    InvalidColor(String),
    /// Spawning the control thread failed.
    Io(io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::KeepActiveNotSupported => write!(f, "keep active is not supported"),
            Error::WriteFailed(err) => write!(f, "unable to write to device: {err}"),
            Error::UseAfterClose => write!(f, "device is closed"),
            Error::OpenFailed(err) => write!(f, "unable to open device: {err}"),
            Error::UnknownDevice { vendor_id, product_id } => {
                write!(f, "unknown device {vendor_id:04x}:{product_id:04x}")
            },
            Error::InvalidColor(color) => {
                write!(f, "color '{color}' does not match format 0xRRGGBB")
            },
            Error::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
