//! Driver for the TI TLC59108 / TLC59108F / TLC59208 8-channel I2C PWM LED
//! controller, built on the `embedded-hal` 1.0 traits.
//!
//! Every operation is a self-contained bus transaction; the driver keeps no
//! register cache. Blocking and async flavours share the same wire behaviour:
//!
//! ```ignore
//! use tlc59108::{LedMode, Tlc59108};
//!
//! let mut leds = Tlc59108::new_blocking(i2c, 0x40);
//! leds.init()?;
//! leds.set_led_output_mode(LedMode::Pwm)?;
//! leds.set_brightness(3, 128)?;
//! leds.set_all_brightness_channels(&[0, 32, 64, 96, 128, 160, 192, 224])?;
//! ```
#![no_std]

pub mod registers;
pub mod tlc59108;
pub mod types;

#[cfg(test)]
mod test_utils;

use embedded_hal::i2c::{Error, ErrorKind};

pub use crate::registers::{AutoIncrement, Register, NUM_CHANNELS};
pub use crate::tlc59108::{Async, Blocking, Mode, Tlc59108};
pub use crate::types::{GroupControl, LedMode, OutputCurrent, ResponseAddress, SubAddress};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tlc59108Error {
    /// The bus reported a failure; nothing is retried
    I2CError(ErrorKind),
    /// The hardware reset pin could not be driven
    PinError(embedded_hal::digital::ErrorKind),
    /// Rejected before any bus traffic: channel > 7, reserved mode bits,
    /// register span past EFLAG or a bitfield value out of range
    InvalidArgument,
    /// A block read returned fewer registers than it needs
    PartialRead { requested: usize, read: usize },
    /// Control byte and data did not fit the transmit frame
    OutOfSpaceError,
}

impl Error for Tlc59108Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Tlc59108Error::I2CError(kind) => *kind,
            _ => ErrorKind::Other,
        }
    }
}
