use crate::registers::*;
use crate::Tlc59108Error;

/// Output state of one LED channel, as stored in LEDOUT0/LEDOUT1.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedMode {
    /// Driver off
    Off = 0,
    /// Fully on, PWM ignored
    FullOn = 1,
    /// Controlled by the channel's PWM register
    Pwm = 2,
    /// Controlled by the channel's PWM register and GRPPWM
    PwmGroup = 3,
}

impl LedMode {
    /// The mode repeated in all four channel slots of a LEDOUT register.
    pub const fn packed(self) -> u8 {
        let mode = self as u8;
        (mode << 6) | (mode << 4) | (mode << 2) | mode
    }

    pub(crate) fn from_slot(bits: u8) -> Self {
        match bits & LEDOUT_SLOT_MASK {
            0 => LedMode::Off,
            1 => LedMode::FullOn,
            2 => LedMode::Pwm,
            _ => LedMode::PwmGroup,
        }
    }
}

impl TryFrom<u8> for LedMode {
    type Error = Tlc59108Error;

    /// Fails for any value using bits 2..7.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value & !LEDOUT_SLOT_MASK != 0 {
            return Err(Tlc59108Error::InvalidArgument);
        }
        Ok(Self::from_slot(value))
    }
}

/// What GRPPWM/GRPFREQ act on, selected by MODE2.DMBLNK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GroupControl {
    Dimming,
    Blinking,
}

/// Programmable secondary I2C addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubAddress {
    Sub1,
    Sub2,
    Sub3,
}

impl SubAddress {
    pub(crate) const fn register(self) -> Register {
        match self {
            SubAddress::Sub1 => Register::SubAdr1,
            SubAddress::Sub2 => Register::SubAdr2,
            SubAddress::Sub3 => Register::SubAdr3,
        }
    }
}

/// Addresses the chip can be told to respond to, besides its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseAddress {
    Sub(SubAddress),
    AllCall,
}

impl ResponseAddress {
    pub(crate) const fn mode1_bit(self) -> u8 {
        match self {
            ResponseAddress::Sub(SubAddress::Sub1) => MODE1_SUB1,
            ResponseAddress::Sub(SubAddress::Sub2) => MODE1_SUB2,
            ResponseAddress::Sub(SubAddress::Sub3) => MODE1_SUB3,
            ResponseAddress::AllCall => MODE1_ALLCALL,
        }
    }
}

/// Contents of the IREF register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputCurrent {
    /// CM: current multiplier
    pub multiplier: bool,
    /// HC: subcurrent
    pub half: bool,
    /// CC: 6-bit current adjust
    pub adjust: u8,
}

impl OutputCurrent {
    pub fn to_register(self) -> Result<u8, Tlc59108Error> {
        if self.adjust & !IREF_CC_MASK != 0 {
            return Err(Tlc59108Error::InvalidArgument);
        }

        let mut value = self.adjust;
        if self.multiplier {
            value |= IREF_CM;
        }
        if self.half {
            value |= IREF_HC;
        }
        Ok(value)
    }
}

/// Encodes a 7-bit I2C address the way SUBADRx/ALLCALLADR store it (bits 7:1).
pub(crate) fn address_register_value(address: u8) -> Result<u8, Tlc59108Error> {
    if address > 0x7f {
        return Err(Tlc59108Error::InvalidArgument);
    }
    Ok(address << 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn led_mode_packing() {
        for raw in 0..=3u8 {
            let mode = LedMode::try_from(raw).unwrap();
            assert_eq!(mode as u8, raw);
            assert_eq!(mode.packed(), raw | (raw << 2) | (raw << 4) | (raw << 6));
        }
        assert_eq!(LedMode::Pwm.packed(), 0xaa);
        assert_eq!(LedMode::PwmGroup.packed(), 0xff);
    }

    #[test]
    fn led_mode_rejects_reserved_bits() {
        for raw in 4..=255u8 {
            assert_eq!(LedMode::try_from(raw), Err(Tlc59108Error::InvalidArgument));
        }
    }

    #[test]
    fn output_current_encoding() {
        let current = OutputCurrent {
            multiplier: true,
            half: false,
            adjust: 0x3f,
        };
        assert_eq!(current.to_register(), Ok(0xbf));

        let current = OutputCurrent {
            multiplier: false,
            half: true,
            adjust: 0x01,
        };
        assert_eq!(current.to_register(), Ok(0x41));

        let current = OutputCurrent {
            adjust: 0x40,
            ..Default::default()
        };
        assert_eq!(current.to_register(), Err(Tlc59108Error::InvalidArgument));
    }

    #[test]
    fn address_registers_hold_shifted_address() {
        assert_eq!(address_register_value(I2C_ADDRESS_SUB1), Ok(0x92));
        assert_eq!(address_register_value(I2C_ADDRESS_ALLCALL), Ok(0x90));
        assert_eq!(
            address_register_value(0x80),
            Err(Tlc59108Error::InvalidArgument)
        );
    }
}
