use crate::Tlc59108Error;

// Default I2C addresses, datasheet pp 12-13
pub const I2C_ADDRESS_BASE: u8 = 0x40;
pub const I2C_ADDRESS_SWRESET: u8 = 0x4b;
pub const I2C_ADDRESS_ALLCALL: u8 = 0x48;
pub const I2C_ADDRESS_SUB1: u8 = 0x49;
pub const I2C_ADDRESS_SUB2: u8 = 0x4a;
pub const I2C_ADDRESS_SUB3: u8 = 0x4c;

/// Bytes the software reset call address expects, in order.
pub const SOFTWARE_RESET_SEQUENCE: [u8; 2] = [0xa5, 0x5a];

pub const NUM_CHANNELS: usize = 8;

/// Number of registers in the register file (0x00..=0x13).
pub const REGISTER_COUNT: usize = 0x14;

/// The address part of the control byte occupies bits 4:0.
pub const REGISTER_ADDRESS_MASK: u8 = 0b0001_1111;

pub const MODE1_OSC_OFF: u8 = 0b0001_0000;
pub const MODE1_SUB1: u8 = 0b0000_1000;
pub const MODE1_SUB2: u8 = 0b0000_0100;
pub const MODE1_SUB3: u8 = 0b0000_0010;
pub const MODE1_ALLCALL: u8 = 0b0000_0001;

pub const MODE2_EFCLR: u8 = 0b1000_0000;
pub const MODE2_DMBLNK: u8 = 0b0010_0000;
pub const MODE2_OCH: u8 = 0b0000_1000;

pub const IREF_CM: u8 = 0b1000_0000;
pub const IREF_HC: u8 = 0b0100_0000;
pub const IREF_CC_MASK: u8 = 0b0011_1111;

/// Width of one channel slot in LEDOUT0/LEDOUT1.
pub const LEDOUT_BITS_PER_CHANNEL: u8 = 2;
pub const LEDOUT_CHANNELS_PER_REGISTER: u8 = 4;
pub const LEDOUT_SLOT_MASK: u8 = 0b11;

/// Register map, datasheet p 16.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    Mode1 = 0x00,
    Mode2 = 0x01,
    Pwm0 = 0x02,
    Pwm1 = 0x03,
    Pwm2 = 0x04,
    Pwm3 = 0x05,
    Pwm4 = 0x06,
    Pwm5 = 0x07,
    Pwm6 = 0x08,
    Pwm7 = 0x09,
    GrpPwm = 0x0a,
    GrpFreq = 0x0b,
    LedOut0 = 0x0c,
    LedOut1 = 0x0d,
    SubAdr1 = 0x0e,
    SubAdr2 = 0x0f,
    SubAdr3 = 0x10,
    AllCallAdr = 0x11,
    Iref = 0x12,
    Eflag = 0x13,
}

const REGISTERS: [Register; REGISTER_COUNT] = [
    Register::Mode1,
    Register::Mode2,
    Register::Pwm0,
    Register::Pwm1,
    Register::Pwm2,
    Register::Pwm3,
    Register::Pwm4,
    Register::Pwm5,
    Register::Pwm6,
    Register::Pwm7,
    Register::GrpPwm,
    Register::GrpFreq,
    Register::LedOut0,
    Register::LedOut1,
    Register::SubAdr1,
    Register::SubAdr2,
    Register::SubAdr3,
    Register::AllCallAdr,
    Register::Iref,
    Register::Eflag,
];

impl Register {
    pub const fn addr(self) -> u8 {
        self as u8
    }

    /// PWM duty cycle register of `channel`.
    pub fn pwm(channel: u8) -> Result<Self, Tlc59108Error> {
        if channel as usize >= NUM_CHANNELS {
            return Err(Tlc59108Error::InvalidArgument);
        }
        Self::try_from(Register::Pwm0.addr() + channel)
    }

    /// LEDOUT register holding the output mode slot of `channel`.
    pub fn ledout(channel: u8) -> Result<Self, Tlc59108Error> {
        match channel {
            0..=3 => Ok(Register::LedOut0),
            4..=7 => Ok(Register::LedOut1),
            _ => Err(Tlc59108Error::InvalidArgument),
        }
    }

    /// Checks that `len` consecutive registers starting here exist.
    pub fn span(self, len: usize) -> Result<(), Tlc59108Error> {
        if self.addr() as usize + len > REGISTER_COUNT {
            return Err(Tlc59108Error::InvalidArgument);
        }
        Ok(())
    }
}

impl TryFrom<u8> for Register {
    type Error = Tlc59108Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        REGISTERS
            .get(value as usize)
            .copied()
            .ok_or(Tlc59108Error::InvalidArgument)
    }
}

/// Register auto-increment modes for accessing multiple registers,
/// datasheet p 13. The mode is OR'd into bits 7:5 of the control byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AutoIncrement {
    None = 0x00,
    /// Increment through all registers (initial setup)
    All = 0x80,
    /// Increment through the individual brightness registers only
    Individual = 0xa0,
    /// Increment through the global control registers only
    Global = 0xc0,
    /// Increment through individual and global registers
    IndividualGlobal = 0xe0,
}

impl AutoIncrement {
    /// Builds the control byte sent ahead of register data.
    pub const fn control_byte(self, register: Register) -> u8 {
        (register.addr() & REGISTER_ADDRESS_MASK) | self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_lookup_matches_discriminants() {
        for (index, register) in REGISTERS.iter().enumerate() {
            assert_eq!(register.addr() as usize, index);
            assert_eq!(Register::try_from(index as u8), Ok(*register));
        }
        assert_eq!(
            Register::try_from(0x14),
            Err(Tlc59108Error::InvalidArgument)
        );
    }

    #[test]
    fn pwm_register_per_channel() {
        assert_eq!(Register::pwm(0), Ok(Register::Pwm0));
        assert_eq!(Register::pwm(3), Ok(Register::Pwm3));
        assert_eq!(Register::pwm(7), Ok(Register::Pwm7));
        assert_eq!(Register::pwm(8), Err(Tlc59108Error::InvalidArgument));
    }

    #[test]
    fn control_byte_keeps_address_bits() {
        assert_eq!(AutoIncrement::None.control_byte(Register::Pwm3), 0x05);
        assert_eq!(AutoIncrement::All.control_byte(Register::Mode1), 0x80);
        assert_eq!(AutoIncrement::Individual.control_byte(Register::Pwm0), 0xa2);
        assert_eq!(AutoIncrement::Global.control_byte(Register::GrpPwm), 0xca);
        assert_eq!(
            AutoIncrement::IndividualGlobal.control_byte(Register::Eflag),
            0xf3
        );
    }

    #[test]
    fn span_rejects_reads_past_eflag() {
        assert!(Register::Mode1.span(REGISTER_COUNT).is_ok());
        assert!(Register::Eflag.span(1).is_ok());
        assert_eq!(Register::Eflag.span(2), Err(Tlc59108Error::InvalidArgument));
        assert_eq!(Register::Pwm0.span(19), Err(Tlc59108Error::InvalidArgument));
    }
}
