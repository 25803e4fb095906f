use crate::registers::*;
use crate::types::*;
use crate::Tlc59108Error;

use embedded_hal::digital::Error as _;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::Error as _;

/// Longest frame: control byte followed by the whole register file.
const MAX_FRAME_LEN: usize = REGISTER_COUNT + 1;

/// Reset pulse width and recovery time.
const RESET_PULSE_MS: u32 = 1;

const LEDOUT_REGISTERS: usize = NUM_CHANNELS / LEDOUT_CHANNELS_PER_REGISTER as usize;

pub trait Mode {}

#[derive(Debug)]
pub struct Async;
#[derive(Debug)]
pub struct Blocking;

impl Mode for Async {}
impl Mode for Blocking {}

pub struct Tlc59108<BUS, M: Mode> {
    bus: BUS,
    address: u8,
    _phantom: core::marker::PhantomData<M>,
}

// General implementation
impl<BUS, M: Mode> Tlc59108<BUS, M> {
    /// Create a new TLC59108 driver
    /// # Arguments
    /// * `bus` - The I2C bus to use
    /// * `address` - The 7-bit I2C address of the device
    ///
    /// # Returns
    /// A new TLC59108 driver
    pub fn new(bus: BUS, address: u8) -> Self {
        Self {
            bus,
            address,
            _phantom: core::marker::PhantomData,
        }
    }

    /// Create a driver for a chip strapped to the base address (0x40)
    pub fn new_default(bus: BUS) -> Self {
        Self::new(bus, I2C_ADDRESS_BASE)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn into_inner(self) -> BUS {
        self.bus
    }

    pub fn inner(&self) -> &BUS {
        &self.bus
    }

    pub fn inner_mut(&mut self) -> &mut BUS {
        &mut self.bus
    }
}

/// Prefix `data` with the control byte for `start` in `mode`.
fn frame(
    mode: AutoIncrement,
    start: Register,
    data: &[u8],
) -> Result<heapless::Vec<u8, MAX_FRAME_LEN>, Tlc59108Error> {
    let mut buffer: heapless::Vec<u8, MAX_FRAME_LEN> = heapless::Vec::new();
    buffer
        .push(mode.control_byte(start))
        .map_err(|_| Tlc59108Error::OutOfSpaceError)?;
    buffer
        .extend_from_slice(data)
        .map_err(|_| Tlc59108Error::OutOfSpaceError)?;
    Ok(buffer)
}

fn merge(current: u8, mask: u8, bits: u8) -> u8 {
    (current & !mask) | (bits & mask)
}

/// Mask and value placing `mode` in the LEDOUT slot of `channel`.
fn ledout_slot(channel: u8, mode: LedMode) -> (u8, u8) {
    let shift = (channel % LEDOUT_CHANNELS_PER_REGISTER) * LEDOUT_BITS_PER_CHANNEL;
    (LEDOUT_SLOT_MASK << shift, (mode as u8) << shift)
}

fn decode_ledout(raw: [u8; LEDOUT_REGISTERS]) -> [LedMode; NUM_CHANNELS] {
    let mut modes = [LedMode::Off; NUM_CHANNELS];
    for (channel, mode) in modes.iter_mut().enumerate() {
        let shift = (channel % LEDOUT_CHANNELS_PER_REGISTER as usize)
            * LEDOUT_BITS_PER_CHANNEL as usize;
        *mode = LedMode::from_slot(raw[channel / LEDOUT_CHANNELS_PER_REGISTER as usize] >> shift);
    }
    modes
}

fn check_full_read(requested: usize, read: usize) -> Result<(), Tlc59108Error> {
    if read != requested {
        return Err(Tlc59108Error::PartialRead { requested, read });
    }
    Ok(())
}

fn group_control_bits(control: GroupControl) -> u8 {
    match control {
        GroupControl::Dimming => 0,
        GroupControl::Blinking => MODE2_DMBLNK,
    }
}

impl<BUS: embedded_hal::i2c::I2c> Tlc59108<BUS, Blocking> {
    pub fn new_blocking(bus: BUS, address: u8) -> Self {
        Self::new(bus, address)
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<(), Tlc59108Error> {
        #[cfg(feature = "defmt")]
        defmt::trace!("TLC59108 0x{:02x} <- {=[u8]:x}", self.address, frame);

        self.bus
            .write(self.address, frame)
            .map_err(|e| Tlc59108Error::I2CError(e.kind()))
    }

    fn receive(&mut self, control: u8, data: &mut [u8]) -> Result<(), Tlc59108Error> {
        self.bus
            .write_read(self.address, &[control], data)
            .map_err(|e| Tlc59108Error::I2CError(e.kind()))?;

        #[cfg(feature = "defmt")]
        defmt::trace!("TLC59108 0x{:02x} [{:02x}] -> {=[u8]:x}", self.address, control, &*data);

        Ok(())
    }

    /// Write a single register, no auto-increment
    pub fn write_register(&mut self, register: Register, value: u8) -> Result<(), Tlc59108Error> {
        self.transmit(&[AutoIncrement::None.control_byte(register), value])
    }

    /// Write consecutive registers starting at `start` in one transaction,
    /// incrementing through all registers.
    ///
    /// # Returns
    /// * Err(Tlc59108Error::InvalidArgument) if the values run past EFLAG
    pub fn write_registers(&mut self, start: Register, values: &[u8]) -> Result<(), Tlc59108Error> {
        start.span(values.len())?;
        self.write_auto_increment(AutoIncrement::All, start, values)
    }

    fn write_auto_increment(
        &mut self,
        mode: AutoIncrement,
        start: Register,
        values: &[u8],
    ) -> Result<(), Tlc59108Error> {
        let frame = frame(mode, start, values)?;
        self.transmit(&frame)
    }

    /// Read a single register. The address byte and the read are joined by a
    /// repeated start rather than a STOP followed by a new transaction.
    pub fn read_register(&mut self, register: Register) -> Result<u8, Tlc59108Error> {
        let mut data = [0];
        self.receive(AutoIncrement::None.control_byte(register), &mut data)?;
        Ok(data[0])
    }

    /// Read up to `count` consecutive registers starting at `start` into `dest`
    ///
    /// # Returns
    /// * Ok(n) with the number of bytes copied, never more than `dest.len()`.
    ///   Callers compare `n` against `count` to detect a short read.
    pub fn read_registers(
        &mut self,
        dest: &mut [u8],
        start: Register,
        count: usize,
    ) -> Result<usize, Tlc59108Error> {
        let len = count.min(dest.len());
        if len == 0 {
            return Ok(0);
        }
        start.span(len)?;

        self.receive(AutoIncrement::All.control_byte(start), &mut dest[..len])?;
        Ok(len)
    }

    fn update_register(&mut self, register: Register, mask: u8, bits: u8) -> Result<(), Tlc59108Error> {
        let current = self.read_register(register)?;
        self.write_register(register, merge(current, mask, bits))
    }

    /// Initialize the device: respond to the all-call address and start
    /// the oscillator.
    pub fn init(&mut self) -> Result<(), Tlc59108Error> {
        #[cfg(feature = "defmt")]
        defmt::debug!("TLC59108 0x{:02x}: init", self.address);

        self.write_register(Register::Mode1, MODE1_ALLCALL)
    }

    /// Pulse the hardware reset line, then [`init`](Self::init).
    ///
    /// # Arguments
    /// * `reset` - Output pin wired to the chip's RESET input
    /// * `delay` - Used to time the reset pulse
    pub fn init_with_reset<P, D>(&mut self, reset: &mut P, delay: &mut D) -> Result<(), Tlc59108Error>
    where
        P: OutputPin,
        D: embedded_hal::delay::DelayNs,
    {
        #[cfg(feature = "defmt")]
        defmt::debug!("TLC59108 0x{:02x}: hardware reset", self.address);

        reset
            .set_low()
            .map_err(|e| Tlc59108Error::PinError(e.kind()))?;
        delay.delay_ms(RESET_PULSE_MS);
        reset
            .set_high()
            .map_err(|e| Tlc59108Error::PinError(e.kind()))?;
        delay.delay_ms(RESET_PULSE_MS);

        self.init()
    }

    /// Send the software reset call. Every TLC59108 on the bus resets,
    /// not only this one.
    pub fn software_reset(&mut self) -> Result<(), Tlc59108Error> {
        #[cfg(feature = "defmt")]
        defmt::debug!("TLC59108: software reset call");

        self.bus
            .write(I2C_ADDRESS_SWRESET, &SOFTWARE_RESET_SEQUENCE)
            .map_err(|e| Tlc59108Error::I2CError(e.kind()))
    }

    /// Set the PWM duty cycle of one channel
    ///
    /// # Returns
    /// * Err(Tlc59108Error::InvalidArgument) if `channel` > 7, nothing is sent
    pub fn set_brightness(&mut self, channel: u8, duty_cycle: u8) -> Result<(), Tlc59108Error> {
        let register = Register::pwm(channel)?;
        self.write_register(register, duty_cycle)
    }

    pub fn brightness(&mut self, channel: u8) -> Result<u8, Tlc59108Error> {
        let register = Register::pwm(channel)?;
        self.read_register(register)
    }

    /// Set every channel to the same duty cycle in one transaction
    pub fn set_all_brightness(&mut self, duty_cycle: u8) -> Result<(), Tlc59108Error> {
        self.write_auto_increment(
            AutoIncrement::Individual,
            Register::Pwm0,
            &[duty_cycle; NUM_CHANNELS],
        )
    }

    /// Set the duty cycle of channels 0 to 7 in one transaction
    pub fn set_all_brightness_channels(
        &mut self,
        duty_cycles: &[u8; NUM_CHANNELS],
    ) -> Result<(), Tlc59108Error> {
        self.write_auto_increment(AutoIncrement::Individual, Register::Pwm0, duty_cycles)
    }

    /// Read the duty cycle of all channels
    ///
    /// # Returns
    /// * Err(Tlc59108Error::PartialRead) if fewer than 8 registers came back
    pub fn all_brightness(&mut self) -> Result<[u8; NUM_CHANNELS], Tlc59108Error> {
        let mut duty_cycles = [0; NUM_CHANNELS];
        let read = self.read_registers(&mut duty_cycles, Register::Pwm0, NUM_CHANNELS)?;
        check_full_read(NUM_CHANNELS, read)?;
        Ok(duty_cycles)
    }

    /// Apply one output mode to all channels.
    /// Fails as soon as either LEDOUT write fails.
    pub fn set_led_output_mode(&mut self, mode: LedMode) -> Result<(), Tlc59108Error> {
        let packed = mode.packed();
        self.write_register(Register::LedOut0, packed)?;
        self.write_register(Register::LedOut1, packed)
    }

    /// Change the output mode of one channel, leaving the others untouched
    pub fn set_channel_output_mode(&mut self, channel: u8, mode: LedMode) -> Result<(), Tlc59108Error> {
        let register = Register::ledout(channel)?;
        let (mask, bits) = ledout_slot(channel, mode);
        self.update_register(register, mask, bits)
    }

    pub fn led_output_modes(&mut self) -> Result<[LedMode; NUM_CHANNELS], Tlc59108Error> {
        let mut raw = [0; LEDOUT_REGISTERS];
        let read = self.read_registers(&mut raw, Register::LedOut0, LEDOUT_REGISTERS)?;
        check_full_read(LEDOUT_REGISTERS, read)?;
        Ok(decode_ledout(raw))
    }

    pub fn set_group_pwm(&mut self, duty_cycle: u8) -> Result<(), Tlc59108Error> {
        self.write_register(Register::GrpPwm, duty_cycle)
    }

    pub fn set_group_frequency(&mut self, frequency: u8) -> Result<(), Tlc59108Error> {
        self.write_register(Register::GrpFreq, frequency)
    }

    /// Select whether GRPPWM/GRPFREQ dim or blink channels in `PwmGroup` mode
    pub fn set_group_control(&mut self, control: GroupControl) -> Result<(), Tlc59108Error> {
        self.update_register(Register::Mode2, MODE2_DMBLNK, group_control_bits(control))
    }

    pub fn error_flags(&mut self) -> Result<u8, Tlc59108Error> {
        self.read_register(Register::Eflag)
    }

    /// Pulse MODE2.EFCLR: EFLAG is held clear while the bit is set, so it is
    /// written back to 0 to let new errors latch.
    pub fn clear_error_flags(&mut self) -> Result<(), Tlc59108Error> {
        let mode2 = self.read_register(Register::Mode2)?;
        self.write_register(Register::Mode2, mode2 | MODE2_EFCLR)?;
        self.write_register(Register::Mode2, mode2 & !MODE2_EFCLR)
    }

    /// Start (`true`) or stop the internal oscillator. Outputs are off while it is stopped.
    pub fn set_oscillator(&mut self, enabled: bool) -> Result<(), Tlc59108Error> {
        let bits = if enabled { 0 } else { MODE1_OSC_OFF };
        self.update_register(Register::Mode1, MODE1_OSC_OFF, bits)
    }

    /// Program a secondary 7-bit address. Use [`enable_address`](Self::enable_address) to make the chip answer on it.
    pub fn set_subaddress(&mut self, sub: SubAddress, address: u8) -> Result<(), Tlc59108Error> {
        let value = address_register_value(address)?;
        self.write_register(sub.register(), value)
    }

    pub fn set_allcall_address(&mut self, address: u8) -> Result<(), Tlc59108Error> {
        let value = address_register_value(address)?;
        self.write_register(Register::AllCallAdr, value)
    }

    pub fn enable_address(&mut self, address: ResponseAddress, enabled: bool) -> Result<(), Tlc59108Error> {
        let bit = address.mode1_bit();
        self.update_register(Register::Mode1, bit, if enabled { bit } else { 0 })
    }

    pub fn set_output_current(&mut self, current: OutputCurrent) -> Result<(), Tlc59108Error> {
        let value = current.to_register()?;
        self.write_register(Register::Iref, value)
    }
}

impl<BUS: embedded_hal_async::i2c::I2c> Tlc59108<BUS, Async> {
    pub fn new_async(bus: BUS, address: u8) -> Self {
        Self::new(bus, address)
    }

    async fn transmit(&mut self, frame: &[u8]) -> Result<(), Tlc59108Error> {
        #[cfg(feature = "defmt")]
        defmt::trace!("TLC59108 0x{:02x} <- {=[u8]:x}", self.address, frame);

        self.bus
            .write(self.address, frame)
            .await
            .map_err(|e| Tlc59108Error::I2CError(e.kind()))
    }

    async fn receive(&mut self, control: u8, data: &mut [u8]) -> Result<(), Tlc59108Error> {
        self.bus
            .write_read(self.address, &[control], data)
            .await
            .map_err(|e| Tlc59108Error::I2CError(e.kind()))?;

        #[cfg(feature = "defmt")]
        defmt::trace!("TLC59108 0x{:02x} [{:02x}] -> {=[u8]:x}", self.address, control, &*data);

        Ok(())
    }

    /// Write a single register, no auto-increment
    pub async fn write_register(&mut self, register: Register, value: u8) -> Result<(), Tlc59108Error> {
        self.transmit(&[AutoIncrement::None.control_byte(register), value])
            .await
    }

    /// Write consecutive registers starting at `start` in one transaction,
    /// incrementing through all registers.
    ///
    /// # Returns
    /// * Err(Tlc59108Error::InvalidArgument) if the values run past EFLAG
    pub async fn write_registers(&mut self, start: Register, values: &[u8]) -> Result<(), Tlc59108Error> {
        start.span(values.len())?;
        self.write_auto_increment(AutoIncrement::All, start, values)
            .await
    }

    async fn write_auto_increment(
        &mut self,
        mode: AutoIncrement,
        start: Register,
        values: &[u8],
    ) -> Result<(), Tlc59108Error> {
        let frame = frame(mode, start, values)?;
        self.transmit(&frame).await
    }

    /// Read a single register, address and data joined by a repeated start
    pub async fn read_register(&mut self, register: Register) -> Result<u8, Tlc59108Error> {
        let mut data = [0];
        self.receive(AutoIncrement::None.control_byte(register), &mut data)
            .await?;
        Ok(data[0])
    }

    /// Read up to `count` consecutive registers starting at `start` into `dest`
    ///
    /// # Returns
    /// * Ok(n) with the number of bytes copied, never more than `dest.len()`.
    ///   Callers compare `n` against `count` to detect a short read.
    pub async fn read_registers(
        &mut self,
        dest: &mut [u8],
        start: Register,
        count: usize,
    ) -> Result<usize, Tlc59108Error> {
        let len = count.min(dest.len());
        if len == 0 {
            return Ok(0);
        }
        start.span(len)?;

        self.receive(AutoIncrement::All.control_byte(start), &mut dest[..len])
            .await?;
        Ok(len)
    }

    async fn update_register(&mut self, register: Register, mask: u8, bits: u8) -> Result<(), Tlc59108Error> {
        let current = self.read_register(register).await?;
        self.write_register(register, merge(current, mask, bits))
            .await
    }

    /// Initialize the device: respond to the all-call address and start
    /// the oscillator.
    pub async fn init(&mut self) -> Result<(), Tlc59108Error> {
        #[cfg(feature = "defmt")]
        defmt::debug!("TLC59108 0x{:02x}: init", self.address);

        self.write_register(Register::Mode1, MODE1_ALLCALL).await
    }

    /// Pulse the hardware reset line, then [`init`](Self::init).
    pub async fn init_with_reset<P, D>(&mut self, reset: &mut P, delay: &mut D) -> Result<(), Tlc59108Error>
    where
        P: OutputPin,
        D: embedded_hal_async::delay::DelayNs,
    {
        #[cfg(feature = "defmt")]
        defmt::debug!("TLC59108 0x{:02x}: hardware reset", self.address);

        reset
            .set_low()
            .map_err(|e| Tlc59108Error::PinError(e.kind()))?;
        delay.delay_ms(RESET_PULSE_MS).await;
        reset
            .set_high()
            .map_err(|e| Tlc59108Error::PinError(e.kind()))?;
        delay.delay_ms(RESET_PULSE_MS).await;

        self.init().await
    }

    /// Send the software reset call. Every TLC59108 on the bus resets,
    /// not only this one.
    pub async fn software_reset(&mut self) -> Result<(), Tlc59108Error> {
        #[cfg(feature = "defmt")]
        defmt::debug!("TLC59108: software reset call");

        self.bus
            .write(I2C_ADDRESS_SWRESET, &SOFTWARE_RESET_SEQUENCE)
            .await
            .map_err(|e| Tlc59108Error::I2CError(e.kind()))
    }

    pub async fn set_brightness(&mut self, channel: u8, duty_cycle: u8) -> Result<(), Tlc59108Error> {
        let register = Register::pwm(channel)?;
        self.write_register(register, duty_cycle).await
    }

    pub async fn brightness(&mut self, channel: u8) -> Result<u8, Tlc59108Error> {
        let register = Register::pwm(channel)?;
        self.read_register(register).await
    }

    pub async fn set_all_brightness(&mut self, duty_cycle: u8) -> Result<(), Tlc59108Error> {
        self.write_auto_increment(
            AutoIncrement::Individual,
            Register::Pwm0,
            &[duty_cycle; NUM_CHANNELS],
        )
        .await
    }

    pub async fn set_all_brightness_channels(
        &mut self,
        duty_cycles: &[u8; NUM_CHANNELS],
    ) -> Result<(), Tlc59108Error> {
        self.write_auto_increment(AutoIncrement::Individual, Register::Pwm0, duty_cycles)
            .await
    }

    pub async fn all_brightness(&mut self) -> Result<[u8; NUM_CHANNELS], Tlc59108Error> {
        let mut duty_cycles = [0; NUM_CHANNELS];
        let read = self
            .read_registers(&mut duty_cycles, Register::Pwm0, NUM_CHANNELS)
            .await?;
        check_full_read(NUM_CHANNELS, read)?;
        Ok(duty_cycles)
    }

    pub async fn set_led_output_mode(&mut self, mode: LedMode) -> Result<(), Tlc59108Error> {
        let packed = mode.packed();
        self.write_register(Register::LedOut0, packed).await?;
        self.write_register(Register::LedOut1, packed).await
    }

    pub async fn set_channel_output_mode(&mut self, channel: u8, mode: LedMode) -> Result<(), Tlc59108Error> {
        let register = Register::ledout(channel)?;
        let (mask, bits) = ledout_slot(channel, mode);
        self.update_register(register, mask, bits).await
    }

    pub async fn led_output_modes(&mut self) -> Result<[LedMode; NUM_CHANNELS], Tlc59108Error> {
        let mut raw = [0; LEDOUT_REGISTERS];
        let read = self
            .read_registers(&mut raw, Register::LedOut0, LEDOUT_REGISTERS)
            .await?;
        check_full_read(LEDOUT_REGISTERS, read)?;
        Ok(decode_ledout(raw))
    }

    pub async fn set_group_pwm(&mut self, duty_cycle: u8) -> Result<(), Tlc59108Error> {
        self.write_register(Register::GrpPwm, duty_cycle).await
    }

    pub async fn set_group_frequency(&mut self, frequency: u8) -> Result<(), Tlc59108Error> {
        self.write_register(Register::GrpFreq, frequency).await
    }

    pub async fn set_group_control(&mut self, control: GroupControl) -> Result<(), Tlc59108Error> {
        self.update_register(Register::Mode2, MODE2_DMBLNK, group_control_bits(control))
            .await
    }

    pub async fn error_flags(&mut self) -> Result<u8, Tlc59108Error> {
        self.read_register(Register::Eflag).await
    }

    pub async fn clear_error_flags(&mut self) -> Result<(), Tlc59108Error> {
        let mode2 = self.read_register(Register::Mode2).await?;
        self.write_register(Register::Mode2, mode2 | MODE2_EFCLR)
            .await?;
        self.write_register(Register::Mode2, mode2 & !MODE2_EFCLR)
            .await
    }

    pub async fn set_oscillator(&mut self, enabled: bool) -> Result<(), Tlc59108Error> {
        let bits = if enabled { 0 } else { MODE1_OSC_OFF };
        self.update_register(Register::Mode1, MODE1_OSC_OFF, bits)
            .await
    }

    pub async fn set_subaddress(&mut self, sub: SubAddress, address: u8) -> Result<(), Tlc59108Error> {
        let value = address_register_value(address)?;
        self.write_register(sub.register(), value).await
    }

    pub async fn set_allcall_address(&mut self, address: u8) -> Result<(), Tlc59108Error> {
        let value = address_register_value(address)?;
        self.write_register(Register::AllCallAdr, value).await
    }

    pub async fn enable_address(&mut self, address: ResponseAddress, enabled: bool) -> Result<(), Tlc59108Error> {
        let bit = address.mode1_bit();
        self.update_register(Register::Mode1, bit, if enabled { bit } else { 0 })
            .await
    }

    pub async fn set_output_current(&mut self, current: OutputCurrent) -> Result<(), Tlc59108Error> {
        let value = current.to_register()?;
        self.write_register(Register::Iref, value).await
    }
}
