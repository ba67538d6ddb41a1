use embedded_hal::{delay::DelayNs, i2c::I2c};

use crate::error::Error;
use crate::measurement::{PAYLOAD_LEN, RawMeasurement};
use crate::status::StatusFlags;

/// Initialization is performed by writing two bytes to registers 0xA8 and 0xBE.
const INITIALIZE_CMD1: [u8; 3] = [0xA8, 0x00, 0x00];
const INITIALIZE_CMD2: [u8; 3] = [0xBE, 0x08, 0x00];

/// Measurement is triggered by writing two bytes to register 0xAC.
const MEASURE_CMD: [u8; 3] = [0xAC, 0x33, 0x00];

/// Calibration registers rewritten when the status asks for a reset, in order.
pub const RESET_REGISTERS: [u8; 3] = [0x1B, 0x1C, 0x1E];

/// Or'ed with the register address when confirming a reset.
const RESET_REGISTER_MASK: u8 = 0xB0;

/// Command layer of the AHT21 on an I2C bus.
///
/// Every method is a short, bounded bus sequence; waiting for the sensor is
/// left to the caller except inside [`Device::reset_register`].
pub struct Device<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> Device<I2C>
where
    I2C: I2c,
{
    /// Creates a device talking to `address` on `i2c`.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Changes the address used for subsequent transfers.
    pub fn set_address(&mut self, address: u8) {
        self.address = address;
    }

    /// Sends the two-step initialization sequence.
    pub fn initialize(&mut self) -> Result<(), Error<I2C::Error>> {
        self.i2c.write(self.address, &INITIALIZE_CMD1)?;
        self.i2c.write(self.address, &INITIALIZE_CMD2)?;
        Ok(())
    }

    /// Reads the status byte.
    pub fn status(&mut self) -> Result<StatusFlags, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c.read(self.address, &mut buf)?;

        Ok(StatusFlags::from_bits_retain(buf[0]))
    }

    /// Rewrites one calibration register.
    ///
    /// Writes the register followed by two zero bytes, reads three bytes
    /// back, then confirms with `(0xB0 | register)` followed by the last two
    /// bytes read. Blocks for `settle_ms` and `readback_ms` between the steps.
    pub fn reset_register<D: DelayNs>(
        &mut self,
        register: u8,
        delay: &mut D,
        settle_ms: u32,
        readback_ms: u32,
    ) -> Result<(), Error<I2C::Error>> {
        let mut data = [register, 0x00, 0x00];

        trace!("Resetting register {}", register);

        if let Err(e) = self.i2c.write(self.address, &data) {
            warn!("Error resetting register {} (step 1)", register);
            return Err(e.into());
        }

        delay.delay_ms(settle_ms);

        if let Err(e) = self.i2c.read(self.address, &mut data) {
            warn!("Error resetting register {} (step 2)", register);
            return Err(e.into());
        }

        delay.delay_ms(readback_ms);

        data[0] = RESET_REGISTER_MASK | register;
        if let Err(e) = self.i2c.write(self.address, &data) {
            warn!("Error resetting register {} (step 3)", register);
            return Err(e.into());
        }

        Ok(())
    }

    /// Starts a conversion.
    pub fn trigger_measurement(&mut self) -> Result<(), Error<I2C::Error>> {
        self.i2c.write(self.address, &MEASURE_CMD)?;
        Ok(())
    }

    /// Reads the 7-byte result of a finished conversion and checks its CRC.
    pub fn read_measurement(&mut self) -> Result<RawMeasurement, Error<I2C::Error>> {
        let mut buf = [0u8; PAYLOAD_LEN];
        self.i2c.read(self.address, &mut buf)?;

        trace!("Measurement payload {:?}", buf);

        RawMeasurement::from_payload(&buf)
    }
}
