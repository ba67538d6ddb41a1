use embedded_hal::digital;

use crate::aht21::State;

/// Possible errors from the AHT21 driver.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error<E> {
    /// Error from the I2C bus (write or read).
    #[error("I2C error: {0:?}")]
    I2c(E),
    /// The power control pin could not be driven.
    #[error("power pin error: {0:?}")]
    Power(digital::ErrorKind),
    /// Checksum did not match the received data.
    #[error("CRC mismatch: received {received:#04x}, computed {computed:#04x}")]
    Checksum {
        /// Checksum byte sent by the sensor.
        received: u8,
        /// Checksum computed over the payload.
        computed: u8,
    },
    /// The sensor was still busy after the given number of status polls.
    #[error("sensor still busy after {0} status polls")]
    Busy(u8),
    /// No power control pin was configured.
    #[error("no power pin configured")]
    MissingPowerPin,
}

impl<E> From<E> for Error<E> {
    fn from(value: E) -> Self {
        Self::I2c(value)
    }
}

/// A non-fatal failure of the last measurement cycle.
///
/// Set whenever a cycle is aborted and cleared by the next successful read.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub struct Warning<E> {
    /// Phase in which the cycle was aborted.
    pub state: State,
    /// What went wrong.
    pub error: Error<E>,
}
