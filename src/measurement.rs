use crc::{Algorithm, Crc};

use crate::error::Error;
use crate::status::StatusFlags;

/// Length of a measurement payload: status, five data bytes and the CRC.
pub const PAYLOAD_LEN: usize = 7;

/// Raw counts are 20 bits wide.
const FULL_SCALE: f32 = 1_048_576.0;

/// CRC8 used by the AHT2x family.
/// Polynomial: 0x31 (x^8 + x^5 + x^4 + 1)
/// Initial Value: 0xFF
/// Input/Output Reflected: false
/// Final XOR: 0x00
/// Check Value: 0xF7 (for "123456789")
pub const AHT21_CRC: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x31,
    init: 0xFF,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0xF7,
    residue: 0x00,
};

const CRC_COMPUTER: Crc<u8> = Crc::<u8>::new(&AHT21_CRC);

/// Computes the AHT21 CRC8 over `data`.
#[inline]
pub fn crc8(data: &[u8]) -> u8 {
    CRC_COMPUTER.checksum(data)
}

/// Converts a 20-bit raw temperature count to degrees Celsius.
pub fn decode_temperature(raw: u32) -> f32 {
    200.0 * raw as f32 / FULL_SCALE - 50.0
}

/// Converts a 20-bit raw humidity count to percent relative humidity.
///
/// A raw count of exactly zero is not a realistic reading and yields NaN.
pub fn decode_humidity(raw: u32) -> f32 {
    if raw == 0 {
        return f32::NAN;
    }
    raw as f32 * 100.0 / FULL_SCALE
}

/// A CRC-checked measurement, before conversion to engineering units.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawMeasurement {
    /// Status byte that preceded the data.
    pub status: u8,
    /// 20-bit humidity count.
    pub humidity: u32,
    /// 20-bit temperature count.
    pub temperature: u32,
}

impl RawMeasurement {
    /// Validates the checksum of a 7-byte payload and extracts the raw counts.
    ///
    /// # Errors
    ///
    /// Returns `Error::Checksum` if the last byte does not match the CRC of
    /// the first six.
    pub fn from_payload<E>(payload: &[u8; PAYLOAD_LEN]) -> Result<Self, Error<E>> {
        let [status, h0, h1, mixed, t1, t2, received] = *payload;

        let computed = crc8(&payload[..PAYLOAD_LEN - 1]);
        if computed != received {
            return Err(Error::Checksum { received, computed });
        }

        let humidity = (u32::from(h0) << 12) | (u32::from(h1) << 4) | (u32::from(mixed) >> 4);
        let temperature = ((u32::from(mixed) & 0x0F) << 16) | (u32::from(t1) << 8) | u32::from(t2);

        Ok(Self {
            status,
            humidity,
            temperature,
        })
    }

    /// Status flags reported alongside the data.
    pub fn status_flags(&self) -> StatusFlags {
        StatusFlags::from_bits_retain(self.status)
    }

    /// Temperature in degrees Celsius.
    pub fn celsius(&self) -> f32 {
        decode_temperature(self.temperature)
    }

    /// Relative humidity in percent, NaN for a zero reading.
    pub fn relative_humidity(&self) -> f32 {
        decode_humidity(self.humidity)
    }
}
