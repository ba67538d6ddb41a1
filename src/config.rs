//! Poller configuration.

/// Default I2C address of the AHT21.
pub const DEFAULT_ADDRESS: u8 = 0x38;

/// Timing and addressing of the measurement cycle.
///
/// All durations are in milliseconds.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// 7-bit I2C address of the sensor.
    pub address: u8,
    /// Minimum spacing between the starts of two cycles.
    pub read_interval_ms: u32,
    /// Wait after power-on before the initialization commands.
    pub startup_delay_ms: u32,
    /// Wait between initialization and the measurement trigger.
    pub init_delay_ms: u32,
    /// Wait after the trigger before the first status poll.
    pub conversion_delay_ms: u32,
    /// Wait between two status polls.
    pub poll_delay_ms: u32,
    /// Blocking wait after the first write of a register reset.
    pub reset_settle_ms: u32,
    /// Blocking wait after reading back a register during reset.
    pub reset_readback_ms: u32,
    /// Consecutive busy polls after which the cycle is abandoned.
    pub max_busy_polls: u8,
}

impl Config {
    /// Manufacturer recommended timings, one reading every five minutes.
    pub const DEFAULT: Self = Self {
        address: DEFAULT_ADDRESS,
        read_interval_ms: 300_000,
        startup_delay_ms: 500,
        init_delay_ms: 10,
        // 80 ms conversion time minus the first poll delay
        conversion_delay_ms: 75,
        poll_delay_ms: 5,
        reset_settle_ms: 5,
        reset_readback_ms: 10,
        max_busy_polls: 100,
    };

    /// Use a different I2C address.
    pub const fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Use a different spacing between cycles.
    pub const fn with_read_interval_ms(mut self, read_interval_ms: u32) -> Self {
        self.read_interval_ms = read_interval_ms;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}
