use bitflags::bitflags;

bitflags! {
    /// AHT21 status byte.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        /// Device is busy measuring.
        const BUSY = 1 << 7;
        /// Calibration bit 4.
        const CALIBRATION_RESET = 1 << 4;
        /// Device is calibrated.
        const CALIBRATION_ENABLE = 1 << 3;
        /// Both calibration bits set: registers 0x1B, 0x1C and 0x1E must be
        /// reset before the first measurement.
        const RESET_REQUIRED = Self::CALIBRATION_RESET.bits() | Self::CALIBRATION_ENABLE.bits();
    }
}

impl StatusFlags {
    /// Whether a conversion is still in progress.
    pub fn is_busy(self) -> bool {
        self.contains(Self::BUSY)
    }

    /// Whether the calibration registers have to be reset.
    pub fn needs_register_reset(self) -> bool {
        self.contains(Self::RESET_REQUIRED)
    }
}
