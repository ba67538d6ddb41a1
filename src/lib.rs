//! AHT21 Sensor Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic, non-blocking driver for the AHT21
//! temperature and humidity sensor, built on top of the [`embedded-hal`] traits.
//!
//! The driver is a polling state machine: the host calls [`Aht21::tick`] on
//! every iteration of its main loop and the driver advances by at most one
//! step. Every few minutes it powers the sensor up through a GPIO, runs the
//! initialization sequence (resetting the calibration registers when the
//! sensor asks for it), triggers a conversion, polls the busy flag, checks
//! the CRC and hands the decoded values to the attached sinks before
//! switching the sensor off again.
//!
//! # Features
//! - Non-blocking `tick` API using `embedded-hal` traits
//! - Designed for `no_std` environments
//! - Optional logging support via `defmt` or `log`
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`I2c`] for the sensor bus
//! - [`OutputPin`] for the power switch
//! - [`DelayNs`] for the short waits of the register reset
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` and logs through `defmt`
//! - `log`: Logs through the `log` facade
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`I2c`]: embedded_hal::i2c::I2c
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod aht21;
pub mod config;
pub mod device;
pub mod error;
pub mod io;
pub mod measurement;
pub mod status;

pub use aht21::{Aht21, State};
pub use config::Config;
pub use error::{Error, Warning};
pub use io::{Clock, NoSink, Sink};
pub use measurement::{RawMeasurement, crc8, decode_humidity, decode_temperature};
pub use status::StatusFlags;
