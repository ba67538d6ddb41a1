use embedded_hal::{
    delay::DelayNs,
    digital::{self, OutputPin},
    i2c::I2c,
};

use crate::config::Config;
use crate::device::{Device, RESET_REGISTERS};
use crate::error::{Error, Warning};
use crate::io::{Clock, NoSink, Sink};
use crate::measurement::RawMeasurement;

/// Phase of the measurement cycle.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Powered off, waiting for the next read interval.
    Idle,
    /// Power the sensor on.
    Start,
    /// Wait for start-up, then send the initialization commands.
    Init,
    /// Reset the first calibration register.
    Reset1,
    /// Reset the second calibration register.
    Reset2,
    /// Reset the third calibration register.
    Reset3,
    /// Initialization done.
    Ready,
    /// Wait briefly, then trigger a conversion.
    StartMeasure,
    /// Wait for the nominal conversion time.
    WaitMeasure,
    /// Poll the busy bit.
    CheckMeasure,
    /// Read, validate and publish the result.
    ReadMeasure,
    /// Power the sensor off.
    Finish,
}

/// Non-blocking AHT21 poller.
///
/// Call [`Aht21::tick`] from the main loop. Each call performs at most one
/// state transition and returns immediately while a timed wait is pending.
/// The sensor is powered only for the duration of a cycle.
pub struct Aht21<I2C, P, C, D, TS = NoSink, HS = NoSink>
where
    I2C: I2c,
{
    device: Device<I2C>,
    power: Option<P>,
    clock: C,
    delay: D,
    config: Config,
    temperature_sink: Option<TS>,
    humidity_sink: Option<HS>,

    state: State,
    last_read: u32,
    phase_started: u32,
    busy_polls: u8,
    warning: Option<Warning<I2C::Error>>,
    failed: bool,
    last_cycle_ms: Option<u32>,
}

impl<I2C, P, C, D> Aht21<I2C, P, C, D>
where
    I2C: I2c,
    P: OutputPin,
    C: Clock,
    D: DelayNs,
{
    /// Creates a new poller with the default configuration and no sinks.
    ///
    /// # Arguments
    ///
    /// * `i2c` - Bus the sensor is attached to.
    /// * `power` - Output switching the sensor supply. `None` makes
    ///   [`Aht21::setup`] fail permanently.
    /// * `clock` - Monotonic millisecond clock.
    /// * `delay` - Blocking delay, only used while resetting calibration registers.
    pub fn new(i2c: I2C, power: Option<P>, clock: C, delay: D) -> Self {
        let config = Config::DEFAULT;
        Self {
            device: Device::new(i2c, config.address),
            power,
            clock,
            delay,
            config,
            temperature_sink: None,
            humidity_sink: None,
            state: State::Idle,
            last_read: 0,
            phase_started: 0,
            busy_polls: 0,
            warning: None,
            failed: false,
            last_cycle_ms: None,
        }
    }
}

impl<I2C, P, C, D, TS, HS> Aht21<I2C, P, C, D, TS, HS>
where
    I2C: I2c,
    P: OutputPin,
    C: Clock,
    D: DelayNs,
    TS: Sink,
    HS: Sink,
{
    /// Replaces the configuration, including the I2C address.
    pub fn with_config(mut self, config: Config) -> Self {
        self.device.set_address(config.address);
        self.config = config;
        self
    }

    /// Attaches the sink receiving temperatures in degrees Celsius.
    pub fn with_temperature_sink<S: Sink>(self, sink: S) -> Aht21<I2C, P, C, D, S, HS> {
        Aht21 {
            device: self.device,
            power: self.power,
            clock: self.clock,
            delay: self.delay,
            config: self.config,
            temperature_sink: Some(sink),
            humidity_sink: self.humidity_sink,
            state: self.state,
            last_read: self.last_read,
            phase_started: self.phase_started,
            busy_polls: self.busy_polls,
            warning: self.warning,
            failed: self.failed,
            last_cycle_ms: self.last_cycle_ms,
        }
    }

    /// Attaches the sink receiving relative humidity in percent.
    pub fn with_humidity_sink<S: Sink>(self, sink: S) -> Aht21<I2C, P, C, D, TS, S> {
        Aht21 {
            device: self.device,
            power: self.power,
            clock: self.clock,
            delay: self.delay,
            config: self.config,
            temperature_sink: self.temperature_sink,
            humidity_sink: Some(sink),
            state: self.state,
            last_read: self.last_read,
            phase_started: self.phase_started,
            busy_polls: self.busy_polls,
            warning: self.warning,
            failed: self.failed,
            last_cycle_ms: self.last_cycle_ms,
        }
    }

    /// Prepares the poller. Call once before the first [`Aht21::tick`].
    ///
    /// Switches the sensor off so the first cycle starts from a cold boot.
    ///
    /// # Errors
    ///
    /// * `Error::MissingPowerPin` if no power pin was given. The poller is
    ///   then permanently failed and `tick` does nothing.
    /// * `Error::Power` if the pin could not be driven low. The poller stays
    ///   usable and retries at the end of the next cycle.
    pub fn setup(&mut self) -> Result<(), Error<I2C::Error>> {
        trace!("Setup");

        if self.power.is_none() {
            error!("No power GPIO set!");
            self.failed = true;
            return Err(Error::MissingPowerPin);
        }

        self.state = State::Idle;
        self.last_read = 0;
        self.phase_started = 0;

        self.set_power(false).inspect_err(|_| {
            warn!("Could not switch the sensor off during setup");
        })
    }

    /// Advances the state machine by at most one transition.
    ///
    /// Returns the state after the call.
    pub fn tick(&mut self) -> State {
        if self.failed {
            return self.state;
        }

        let now = self.clock.now_ms();
        let next = match self.step(now) {
            Ok(next) => next,
            Err(error) => self.abort(error),
        };

        if next != self.state {
            trace!("{:?} -> {:?}", self.state, next);
        }
        self.state = next;
        self.state
    }

    /// Current phase.
    pub fn state(&self) -> State {
        self.state
    }

    /// Failure of the last cycle, if any.
    pub fn warning(&self) -> Option<&Warning<I2C::Error>> {
        self.warning.as_ref()
    }

    /// Whether the last cycle was aborted.
    pub fn has_warning(&self) -> bool {
        self.warning.is_some()
    }

    /// Whether the poller is permanently disabled.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Duration of the last completed cycle in milliseconds.
    pub fn last_cycle_ms(&self) -> Option<u32> {
        self.last_cycle_ms
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Logs the configuration.
    pub fn dump_config(&self) {
        info!("AHT21:");
        info!("  Address: {:#x}", self.config.address);
        info!("  Read interval: {} ms", self.config.read_interval_ms);
        if self.failed {
            error!("Communication with AHT21 failed!");
        }
        info!("  Temperature: {}", self.temperature_sink.is_some());
        info!("  Humidity: {}", self.humidity_sink.is_some());
    }

    fn step(&mut self, now: u32) -> Result<State, Error<I2C::Error>> {
        match self.state {
            State::Idle => {
                if now.wrapping_sub(self.last_read) >= self.config.read_interval_ms {
                    self.last_read = now;
                    Ok(State::Start)
                } else {
                    Ok(State::Idle)
                }
            }

            State::Start => {
                trace!("Starting");
                self.set_power(true)?;
                self.phase_started = now;
                Ok(State::Init)
            }

            State::Init => {
                if !self.waited(self.config.startup_delay_ms, now) {
                    return Ok(State::Init);
                }
                trace!("Initialising");
                self.device.initialize()?;
                if self.device.status()?.needs_register_reset() {
                    trace!("Resetting registers");
                    Ok(State::Reset1)
                } else {
                    Ok(State::Ready)
                }
            }

            State::Reset1 => self.reset(RESET_REGISTERS[0]).map(|_| State::Reset2),
            State::Reset2 => self.reset(RESET_REGISTERS[1]).map(|_| State::Reset3),
            State::Reset3 => self.reset(RESET_REGISTERS[2]).map(|_| State::Ready),

            State::Ready => {
                trace!("Ready to start");
                self.phase_started = now;
                Ok(State::StartMeasure)
            }

            State::StartMeasure => {
                if !self.waited(self.config.init_delay_ms, now) {
                    return Ok(State::StartMeasure);
                }
                trace!("Request");
                self.device.trigger_measurement()?;
                self.phase_started = now;
                Ok(State::WaitMeasure)
            }

            State::WaitMeasure => {
                if !self.waited(self.config.conversion_delay_ms, now) {
                    return Ok(State::WaitMeasure);
                }
                self.busy_polls = 0;
                self.phase_started = now;
                Ok(State::CheckMeasure)
            }

            State::CheckMeasure => {
                if !self.waited(self.config.poll_delay_ms, now) {
                    return Ok(State::CheckMeasure);
                }
                if !self.device.status()?.is_busy() {
                    return Ok(State::ReadMeasure);
                }
                self.busy_polls += 1;
                self.phase_started = now;
                if self.busy_polls >= self.config.max_busy_polls {
                    return Err(Error::Busy(self.busy_polls));
                }
                Ok(State::CheckMeasure)
            }

            State::ReadMeasure => {
                trace!("Retrieve");
                let raw = self.device.read_measurement()?;
                trace!("Status {}", raw.status_flags().bits());
                self.publish(&raw);
                self.warning = None;
                Ok(State::Finish)
            }

            State::Finish => {
                trace!("Sleep");
                if let Err(error) = self.set_power(false) {
                    warn!("Could not switch the sensor off");
                    self.warning = Some(Warning {
                        state: State::Finish,
                        error,
                    });
                }
                let took = now.wrapping_sub(self.last_read);
                self.last_cycle_ms = Some(took);
                debug!("Measure took {} ms", took);
                Ok(State::Idle)
            }
        }
    }

    /// Records a failed step and picks the state to continue from.
    fn abort(&mut self, error: Error<I2C::Error>) -> State {
        if matches!(error, Error::MissingPowerPin) {
            error!("No power GPIO set!");
            self.failed = true;
            return State::Idle;
        }

        match &error {
            Error::I2c(_) => warn!("Bus error in {:?}", self.state),
            Error::Power(_) => warn!("Power pin error in {:?}", self.state),
            Error::Checksum { received, computed } => {
                warn!("Bad CRC! received {}, computed {}", received, computed)
            }
            Error::Busy(polls) => warn!("Could not obtain measure after {} polls", polls),
            Error::MissingPowerPin => {}
        }

        self.warning = Some(Warning {
            state: self.state,
            error,
        });
        State::Finish
    }

    fn reset(&mut self, register: u8) -> Result<(), Error<I2C::Error>> {
        self.device.reset_register(
            register,
            &mut self.delay,
            self.config.reset_settle_ms,
            self.config.reset_readback_ms,
        )
    }

    fn waited(&self, delay_ms: u32, now: u32) -> bool {
        now.wrapping_sub(self.phase_started) >= delay_ms
    }

    fn set_power(&mut self, on: bool) -> Result<(), Error<I2C::Error>> {
        let pin = self.power.as_mut().ok_or(Error::MissingPowerPin)?;
        let result = if on { pin.set_high() } else { pin.set_low() };
        result.map_err(|e| Error::Power(digital::Error::kind(&e)))
    }

    fn publish(&mut self, raw: &RawMeasurement) {
        if let Some(sink) = self.temperature_sink.as_mut() {
            let temperature = raw.celsius();
            debug!("Temperature: {} C", temperature);
            sink.publish(temperature);
        }

        if let Some(sink) = self.humidity_sink.as_mut() {
            let humidity = raw.relative_humidity();
            if humidity.is_nan() {
                warn!("Invalid humidity! Sensor reported 0% Hum");
            } else {
                debug!("Humidity: {} %", humidity);
            }
            sink.publish(humidity);
        }
    }
}
