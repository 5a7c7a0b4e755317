/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Sensor facade: the exposure controller and streaming state machine bound
//! to a register transport

use embedded_hal::blocking::delay::DelayMs;
use spin::{Mutex, MutexGuard};

use crate::batch::{self, MAX_BURST_BYTES};
use crate::exposure::{ExposureConfig, ExposureController};
use crate::io::RegisterIo;
use crate::plan::WritePlan;
use crate::profile::{Scenario, ScenarioTable, TimingProfile};
use crate::regmap::OrientationField;
use crate::streaming::{StreamConfig, StreamState, StreamingStateMachine};
use crate::Error;

/// Image orientation written to the orientation register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Normal,
    HMirror,
    VFlip,
    HvMirrorFlip,
}

impl Orientation {
    /// Register bits for this orientation on a chip laid out as `field`
    pub fn bits(self, field: &OrientationField) -> u8 {
        match self {
            Orientation::Normal => 0,
            Orientation::HMirror => field.mirror,
            Orientation::VFlip => field.flip,
            Orientation::HvMirrorFlip => field.mask(),
        }
    }
}

/// Everything chip specific that is not per scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig {
    pub exposure: ExposureConfig,
    pub stream: StreamConfig,
    /// Payload budget of a single bus transaction
    pub max_burst_bytes: usize,
}

impl SensorConfig {
    pub const fn new(exposure: ExposureConfig, stream: StreamConfig) -> Self {
        Self {
            exposure,
            stream,
            max_burst_bytes: MAX_BURST_BYTES,
        }
    }
}

/// Main driver struct
pub struct ImageSensor<IO, D> {
    io: IO,
    delay: D,
    exposure: ExposureController,
    stream: StreamingStateMachine,
    max_burst_bytes: usize,
}

impl<IO, D> ImageSensor<IO, D>
where
    IO: RegisterIo,
    D: DelayMs<u32>,
{
    /// Create a driver for a sensor in standby, timed by `profile`
    pub fn new(io: IO, delay: D, config: SensorConfig, profile: TimingProfile) -> Self {
        Self {
            io,
            delay,
            exposure: ExposureController::new(config.exposure, profile),
            stream: StreamingStateMachine::new(config.stream),
            max_burst_bytes: config.max_burst_bytes,
        }
    }

    /// Give back the transport and delay
    pub fn release(self) -> (IO, D) {
        (self.io, self.delay)
    }

    /// Direct access to the register transport
    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    pub fn exposure(&self) -> &ExposureController {
        &self.exposure
    }

    pub fn stream_state(&self) -> StreamState {
        self.stream.state()
    }

    fn apply(&mut self, plan: &WritePlan) -> Result<(), Error<IO::Error>> {
        plan.apply(&mut self.io, self.max_burst_bytes)
            .map_err(Error::Comm)
    }

    /// Write a mode or init register table in as few bursts as the bus
    /// allows. A failure aborts the table; rewrite it from the start.
    pub fn write_table(
        &mut self,
        entries: &[(u16, u16)],
        unit_size: usize,
    ) -> Result<(), Error<IO::Error>> {
        batch::write_table(&mut self.io, entries, self.max_burst_bytes, unit_size)
            .map_err(Error::Comm)
    }

    pub fn select_scenario(&mut self, profile: TimingProfile) {
        self.exposure.select_scenario(profile);
    }

    /// Select `scenario` from `table` and cap its frame rate, latching the
    /// result as the frame length floor
    pub fn set_max_framerate_by_scenario(
        &mut self,
        table: &ScenarioTable<'_>,
        scenario: Scenario,
        fps_x10: u32,
    ) -> Result<(), Error<IO::Error>> {
        let profile = *table
            .get(scenario)
            .ok_or(Error::UnknownScenario(scenario))?;
        self.exposure.select_scenario(profile);
        self.apply_max_framerate(fps_x10, true)
    }

    pub fn set_autoflicker(&mut self, enabled: bool) {
        self.exposure.set_autoflicker(enabled);
    }

    pub fn set_long_exposure_mode(&mut self, enabled: bool) {
        self.exposure.set_long_exposure_mode(enabled);
    }

    /// Returns the gain actually applied, in Q6
    pub fn set_gain(&mut self, gain_q6: u16) -> Result<u16, Error<IO::Error>> {
        let (applied, plan) = self.exposure.set_gain(gain_q6);
        self.apply(&plan)?;
        Ok(applied)
    }

    /// Returns the shutter actually latched, in lines.
    ///
    /// On [`Error::Comm`] the frame length may already be written without
    /// the shutter; repeat the call to bring the sensor back in line.
    pub fn set_shutter(&mut self, lines: u32) -> Result<u32, Error<IO::Error>> {
        let autoflicker = self.exposure.state().autoflicker_enabled;
        let (applied, plan) = self.exposure.set_shutter(lines, autoflicker);
        self.apply(&plan)?;
        Ok(applied)
    }

    /// As [`set_shutter`](Self::set_shutter), also latching the frame length
    /// as the new frame rate floor
    pub fn set_shutter_with_floor(&mut self, lines: u32) -> Result<u32, Error<IO::Error>> {
        let autoflicker = self.exposure.state().autoflicker_enabled;
        let (applied, plan) = self.exposure.set_shutter_with_floor(lines, autoflicker);
        self.apply(&plan)?;
        Ok(applied)
    }

    pub fn apply_max_framerate(
        &mut self,
        fps_x10: u32,
        latch_as_min: bool,
    ) -> Result<(), Error<IO::Error>> {
        let plan = self.exposure.apply_max_framerate(fps_x10, latch_as_min);
        self.apply(&plan)
    }

    pub fn apply_shutter_and_frame_length(
        &mut self,
        shutter_lines: u32,
        frame_length_lines: u32,
    ) -> Result<u32, Error<IO::Error>> {
        let (applied, plan) = self
            .exposure
            .apply_shutter_and_frame_length(shutter_lines, frame_length_lines);
        self.apply(&plan)?;
        Ok(applied)
    }

    /// Returns the number of status polls the sensor needed
    pub fn start_streaming(&mut self) -> Result<u32, Error<IO::Error>> {
        self.stream.start(&mut self.io, &mut self.delay)
    }

    pub fn stop_streaming(&mut self) -> Result<u32, Error<IO::Error>> {
        self.stream.stop(&mut self.io, &mut self.delay)
    }

    /// Read-modify-write of the orientation bits named by the register map;
    /// other bits in the register are kept. No-op on chips without an
    /// orientation register.
    pub fn set_mirror_flip(&mut self, orientation: Orientation) -> Result<(), Error<IO::Error>> {
        let field = match self.exposure.config().registers.orientation {
            Some(field) => field,
            None => return Ok(()),
        };
        let current = self.io.read8(field.addr).map_err(Error::Comm)?;
        self.io
            .write8(field.addr, (current & !field.mask()) | orientation.bits(&field))
            .map_err(Error::Comm)
    }

    /// Current value of the status register polled during streaming
    /// transitions (the frame counter on SMIA parts)
    pub fn read_frame_counter(&mut self) -> Result<u8, Error<IO::Error>> {
        let addr = self.stream.config().status;
        self.io.read8(addr).map_err(Error::Comm)
    }
}

/// An [`ImageSensor`] shared between contexts.
///
/// Each operation holds the lock for its whole read-modify-write, so two
/// shutter updates can never interleave their frame length and shutter
/// writes.
pub struct SharedSensor<IO, D> {
    inner: Mutex<ImageSensor<IO, D>>,
}

impl<IO, D> SharedSensor<IO, D>
where
    IO: RegisterIo,
    D: DelayMs<u32>,
{
    pub fn new(sensor: ImageSensor<IO, D>) -> Self {
        Self {
            inner: Mutex::new(sensor),
        }
    }

    /// Hold the sensor across several operations
    pub fn lock(&self) -> MutexGuard<'_, ImageSensor<IO, D>> {
        self.inner.lock()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut ImageSensor<IO, D>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn set_gain(&self, gain_q6: u16) -> Result<u16, Error<IO::Error>> {
        self.with(|sensor| sensor.set_gain(gain_q6))
    }

    pub fn set_shutter(&self, lines: u32) -> Result<u32, Error<IO::Error>> {
        self.with(|sensor| sensor.set_shutter(lines))
    }

    pub fn apply_shutter_and_frame_length(
        &self,
        shutter_lines: u32,
        frame_length_lines: u32,
    ) -> Result<u32, Error<IO::Error>> {
        self.with(|sensor| sensor.apply_shutter_and_frame_length(shutter_lines, frame_length_lines))
    }

    pub fn into_inner(self) -> ImageSensor<IO, D> {
        self.inner.into_inner()
    }
}
