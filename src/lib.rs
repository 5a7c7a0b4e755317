/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/
#![no_std]

//! Exposure, frame timing and streaming control for SMIA style CMOS image
//! sensors that are configured over a two-wire register bus.
//!
//! - [`exposure::ExposureController`] turns shutter, gain and frame rate
//!   requests into ordered register [`plan::WritePlan`]s
//! - [`batch`] packs register tables into bus sized bursts
//! - [`streaming::StreamingStateMachine`] moves the sensor between standby
//!   and streaming
//! - [`sensor::ImageSensor`] binds all of the above to a [`io::RegisterIo`]
//!
//! This driver is concerned only with the configuration interface; pixel
//! data travels elsewhere.

#[cfg(test)]
extern crate std;

macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "rttdebug")]
        panic_rtt_core::rprintln!($($arg)*);
    };
}

pub mod batch;
pub mod exposure;
pub mod gain;
pub mod io;
pub mod plan;
pub mod profile;
pub mod regmap;
pub mod sensor;
pub mod streaming;

pub use exposure::{ExposureConfig, ExposureController, ExposureState};
pub use io::{I2cRegisterIo, RegisterIo};
pub use profile::{Scenario, ScenarioTable, TimingProfile};
pub use sensor::{ImageSensor, Orientation, SensorConfig, SharedSensor};
pub use streaming::{StreamConfig, StreamState, StreamingStateMachine};

/// Errors in this crate
#[derive(Debug)]
pub enum Error<CommE> {
    /// Sensor communication error
    Comm(CommE),

    /// The sensor did not confirm a streaming transition in time.
    /// The driver state has moved to `target` regardless.
    StreamTimeout { target: StreamState, polls: u32 },

    /// No timing profile is registered for the scenario
    UnknownScenario(Scenario),
}
