/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Standby / streaming transitions

use embedded_hal::blocking::delay::DelayMs;

use crate::io::RegisterIo;
use crate::Error;

/// Sensor output state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Standby,
    Streaming,
}

/// Registers and timing of the streaming handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Mode select register
    pub mode_select: u16,
    pub streaming_value: u8,
    pub standby_value: u8,
    /// Register polled to confirm the transition, usually the frame counter
    pub status: u16,
    /// Status value the sensor reports while in standby
    pub standby_status: u8,
    pub poll_interval_ms: u32,
    /// Polls after the first read before giving up
    pub max_polls: u32,
}

impl StreamConfig {
    /// SMIA mode select with the frame counter as status;
    /// the counter reads 0xFF in software standby
    pub const SMIA: Self = Self {
        mode_select: 0x0100,
        streaming_value: 0x01,
        standby_value: 0x00,
        status: 0x0005,
        standby_status: 0xFF,
        poll_interval_ms: 2,
        max_polls: 50,
    };
}

/// Drives the sensor between standby and streaming
#[derive(Debug, Clone)]
pub struct StreamingStateMachine {
    config: StreamConfig,
    state: StreamState,
}

impl StreamingStateMachine {
    /// Sensors come out of reset in standby
    pub const fn new(config: StreamConfig) -> Self {
        Self {
            config,
            state: StreamState::Standby,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Enter streaming. Returns the number of polls spent waiting.
    ///
    /// On [`Error::StreamTimeout`] the state still moves to streaming.
    pub fn start<IO, D>(&mut self, io: &mut IO, delay: &mut D) -> Result<u32, Error<IO::Error>>
    where
        IO: RegisterIo + ?Sized,
        D: DelayMs<u32>,
    {
        self.transition(io, delay, StreamState::Streaming)
    }

    /// Enter standby. Returns the number of polls spent waiting.
    ///
    /// On [`Error::StreamTimeout`] the state still moves to standby.
    pub fn stop<IO, D>(&mut self, io: &mut IO, delay: &mut D) -> Result<u32, Error<IO::Error>>
    where
        IO: RegisterIo + ?Sized,
        D: DelayMs<u32>,
    {
        self.transition(io, delay, StreamState::Standby)
    }

    fn transition<IO, D>(
        &mut self,
        io: &mut IO,
        delay: &mut D,
        target: StreamState,
    ) -> Result<u32, Error<IO::Error>>
    where
        IO: RegisterIo + ?Sized,
        D: DelayMs<u32>,
    {
        let cfg = self.config;
        let mode = match target {
            StreamState::Streaming => cfg.streaming_value,
            StreamState::Standby => cfg.standby_value,
        };
        io.write8(cfg.mode_select, mode).map_err(Error::Comm)?;

        let mut polls = 0;
        loop {
            let status = io.read8(cfg.status).map_err(Error::Comm)?;
            let reached = match target {
                StreamState::Streaming => status != cfg.standby_status,
                StreamState::Standby => status == cfg.standby_status,
            };
            if reached {
                self.state = target;
                debug_log!(
                    "{:?} after {} ms",
                    target,
                    polls * cfg.poll_interval_ms
                );
                return Ok(polls);
            }
            if polls >= cfg.max_polls {
                // move on anyway so the caller is not wedged
                self.state = target;
                debug_log!(
                    "stream timeout waiting for {:?}: {} ms",
                    target,
                    polls * cfg.poll_interval_ms
                );
                return Err(Error::StreamTimeout { target, polls });
            }
            delay.delay_ms(cfg.poll_interval_ms);
            polls += 1;
        }
    }
}
