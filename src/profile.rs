/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Per-scenario timing constants

use crate::gain::GainLaw;

/// Timing and gain limits of one capture scenario.
///
/// Values come from the sensor vendor's mode tables; nothing here is derived
/// at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingProfile {
    pub pixel_clock_hz: u32,
    pub line_length_pck: u16,
    pub default_frame_length_lines: u32,
    /// Lines the sensor needs between shutter and frame end
    pub margin_lines: u16,
    pub min_shutter_lines: u16,
    pub max_frame_length_lines: u32,
    /// Largest value the shutter register can hold, when it is narrower
    /// than the frame length register
    pub max_coarse_integration_lines: Option<u32>,
    pub max_lshift_count: u8,
    pub min_gain_q6: u16,
    pub max_gain_q6: u16,
    pub gain_law: GainLaw,
}

impl TimingProfile {
    /// Frame length giving `fps_x10` (frames per 10 s), floored the way the
    /// sensor firmware computes it: `pclk / fps * 10 / line_length`
    pub fn frame_length_for_fps(&self, fps_x10: u32) -> u32 {
        let lines = u64::from(self.pixel_clock_hz) / u64::from(fps_x10.max(1)) * 10
            / u64::from(self.line_length_pck.max(1));
        lines.min(u64::from(u32::MAX)) as u32
    }

    /// Frame rate, x10, produced by a frame length: `pclk / line_length * 10 / fl`
    pub fn fps_x10_for_frame_length(&self, frame_length_lines: u32) -> u32 {
        let fps = u64::from(self.pixel_clock_hz) / u64::from(self.line_length_pck.max(1)) * 10
            / u64::from(frame_length_lines.max(1));
        fps.min(u64::from(u32::MAX)) as u32
    }

    /// Frame length lasting `duration_ms`, rounded to the nearest line
    pub fn frame_length_for_duration_ms(&self, duration_ms: u32) -> u32 {
        let den = u64::from(self.line_length_pck.max(1)) * 1000;
        let lines = (u64::from(self.pixel_clock_hz) * u64::from(duration_ms) + den / 2) / den;
        lines.min(u64::from(u32::MAX)) as u32
    }

    /// Frame rate, x10, of the scenario's default frame length
    pub fn default_fps_x10(&self) -> u32 {
        self.fps_x10_for_frame_length(self.default_frame_length_lines)
    }

    /// Longest shutter the frame length register allows
    pub fn max_shutter_lines(&self) -> u32 {
        self.max_frame_length_lines
            .saturating_sub(u32::from(self.margin_lines))
    }
}

/// Capture scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Preview,
    Capture,
    Video,
    HighSpeedVideo,
    SlimVideo,
    Custom(u8),
}

/// Lookup of timing profiles by scenario
#[derive(Debug, Clone, Copy)]
pub struct ScenarioTable<'a> {
    entries: &'a [(Scenario, TimingProfile)],
}

impl<'a> ScenarioTable<'a> {
    pub const fn new(entries: &'a [(Scenario, TimingProfile)]) -> Self {
        Self { entries }
    }

    pub fn get(&self, scenario: Scenario) -> Option<&'a TimingProfile> {
        self.entries
            .iter()
            .find(|(id, _)| *id == scenario)
            .map(|(_, profile)| profile)
    }

    pub fn scenarios(&self) -> impl Iterator<Item = Scenario> + 'a {
        self.entries.iter().map(|(id, _)| *id)
    }
}
