/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Gain laws: conversion of Q6 gain (64 == 1.0x) into register codes

/// Unity gain in Q6
pub const GAIN_BASE_Q6: u16 = 64;

/// Most bands a piecewise gain table may have
pub const MAX_GAIN_BANDS: usize = 17;

/// Digital pregain register value for 1.0x
pub const PREGAIN_UNITY: u16 = 1024;

/// One analog gain step of a piecewise table.
///
/// A band covers `[floor_q6, next band's floor_q6)`; the last band is open ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GainBand {
    pub floor_q6: u16,
    pub analog_code: u16,
}

impl GainBand {
    pub const fn new(floor_q6: u16, analog_code: u16) -> Self {
        Self {
            floor_q6,
            analog_code,
        }
    }
}

/// A band table known to be usable: 1 to [`MAX_GAIN_BANDS`] bands with
/// strictly ascending floors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GainTable {
    bands: &'static [GainBand],
}

impl GainTable {
    /// `None` when `bands` is empty, too long or not sorted
    pub const fn new(bands: &'static [GainBand]) -> Option<Self> {
        if bands.is_empty() || bands.len() > MAX_GAIN_BANDS {
            return None;
        }
        let mut i = 1;
        while i < bands.len() {
            if bands[i].floor_q6 <= bands[i - 1].floor_q6 {
                return None;
            }
            i += 1;
        }
        Some(Self { bands })
    }

    pub fn bands(&self) -> &'static [GainBand] {
        self.bands
    }
}

/// How a chip encodes analog gain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainLaw {
    /// `reg = gain / 2`
    Linear,
    /// `reg = 1024 - 1024 * 64 / gain`
    Inverse,
    /// Analog step from a band table plus residual digital pregain
    PiecewiseLut(GainTable),
}

/// Register codes for one gain request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GainCode {
    pub analog: u16,
    /// Only produced by [`GainLaw::PiecewiseLut`]
    pub pregain: Option<u16>,
}

impl GainLaw {
    /// Piecewise law over `bands`, see [`GainTable::new`]
    pub const fn piecewise(bands: &'static [GainBand]) -> Option<Self> {
        match GainTable::new(bands) {
            Some(table) => Some(GainLaw::PiecewiseLut(table)),
            None => None,
        }
    }

    /// Encode an already clamped gain
    pub fn encode(&self, gain_q6: u16) -> GainCode {
        match *self {
            GainLaw::Linear => GainCode {
                analog: gain_q6 / 2,
                pregain: None,
            },
            GainLaw::Inverse => {
                let gain = u32::from(gain_q6.max(1));
                let reg = 1024u32.saturating_sub(1024 * u32::from(GAIN_BASE_Q6) / gain);
                GainCode {
                    analog: reg as u16,
                    pregain: None,
                }
            }
            GainLaw::PiecewiseLut(table) => match select_band(table.bands(), gain_q6) {
                Some(band) => {
                    let pregain = u32::from(PREGAIN_UNITY) * u32::from(gain_q6)
                        / u32::from(band.floor_q6.max(1));
                    GainCode {
                        analog: band.analog_code,
                        pregain: Some(pregain.min(u32::from(u16::MAX)) as u16),
                    }
                }
                None => GainCode {
                    analog: 0,
                    pregain: Some(PREGAIN_UNITY),
                },
            },
        }
    }
}

/// Scan from the lowest band up; the first band whose upper bound exceeds
/// `gain_q6` wins.
fn select_band(bands: &[GainBand], gain_q6: u16) -> Option<GainBand> {
    bands
        .windows(2)
        .find(|pair| pair[1].floor_q6 > gain_q6)
        .map(|pair| pair[0])
        .or_else(|| bands.last().copied())
}
