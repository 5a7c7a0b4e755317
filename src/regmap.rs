/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Per-chip register layout

/// Width of one addressable register on the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataWidth {
    /// 8-bit registers, multi-byte fields span consecutive addresses
    Byte,
    /// 16-bit registers at even addresses
    Word,
}

impl DataWidth {
    /// Register width in bytes
    pub const fn bytes(self) -> usize {
        match self {
            DataWidth::Byte => 1,
            DataWidth::Word => 2,
        }
    }
}

/// A big-endian value of `len` bytes starting at `addr`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterField {
    pub addr: u16,
    pub len: u8,
}

impl RegisterField {
    pub const fn new(addr: u16, len: u8) -> Self {
        Self { addr, len }
    }

    /// Single byte field
    pub const fn byte(addr: u16) -> Self {
        Self::new(addr, 1)
    }

    /// Two byte field (high byte at `addr`)
    pub const fn word(addr: u16) -> Self {
        Self::new(addr, 2)
    }

    /// Largest value the field can hold
    pub const fn max_value(&self) -> u32 {
        match self.len {
            0 | 1 => 0xFF,
            2 => 0xFFFF,
            3 => 0xFF_FFFF,
            _ => u32::MAX,
        }
    }
}

/// Orientation register and the bits it uses for mirror and flip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientationField {
    pub addr: u16,
    /// Set for a horizontal mirror
    pub mirror: u8,
    /// Set for a vertical flip
    pub flip: u8,
}

impl OrientationField {
    pub const fn new(addr: u16, mirror: u8, flip: u8) -> Self {
        Self { addr, mirror, flip }
    }

    /// Every bit the orientation owns in the register
    pub const fn mask(&self) -> u8 {
        self.mirror | self.flip
    }
}

/// Addresses of the registers the timing core drives.
///
/// Optional entries are left `None` on chips that lack the feature; the
/// corresponding writes are then skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterMap {
    pub frame_length: RegisterField,
    pub line_length: RegisterField,
    /// Shutter, in lines
    pub coarse_integration: RegisterField,
    pub analog_gain: RegisterField,
    /// Residual digital gain written by piecewise gain tables
    pub digital_gain: Option<RegisterField>,
    /// Coarse integration time left shift for long exposures
    pub lshift: Option<RegisterField>,
    pub group_hold: Option<RegisterField>,
    /// Frame length auto extension enable
    pub auto_extend: Option<RegisterField>,
    pub orientation: Option<OrientationField>,
}

impl RegisterMap {
    /// Standard SMIA / MIPI CCS layout
    pub const SMIA: Self = Self {
        frame_length: RegisterField::word(0x0340),
        line_length: RegisterField::word(0x0342),
        coarse_integration: RegisterField::word(0x0202),
        analog_gain: RegisterField::word(0x0204),
        digital_gain: Some(RegisterField::word(0x020E)),
        lshift: None,
        group_hold: Some(RegisterField::byte(0x0104)),
        auto_extend: None,
        orientation: Some(OrientationField::new(0x0101, 0x01, 0x02)),
    };

    /// SMIA layout plus the vendor long exposure registers found on
    /// 48 megapixel class parts
    pub const SMIA_LSHIFT: Self = Self {
        lshift: Some(RegisterField::byte(0x3100)),
        auto_extend: Some(RegisterField::byte(0x0350)),
        ..Self::SMIA
    };
}
