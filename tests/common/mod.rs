/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use imgsensor_timing::gain::GainLaw;
use imgsensor_timing::RegisterIo;
use imgsensor_timing::TimingProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusError;

/// One transaction seen by [`FakeBus`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Read8(u16),
    Write8(u16, u8),
    Burst { start: u16, bytes: Vec<u8>, unit: usize },
}

/// Byte addressed register file that records every transaction
#[derive(Debug, Default)]
pub struct FakeBus {
    pub ops: Vec<Op>,
    regs: HashMap<u16, u8>,
    reads: HashMap<u16, VecDeque<u8>>,
    fail_in: Option<usize>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `ok_ops` more transactions through, fail the next one, then recover
    pub fn fail_after(&mut self, ok_ops: usize) {
        self.fail_in = Some(ok_ops);
    }

    /// Values returned by successive reads of `addr`, before falling back to
    /// the register file
    pub fn script_reads(&mut self, addr: u16, values: &[u8]) {
        self.reads
            .entry(addr)
            .or_default()
            .extend(values.iter().copied());
    }

    pub fn set(&mut self, addr: u16, val: u8) {
        self.regs.insert(addr, val);
    }

    pub fn reg8(&self, addr: u16) -> u8 {
        self.regs.get(&addr).copied().unwrap_or(0)
    }

    pub fn reg16(&self, addr: u16) -> u16 {
        u16::from(self.reg8(addr)) << 8 | u16::from(self.reg8(addr + 1))
    }

    pub fn bursts(&self) -> Vec<(u16, Vec<u8>)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Burst { start, bytes, .. } => Some((*start, bytes.clone())),
                _ => None,
            })
            .collect()
    }

    fn check(&mut self) -> Result<(), BusError> {
        match self.fail_in {
            Some(0) => {
                self.fail_in = None;
                Err(BusError)
            }
            Some(n) => {
                self.fail_in = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl RegisterIo for FakeBus {
    type Error = BusError;

    fn read8(&mut self, addr: u16) -> Result<u8, BusError> {
        self.check()?;
        self.ops.push(Op::Read8(addr));
        let scripted = self.reads.get_mut(&addr).and_then(|q| q.pop_front());
        Ok(scripted.unwrap_or_else(|| self.reg8(addr)))
    }

    fn write8(&mut self, addr: u16, val: u8) -> Result<(), BusError> {
        self.check()?;
        self.ops.push(Op::Write8(addr, val));
        self.regs.insert(addr, val);
        Ok(())
    }

    fn burst_write(&mut self, start: u16, bytes: &[u8], unit: usize) -> Result<(), BusError> {
        self.check()?;
        self.ops.push(Op::Burst {
            start,
            bytes: bytes.to_vec(),
            unit,
        });
        for (i, b) in bytes.iter().enumerate() {
            self.regs.insert(start + i as u16, *b);
        }
        Ok(())
    }
}

/// 89.7 MHz preview mode, no coarse integration cap
pub const PREVIEW: TimingProfile = TimingProfile {
    pixel_clock_hz: 89_700_000,
    line_length_pck: 1495,
    default_frame_length_lines: 3000,
    margin_lines: 16,
    min_shutter_lines: 4,
    max_frame_length_lines: 0x7FFFF,
    max_coarse_integration_lines: None,
    max_lshift_count: 0,
    min_gain_q6: 64,
    max_gain_q6: 1024,
    gain_law: GainLaw::Linear,
};

/// 16-bit shutter register with long exposure shifting
pub const LONG_EXPOSURE: TimingProfile = TimingProfile {
    max_frame_length_lines: 0xFFFFF,
    max_coarse_integration_lines: Some(65535),
    max_lshift_count: 7,
    min_gain_q6: 64,
    max_gain_q6: 1024,
    gain_law: GainLaw::Inverse,
    ..PREVIEW
};
