/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Ordered register write plans

use heapless::Vec;

use crate::batch::{self, Bursts};
use crate::io::RegisterIo;
use crate::regmap::{DataWidth, RegisterField};

/// Upper bound on the body of any plan built by this crate
pub const PLAN_CAPACITY: usize = 24;

const GROUP_HOLD_BEGIN: u8 = 0x01;
const GROUP_HOLD_END: u8 = 0x00;

/// A single register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub addr: u16,
    pub value: u16,
    pub width: DataWidth,
}

impl RegisterWrite {
    pub const fn byte(addr: u16, value: u8) -> Self {
        Self {
            addr,
            value: value as u16,
            width: DataWidth::Byte,
        }
    }
}

/// Register writes that must reach the sensor in order.
///
/// When the chip has a group hold register the whole body is bracketed by
/// hold begin / hold end so the sensor latches it at one frame boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePlan {
    writes: Vec<RegisterWrite, PLAN_CAPACITY>,
    group_hold: Option<RegisterField>,
}

impl WritePlan {
    pub fn new(group_hold: Option<RegisterField>) -> Self {
        Self {
            writes: Vec::new(),
            group_hold,
        }
    }

    pub fn push(&mut self, write: RegisterWrite) {
        if self.writes.push(write).is_err() {
            debug_log!("write plan full, dropped {:#06x}", write.addr);
        }
    }

    /// Append `value` encoded into `field`, split into `width` sized registers.
    /// Values too large for the field saturate at its maximum.
    pub fn field(&mut self, field: RegisterField, value: u32, width: DataWidth) {
        let max = field.max_value();
        let value = if value > max {
            debug_log!("{:#06x}: {} saturated to {}", field.addr, value, max);
            max
        } else {
            value
        };
        let all = value.to_be_bytes();
        let len = usize::from(field.len).max(1).min(all.len());
        let mut addr = field.addr;
        for chunk in all[all.len() - len..].chunks(width.bytes()) {
            let value = chunk
                .iter()
                .fold(0u16, |acc, b| (acc << 8) | u16::from(*b));
            let width = if chunk.len() == 2 {
                DataWidth::Word
            } else {
                DataWidth::Byte
            };
            self.push(RegisterWrite { addr, value, width });
            addr = addr.wrapping_add(chunk.len() as u16);
        }
    }

    /// Body writes, without the group hold bracket
    pub fn writes(&self) -> &[RegisterWrite] {
        &self.writes
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// True when the plan will be issued inside a group hold
    pub fn is_held(&self) -> bool {
        self.group_hold.is_some() && !self.writes.is_empty()
    }

    /// Full write sequence including the group hold bracket
    pub fn iter(&self) -> impl Iterator<Item = RegisterWrite> + '_ {
        let hold = if self.is_held() { self.group_hold } else { None };
        let begin = hold.map(|f| RegisterWrite::byte(f.addr, GROUP_HOLD_BEGIN));
        let end = hold.map(|f| RegisterWrite::byte(f.addr, GROUP_HOLD_END));
        begin
            .into_iter()
            .chain(self.writes.iter().copied())
            .chain(end)
    }

    /// Value the plan leaves in the register at `addr`, if it writes it
    pub fn value_at(&self, addr: u16) -> Option<u16> {
        self.writes
            .iter()
            .rev()
            .find(|w| w.addr == addr)
            .map(|w| w.value)
    }

    /// Issue the plan. Runs of same-width registers are coalesced into bursts.
    ///
    /// A transport failure aborts the remainder of the plan.
    pub fn apply<IO: RegisterIo + ?Sized>(
        &self,
        io: &mut IO,
        max_burst_bytes: usize,
    ) -> Result<(), IO::Error> {
        let sequence: Vec<RegisterWrite, { PLAN_CAPACITY + 2 }> = self.iter().collect();
        let mut rest = &sequence[..];
        while let Some(first) = rest.first() {
            let run = rest.iter().take_while(|w| w.width == first.width).count();
            let (head, tail) = rest.split_at(run);
            batch::write_bursts(
                io,
                Bursts::new(
                    head.iter().map(|w| (w.addr, w.value)),
                    max_burst_bytes,
                    first.width.bytes(),
                ),
            )?;
            rest = tail;
        }
        Ok(())
    }
}
