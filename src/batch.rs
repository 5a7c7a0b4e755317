/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Coalescing of register tables into burst writes.
//!
//! A table is an ordered list of `(address, value)` pairs. Runs of entries at
//! consecutive addresses are packed into a single burst, up to a byte budget.
//! A repeated address (used by sensor init tables to mean "write this register
//! again") or any other address jump closes the current burst.

use core::iter::Peekable;

use crate::io::RegisterIo;

/// Largest payload a single burst may carry, in bytes
pub const MAX_BURST_BYTES: usize = 255;

/// One contiguous block write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Burst {
    start_addr: u16,
    unit_size: usize,
    len: usize,
    buf: [u8; MAX_BURST_BYTES],
}

impl Burst {
    fn new(start_addr: u16, unit_size: usize) -> Self {
        Self {
            start_addr,
            unit_size,
            len: 0,
            buf: [0; MAX_BURST_BYTES],
        }
    }

    fn push(&mut self, value: u16) {
        if self.unit_size == 2 {
            self.buf[self.len..self.len + 2].copy_from_slice(&value.to_be_bytes());
        } else {
            self.buf[self.len] = value as u8;
        }
        self.len += self.unit_size;
    }

    /// First register address covered
    pub fn start_addr(&self) -> u16 {
        self.start_addr
    }

    /// Register width in bytes
    pub fn unit_size(&self) -> usize {
        self.unit_size
    }

    /// Payload bytes, most significant byte of each register first
    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Number of registers covered
    pub fn entries(&self) -> usize {
        self.len / self.unit_size
    }
}

/// Lazy sequence of bursts over a register table.
///
/// Each entry is visited exactly once, in source order.
pub struct Bursts<I: Iterator<Item = (u16, u16)>> {
    entries: Peekable<I>,
    chunk_bytes: usize,
    unit_size: usize,
}

impl<I: Iterator<Item = (u16, u16)>> Bursts<I> {
    /// `unit_size` is 1 for 8-bit registers and 2 for 16-bit registers.
    /// A burst never splits a register, so the effective budget is
    /// `max_chunk_bytes` rounded down to whole registers (at least one).
    pub fn new(entries: I, max_chunk_bytes: usize, unit_size: usize) -> Self {
        let unit_size = if unit_size >= 2 { 2 } else { 1 };
        let budget = max_chunk_bytes.min(MAX_BURST_BYTES);
        let chunk_bytes = (budget - budget % unit_size).max(unit_size);
        Self {
            entries: entries.peekable(),
            chunk_bytes,
            unit_size,
        }
    }
}

impl<I: Iterator<Item = (u16, u16)>> Iterator for Bursts<I> {
    type Item = Burst;

    fn next(&mut self) -> Option<Burst> {
        let (start_addr, value) = self.entries.next()?;
        let step = self.unit_size as u16;
        let mut burst = Burst::new(start_addr, self.unit_size);
        burst.push(value);

        let mut next_addr = start_addr.wrapping_add(step);
        while burst.len + self.unit_size <= self.chunk_bytes {
            match self.entries.peek() {
                Some(&(addr, value)) if addr == next_addr => {
                    burst.push(value);
                    self.entries.next();
                    next_addr = next_addr.wrapping_add(step);
                }
                _ => break,
            }
        }
        Some(burst)
    }
}

/// Issue every burst in order, stopping at the first transport failure
pub fn write_bursts<IO, I>(io: &mut IO, bursts: Bursts<I>) -> Result<(), IO::Error>
where
    IO: RegisterIo + ?Sized,
    I: Iterator<Item = (u16, u16)>,
{
    for burst in bursts {
        io.burst_write(burst.start_addr(), burst.bytes(), burst.unit_size())?;
    }
    Ok(())
}

/// Write a register table using the fewest bursts.
///
/// A failed burst aborts the call; the remaining entries are not written and
/// the table must be rewritten from the start.
pub fn write_table<IO: RegisterIo + ?Sized>(
    io: &mut IO,
    entries: &[(u16, u16)],
    max_chunk_bytes: usize,
    unit_size: usize,
) -> Result<(), IO::Error> {
    write_bursts(
        io,
        Bursts::new(entries.iter().copied(), max_chunk_bytes, unit_size),
    )
}
