/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Register transport.
//!
//! Every sensor handled by this crate exposes a flat, byte-addressed register
//! space behind a 16-bit register address. [`RegisterIo`] is the only thing the
//! timing core needs from the bus; [`I2cRegisterIo`] provides it over any
//! blocking `embedded-hal` I2C implementation.

use embedded_hal::blocking::i2c;

use crate::batch::MAX_BURST_BYTES;

/// Register-level access to a sensor.
///
/// Implementations are not assumed to be reentrant; callers serialize access.
pub trait RegisterIo {
    /// Transport error
    type Error;

    /// Read one 8-bit register
    fn read8(&mut self, addr: u16) -> Result<u8, Self::Error>;

    /// Write one 8-bit register
    fn write8(&mut self, addr: u16, val: u8) -> Result<(), Self::Error>;

    /// Write `bytes` to the contiguous register block starting at `start_addr`.
    /// `unit_size` is the width in bytes of each register in the block.
    fn burst_write(
        &mut self,
        start_addr: u16,
        bytes: &[u8],
        unit_size: usize,
    ) -> Result<(), Self::Error>;

    /// Write one 16-bit register, most significant byte first
    fn write16(&mut self, addr: u16, val: u16) -> Result<(), Self::Error> {
        self.burst_write(addr, &val.to_be_bytes(), 2)
    }
}

impl<T: RegisterIo + ?Sized> RegisterIo for &mut T {
    type Error = T::Error;

    fn read8(&mut self, addr: u16) -> Result<u8, Self::Error> {
        (**self).read8(addr)
    }

    fn write8(&mut self, addr: u16, val: u8) -> Result<(), Self::Error> {
        (**self).write8(addr, val)
    }

    fn burst_write(
        &mut self,
        start_addr: u16,
        bytes: &[u8],
        unit_size: usize,
    ) -> Result<(), Self::Error> {
        (**self).burst_write(start_addr, bytes, unit_size)
    }
}

/// Two-wire transport using 16-bit big-endian register addresses
pub struct I2cRegisterIo<I2C> {
    address: u8,
    i2c: I2C,
}

impl<I2C> I2cRegisterIo<I2C> {
    /// Create a transport for the sensor at 7-bit bus `address`
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { address, i2c }
    }

    /// Bus address in use
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give back the underlying bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, CommE> RegisterIo for I2cRegisterIo<I2C>
where
    I2C: i2c::Write<Error = CommE> + i2c::WriteRead<Error = CommE>,
{
    type Error = CommE;

    fn read8(&mut self, addr: u16) -> Result<u8, CommE> {
        let mut recv_buf = [0u8];
        self.i2c
            .write_read(self.address, &addr.to_be_bytes(), &mut recv_buf)?;
        Ok(recv_buf[0])
    }

    fn write8(&mut self, addr: u16, val: u8) -> Result<(), CommE> {
        let [hi, lo] = addr.to_be_bytes();
        self.i2c.write(self.address, &[hi, lo, val])
    }

    fn burst_write(
        &mut self,
        start_addr: u16,
        bytes: &[u8],
        unit_size: usize,
    ) -> Result<(), CommE> {
        // oversized blocks are split on whole-register boundaries
        let unit = unit_size.max(1);
        let step = (MAX_BURST_BYTES - MAX_BURST_BYTES % unit).max(unit);
        let mut addr = start_addr;
        let mut write_buf = [0u8; MAX_BURST_BYTES + 2];
        for chunk in bytes.chunks(step) {
            let end = 2 + chunk.len();
            write_buf[..2].copy_from_slice(&addr.to_be_bytes());
            write_buf[2..end].copy_from_slice(chunk);
            self.i2c.write(self.address, &write_buf[..end])?;
            addr = addr.wrapping_add(chunk.len() as u16);
        }
        Ok(())
    }
}
