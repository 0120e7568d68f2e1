//! Linux I2C character device (`/dev/i2c-N`) through `rppal`.

use std::io;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rppal::i2c;
use tracing::trace;

use crate::hw_trait::{HwError, I2c, I2cError, Result};

// errno values reported by Linux bus drivers
const ENXIO: i32 = 6;
const EAGAIN: i32 = 11;
const ETIMEDOUT: i32 = 110;
const EREMOTEIO: i32 = 121;

/// I2C bus backed by `rppal`.
///
/// The kernel device has a single target address register; it is updated
/// lazily whenever a transaction addresses a different device.
#[derive(Debug)]
pub struct RppalI2c {
    // `rppal::i2c::I2c` is not `Sync`; the trait requires it. Every access
    // goes through `&mut self`, so the lock is never contended.
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    i2c: i2c::I2c,
    address: Option<u8>,
}

impl RppalI2c {
    /// Open `/dev/i2c-{bus}`.
    pub fn open(bus: u8) -> Result<Self> {
        let i2c = i2c::I2c::with_bus(bus).map_err(|e| map_error(e, 0))?;
        trace!(bus, "Opened I2C bus");
        Ok(Self::new(i2c))
    }

    /// Wrap an already opened bus.
    pub fn new(i2c: i2c::I2c) -> Self {
        Self {
            inner: Mutex::new(Inner { i2c, address: None }),
        }
    }

    fn with_device<F, T>(&mut self, addr: u8, op: F) -> Result<T>
    where
        F: FnOnce(&mut i2c::I2c) -> std::result::Result<T, i2c::Error>,
    {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if inner.address != Some(addr) {
            inner
                .i2c
                .set_slave_address(addr as u16)
                .map_err(|e| map_error(e, addr))?;
            inner.address = Some(addr);
        }
        op(&mut inner.i2c).map_err(|e| map_error(e, addr))
    }
}

#[async_trait]
impl I2c for RppalI2c {
    async fn write(&mut self, addr: u8, data: &[u8]) -> Result<()> {
        let written = self.with_device(addr, |i2c| i2c.write(data))?;
        if written < data.len() {
            return Err(I2cError::DataNack(addr).into());
        }
        Ok(())
    }

    async fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<usize> {
        self.with_device(addr, |i2c| i2c.read(buffer))
    }

    async fn probe(&mut self, addr: u8) -> Result<bool> {
        match self.with_device(addr, |i2c| i2c.smbus_quick_command(false)) {
            Ok(()) => Ok(true),
            Err(HwError::I2c(I2cError::NoAck(_))) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn set_frequency(&mut self, _hz: u32) -> Result<()> {
        Err(HwError::NotSupported(
            "bus frequency is fixed by the kernel driver".to_string(),
        ))
    }
}

fn map_error(error: i2c::Error, addr: u8) -> HwError {
    match error {
        i2c::Error::Io(e) => map_io_error(e, addr),
        other => HwError::Other(other.to_string()),
    }
}

fn map_io_error(error: io::Error, addr: u8) -> HwError {
    match error.raw_os_error() {
        Some(ENXIO) | Some(EREMOTEIO) => I2cError::NoAck(addr).into(),
        Some(ETIMEDOUT) => I2cError::Timeout.into(),
        Some(EAGAIN) => I2cError::ArbitrationLost.into(),
        _ => HwError::Io(error),
    }
}
