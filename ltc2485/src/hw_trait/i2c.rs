//! I2C hardware abstraction trait.

use async_trait::async_trait;
use super::{HwError, Result};

/// Transaction status codes reported by two-wire bus controllers.
pub mod status {
    pub const DATA_TOO_LONG: u8 = 1;
    pub const ADDRESS_NACK: u8 = 2;
    pub const DATA_NACK: u8 = 3;
    pub const OTHER: u8 = 4;
    pub const TIMEOUT: u8 = 5;
}

/// I2C-specific errors
#[derive(Debug, thiserror::Error)]
pub enum I2cError {
    /// No acknowledgment from device
    #[error("No acknowledgment from device at address 0x{0:02x}")]
    NoAck(u8),

    /// Device acknowledged its address but not a data byte
    #[error("Data byte not acknowledged by device at address 0x{0:02x}")]
    DataNack(u8),

    /// Transfer exceeds what the controller can buffer
    #[error("Transfer of {0} bytes too long for controller")]
    DataTooLong(usize),

    /// Bus arbitration lost
    #[error("Bus arbitration lost")]
    ArbitrationLost,

    /// Controller gave up waiting on the bus
    #[error("Bus transaction timed out")]
    Timeout,

    /// Other I2C error
    #[error("I2C error: {0}")]
    Other(String),
}

impl I2cError {
    /// Status code for this failure, see [`status`].
    pub fn code(&self) -> u8 {
        match self {
            I2cError::DataTooLong(_) => status::DATA_TOO_LONG,
            I2cError::NoAck(_) => status::ADDRESS_NACK,
            I2cError::DataNack(_) => status::DATA_NACK,
            I2cError::Timeout => status::TIMEOUT,
            I2cError::ArbitrationLost | I2cError::Other(_) => status::OTHER,
        }
    }
}

/// I2C bus abstraction
///
/// Implementations own their transaction timeout; no call may block
/// indefinitely.
#[async_trait]
pub trait I2c: Send + Sync {
    /// Write data to an I2C device.
    async fn write(&mut self, addr: u8, data: &[u8]) -> Result<()>;

    /// Read data from an I2C device.
    ///
    /// Returns the number of bytes actually received, which may be less
    /// than `buffer.len()` if the device stopped early.
    async fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<usize>;

    /// Address the device with an empty transaction and report whether it
    /// acknowledged.
    async fn probe(&mut self, addr: u8) -> Result<bool> {
        match self.write(addr, &[]).await {
            Ok(()) => Ok(true),
            Err(HwError::I2c(I2cError::NoAck(_))) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Set the I2C bus frequency in Hz.
    async fn set_frequency(&mut self, hz: u32) -> Result<()>;
}
