//! Hardware abstraction layer traits.
//!
//! This module defines the interfaces the driver needs from its
//! environment: an I2C bus and a monotonic millisecond clock. Drivers are
//! generic over both so they run against a Linux I2C adapter, a tunneled
//! bus, or the simulated hardware used in tests.

pub mod clock;
pub mod i2c;

#[cfg(test)]
pub mod mock;

// Re-export traits
pub use clock::{Clock, TokioClock};
pub use i2c::{I2c, I2cError};

/// Common error type for hardware operations
#[derive(Debug, thiserror::Error)]
pub enum HwError {
    /// I/O error from underlying transport
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bus-level I2C failure
    #[error(transparent)]
    I2c(#[from] I2cError),

    /// Operation not supported by hardware
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Timeout waiting for hardware response
    #[error("Hardware timeout")]
    Timeout,

    /// Other hardware-specific error
    #[error("Hardware error: {0}")]
    Other(String),
}

impl HwError {
    /// Numeric transaction status in the two-wire convention (never 0).
    ///
    /// Codes: 1 data too long, 2 NACK on address, 3 NACK on data,
    /// 4 other error, 5 timeout.
    pub fn code(&self) -> u8 {
        match self {
            HwError::I2c(e) => e.code(),
            HwError::Timeout => i2c::status::TIMEOUT,
            _ => i2c::status::OTHER,
        }
    }
}

pub type Result<T> = std::result::Result<T, HwError>;
