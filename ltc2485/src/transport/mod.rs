//! Concrete bus implementations of the [`crate::hw_trait`] traits.
//!
//! Each transport adapts a platform I2C interface to [`crate::hw_trait::I2c`]
//! so the drivers in [`crate::peripheral`] can run on it unchanged.

#[cfg(feature = "rppal")]
pub mod rppal_i2c;

#[cfg(feature = "rppal")]
pub use rppal_i2c::RppalI2c;
