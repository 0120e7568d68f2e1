//! Drivers for I2C peripherals.

pub mod ltc2485;

pub use ltc2485::{Ltc2485, Ltc2485Config, Ltc2485Error};
