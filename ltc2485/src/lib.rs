//! Driver for the Linear Technology LTC2485, a single-channel 24-bit
//! delta-sigma ADC with an I2C interface and an internal temperature
//! sensor.
//!
//! The driver is generic over the bus ([`hw_trait::I2c`]) and the clock
//! ([`hw_trait::Clock`]). It tracks the device's conversion cycle itself
//! and waits out each conversion before touching the bus again.
//!
//! ```ignore
//! use ltc2485::hw_trait::TokioClock;
//! use ltc2485::peripheral::ltc2485::{Ltc2485, DEFAULT_ADDRESS};
//! use ltc2485::transport::RppalI2c;
//!
//! let bus = RppalI2c::open(1)?;
//! let mut adc = Ltc2485::new(bus, TokioClock::new(), DEFAULT_ADDRESS);
//! if adc.begin(5.0).await {
//!     let volts = adc.get_volts().await?;
//!     let celsius = adc.get_temperature().await?;
//! }
//! ```

pub mod config;
pub mod hw_trait;
pub mod peripheral;
pub mod tracing;
pub mod transport;

pub use config::{ConfigError, MonitorConfig, TimingConfig};
pub use peripheral::ltc2485::{Ltc2485, Ltc2485Config, Ltc2485Error};
