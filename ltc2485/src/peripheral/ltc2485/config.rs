//! Typed view of the LTC2485 configuration byte.

use super::protocol::{self, config_bits};
use super::Ltc2485Error;

/// A configuration byte known to pass validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ltc2485Config(u8);

impl Ltc2485Config {
    /// External input, 1x speed, 50/60 Hz rejection
    pub const EXTERNAL_1X: Self = Self(protocol::DEFAULT_CONFIG);
    /// External input, 2x speed, 50/60 Hz rejection
    pub const EXTERNAL_2X: Self = Self(config_bits::SPEED_2X);
    /// Internal temperature sensor, 1x speed, 50/60 Hz rejection
    pub const TEMPERATURE: Self = Self(config_bits::INTERNAL_TEMP);

    /// Validate a raw configuration byte.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if protocol::is_valid_config(bits) {
            Some(Self(bits))
        } else {
            None
        }
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_speed_2x(self) -> bool {
        self.0 & config_bits::SPEED_2X != 0
    }

    pub const fn is_internal_temperature(self) -> bool {
        self.0 & config_bits::INTERNAL_TEMP != 0
    }
}

impl Default for Ltc2485Config {
    fn default() -> Self {
        Self::EXTERNAL_1X
    }
}

impl From<Ltc2485Config> for u8 {
    fn from(config: Ltc2485Config) -> u8 {
        config.0
    }
}

impl TryFrom<u8> for Ltc2485Config {
    type Error = Ltc2485Error;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::from_bits(bits).ok_or(Ltc2485Error::InvalidConfiguration(bits))
    }
}

impl std::fmt::Display for Ltc2485Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&protocol::decode_config(self.0))
    }
}
