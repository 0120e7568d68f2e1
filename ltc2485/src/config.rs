//! Runtime configuration.
//!
//! Defaults are compiled in; environment variables override them so the
//! same binary can be tuned on a board without a rebuild.

use crate::peripheral::ltc2485::protocol::{config_bits, ADDRESSES, DEFAULT_ADDRESS};
use crate::peripheral::ltc2485::Ltc2485Config;

/// Error parsing configuration from the environment
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Conversion timing of the device.
///
/// The timeouts are the time the LTC2485 needs to finish a conversion after
/// a configuration write or result read. The datasheet gives 147 ms typical
/// (163.5 ms max) in 1x mode and half that in 2x mode; the defaults round
/// to a small margin below the maximum, matching common practice with this
/// part. Increase them if reads return stale data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// Conversion time in 1x speed mode (ms)
    pub speed_1x_timeout_ms: u32,
    /// Conversion time in 2x speed mode (ms)
    pub speed_2x_timeout_ms: u32,
    /// Sleep between clock polls while waiting on a conversion (ms)
    pub poll_interval_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            speed_1x_timeout_ms: 160,
            speed_2x_timeout_ms: 80,
            poll_interval_ms: 1,
        }
    }
}

impl TimingConfig {
    /// Defaults overridden by environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LTC2485_TIMEOUT_1X_MS`: 1x conversion time (default: 160)
    /// - `LTC2485_TIMEOUT_2X_MS`: 2x conversion time (default: 80)
    /// - `LTC2485_POLL_MS`: poll granularity (default: 1, minimum 1)
    ///
    /// Unparsable values are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            speed_1x_timeout_ms: env_parse("LTC2485_TIMEOUT_1X_MS")
                .unwrap_or(defaults.speed_1x_timeout_ms),
            speed_2x_timeout_ms: env_parse("LTC2485_TIMEOUT_2X_MS")
                .unwrap_or(defaults.speed_2x_timeout_ms),
            poll_interval_ms: env_parse("LTC2485_POLL_MS")
                .unwrap_or(defaults.poll_interval_ms)
                .max(1),
        }
    }

    /// Conversion time that applies after writing `config`.
    pub fn conversion_timeout_ms(&self, config: u8) -> u32 {
        if config & config_bits::SPEED_2X != 0 {
            self.speed_2x_timeout_ms
        } else {
            self.speed_1x_timeout_ms
        }
    }
}

/// Settings for the `ltc2485-monitor` binary.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// I2C bus number (`/dev/i2c-N`)
    pub bus: u8,
    /// 7-bit device address
    pub address: u8,
    /// Reference voltage applied to REF+ (V)
    pub reference_voltage: f32,
    /// Time between samples (ms)
    pub interval_ms: u64,
    /// Sample in 2x speed mode
    pub speed_2x: bool,
    /// Also sample the die temperature
    pub temperature: bool,
    pub timing: TimingConfig,
}

impl MonitorConfig {
    /// Parse configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LTC2485_I2C_BUS`: bus number (default: 1)
    /// - `LTC2485_ADDRESS`: device address, hex with `0x` prefix or decimal;
    ///   must be one of the pin-strapped [`ADDRESSES`] (default: 0x14)
    /// - `LTC2485_VREF`: reference voltage, must be positive (default: 5.0)
    /// - `LTC2485_INTERVAL_MS`: sample interval (default: 1000)
    /// - `LTC2485_SPEED_2X`: `1`/`true` to enable 2x mode
    /// - `LTC2485_TEMPERATURE`: `1`/`true` to also read the die temperature
    ///
    /// Plus the timing variables read by [`TimingConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let bus = match std::env::var("LTC2485_I2C_BUS") {
            Ok(s) => s.trim().parse().map_err(|_| invalid("LTC2485_I2C_BUS", s))?,
            Err(_) => 1,
        };

        let address = match std::env::var("LTC2485_ADDRESS") {
            Ok(s) => parse_address(&s)
                .filter(|addr| ADDRESSES.contains(addr))
                .ok_or_else(|| invalid("LTC2485_ADDRESS", s))?,
            Err(_) => DEFAULT_ADDRESS,
        };

        let reference_voltage = match std::env::var("LTC2485_VREF") {
            Ok(s) => s
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite() && *v > 0.0)
                .ok_or_else(|| invalid("LTC2485_VREF", s))?,
            Err(_) => 5.0,
        };

        let interval_ms = env_parse("LTC2485_INTERVAL_MS").unwrap_or(1000);

        Ok(Self {
            bus,
            address,
            reference_voltage,
            interval_ms,
            speed_2x: env_flag("LTC2485_SPEED_2X"),
            temperature: env_flag("LTC2485_TEMPERATURE"),
            timing: TimingConfig::from_env(),
        })
    }

    /// Configuration used for voltage samples
    pub fn sample_config(&self) -> Ltc2485Config {
        if self.speed_2x {
            Ltc2485Config::EXTERNAL_2X
        } else {
            Ltc2485Config::EXTERNAL_1X
        }
    }
}

fn invalid(var: &'static str, value: String) -> ConfigError {
    ConfigError::InvalidValue { var, value }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(var: &str) -> bool {
    std::env::var(var)
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Parse a 7-bit address given as `0x14` or `20`.
fn parse_address(s: &str) -> Option<u8> {
    let s = s.trim();
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok()?,
        None => s.parse().ok()?,
    };
    (value <= 0x7F).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "LTC2485_TIMEOUT_1X_MS",
        "LTC2485_TIMEOUT_2X_MS",
        "LTC2485_POLL_MS",
        "LTC2485_I2C_BUS",
        "LTC2485_ADDRESS",
        "LTC2485_VREF",
        "LTC2485_INTERVAL_MS",
        "LTC2485_SPEED_2X",
        "LTC2485_TEMPERATURE",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_timeout_follows_speed_bit() {
        let timing = TimingConfig::default();
        assert_eq!(timing.conversion_timeout_ms(0x00), 160);
        assert_eq!(timing.conversion_timeout_ms(0x01), 80);
        assert_eq!(timing.conversion_timeout_ms(0x08), 160);
    }

    #[test]
    #[serial]
    fn test_timing_from_env() {
        clear_env();
        assert_eq!(TimingConfig::from_env(), TimingConfig::default());

        std::env::set_var("LTC2485_TIMEOUT_1X_MS", "200");
        std::env::set_var("LTC2485_TIMEOUT_2X_MS", "bogus");
        std::env::set_var("LTC2485_POLL_MS", "0");
        let timing = TimingConfig::from_env();
        assert_eq!(timing.speed_1x_timeout_ms, 200);
        assert_eq!(timing.speed_2x_timeout_ms, 80);
        assert_eq!(timing.poll_interval_ms, 1);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_monitor_defaults() {
        clear_env();
        let config = MonitorConfig::from_env().unwrap();
        assert_eq!(config.bus, 1);
        assert_eq!(config.address, 0x14);
        assert_eq!(config.reference_voltage, 5.0);
        assert_eq!(config.interval_ms, 1000);
        assert!(!config.speed_2x);
        assert!(!config.temperature);
        assert_eq!(config.sample_config(), Ltc2485Config::EXTERNAL_1X);
    }

    #[test]
    #[serial]
    fn test_monitor_overrides() {
        clear_env();
        std::env::set_var("LTC2485_I2C_BUS", "0");
        std::env::set_var("LTC2485_ADDRESS", "0x26");
        std::env::set_var("LTC2485_VREF", "4.096");
        std::env::set_var("LTC2485_SPEED_2X", "true");
        std::env::set_var("LTC2485_TEMPERATURE", "1");
        let config = MonitorConfig::from_env().unwrap();
        assert_eq!(config.bus, 0);
        assert_eq!(config.address, 0x26);
        assert_eq!(config.reference_voltage, 4.096);
        assert!(config.speed_2x);
        assert!(config.temperature);
        assert_eq!(config.sample_config(), Ltc2485Config::EXTERNAL_2X);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_monitor_rejects_bad_values() {
        clear_env();
        std::env::set_var("LTC2485_ADDRESS", "0x80");
        assert!(MonitorConfig::from_env().is_err());

        // Parses, but no pin strapping selects it
        std::env::set_var("LTC2485_ADDRESS", "0x15");
        let err = MonitorConfig::from_env().unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for LTC2485_ADDRESS: \"0x15\"");

        clear_env();
        std::env::set_var("LTC2485_VREF", "-1");
        let err = MonitorConfig::from_env().unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for LTC2485_VREF: \"-1\"");
        clear_env();
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x14"), Some(0x14));
        assert_eq!(parse_address(" 38 "), Some(38));
        assert_eq!(parse_address("0xZZ"), None);
        assert_eq!(parse_address("200"), None);
    }
}
