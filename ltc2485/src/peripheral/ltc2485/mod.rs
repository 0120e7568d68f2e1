//! LTC2485 24-bit delta-sigma ADC driver.
//!
//! The LTC2485 starts a new conversion as soon as a configuration write or
//! a result read completes, and NACKs any transaction until that conversion
//! has finished. The driver cannot ask the part how far along it is, so it
//! tracks the cycle itself: the time of the last access plus the conversion
//! time for the current speed mode. Every bus transaction first waits for
//! that window to elapse.
//!
//! Datasheet: <https://www.analog.com/media/en/technical-documentation/data-sheets/2485fd.pdf>

pub mod config;
pub mod protocol;

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::config::TimingConfig;
use crate::hw_trait::i2c::status;
use crate::hw_trait::{Clock, HwError, I2c};

pub use config::Ltc2485Config;
pub use protocol::DEFAULT_ADDRESS;
use protocol::{config_bits, RESULT_LEN};

/// Status reported for a rejected configuration byte. Bus controllers
/// never produce it.
pub const INVALID_CONFIG_STATUS: u8 = 255;

/// Volts per LSB of the 24-bit result, per volt of reference
/// (1 / 16_777_215).
///
/// The 32-bit result word carries the sign, 24 result bits and sub-LSB
/// noise bits; after the sign flip the code is divided by
/// [`RESULT_ALIGN`] to line the result field up with this scale. The
/// full code span then covers the ±0.5 * Vref input range.
pub const VOLTS_PER_LSB: f32 = 5.960464832810e-8;

/// Divisor aligning the 32-bit code to the 24-bit result field
pub const RESULT_ALIGN: f32 = 256.0;

/// Die temperature at the PTAT reference point (°C)
pub const TEMP_REFERENCE_CELSIUS: f32 = 27.0;
/// PTAT output at the reference point (V)
pub const TEMP_REFERENCE_VOLTS: f32 = 0.420;
/// Calibration slope applied to the PTAT deviation
pub const TEMP_SLOPE: f32 = 1.40;

/// LTC2485 error types
#[derive(Error, Debug)]
pub enum Ltc2485Error {
    #[error("Invalid configuration 0x{0:02X}")]
    InvalidConfiguration(u8),
    #[error("Bus transaction failed: {0}")]
    Bus(#[from] HwError),
    #[error("Incomplete read: expected {expected} bytes, received {received}")]
    IncompleteRead { expected: usize, received: usize },
    #[error("Reconfiguration to 0x{config:02X} failed: {source}")]
    Reconfigure {
        config: u8,
        source: Box<Ltc2485Error>,
    },
}

impl Ltc2485Error {
    /// Numeric status in the two-wire convention: 255 for a rejected
    /// configuration, the bus controller's code otherwise.
    pub fn status_code(&self) -> u8 {
        match self {
            Ltc2485Error::InvalidConfiguration(_) => INVALID_CONFIG_STATUS,
            Ltc2485Error::Bus(e) => e.code(),
            Ltc2485Error::IncompleteRead { .. } => status::OTHER,
            Ltc2485Error::Reconfigure { source, .. } => source.status_code(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Ltc2485Error>;

/// LTC2485 driver
///
/// Operations take `&mut self`, so a wait followed by its bus transaction
/// cannot interleave with another operation on the same device. To share
/// one device between tasks, wrap it in `Arc<tokio::sync::Mutex<_>>`.
pub struct Ltc2485<I2C, CLK> {
    i2c: I2C,
    clock: CLK,
    address: u8,
    timing: TimingConfig,
    reference_voltage: f32,
    /// Last configuration confirmed written
    config: Ltc2485Config,
    /// `None` until the first access: nothing to wait for
    last_access: Option<u32>,
    conversion_timeout_ms: u32,
}

impl<I2C: I2c, CLK: Clock> Ltc2485<I2C, CLK> {
    /// Create a new driver with default timing
    pub fn new(i2c: I2C, clock: CLK, address: u8) -> Self {
        Self::with_timing(i2c, clock, address, TimingConfig::default())
    }

    /// Create a new driver with custom conversion timing
    pub fn with_timing(i2c: I2C, clock: CLK, address: u8, timing: TimingConfig) -> Self {
        Self {
            i2c,
            clock,
            address,
            timing,
            reference_voltage: 0.0,
            config: Ltc2485Config::default(),
            last_access: None,
            conversion_timeout_ms: timing.conversion_timeout_ms(Ltc2485Config::default().bits()),
        }
    }

    /// Store the reference voltage, check the device answers and write the
    /// default configuration.
    ///
    /// Returns false if the device did not acknowledge; the driver must not
    /// be used in that case. A failed configuration write is logged but
    /// does not fail initialization.
    pub async fn begin(&mut self, reference_voltage: f32) -> bool {
        self.reference_voltage = reference_voltage;

        if !self.is_connected().await {
            warn!(address = self.address, "LTC2485 not responding");
            return false;
        }

        if let Err(e) = self.configure(Ltc2485Config::default().bits()).await {
            warn!(
                address = self.address,
                status = e.status_code(),
                "Initial configuration failed: {}",
                e
            );
        }

        info!(
            address = self.address,
            vref = reference_voltage,
            "LTC2485 initialized"
        );
        true
    }

    /// Whether the device acknowledges its address.
    pub async fn is_connected(&mut self) -> bool {
        trace!("{}", protocol::format_transaction(&[], false));
        match self.i2c.probe(self.address).await {
            Ok(present) => present,
            Err(e) => {
                debug!(address = self.address, "Probe failed: {}", e);
                false
            }
        }
    }

    /// Write a new configuration byte.
    ///
    /// Waits for the conversion started by the previous access, using the
    /// timeout of the configuration in effect, then writes `config`. State
    /// is only updated once the write is acknowledged.
    pub async fn configure(&mut self, config: u8) -> Result<()> {
        let Some(new_config) = Ltc2485Config::from_bits(config) else {
            debug!("Rejecting configuration {}", protocol::decode_config(config));
            return Err(Ltc2485Error::InvalidConfiguration(config));
        };

        self.wait_for_conversion().await;

        trace!("{}", protocol::format_transaction(&[config], false));
        self.i2c.write(self.address, &[config]).await?;

        self.last_access = Some(self.clock.now_ms());
        self.config = new_config;
        self.conversion_timeout_ms = self.timing.conversion_timeout_ms(config);
        debug!(
            timeout_ms = self.conversion_timeout_ms,
            "Configuration set to {}", new_config
        );

        Ok(())
    }

    /// Read the next conversion of the external input as a signed code.
    ///
    /// Switches away from temperature mode first if needed.
    pub async fn get_raw_code(&mut self) -> Result<i32> {
        if self.config.is_internal_temperature() {
            self.reconfigure(self.config.bits() & config_bits::MODE_MASK, "ADC read")
                .await?;
        }

        self.wait_for_conversion().await;
        self.read_code().await
    }

    /// Read the next conversion of the external input in volts.
    pub async fn get_volts(&mut self) -> Result<f32> {
        let code = self.get_raw_code().await?;
        Ok(self.code_to_volts(code))
    }

    /// Read the die temperature in °C.
    ///
    /// Switches to temperature mode first if needed, keeping the other
    /// bits. Temperature has no 2x mode, so from 2x speed the switch is
    /// rejected and this returns [`Ltc2485Error::Reconfigure`]; configure
    /// 1x speed first.
    pub async fn get_temperature(&mut self) -> Result<f32> {
        if !self.config.is_internal_temperature() {
            let target = self.config.bits() | config_bits::INTERNAL_TEMP;
            self.reconfigure(target, "temperature read").await?;
        }

        self.wait_for_conversion().await;
        let code = self.read_code().await?;
        let volts = self.code_to_volts(code);

        Ok(TEMP_REFERENCE_CELSIUS + TEMP_SLOPE * (volts - TEMP_REFERENCE_VOLTS))
    }

    /// Scale a signed code to volts using the stored reference voltage.
    pub fn code_to_volts(&self, code: i32) -> f32 {
        code as f32 / RESULT_ALIGN * self.reference_voltage * VOLTS_PER_LSB
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Time of the last access that started a conversion, 0 before the
    /// first one.
    pub fn last_accessed(&self) -> u32 {
        self.last_access.unwrap_or(0)
    }

    /// Configuration currently in effect
    pub fn config(&self) -> Ltc2485Config {
        self.config
    }

    pub fn conversion_timeout_ms(&self) -> u32 {
        self.conversion_timeout_ms
    }

    pub fn reference_voltage(&self) -> f32 {
        self.reference_voltage
    }

    /// Release the bus and clock
    pub fn release(self) -> (I2C, CLK) {
        (self.i2c, self.clock)
    }

    async fn reconfigure(&mut self, config: u8, purpose: &'static str) -> Result<()> {
        self.configure(config).await.map_err(|e| {
            warn!(
                status = e.status_code(),
                "Reconfigure for {} failed: {}", purpose, e
            );
            Ltc2485Error::Reconfigure {
                config,
                source: Box::new(e),
            }
        })
    }

    /// Poll the clock until the conversion window has elapsed.
    async fn wait_for_conversion(&mut self) {
        let Some(since) = self.last_access else {
            return;
        };

        let poll_ms = self.timing.poll_interval_ms.max(1);
        while self.clock.elapsed_since(since) < self.conversion_timeout_ms {
            self.clock.delay_ms(poll_ms).await;
        }
    }

    /// Fetch a result. The read itself starts the next conversion.
    async fn read_code(&mut self) -> Result<i32> {
        let mut buf = [0u8; RESULT_LEN];
        let received = self.i2c.read(self.address, &mut buf).await?;
        trace!(
            "{}",
            protocol::format_transaction(&buf[..received.min(RESULT_LEN)], true)
        );

        if received != RESULT_LEN {
            warn!(
                expected = RESULT_LEN,
                received, "Short read from LTC2485"
            );
            return Err(Ltc2485Error::IncompleteRead {
                expected: RESULT_LEN,
                received,
            });
        }

        self.last_access = Some(self.clock.now_ms());
        Ok(protocol::code_from_bytes(buf))
    }
}
