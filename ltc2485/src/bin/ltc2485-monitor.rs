//! Periodically sample an LTC2485 on a Linux I2C bus and log the results.
//!
//! Configured through environment variables, see
//! [`ltc2485::MonitorConfig::from_env`].

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::time;

use ltc2485::hw_trait::{I2c, TokioClock};
use ltc2485::tracing::prelude::*;
use ltc2485::transport::RppalI2c;
use ltc2485::{Ltc2485, Ltc2485Config, MonitorConfig};

#[tokio::main]
async fn main() -> Result<()> {
    ltc2485::tracing::init_journald_or_stdout();

    let config = MonitorConfig::from_env().context("reading configuration")?;
    info!(
        bus = config.bus,
        address = format_args!("0x{:02x}", config.address),
        vref = config.reference_voltage,
        interval_ms = config.interval_ms,
        "Starting LTC2485 monitor"
    );

    let bus = RppalI2c::open(config.bus)
        .with_context(|| format!("opening /dev/i2c-{}", config.bus))?;
    let mut adc = Ltc2485::with_timing(bus, TokioClock::new(), config.address, config.timing);

    if !adc.begin(config.reference_voltage).await {
        bail!("no LTC2485 at address 0x{:02x}", config.address);
    }

    let sample_config = config.sample_config();
    let mut interval = time::interval(Duration::from_millis(config.interval_ms.max(1)));
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, shutting down.");
                break;
            }
            _ = interval.tick() => {
                sample(&mut adc, sample_config, config.temperature).await;
            }
        }
    }

    Ok(())
}

/// Take one voltage sample, and one temperature sample if requested.
///
/// Failures are logged and the next tick tries again.
async fn sample<I: I2c>(
    adc: &mut Ltc2485<I, TokioClock>,
    sample_config: Ltc2485Config,
    temperature: bool,
) {
    // A temperature read leaves the device in temperature mode.
    if adc.config() != sample_config {
        if let Err(e) = adc.configure(sample_config.bits()).await {
            warn!(status = e.status_code(), "Configure failed: {}", e);
            return;
        }
    }

    match adc.get_volts().await {
        Ok(volts) => info!(volts = format_args!("{:.7}", volts), "Sample"),
        Err(e) => warn!(status = e.status_code(), "Voltage read failed: {}", e),
    }

    if temperature {
        // Temperature has no 2x mode.
        if adc.config().is_speed_2x() {
            if let Err(e) = adc.configure(Ltc2485Config::TEMPERATURE.bits()).await {
                warn!(status = e.status_code(), "Configure failed: {}", e);
                return;
            }
        }
        match adc.get_temperature().await {
            Ok(celsius) => info!(celsius = format_args!("{:.2}", celsius), "Die temperature"),
            Err(e) => warn!(status = e.status_code(), "Temperature read failed: {}", e),
        }
    }
}
