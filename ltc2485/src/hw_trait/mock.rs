//! Simulated bus and clock for tests.
//!
//! Both types are cheap handles over shared state: a test keeps a clone to
//! program responses and inspect the transaction log after the driver has
//! taken ownership of the other.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Clock, I2c, I2cError, Result};

/// Simulated millisecond clock. Delays advance time instantly.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now: Arc<AtomicU32>,
}

impl MockClock {
    pub fn new(start_ms: u32) -> Self {
        Self {
            now: Arc::new(AtomicU32::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u32) {
        // fetch_add wraps on overflow
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

#[async_trait]
impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        self.now.load(Ordering::SeqCst)
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.advance(ms);
    }
}

/// Bus transaction kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cTransaction {
    Write { addr: u8, data: Vec<u8> },
    Read { addr: u8, len: usize },
}

/// A transaction together with the simulated time it was issued at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub at_ms: u32,
    pub transaction: I2cTransaction,
}

#[derive(Debug)]
struct MockState {
    present: bool,
    frequency: u32,
    log: Vec<Recorded>,
    responses: VecDeque<Vec<u8>>,
    write_errors: VecDeque<I2cError>,
}

/// Simulated I2C bus with a single device behind it.
#[derive(Debug, Clone)]
pub struct MockI2c {
    clock: MockClock,
    state: Arc<Mutex<MockState>>,
}

impl MockI2c {
    pub fn new(clock: MockClock) -> Self {
        Self {
            clock,
            state: Arc::new(Mutex::new(MockState {
                present: true,
                frequency: 100_000,
                log: Vec::new(),
                responses: VecDeque::new(),
                write_errors: VecDeque::new(),
            })),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }

    /// Make the device stop acknowledging its address.
    pub fn set_present(&self, present: bool) {
        self.state().present = present;
    }

    /// Queue the bytes returned by the next read. A response shorter than
    /// the read buffer simulates a truncated transfer.
    pub fn push_response(&self, data: &[u8]) {
        self.state().responses.push_back(data.to_vec());
    }

    /// Fail the next non-empty write with `error`.
    pub fn fail_next_write(&self, error: I2cError) {
        self.state().write_errors.push_back(error);
    }

    pub fn transactions(&self) -> Vec<Recorded> {
        self.state().log.clone()
    }

    /// Every single-byte write as `(time, byte)`.
    pub fn config_writes(&self) -> Vec<(u32, u8)> {
        self.state()
            .log
            .iter()
            .filter_map(|r| match &r.transaction {
                I2cTransaction::Write { data, .. } if data.len() == 1 => Some((r.at_ms, data[0])),
                _ => None,
            })
            .collect()
    }

    pub fn frequency(&self) -> u32 {
        self.state().frequency
    }

    pub fn clear(&self) {
        self.state().log.clear();
    }
}

#[async_trait]
impl I2c for MockI2c {
    async fn write(&mut self, addr: u8, data: &[u8]) -> Result<()> {
        let at_ms = self.clock.now_ms();
        let mut state = self.state();
        state.log.push(Recorded {
            at_ms,
            transaction: I2cTransaction::Write {
                addr,
                data: data.to_vec(),
            },
        });
        if !state.present {
            return Err(I2cError::NoAck(addr).into());
        }
        if !data.is_empty() {
            if let Some(error) = state.write_errors.pop_front() {
                return Err(error.into());
            }
        }
        Ok(())
    }

    async fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<usize> {
        let at_ms = self.clock.now_ms();
        let mut state = self.state();
        state.log.push(Recorded {
            at_ms,
            transaction: I2cTransaction::Read {
                addr,
                len: buffer.len(),
            },
        });
        if !state.present {
            return Err(I2cError::NoAck(addr).into());
        }
        let response = state.responses.pop_front().unwrap_or_default();
        let n = response.len().min(buffer.len());
        buffer[..n].copy_from_slice(&response[..n]);
        Ok(n)
    }

    async fn set_frequency(&mut self, hz: u32) -> Result<()> {
        self.state().frequency = hz;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_time_of_write() {
        let clock = MockClock::new(10);
        let mut i2c = MockI2c::new(clock.clone());

        i2c.write(0x14, &[0x01]).await.unwrap();
        clock.advance(5);
        i2c.write(0x14, &[0x00]).await.unwrap();

        assert_eq!(i2c.config_writes(), vec![(10, 0x01), (15, 0x00)]);
    }

    #[tokio::test]
    async fn test_mock_short_read() {
        let mut i2c = MockI2c::new(MockClock::default());
        i2c.push_response(&[0xAA, 0xBB]);

        let mut buf = [0u8; 4];
        let n = i2c.read(0x14, &mut buf).await.unwrap();
        assert_eq!(n, 2);
        assert_eq!(&buf[..2], &[0xAA, 0xBB]);

        let n = i2c.read(0x14, &mut buf).await.unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_mock_probe_follows_presence() {
        let mut i2c = MockI2c::new(MockClock::default());
        assert!(i2c.probe(0x14).await.unwrap());

        i2c.set_present(false);
        assert!(!i2c.probe(0x14).await.unwrap());
    }

    #[tokio::test]
    async fn test_mock_frequency() {
        let mut i2c = MockI2c::new(MockClock::default());
        assert_eq!(i2c.frequency(), 100_000);

        i2c.set_frequency(400_000).await.unwrap();
        assert_eq!(i2c.frequency(), 400_000);
    }
}
