//! LTC2485 wire format: configuration bits, result word layout and
//! human-readable decoding of bus transactions.
//!
//! Datasheet: <https://www.analog.com/media/en/technical-documentation/data-sheets/2485fd.pdf>

/// Default I2C address (CA0/CA1 tied low)
pub const DEFAULT_ADDRESS: u8 = 0x14;

/// Addresses selectable with the CA0/CA1 pins
pub const ADDRESSES: [u8; 6] = [0x14, 0x16, 0x17, 0x24, 0x26, 0x27];

/// Configuration byte bits
pub mod config_bits {
    /// Double output rate, no offset auto-calibration
    pub const SPEED_2X: u8 = 0x01;
    /// Rejection select FB
    pub const FB: u8 = 0x02;
    /// Rejection select FA
    pub const FA: u8 = 0x04;
    /// Measure the internal PTAT sensor instead of the input pins
    pub const INTERNAL_TEMP: u8 = 0x08;
    /// Rejection select bits; only the combined 50/60 Hz mode (both clear)
    /// is supported
    pub const REJECTION_MASK: u8 = FA | FB;
    /// Bits that select the conversion mode, everything but the input mux
    pub const MODE_MASK: u8 = SPEED_2X | FB | FA;
    /// Upper nibble is reserved
    pub const RESERVED_MASK: u8 = 0xF0;
    /// Temperature measurement has no 2x speed mode
    pub const UNDEFINED_TEMP_2X: u8 = INTERNAL_TEMP | SPEED_2X;
}

/// Configuration after power-up and `begin`: 1x speed, 50/60 Hz
/// rejection, external input.
pub const DEFAULT_CONFIG: u8 = 0x00;

/// Number of bytes in a conversion result
pub const RESULT_LEN: usize = 4;

/// SIG bit of the result word; set for non-negative inputs
pub const SIGN_BIT: u32 = 0x8000_0000;

/// MSB bit of the result word, paired with SIG for range detection
pub const MSB_BIT: u32 = 0x4000_0000;

/// Whether `config` is a configuration this driver will write.
pub const fn is_valid_config(config: u8) -> bool {
    use config_bits::*;
    config & REJECTION_MASK == 0 && config != UNDEFINED_TEMP_2X && config & RESERVED_MASK == 0
}

/// Assemble a result (MSB first) and convert the offset-binary word to a
/// two's-complement code.
pub fn code_from_bytes(data: [u8; RESULT_LEN]) -> i32 {
    (u32::from_be_bytes(data) ^ SIGN_BIT) as i32
}

/// Input range indicated by the SIG and MSB bits of a raw result word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRange {
    /// Input at or above +0.5 * Vref
    OverRange,
    /// Input between -0.5 * Vref and +0.5 * Vref
    InRange,
    /// Input below -0.5 * Vref
    UnderRange,
}

impl InputRange {
    pub fn from_word(word: u32) -> Self {
        match (word & SIGN_BIT != 0, word & MSB_BIT != 0) {
            (true, true) => InputRange::OverRange,
            (false, false) => InputRange::UnderRange,
            _ => InputRange::InRange,
        }
    }
}

/// Decode a configuration byte
pub fn decode_config(config: u8) -> String {
    use config_bits::*;

    if !is_valid_config(config) {
        return format!("0x{:02x} (invalid)", config);
    }

    let input = if config & INTERNAL_TEMP != 0 {
        "internal temperature"
    } else {
        "external input"
    };
    let speed = if config & SPEED_2X != 0 { "2x" } else { "1x" };
    format!("0x{:02x} ({}, 50/60Hz rejection, {} speed)", config, input, speed)
}

/// Decode a conversion result read from the device
pub fn decode_reading(data: &[u8]) -> String {
    let Ok(bytes) = <[u8; RESULT_LEN]>::try_from(data) else {
        return format!("{:02x?} (truncated)", data);
    };

    let word = u32::from_be_bytes(bytes);
    let range = match InputRange::from_word(word) {
        InputRange::OverRange => ", over range",
        InputRange::UnderRange => ", under range",
        InputRange::InRange => "",
    };
    format!("{:02x?} (code={}{})", data, code_from_bytes(bytes), range)
}

/// Format an LTC2485 I2C transaction
pub fn format_transaction(data: &[u8], is_read: bool) -> String {
    if is_read {
        format!("READ RESULT={}", decode_reading(data))
    } else {
        match data {
            [] => "WRITE (probe)".to_string(),
            [config] => format!("WRITE CONFIG={}", decode_config(*config)),
            _ => format!("WRITE {:02x?} (unexpected length)", data),
        }
    }
}
