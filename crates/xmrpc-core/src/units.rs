//! Atomic-unit conversions and payment id helpers.
//!
//! Amounts on the wire are integers in piconero; 1 XMR = 10^12 atomic units.

use rand::RngCore;

use crate::error::CoreError;

pub const ATOMIC_UNITS_PER_XMR: u64 = 1_000_000_000_000;
const FRACTION_DIGITS: usize = 12;

/// Render atomic units as a decimal XMR string with all 12 fractional digits.
pub fn xmr_to_decimal(atomic: u64) -> String {
    let whole = atomic / ATOMIC_UNITS_PER_XMR;
    let fraction = atomic % ATOMIC_UNITS_PER_XMR;
    format!("{whole}.{fraction:0width$}", width = FRACTION_DIGITS)
}

/// Lossy conversion for display and arithmetic that tolerates rounding.
pub fn xmr_to_f64(atomic: u64) -> f64 {
    atomic as f64 / ATOMIC_UNITS_PER_XMR as f64
}

/// Truncating conversion; negative and NaN inputs saturate to 0.
pub fn f64_to_xmr(xmr: f64) -> u64 {
    (xmr * ATOMIC_UNITS_PER_XMR as f64) as u64
}

/// Parse a decimal XMR amount such as `"1.5"` or `"0.000000000001"` exactly.
pub fn parse_xmr(input: &str) -> Result<u64, CoreError> {
    let invalid = |reason: &str| CoreError::Decode(format!("invalid XMR amount `{input}`: {reason}"));

    let trimmed = input.trim();
    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("empty"));
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected digits with an optional decimal point"));
    }
    if fraction.len() > FRACTION_DIGITS {
        return Err(invalid("more than 12 fractional digits"));
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid("out of range"))?
    };
    let fraction: u64 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{fraction:0<width$}", width = FRACTION_DIGITS);
        padded.parse().map_err(|_| invalid("out of range"))?
    };

    whole
        .checked_mul(ATOMIC_UNITS_PER_XMR)
        .and_then(|atomic| atomic.checked_add(fraction))
        .ok_or_else(|| invalid("out of range"))
}

/// Random 64-bit payment id, hex encoded.
///
/// Random short ids can collide; recipients should check for uniqueness.
pub fn new_payment_id_64() -> String {
    random_hex::<8>()
}

/// Random 256-bit payment id, hex encoded.
pub fn new_payment_id_256() -> String {
    random_hex::<32>()
}

fn random_hex<const N: usize>() -> String {
    let mut buf = [0u8; N];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}
