//! Chain constants and precision helpers

/// Human-readable prefix of Klever bech32 addresses.
pub const ADDRESS_HRP: &str = "klv";

/// Byte length of a decoded address payload.
pub const ADDRESS_BYTES: usize = 32;

/// Separator between the function name and each hex argument in call data.
pub const CALL_ARG_SEPARATOR: char = '@';

/// Node status marker for a confirmed transaction.
pub const TX_STATUS_SUCCESS: &str = "success";

/// Node status marker for a failed transaction.
pub const TX_STATUS_FAILED: &str = "fail";

/// Node status marker for a transaction still in the pool.
pub const TX_STATUS_PENDING: &str = "pending";

/// Query return code for a successful read-only call.
pub const QUERY_RETURN_OK: &str = "Ok";

/// KLV and most KDA assets use 6 decimals.
pub const KLV_DECIMALS: u8 = 6;

/// Scale a floating point amount to raw units with the given decimals.
pub fn scale_to_decimals(value: f64, decimals: u8) -> i64 {
    let multiplier = 10i64.pow(decimals as u32);
    (value * multiplier as f64) as i64
}

/// Unscale raw units back to a floating point amount.
pub fn unscale_from_decimals(value: i64, decimals: u8) -> f64 {
    let divisor = 10i64.pow(decimals as u32) as f64;
    value as f64 / divisor
}

/// Scale a KLV/KDA amount (6 decimals).
pub fn scale_klv(amount: f64) -> i64 {
    scale_to_decimals(amount, KLV_DECIMALS)
}

/// Unscale a raw KLV/KDA amount (6 decimals).
pub fn unscale_klv(amount: i64) -> f64 {
    unscale_from_decimals(amount, KLV_DECIMALS)
}
