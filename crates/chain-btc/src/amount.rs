//! Checked satoshi arithmetic.

use bitcoin::{Amount, Denomination};

use crate::error::BtcError;

const SAT_PER_BTC: u64 = 100_000_000;

/// Sum a sequence of satoshi values, failing on overflow.
pub fn checked_total<I>(values: I) -> Result<u64, BtcError>
where
    I: IntoIterator<Item = u64>,
{
    values
        .into_iter()
        .try_fold(0u64, |acc, v| acc.checked_add(v))
        .ok_or(BtcError::ValueOverflow)
}

/// `amount + fee`, failing on overflow.
pub fn required_total(amount_sat: u64, fee_sat: u64) -> Result<u64, BtcError> {
    amount_sat
        .checked_add(fee_sat)
        .ok_or(BtcError::ValueOverflow)
}

/// Change left over once `amount + fee` is paid out of `total_sat`.
///
/// Fails with `InsufficientFunds` when the inputs do not cover the payment.
pub fn change_for(total_sat: u64, amount_sat: u64, fee_sat: u64) -> Result<u64, BtcError> {
    let required = required_total(amount_sat, fee_sat)?;
    total_sat
        .checked_sub(required)
        .ok_or(BtcError::InsufficientFunds {
            available: total_sat,
            required,
        })
}

/// Parse a decimal BTC string (e.g. `"0.0002"`) into satoshis.
///
/// Exact decimal parsing: more than eight fractional digits, negative values
/// and garbage are rejected rather than rounded.
pub fn parse_btc_amount(input: &str) -> Result<u64, BtcError> {
    Amount::from_str_in(input.trim(), Denomination::Bitcoin)
        .map(Amount::to_sat)
        .map_err(|e| BtcError::InvalidAmount(format!("{input:?}: {e}")))
}

/// Satoshis as a BTC string with all 8 decimals, e.g. `0.00055000`.
pub fn format_btc(sat: u64) -> String {
    format!("{}.{:08}", sat / SAT_PER_BTC, sat % SAT_PER_BTC)
}
