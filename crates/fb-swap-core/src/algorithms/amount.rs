//! Decimal token amounts <-> base units.

use crate::domain::AmountError;
use primitive_types::U256;

/// Parse `"12.5"` into base units for a token with `decimals` decimals.
///
/// Only plain decimal notation is accepted: no sign, exponent or separators.
/// Excess fractional digits are an error, never silently truncated.
pub fn parse_token_amount(input: &str, decimals: u8) -> Result<U256, AmountError> {
    let text = input.trim();
    let malformed = || AmountError::Malformed(input.to_string());

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, f),
        None => (text, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(malformed());
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(malformed());
    }
    if frac_part.len() > usize::from(decimals) {
        return Err(AmountError::TooPrecise {
            input: input.to_string(),
            decimals,
        });
    }

    let overflow = || AmountError::Overflow(input.to_string());
    let scale = pow10(decimals).ok_or_else(overflow)?;
    let whole = if int_part.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(int_part).map_err(|_| overflow())?
    };
    let frac = if frac_part.is_empty() {
        U256::zero()
    } else {
        let frac_scale = pow10(decimals - frac_part.len() as u8).ok_or_else(overflow)?;
        let digits = U256::from_dec_str(frac_part).map_err(|_| overflow())?;
        digits.checked_mul(frac_scale).ok_or_else(overflow)?
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(overflow)
}

/// Render base units with at most `precision` fractional digits (truncated,
/// trailing zeros dropped) and thousands separators. Non-zero amounts too small
/// to show come out as `"< 0.0001"`.
pub fn format_token_amount(amount: U256, decimals: u8, precision: usize) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }
    let Some(scale) = pow10(decimals) else {
        return "0".to_string();
    };
    let whole = amount / scale;
    let frac = amount % scale;

    let frac_digits = format!("{:0>width$}", frac.to_string(), width = usize::from(decimals));
    let shown: String = frac_digits.chars().take(precision).collect();
    let shown = shown.trim_end_matches('0');

    if whole.is_zero() && shown.is_empty() {
        return format!("< 0.{}1", "0".repeat(precision.saturating_sub(1)));
    }

    let grouped = group_thousands(&whole.to_string());
    if shown.is_empty() {
        grouped
    } else {
        format!("{grouped}.{shown}")
    }
}

fn pow10(exp: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(exp))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
