//! Ledger amount text format: decimal with up to 7 fraction digits over
//! signed 64-bit stroops.

use crate::error::LedgerError;

/// Fraction digits of a ledger amount
pub const AMOUNT_DECIMALS: u32 = 7;

/// Stroops per whole unit
pub const STROOPS_PER_UNIT: i64 = 10_000_000;

/// Render stroops with exactly seven fraction digits
pub fn format_stroops(stroops: i64) -> String {
    let sign = if stroops < 0 { "-" } else { "" };
    let magnitude = stroops.unsigned_abs();
    let unit = STROOPS_PER_UNIT as u64;
    format!(
        "{}{}.{:07}",
        sign,
        magnitude / unit,
        magnitude % unit
    )
}

/// Parse an unsigned decimal amount into stroops
pub fn parse_stroops(text: &str) -> Result<i64, LedgerError> {
    let invalid = || LedgerError::InvalidAmount(text.to_string());

    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };
    if whole.is_empty()
        || (text.contains('.') && fraction.is_empty())
        || fraction.len() > AMOUNT_DECIMALS as usize
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole: i64 = whole.parse().map_err(|_| invalid())?;
    let mut fraction_stroops: i64 = 0;
    for (i, digit) in fraction.bytes().enumerate() {
        let weight = 10i64.pow(AMOUNT_DECIMALS - 1 - i as u32);
        fraction_stroops += (digit - b'0') as i64 * weight;
    }

    whole
        .checked_mul(STROOPS_PER_UNIT)
        .and_then(|s| s.checked_add(fraction_stroops))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(format_stroops(1_234_567_890), "123.4567890");
        assert_eq!(format_stroops(100_000_000), "10.0000000");
        assert_eq!(format_stroops(1), "0.0000001");
        assert_eq!(format_stroops(0), "0.0000000");
        assert_eq!(format_stroops(i64::MAX), "922337203685.4775807");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_stroops("10.0000000").unwrap(), 100_000_000);
        assert_eq!(parse_stroops("10").unwrap(), 100_000_000);
        assert_eq!(parse_stroops("0.5").unwrap(), 5_000_000);
        assert_eq!(parse_stroops("922337203685.4775807").unwrap(), i64::MAX);
    }

    #[test]
    fn test_parse_rejects() {
        for bad in [
            "",
            ".",
            ".5",
            "1.",
            "-1",
            "+1",
            "1.00000001",
            "1e7",
            "922337203685.4775808",
            "1,5",
        ] {
            assert!(parse_stroops(bad).is_err(), "accepted {bad:?}");
        }
    }
}
