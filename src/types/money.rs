//! Money representation
//!
//! All balances and transaction amounts are integer minor currency units
//! (pesewas, cents). Decimal text only exists at the I/O boundary, where
//! `rust_decimal` converts between `"100.00"` and `10000`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::error::LedgerError;

/// Signed amount in minor currency units
pub type Amount = i64;

/// Number of fractional digits in one major unit
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Parse a major-unit decimal string (`"100.00"`) into minor units
///
/// More fractional digits than [`MINOR_UNIT_SCALE`] are rejected rather than
/// rounded.
pub fn parse_major_units(text: &str) -> Result<Amount, LedgerError> {
    let trimmed = text.trim();
    let invalid = || LedgerError::invalid_amount(trimmed);

    let decimal = Decimal::from_str(trimmed).map_err(|_| invalid())?;
    if decimal.normalize().scale() > MINOR_UNIT_SCALE {
        return Err(invalid());
    }

    decimal
        .checked_mul(Decimal::from(10_i64.pow(MINOR_UNIT_SCALE)))
        .and_then(|minor| minor.to_i64())
        .ok_or_else(invalid)
}

/// Format minor units as a major-unit decimal string (`10000` -> `"100.00"`)
///
/// Accepts widened totals as well as single amounts. Values beyond the
/// 96-bit `Decimal` mantissa are formatted from the integer directly.
pub fn format_minor_units(amount: impl Into<i128>) -> String {
    let amount = amount.into();
    match Decimal::try_from_i128_with_scale(amount, MINOR_UNIT_SCALE) {
        Ok(decimal) => format!("{:.2}", decimal),
        Err(_) => {
            let unit = 10_u128.pow(MINOR_UNIT_SCALE);
            let magnitude = amount.unsigned_abs();
            let sign = if amount < 0 { "-" } else { "" };
            format!("{}{}.{:02}", sign, magnitude / unit, magnitude % unit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::whole("100", 10000)]
    #[case::two_places("100.00", 10000)]
    #[case::one_place("25.5", 2550)]
    #[case::trailing_zeros("40.000", 4000)]
    #[case::padded("  60.00 ", 6000)]
    #[case::negative("-1.25", -125)]
    fn test_parse_major_units(#[case] text: &str, #[case] expected: Amount) {
        assert_eq!(parse_major_units(text).unwrap(), expected);
    }

    #[rstest]
    #[case::sub_minor("0.001")]
    #[case::garbage("ten")]
    #[case::empty("")]
    #[case::too_large("999999999999999999999")]
    fn test_parse_major_units_rejects(#[case] text: &str) {
        assert!(matches!(
            parse_major_units(text),
            Err(LedgerError::InvalidAmount { .. })
        ));
    }

    #[rstest]
    #[case(10000, "100.00")]
    #[case(8500, "85.00")]
    #[case(5, "0.05")]
    #[case(0, "0.00")]
    #[case(-4000, "-40.00")]
    fn test_format_minor_units(#[case] amount: Amount, #[case] expected: &str) {
        assert_eq!(format_minor_units(amount), expected);
    }

    #[rstest]
    #[case::two_max_amounts(2 * i128::from(i64::MAX), "184467440737095516.14")]
    #[case::beyond_decimal(i128::MAX, "1701411834604692317316873037158841057.27")]
    #[case::negative_beyond_decimal(i128::MIN, "-1701411834604692317316873037158841057.28")]
    fn test_format_wide_totals(#[case] amount: i128, #[case] expected: &str) {
        assert_eq!(format_minor_units(amount), expected);
    }
}
