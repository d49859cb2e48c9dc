//! Decimal formatting of token amounts.

use alloy_primitives::U256;
use alloy_primitives::utils::format_units;

/// Formats `value` (in the token's smallest unit) as a decimal string with
/// trailing fractional zeros removed: `1_500_000` with 6 decimals is `"1.5"`,
/// `1000` with 0 decimals is `"1000"`.
///
/// Decimals beyond what a 256-bit value can carry (more than 77) fall back to
/// the raw integer string.
pub fn format_amount(value: U256, decimals: u8) -> String {
    match format_units(value, decimals) {
        Ok(formatted) => trim_fraction(formatted),
        Err(_) => value.to_string(),
    }
}

fn trim_fraction(formatted: String) -> String {
    if !formatted.contains('.') {
        return formatted;
    }
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_trims_zeros() {
        assert_eq!(format_amount(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_amount(U256::from(2_000_000u64), 6), "2");
        assert_eq!(format_amount(U256::from(1u64), 6), "0.000001");
    }

    #[test]
    fn test_format_amount_zero_decimals() {
        assert_eq!(format_amount(U256::from(1000u64), 0), "1000");
        assert_eq!(format_amount(U256::ZERO, 0), "0");
    }

    #[test]
    fn test_format_amount_zero_value() {
        assert_eq!(format_amount(U256::ZERO, 18), "0");
    }

    #[test]
    fn test_format_amount_keeps_integer_zeros() {
        assert_eq!(format_amount(U256::from(100_000_000u64), 6), "100");
    }
}
