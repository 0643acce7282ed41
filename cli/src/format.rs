//! Number formatting for terminal output.

use rust_decimal::Decimal;

/// Format an amount with two decimals and thousands separators.
pub fn format_amount(value: Decimal) -> String {
    let fixed = format!("{:.2}", value.round_dp(2));
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}.{frac_part}")
}

/// Format a rate with four decimals.
pub fn format_rate(value: Decimal) -> String {
    format!("{:.4}", value.round_dp(4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(0)), "0.00");
        assert_eq!(format_amount(dec!(999.5)), "999.50");
        assert_eq!(format_amount(dec!(1000)), "1,000.00");
        assert_eq!(format_amount(dec!(1234567.891)), "1,234,567.89");
        assert_eq!(format_amount(dec!(-12345.6)), "-12,345.60");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(dec!(91.5)), "91.5000");
        assert_eq!(format_rate(dec!(0.0105263)), "0.0105");
    }
}
