//! Presentation strings for quotes.
//!
//! Prices are rendered with a `$` prefix. Prices under the format's small-price
//! threshold get 4 decimals, everything else 2 decimals, and prices of 1000 or more
//! additionally get thousands separators. Change percentages always carry an explicit
//! sign and 2 decimals.

use serde::{Deserialize, Serialize};

/// Prices at or above this value are grouped with thousands separators.
const GROUPING_THRESHOLD: f64 = 1000.0;

/// Formatting parameters for one feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceFormat {
    /// Prices strictly below this value are shown with 4 decimals.
    pub small_price_threshold: f64,
}

impl Default for PriceFormat {
    fn default() -> Self {
        Self {
            small_price_threshold: 1.0,
        }
    }
}

impl PriceFormat {
    /// Build a format with a custom small-price threshold.
    pub fn with_threshold(small_price_threshold: f64) -> Self {
        Self {
            small_price_threshold,
        }
    }

    /// Render a price, e.g. `$0.5234`, `$152.30`, `$50,123.45`.
    pub fn price(&self, price: f64) -> String {
        if price < self.small_price_threshold {
            format!("${:.4}", price)
        } else if price < GROUPING_THRESHOLD {
            format!("${:.2}", price)
        } else {
            format!("${}", group_thousands(&format!("{:.2}", price)))
        }
    }

    /// Render a change percentage, e.g. `+0.42%` or `-1.00%`.
    pub fn change(&self, change_percent: f64) -> String {
        if change_percent >= 0.0 {
            format!("+{:.2}%", change_percent)
        } else {
            format!("-{:.2}%", change_percent.abs())
        }
    }
}

/// Insert `,` every three digits of the integer part of a plain decimal string.
fn group_thousands(plain: &str) -> String {
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (plain, None),
    };

    let digits = int_part.len();
    let mut grouped = String::with_capacity(plain.len() + digits / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_prices_use_four_decimals() {
        let fmt = PriceFormat::default();
        assert_eq!(fmt.price(0.52341), "$0.5234");
        assert_eq!(fmt.price(0.08), "$0.0800");
    }

    #[test]
    fn mid_prices_use_two_decimals() {
        let fmt = PriceFormat::default();
        assert_eq!(fmt.price(1.0), "$1.00");
        assert_eq!(fmt.price(152.3), "$152.30");
        assert_eq!(fmt.price(999.5), "$999.50");
    }

    #[test]
    fn large_prices_are_grouped() {
        let fmt = PriceFormat::default();
        assert_eq!(fmt.price(50123.45), "$50,123.45");
        assert_eq!(fmt.price(1000.0), "$1,000.00");
        assert_eq!(fmt.price(1234567.891), "$1,234,567.89");
    }

    #[test]
    fn grouping_follows_the_raw_price_not_the_rounded_one() {
        let fmt = PriceFormat::default();
        assert_eq!(fmt.price(999.999), "$1000.00");
    }

    #[test]
    fn forex_threshold_keeps_pips() {
        let fmt = PriceFormat::with_threshold(10.0);
        assert_eq!(fmt.price(1.0864), "$1.0864");
        assert_eq!(fmt.price(149.5), "$149.50");
    }

    #[test]
    fn change_carries_explicit_sign() {
        let fmt = PriceFormat::default();
        assert_eq!(fmt.change(0.0), "+0.00%");
        assert_eq!(fmt.change(0.4251), "+0.43%");
        assert_eq!(fmt.change(-0.999), "-1.00%");
        assert_eq!(fmt.change(-0.001), "-0.00%");
    }

    #[test]
    fn group_thousands_handles_short_numbers() {
        assert_eq!(group_thousands("12.00"), "12.00");
        assert_eq!(group_thousands("123456"), "123,456");
    }
}
