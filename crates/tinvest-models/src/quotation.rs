use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const NANOS_PER_UNIT: i128 = 1_000_000_000;
const NANO_DIGITS: usize = 9;

/// Fixed-point quantity: whole units plus a signed nano fraction.
///
/// Both parts carry the same sign. `nano` stays within
/// `[-999_999_999, 999_999_999]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quotation {
    pub units: i64,
    pub nano: i32,
}

impl Quotation {
    pub const ZERO: Quotation = Quotation { units: 0, nano: 0 };

    pub const fn new(units: i64, nano: i32) -> Self {
        Self { units, nano }
    }

    /// Exact conversion to a `Decimal` with scale 9.
    pub fn to_decimal(&self) -> Decimal {
        let raw = i128::from(self.units) * NANOS_PER_UNIT + i128::from(self.nano);
        Decimal::from_i128_with_scale(raw, NANO_DIGITS as u32)
    }

    /// Converts a decimal, rounding to nine fractional digits.
    /// Returns `None` when the whole part does not fit in `i64`.
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        let mut scaled = value.round_dp(NANO_DIGITS as u32);
        scaled.rescale(NANO_DIGITS as u32);
        if scaled.scale() != NANO_DIGITS as u32 {
            return None;
        }
        let mantissa = scaled.mantissa();
        let units = i64::try_from(mantissa / NANOS_PER_UNIT).ok()?;
        let nano = i32::try_from(mantissa % NANOS_PER_UNIT).ok()?;
        Some(Self { units, nano })
    }
}

/// Renders `units`/`nanos` as `"<sign><|units|>.<9-digit |nanos|>"`.
///
/// A zero whole part with a negative fraction still gets the leading minus.
pub fn encode(units: i64, nanos: i32) -> String {
    let negative = units < 0 || (units == 0 && nanos < 0);
    let sign = if negative { "-" } else { "" };
    format!(
        "{sign}{}.{:0width$}",
        units.unsigned_abs(),
        nanos.unsigned_abs(),
        width = NANO_DIGITS
    )
}

impl fmt::Display for Quotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self.units, self.nano))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuotationParseError {
    #[error("empty value")]
    Empty,

    #[error("invalid digits in {0:?}")]
    InvalidDigits(String),

    #[error("more than 9 fractional digits in {0:?}")]
    TooPrecise(String),

    #[error("whole part out of range in {0:?}")]
    OutOfRange(String),
}

impl FromStr for Quotation {
    type Err = QuotationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(QuotationParseError::Empty);
        }

        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) {
            return Err(QuotationParseError::InvalidDigits(s.to_string()));
        }
        if fraction.len() > NANO_DIGITS {
            return Err(QuotationParseError::TooPrecise(s.to_string()));
        }

        // Sign goes into the parse so i64::MIN's magnitude fits.
        let signed_whole = if negative {
            format!("-{whole}")
        } else {
            whole.to_string()
        };
        let units: i64 = signed_whole
            .parse()
            .map_err(|_| QuotationParseError::OutOfRange(s.to_string()))?;
        let padded = format!("{fraction:0<width$}", width = NANO_DIGITS);
        let nano: i32 = padded
            .parse()
            .map_err(|_| QuotationParseError::InvalidDigits(s.to_string()))?;

        Ok(Self::new(units, if negative { -nano } else { nano }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn encode_zero() {
        assert_eq!(encode(0, 0), "0.000000000");
    }

    #[test]
    fn encode_matching_signs() {
        assert_eq!(encode(5, 250_000_000), "5.250000000");
        assert_eq!(encode(-5, -250_000_000), "-5.250000000");
        assert_eq!(encode(123, 1), "123.000000001");
    }

    #[test]
    fn encode_negative_zero_keeps_sign() {
        assert_eq!(encode(0, -1), "-0.000000001");
        assert_eq!(encode(0, -500_000_000), "-0.500000000");
    }

    #[test]
    fn encode_extremes() {
        assert_eq!(encode(i64::MIN, -999_999_999), "-9223372036854775808.999999999");
        assert_eq!(encode(i64::MAX, 999_999_999), "9223372036854775807.999999999");
    }

    #[test]
    fn display_uses_codec() {
        assert_eq!(Quotation::new(42, 50_000_000).to_string(), "42.050000000");
    }

    #[test]
    fn parse_rendered_values_back() {
        for (units, nano) in [
            (0, 0),
            (5, 250_000_000),
            (-5, -250_000_000),
            (0, -1),
            (7, 1),
            (i64::MIN, -999_999_999),
            (i64::MAX, 999_999_999),
        ] {
            let parsed: Quotation = encode(units, nano).parse().unwrap();
            assert_eq!(parsed, Quotation::new(units, nano));
        }
    }

    #[test]
    fn parse_short_fraction_and_integer() {
        assert_eq!("1.5".parse::<Quotation>().unwrap(), Quotation::new(1, 500_000_000));
        assert_eq!("12".parse::<Quotation>().unwrap(), Quotation::new(12, 0));
        assert_eq!("-0.25".parse::<Quotation>().unwrap(), Quotation::new(0, -250_000_000));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!("".parse::<Quotation>(), Err(QuotationParseError::Empty));
        assert!(matches!(
            "1.2.3".parse::<Quotation>(),
            Err(QuotationParseError::InvalidDigits(_))
        ));
        assert!(matches!(
            ".5".parse::<Quotation>(),
            Err(QuotationParseError::InvalidDigits(_))
        ));
        assert!(matches!(
            "1.0000000001".parse::<Quotation>(),
            Err(QuotationParseError::TooPrecise(_))
        ));
        assert!(matches!(
            "99999999999999999999".parse::<Quotation>(),
            Err(QuotationParseError::OutOfRange(_))
        ));
        assert!(matches!(
            "9223372036854775808".parse::<Quotation>(),
            Err(QuotationParseError::OutOfRange(_))
        ));
        assert!(matches!(
            "-9223372036854775809".parse::<Quotation>(),
            Err(QuotationParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn decimal_conversion_is_exact() {
        let q = Quotation::new(-5, -250_000_000);
        assert_eq!(q.to_decimal(), dec!(-5.25));
        assert_eq!(Quotation::from_decimal(dec!(-5.25)), Some(q));
        assert_eq!(
            Quotation::from_decimal(dec!(0.000000001)),
            Some(Quotation::new(0, 1))
        );
        assert_eq!(
            Quotation::from_decimal(dec!(1.0000000004)),
            Some(Quotation::new(1, 0))
        );
    }
}
