//! Exact decimal arithmetic on `i128` mantissas.

use crate::datatypes::DECIMAL_MAX_PRECISION;

/// `10^exp`, or `None` if it doesn't fit an `i128`.
pub fn pow10(exp: usize) -> Option<i128> {
    10i128.checked_pow(u32::try_from(exp).ok()?)
}

/// Number of decimal digits in `mantissa`, ignoring the sign. Zero has one digit.
pub fn num_digits(mantissa: i128) -> usize {
    let mut n = mantissa.unsigned_abs();
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

pub fn fits_precision(mantissa: i128, precision: usize) -> bool {
    num_digits(mantissa) <= precision.min(DECIMAL_MAX_PRECISION)
}

pub fn format_decimal(mantissa: i128, scale: usize) -> String {
    let digits = mantissa.unsigned_abs().to_string();
    let sign = if mantissa < 0 { "-" } else { "" };
    if scale == 0 {
        return format!("{sign}{digits}");
    }
    let padded = format!("{digits:0>width$}", width = scale + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    format!("{sign}{int_part}.{frac_part}")
}

/// Parses a decimal literal such as `-12.50` or `1.5e-3` into `(mantissa, scale)` without any
/// binary floating point step. Trailing fractional zeros are kept in the scale.
pub fn parse_decimal(s: &str) -> Option<(i128, usize)> {
    let s = s.trim();
    let (body, exponent) = match s.find(|c: char| c == 'e' || c == 'E') {
        Some(idx) => (&s[..idx], s[idx + 1..].parse::<i64>().ok()?),
        None => (s, 0),
    };
    let (negative, body) = match body.as_bytes().first()? {
        b'-' => (true, &body[1..]),
        b'+' => (false, &body[1..]),
        _ => (false, body),
    };
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut mantissa: i128 = 0;
    for b in int_part.bytes().chain(frac_part.bytes()) {
        mantissa = mantissa
            .checked_mul(10)?
            .checked_add(i128::from(b - b'0'))?;
    }
    let mut scale = i64::try_from(frac_part.len()).ok()? - exponent;
    if scale < 0 {
        mantissa = mantissa.checked_mul(pow10(usize::try_from(-scale).ok()?)?)?;
        scale = 0;
    }
    let mantissa = if negative { -mantissa } else { mantissa };
    Some((mantissa, usize::try_from(scale).ok()?))
}

/// Moves `mantissa` from `from_scale` to `to_scale`. Scaling down drops digits: an error in
/// strict mode, truncation towards zero otherwise.
pub fn rescale(
    mantissa: i128,
    from_scale: usize,
    to_scale: usize,
    strict: bool,
) -> Result<i128, String> {
    if to_scale >= from_scale {
        pow10(to_scale - from_scale)
            .and_then(|factor| mantissa.checked_mul(factor))
            .ok_or_else(|| "value overflows the decimal range".to_string())
    } else {
        let divisor = pow10(from_scale - to_scale)
            .ok_or_else(|| "scale difference is too large".to_string())?;
        if strict && mantissa % divisor != 0 {
            return Err(format!(
                "value would lose digits when reduced to scale {to_scale}"
            ));
        }
        Ok(mantissa / divisor)
    }
}

pub fn decimal_to_f64(mantissa: i128, scale: usize) -> f64 {
    // Round-tripping through the decimal text gives a correctly rounded float.
    format_decimal(mantissa, scale)
        .parse()
        .unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("12.50", Some((1250, 2)))]
    #[case("-0.5", Some((-5, 1)))]
    #[case("+7", Some((7, 0)))]
    #[case(".25", Some((25, 2)))]
    #[case("1.5e-3", Some((15, 4)))]
    #[case("2.5E2", Some((250, 0)))]
    #[case("abc", None)]
    #[case("", None)]
    #[case("1.2.3", None)]
    fn parses(#[case] input: &str, #[case] expected: Option<(i128, usize)>) {
        assert_eq!(parse_decimal(input), expected);
    }

    #[rstest]
    #[case(1250, 2, "12.50")]
    #[case(-5, 3, "-0.005")]
    #[case(42, 0, "42")]
    fn formats(#[case] mantissa: i128, #[case] scale: usize, #[case] expected: &str) {
        assert_eq!(format_decimal(mantissa, scale), expected);
    }

    #[test]
    fn rescale_up_then_down_is_exact() {
        for mantissa in [-999_999, -1, 0, 1, 12_345, 10i128.pow(20)] {
            let up = rescale(mantissa, 2, 6, true).unwrap();
            assert_eq!(rescale(up, 6, 2, true).unwrap(), mantissa);
        }
    }

    #[test]
    fn rescale_down_drops_digits_only_when_allowed() {
        assert!(rescale(1234, 2, 1, true).is_err());
        assert_eq!(rescale(1234, 2, 1, false).unwrap(), 123);
        assert_eq!(rescale(-1239, 2, 1, false).unwrap(), -123);
        assert!(rescale(i128::MAX / 2, 0, 1, true).is_err());
    }

    #[test]
    fn digits() {
        assert_eq!(num_digits(0), 1);
        assert_eq!(num_digits(-999), 3);
        assert!(fits_precision(99_999, 5));
        assert!(!fits_precision(100_000, 5));
    }
}
