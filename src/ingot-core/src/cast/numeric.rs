use num_traits::ToPrimitive;

use super::decimal::{
    decimal_to_f64, fits_precision, format_decimal, parse_decimal, pow10, rescale,
};
use crate::{datatypes::DataType, lit::Literal};

/// Builds the integer literal of type `target` holding `value`, failing if it is out of range.
pub fn int_literal(value: i128, target: &DataType) -> Result<Literal, String> {
    let lit = match target {
        DataType::Int8 => value.to_i8().map(Literal::Int8),
        DataType::Int16 => value.to_i16().map(Literal::Int16),
        DataType::Int32 => value.to_i32().map(Literal::Int32),
        DataType::Int64 => value.to_i64().map(Literal::Int64),
        DataType::UInt8 => value.to_u8().map(Literal::UInt8),
        DataType::UInt16 => value.to_u16().map(Literal::UInt16),
        DataType::UInt32 => value.to_u32().map(Literal::UInt32),
        DataType::UInt64 => value.to_u64().map(Literal::UInt64),
        other => return Err(format!("`{other}` is not an integer type")),
    };
    lit.ok_or_else(|| format!("value {value} is out of range for `{target}`"))
}

fn decimal_literal(
    mantissa: i128,
    precision: usize,
    scale: usize,
) -> Result<Literal, String> {
    if fits_precision(mantissa, precision) {
        Ok(Literal::Decimal(mantissa, precision, scale))
    } else {
        Err(format!(
            "value needs more than {precision} significant digits"
        ))
    }
}

fn int_to(value: i128, target: &DataType, strict: bool) -> Result<Literal, String> {
    match target {
        t if t.is_integer() => int_literal(value, t),
        DataType::Float32 => {
            let f = value.to_f32().unwrap_or(f32::NAN);
            if strict && f.to_i128() != Some(value) {
                return Err(format!("{value} is not exactly representable as `Float32`"));
            }
            Ok(Literal::Float32(f))
        }
        DataType::Float64 => {
            let f = value.to_f64().unwrap_or(f64::NAN);
            if strict && f.to_i128() != Some(value) {
                return Err(format!("{value} is not exactly representable as `Float64`"));
            }
            Ok(Literal::Float64(f))
        }
        DataType::Decimal(precision, scale) => {
            let mantissa = pow10(*scale)
                .and_then(|factor| value.checked_mul(factor))
                .ok_or_else(|| "value overflows the decimal range".to_string())?;
            decimal_literal(mantissa, *precision, *scale)
        }
        DataType::Boolean => match value {
            0 => Ok(Literal::Boolean(false)),
            1 => Ok(Literal::Boolean(true)),
            _ if !strict => Ok(Literal::Boolean(true)),
            _ => Err(format!("{value} is neither 0 nor 1")),
        },
        other => Err(format!("cannot convert an integer to `{other}`")),
    }
}

/// Float to integer: truncate towards zero, then range-check. Strict mode rejects a
/// fractional part instead of truncating.
fn float_to_int(value: f64, target: &DataType, strict: bool) -> Result<Literal, String> {
    if !value.is_finite() {
        return Err(format!("{value} has no integer representation"));
    }
    let truncated = value.trunc();
    if strict && truncated != value {
        return Err(format!("{value:?} has a fractional part"));
    }
    let whole = truncated
        .to_i128()
        .ok_or_else(|| format!("value {value:?} is out of range for `{target}`"))?;
    int_literal(whole, target)
        .map_err(|_| format!("value {value:?} is out of range for `{target}`"))
}

fn float_to(value: f64, target: &DataType, strict: bool) -> Result<Literal, String> {
    match target {
        t if t.is_integer() => float_to_int(value, t, strict),
        DataType::Float64 => Ok(Literal::Float64(value)),
        DataType::Float32 => {
            let narrowed = value.to_f32().unwrap_or(f32::NAN);
            if value.is_finite() && narrowed.is_infinite() {
                return Err(format!("{value:?} is out of range for `Float32`"));
            }
            if strict && !value.is_nan() && f64::from(narrowed) != value {
                return Err(format!("{value:?} is not exactly representable as `Float32`"));
            }
            Ok(Literal::Float32(narrowed))
        }
        DataType::Decimal(precision, scale) => {
            if !value.is_finite() {
                return Err(format!("{value} has no decimal representation"));
            }
            // Float display is the shortest text that round-trips, never an exponent form.
            let (mantissa, parsed_scale) = parse_decimal(&value.to_string())
                .ok_or_else(|| format!("{value:?} cannot be parsed as a decimal"))?;
            let mantissa = rescale(mantissa, parsed_scale, *scale, strict)?;
            decimal_literal(mantissa, *precision, *scale)
        }
        DataType::Boolean => {
            if value.is_nan() {
                Err("NaN has no boolean representation".to_string())
            } else if value == 0.0 {
                Ok(Literal::Boolean(false))
            } else if value == 1.0 || !strict {
                Ok(Literal::Boolean(true))
            } else {
                Err(format!("{value:?} is neither 0 nor 1"))
            }
        }
        other => Err(format!("cannot convert a float to `{other}`")),
    }
}

/// Whether the shortest text of a float converted from a decimal reads back as that decimal.
fn decimal_round_trips(float_text: &str, mantissa: i128, scale: usize) -> bool {
    parse_decimal(float_text)
        .and_then(|(parsed, parsed_scale)| rescale(parsed, parsed_scale, scale, true).ok())
        == Some(mantissa)
}

fn decimal_to(
    mantissa: i128,
    scale: usize,
    target: &DataType,
    strict: bool,
) -> Result<Literal, String> {
    match target {
        t if t.is_integer() => {
            let whole = rescale(mantissa, scale, 0, strict)
                .map_err(|_| "value has a fractional part".to_string())?;
            int_literal(whole, t)
        }
        DataType::Float64 => {
            let f = decimal_to_f64(mantissa, scale);
            if strict && !decimal_round_trips(&f.to_string(), mantissa, scale) {
                return Err(format!(
                    "{} is not exactly representable as `Float64`",
                    format_decimal(mantissa, scale)
                ));
            }
            Ok(Literal::Float64(f))
        }
        DataType::Float32 => {
            let f = decimal_to_f64(mantissa, scale).to_f32().unwrap_or(f32::NAN);
            if strict && !decimal_round_trips(&f.to_string(), mantissa, scale) {
                return Err(format!(
                    "{} is not exactly representable as `Float32`",
                    format_decimal(mantissa, scale)
                ));
            }
            Ok(Literal::Float32(f))
        }
        DataType::Decimal(to_precision, to_scale) => {
            let rescaled = rescale(mantissa, scale, *to_scale, strict)?;
            decimal_literal(rescaled, *to_precision, *to_scale)
        }
        DataType::Boolean => {
            let whole = rescale(mantissa, scale, 0, true);
            match whole {
                Ok(0) if mantissa == 0 => Ok(Literal::Boolean(false)),
                Ok(1) => Ok(Literal::Boolean(true)),
                _ if !strict => Ok(Literal::Boolean(mantissa != 0)),
                _ => Err("value is neither 0 nor 1".to_string()),
            }
        }
        other => Err(format!("cannot convert a decimal to `{other}`")),
    }
}

/// Converts between Boolean, integer, float and decimal literals.
pub fn cast_numeric(lit: &Literal, target: &DataType, strict: bool) -> Result<Literal, String> {
    match lit {
        Literal::Boolean(v) => match target {
            DataType::Boolean => Ok(lit.clone()),
            _ => int_to(i128::from(*v), target, strict),
        },
        Literal::Float32(v) => float_to(f64::from(*v), target, strict),
        Literal::Float64(v) => float_to(*v, target, strict),
        Literal::Decimal(mantissa, _, scale) => decimal_to(*mantissa, *scale, target, strict),
        other => match other.as_i128() {
            Some(v) => int_to(v, target, strict),
            None => Err(format!("{other} is not numeric")),
        },
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Literal::Float64(3.5), Literal::Int8(3))]
    #[case(Literal::Float64(-3.9), Literal::Int8(-3))]
    #[case(Literal::Float64(127.99), Literal::Int8(127))]
    #[case(Literal::Decimal(-1259, 4, 2), Literal::Int16(-12))]
    fn non_strict_truncates_toward_zero(#[case] lit: Literal, #[case] expected: Literal) {
        assert_eq!(cast_numeric(&lit, &expected.get_type(), false).unwrap(), expected);
    }

    #[rstest]
    #[case(Literal::Float64(300.7), DataType::Int8)]
    #[case(Literal::Float64(-0.5e40), DataType::Int64)]
    #[case(Literal::Float64(f64::NAN), DataType::Int32)]
    #[case(Literal::Float64(f64::INFINITY), DataType::UInt8)]
    #[case(Literal::Int64(-1), DataType::UInt64)]
    #[case(Literal::Int64(300), DataType::UInt8)]
    fn out_of_range_fails_in_both_modes(#[case] lit: Literal, #[case] target: DataType) {
        assert!(cast_numeric(&lit, &target, false).is_err());
        assert!(cast_numeric(&lit, &target, true).is_err());
    }

    #[rstest]
    #[case(Literal::Float64(3.5), DataType::Int64)]
    #[case(Literal::Float64(0.1), DataType::Float32)]
    #[case(Literal::Int64(16_777_217), DataType::Float32)]
    #[case(Literal::Float64(0.125), DataType::Decimal(5, 2))]
    #[case(Literal::Int64(2), DataType::Boolean)]
    fn strict_rejects_inexact(#[case] lit: Literal, #[case] target: DataType) {
        assert!(cast_numeric(&lit, &target, true).is_err());
        assert!(cast_numeric(&lit, &target, false).is_ok());
    }

    #[rstest]
    #[case(Literal::Int64(9_007_199_254_740_993), DataType::Float64)]
    #[case(Literal::UInt64(u64::MAX), DataType::Float64)]
    #[case(Literal::Int64(i64::MAX), DataType::Float64)]
    #[case(Literal::Decimal(12_345_678_901_234_567_89, 19, 2), DataType::Float64)]
    #[case(Literal::Decimal(16_777_217, 8, 0), DataType::Float32)]
    fn strict_float_targets_require_round_trips(#[case] lit: Literal, #[case] target: DataType) {
        let err = cast_numeric(&lit, &target, true).unwrap_err();
        assert!(err.contains("not exactly representable"));
        assert!(cast_numeric(&lit, &target, false).is_ok());
    }

    #[rstest]
    #[case(Literal::Int64(9_007_199_254_740_992), Literal::Float64(9_007_199_254_740_992.0))]
    #[case(Literal::Int64(i64::MIN), Literal::Float64(-9_223_372_036_854_775_808.0))]
    #[case(Literal::Decimal(125, 5, 2), Literal::Float64(1.25))]
    #[case(Literal::Decimal(1, 3, 1), Literal::Float64(0.1))]
    #[case(Literal::Decimal(-15, 3, 1), Literal::Float32(-1.5))]
    fn exact_float_targets_succeed_strictly(#[case] lit: Literal, #[case] expected: Literal) {
        assert_eq!(cast_numeric(&lit, &expected.get_type(), true).unwrap(), expected);
    }

    #[test]
    fn non_strict_float_targets_take_the_nearest_value() {
        assert_eq!(
            cast_numeric(&Literal::Int64(9_007_199_254_740_993), &DataType::Float64, false)
                .unwrap(),
            Literal::Float64(9_007_199_254_740_992.0)
        );
    }

    #[test]
    fn float_to_decimal_uses_exact_text() {
        let lit = cast_numeric(&Literal::Float64(0.1), &DataType::Decimal(10, 4), true).unwrap();
        assert_eq!(lit, Literal::Decimal(1000, 10, 4));
        let lit = cast_numeric(&Literal::Float64(1e20), &DataType::Decimal(38, 2), true).unwrap();
        assert_eq!(lit, Literal::Decimal(10i128.pow(22), 38, 2));
    }

    #[test]
    fn decimal_precision_is_enforced() {
        assert!(cast_numeric(&Literal::Int64(1000), &DataType::Decimal(4, 2), true).is_err());
        assert_eq!(
            cast_numeric(&Literal::Int64(99), &DataType::Decimal(4, 2), true).unwrap(),
            Literal::Decimal(9900, 4, 2)
        );
    }

    #[test]
    fn whole_floats_convert_strictly() {
        assert_eq!(
            cast_numeric(&Literal::Float64(3.0), &DataType::Int8, true).unwrap(),
            Literal::Int8(3)
        );
        assert_eq!(
            cast_numeric(&Literal::Boolean(true), &DataType::Float64, true).unwrap(),
            Literal::Float64(1.0)
        );
    }
}
