use super::{
    decimal::{num_digits, parse_decimal},
    numeric::{cast_numeric, int_literal},
    temporal::{parse_date, parse_datetime},
};
use crate::{datatypes::DataType, lit::Literal};

/// Text rendering used when a scalar is converted to a string. Unlike `Display`, strings are
/// not quoted.
pub fn render_plain(lit: &Literal) -> String {
    match lit {
        Literal::Utf8(s) | Literal::Categorical(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Parses a string into a scalar of type `target`. Numeric text is parsed exactly and then
/// goes through the same numeric rules as any other number.
pub fn parse_str(s: &str, target: &DataType, strict: bool) -> Result<Literal, String> {
    let trimmed = s.trim();
    let unparseable = || format!("\"{s}\" cannot be parsed as `{target}`");
    match target {
        DataType::Boolean => parse_bool(trimmed)
            .map(Literal::Boolean)
            .ok_or_else(unparseable),
        t if t.is_integer() => {
            if let Ok(v) = trimmed.parse::<i128>() {
                return int_literal(v, t);
            }
            let f = trimmed.parse::<f64>().map_err(|_| unparseable())?;
            cast_numeric(&Literal::Float64(f), t, strict)
        }
        DataType::Float32 | DataType::Float64 => {
            let f = trimmed.parse::<f64>().map_err(|_| unparseable())?;
            cast_numeric(&Literal::Float64(f), target, strict)
        }
        DataType::Decimal(..) => {
            let (mantissa, scale) = parse_decimal(trimmed).ok_or_else(unparseable)?;
            let parsed = Literal::Decimal(mantissa, num_digits(mantissa).max(scale), scale);
            cast_numeric(&parsed, target, strict)
        }
        DataType::Date => parse_date(trimmed).map(Literal::Date),
        DataType::Datetime(unit, tz) => {
            parse_datetime(trimmed, *unit).map(|v| Literal::Datetime(v, *unit, tz.clone()))
        }
        DataType::Binary => Ok(Literal::Binary(s.as_bytes().to_vec())),
        DataType::Utf8 => Ok(Literal::Utf8(s.to_string())),
        DataType::Categorical => Ok(Literal::Categorical(s.to_string())),
        _ => Err(unparseable()),
    }
}
