//! Literal parsing for flag and environment values.
//!
//! Integers accept an optional sign, the `0x`/`0o`/`0b` prefixes, a leading
//! `0` for octal and `_` between digits (`1_000_000`, `0x_ff`).

use crate::error::NumberError;

/// Parse an integer literal.
pub(crate) fn parse_int(raw: &str) -> Result<i64, NumberError> {
    let (negative, body) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let (radix, digits, prefixed) = split_radix(body);
    let digits = strip_separators(digits, prefixed)?;
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(NumberError::Syntax);
    }

    let magnitude = u64::from_str_radix(&digits, radix).map_err(|err| match err.kind() {
        std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow => {
            NumberError::Range
        }
        _ => NumberError::Syntax,
    })?;

    let signed = if negative {
        -i128::from(magnitude)
    } else {
        i128::from(magnitude)
    };
    i64::try_from(signed).map_err(|_| NumberError::Range)
}

pub(crate) fn parse_isize(raw: &str) -> Result<isize, NumberError> {
    isize::try_from(parse_int(raw)?).map_err(|_| NumberError::Range)
}

pub(crate) fn parse_i32(raw: &str) -> Result<i32, NumberError> {
    i32::try_from(parse_int(raw)?).map_err(|_| NumberError::Range)
}

/// Parse a floating point literal; `_` is allowed between digits.
pub(crate) fn parse_float(raw: &str) -> Result<f64, NumberError> {
    let cleaned = if raw.contains('_') {
        let bytes = raw.as_bytes();
        for (i, b) in bytes.iter().enumerate() {
            if *b != b'_' {
                continue;
            }
            let before = i.checked_sub(1).map(|j| bytes[j]);
            let after = bytes.get(i + 1).copied();
            if !before.is_some_and(|c| c.is_ascii_digit()) || !after.is_some_and(|c| c.is_ascii_digit()) {
                return Err(NumberError::Syntax);
            }
        }
        raw.replace('_', "")
    } else {
        raw.to_string()
    };

    let value: f64 = cleaned.parse().map_err(|_| NumberError::Syntax)?;
    if value.is_infinite() && !cleaned.to_ascii_lowercase().contains("inf") {
        return Err(NumberError::Range);
    }
    Ok(value)
}

/// Boolean tokens shared by environment values and `-flag=value`.
///
/// Returns `None` for anything that isn't a recognised token.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "" => Some(true),
        "0" | "false" | "f" => Some(false),
        _ => None,
    }
}

fn split_radix(body: &str) -> (u32, &str, bool) {
    let lower = body.get(..2).map(|p| p.to_ascii_lowercase());
    match lower.as_deref() {
        Some("0x") => (16, &body[2..], true),
        Some("0o") => (8, &body[2..], true),
        Some("0b") => (2, &body[2..], true),
        _ if body.len() > 1 && body.starts_with('0') => (8, &body[1..], true),
        _ => (10, body, false),
    }
}

// Underscores must sit between digits, or directly after a base prefix.
fn strip_separators(digits: &str, prefixed: bool) -> Result<String, NumberError> {
    if !digits.contains('_') {
        return Ok(digits.to_string());
    }
    let mut out = String::with_capacity(digits.len());
    let mut prev_underscore = false;
    for (i, c) in digits.chars().enumerate() {
        if c == '_' {
            if prev_underscore || (i == 0 && !prefixed) {
                return Err(NumberError::Syntax);
            }
            prev_underscore = true;
            continue;
        }
        prev_underscore = false;
        out.push(c);
    }
    if prev_underscore {
        return Err(NumberError::Syntax);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_literals() {
        assert_eq!(parse_int("42"), Ok(42));
        assert_eq!(parse_int("-42"), Ok(-42));
        assert_eq!(parse_int("+7"), Ok(7));
        assert_eq!(parse_int("0x10"), Ok(16));
        assert_eq!(parse_int("0XfF"), Ok(255));
        assert_eq!(parse_int("0o17"), Ok(15));
        assert_eq!(parse_int("017"), Ok(15));
        assert_eq!(parse_int("0b101"), Ok(5));
        assert_eq!(parse_int("0"), Ok(0));
        assert_eq!(parse_int("1_000_000"), Ok(1_000_000));
        assert_eq!(parse_int("0x_ff"), Ok(255));
        assert_eq!(parse_int("-9223372036854775808"), Ok(i64::MIN));
    }

    #[test]
    fn int_syntax_errors() {
        for raw in ["", "-", "no", "1__0", "_1", "1_", "0x", "1.5", "--1", "+-1", "08"] {
            assert_eq!(parse_int(raw), Err(NumberError::Syntax), "input {raw:?}");
        }
    }

    #[test]
    fn int_range_errors() {
        assert_eq!(parse_int("9223372036854775808"), Err(NumberError::Range));
        assert_eq!(parse_int("0xffffffffffffffffff"), Err(NumberError::Range));
        assert_eq!(parse_i32("2147483648"), Err(NumberError::Range));
        assert_eq!(parse_i32("-2147483648"), Ok(i32::MIN));
    }

    #[test]
    fn float_literals() {
        assert_eq!(parse_float("42.666"), Ok(42.666));
        assert_eq!(parse_float("-1e3"), Ok(-1000.0));
        assert_eq!(parse_float("1_000.5"), Ok(1000.5));
        assert_eq!(parse_float("no"), Err(NumberError::Syntax));
        assert_eq!(parse_float("1__0"), Err(NumberError::Syntax));
        assert_eq!(parse_float("1e400"), Err(NumberError::Range));
        assert!(parse_float("inf").is_ok_and(f64::is_infinite));
    }

    #[test]
    fn bool_tokens() {
        for raw in ["1", "true", "TRUE", "t", "T", ""] {
            assert_eq!(parse_bool(raw), Some(true), "input {raw:?}");
        }
        for raw in ["0", "false", "False", "f"] {
            assert_eq!(parse_bool(raw), Some(false), "input {raw:?}");
        }
        assert_eq!(parse_bool("yes"), None);
    }
}
