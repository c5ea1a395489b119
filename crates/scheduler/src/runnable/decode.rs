//! Conversion of raw step values into samples.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use vigil_core::Avail;

/// Fallback UP test when a task has no up-regex and the value is not an integer.
static UP_OR_OK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?i:UP|OK)$").unwrap());

/// Numeric value of a metric reading: a JSON number, a numeric string, or a
/// boolean as `1`/`0`.
pub fn metric_value(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("number {n} is not representable as f64")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{s}' is not numeric")),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(format!("expected a number, got {other}")),
    }
}

/// Textual form of a raw value for availability conversion. Null is empty.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert a raw reading into an availability state.
///
/// With an up-regex the value is UP iff it fully matches. Otherwise an
/// integer is UP iff nonzero, and anything else is UP iff it reads `UP` or
/// `OK` (case-insensitive).
pub fn avail_value(raw: &str, up_regex: Option<&Regex>) -> Avail {
    let up = match up_regex {
        Some(re) => re.is_match(raw),
        None => match raw.parse::<i64>() {
            Ok(n) => n != 0,
            Err(_) => UP_OR_OK.is_match(raw),
        },
    };
    if up {
        Avail::Up
    } else {
        Avail::Down
    }
}

/// Fold per-target states into one: the first state seeds the result and a
/// later DOWN forces DOWN. Nothing to fold yields UNKNOWN.
pub fn fold_avail<I>(states: I) -> Avail
where
    I: IntoIterator<Item = Avail>,
{
    let mut aggregate: Option<Avail> = None;
    for state in states {
        aggregate = match aggregate {
            None => Some(state),
            Some(_) if state == Avail::Down => Some(Avail::Down),
            keep => keep,
        };
    }
    aggregate.unwrap_or(Avail::Unknown)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn metric_accepts_numbers_strings_and_bools() {
        assert_eq!(metric_value(&json!(12.5)).unwrap(), 12.5);
        assert_eq!(metric_value(&json!(7)).unwrap(), 7.0);
        assert_eq!(metric_value(&json!(" 3.25 ")).unwrap(), 3.25);
        assert_eq!(metric_value(&json!(true)).unwrap(), 1.0);
        assert_eq!(metric_value(&json!(false)).unwrap(), 0.0);
        assert!(metric_value(&json!("n/a")).is_err());
        assert!(metric_value(&json!({"used": 1})).is_err());
        assert!(metric_value(&Value::Null).is_err());
    }

    #[test]
    fn avail_with_up_regex_requires_full_match() {
        let re = Regex::new("^(?:running|ok)$").unwrap();
        assert_eq!(avail_value("running", Some(&re)), Avail::Up);
        assert_eq!(avail_value("not running", Some(&re)), Avail::Down);
        // the regex replaces the default rules entirely
        assert_eq!(avail_value("1", Some(&re)), Avail::Down);
    }

    #[test]
    fn avail_integer_rule() {
        assert_eq!(avail_value("1", None), Avail::Up);
        assert_eq!(avail_value("-3", None), Avail::Up);
        assert_eq!(avail_value("0", None), Avail::Down);
    }

    #[test]
    fn avail_text_rule() {
        assert_eq!(avail_value("UP", None), Avail::Up);
        assert_eq!(avail_value("ok", None), Avail::Up);
        assert_eq!(avail_value("Ok", None), Avail::Up);
        assert_eq!(avail_value("okay", None), Avail::Down);
        assert_eq!(avail_value("DOWN", None), Avail::Down);
        assert_eq!(avail_value("", None), Avail::Down);
    }

    #[test]
    fn value_text_forms() {
        assert_eq!(value_text(&Value::Null), "");
        assert_eq!(value_text(&json!("UP")), "UP");
        assert_eq!(value_text(&json!(1)), "1");
        assert_eq!(value_text(&json!(true)), "true");
    }

    #[test]
    fn fold_down_is_sticky() {
        assert_eq!(fold_avail([Avail::Up, Avail::Down, Avail::Up]), Avail::Down);
        assert_eq!(fold_avail([Avail::Up, Avail::Up]), Avail::Up);
        assert_eq!(fold_avail([Avail::Down, Avail::Up]), Avail::Down);
        assert_eq!(fold_avail(std::iter::empty()), Avail::Unknown);
    }
}
