//! Single-valued fields: strings, numbers, booleans, options, timestamps and
//! step lists.

use lims_core::errors::CoreError;
use lims_core::timestamps::{format_iso, now_iso, parse_iso};
use serde_json::{Number, Value};

use crate::field::{FieldKind, FieldSpec, Parsed};
use crate::request::{RequestValues, normalize};

/// Input value that stamps a timestamp field with the current time.
pub const NOW: &str = "now";

pub(crate) fn parse(field: &FieldSpec, values: &RequestValues) -> Result<Parsed, CoreError> {
    let Some(raw) = values.first(field.name) else {
        return Ok(Parsed::Absent);
    };
    check_value(field, normalize(raw)).map(Parsed::Provided)
}

/// Validate and coerce a normalized input; `None` is an explicit null.
///
/// # Errors
///
/// `InvalidValue` for a null on a required field or a value of the wrong
/// shape for the variant.
pub fn check_value(field: &FieldSpec, value: Option<String>) -> Result<Value, CoreError> {
    let Some(text) = value else {
        return null_value(field);
    };
    let invalid = |what: &str| CoreError::invalid(field.name, format!("'{text}' is not {what}"));
    let value = match field.kind {
        FieldKind::Text => Value::String(text.replace("\r\n", "\n")),
        FieldKind::Integer => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid("an integer"))?,
        FieldKind::PositiveInteger => match text.parse::<i64>() {
            Ok(number) if number > 0 => Value::from(number),
            _ => return Err(invalid("a positive integer")),
        },
        FieldKind::Float => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| invalid("a float"))?,
        FieldKind::Boolean => parse_bool(&text)
            .map(Value::Bool)
            .ok_or_else(|| invalid("a boolean"))?,
        FieldKind::Option(options) => {
            if !options.contains(&text.as_str()) {
                return Err(CoreError::invalid(
                    field.name,
                    format!("'{text}' is not one of: {}", options.join(", ")),
                ));
            }
            Value::String(text)
        }
        FieldKind::Timestamp => parse_iso(&text)
            .map(|timestamp| Value::String(format_iso(timestamp)))
            .ok_or_else(|| {
                CoreError::invalid(field.name, "datetime value does not have valid ISO format")
            })?,
        FieldKind::Steps => {
            let steps: Vec<Value> = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(Value::from)
                .collect();
            if steps.is_empty() {
                return null_value(field);
            }
            Value::Array(steps)
        }
        _ => Value::String(text),
    };
    Ok(value)
}

fn null_value(field: &FieldSpec) -> Result<Value, CoreError> {
    if field.required {
        Err(CoreError::invalid(field.name, "must be non-null"))
    } else {
        Ok(Value::Null)
    }
}

/// Any submitted `now` wins; otherwise the last submitted value is used.
pub(crate) fn parse_timestamp(field: &FieldSpec, values: &RequestValues) -> Result<Parsed, CoreError> {
    let inputs = values.all(field.name);
    if inputs.is_empty() {
        return Ok(Parsed::Absent);
    }
    if inputs.iter().any(|input| input.trim() == NOW) {
        return Ok(Parsed::Provided(Value::String(now_iso())));
    }
    let last = inputs.last().and_then(|input| normalize(input));
    check_value(field, last).map(Parsed::Provided)
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Canonical input string of a stored scalar value, as an edit form would
/// prefill it.
#[must_use]
pub fn value_to_input(field: &FieldSpec, value: Option<&Value>) -> String {
    match (field.kind, value) {
        (_, None | Some(Value::Null)) => String::new(),
        (FieldKind::Steps, Some(Value::Array(lines))) => lines
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        (_, Some(Value::String(text))) => text.clone(),
        (_, Some(other)) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn provided(field: &FieldSpec, raw: &str) -> Result<Parsed, CoreError> {
        parse(field, &RequestValues::new().with(field.name, raw))
    }

    #[rstest]
    #[case(FieldKind::String, "  abc ", json!("abc"))]
    #[case(FieldKind::Text, "a\r\nb", json!("a\nb"))]
    #[case(FieldKind::Integer, "-3", json!(-3))]
    #[case(FieldKind::PositiveInteger, "7", json!(7))]
    #[case(FieldKind::Float, "1.5", json!(1.5))]
    #[case(FieldKind::Boolean, "Yes", json!(true))]
    #[case(FieldKind::Boolean, "off", json!(false))]
    #[case(FieldKind::Option(&["a", "b"]), "b", json!("b"))]
    #[case(FieldKind::Timestamp, "2011-02-09", json!("2011-02-09T00:00:00Z"))]
    #[case(FieldKind::Steps, "mix\n\n  spin  \n", json!(["mix", "spin"]))]
    fn coerces_valid_input(#[case] kind: FieldKind, #[case] raw: &str, #[case] expected: Value) {
        let field = FieldSpec::new("f", kind);
        assert_eq!(provided(&field, raw).unwrap(), Parsed::Provided(expected));
    }

    #[rstest]
    #[case(FieldKind::Integer, "1.5", "is not an integer")]
    #[case(FieldKind::PositiveInteger, "0", "is not a positive integer")]
    #[case(FieldKind::Float, "abc", "is not a float")]
    #[case(FieldKind::Float, "inf", "is not a float")]
    #[case(FieldKind::Boolean, "maybe", "is not a boolean")]
    #[case(FieldKind::Option(&["a", "b"]), "c", "is not one of: a, b")]
    #[case(FieldKind::Timestamp, "yesterday", "valid ISO format")]
    fn rejects_invalid_input(#[case] kind: FieldKind, #[case] raw: &str, #[case] message: &str) {
        let field = FieldSpec::new("f", kind);
        let error = provided(&field, raw).unwrap_err();
        assert!(matches!(error, CoreError::InvalidValue { ref field, .. } if field == "f"));
        assert!(error.to_string().contains(message), "{error}");
    }

    #[test]
    fn blank_and_sentinel_clear_optional_fields() {
        let field = FieldSpec::new("f", FieldKind::Integer);
        assert_eq!(provided(&field, "  ").unwrap(), Parsed::Provided(Value::Null));
        assert_eq!(provided(&field, "__none__").unwrap(), Parsed::Provided(Value::Null));
    }

    #[test]
    fn null_on_required_field_is_invalid() {
        let field = FieldSpec::new("f", FieldKind::String).required();
        let error = provided(&field, "").unwrap_err();
        assert!(error.to_string().contains("must be non-null"));
    }

    #[test]
    fn untargeted_field_is_absent() {
        let field = FieldSpec::new("f", FieldKind::String);
        assert_eq!(parse(&field, &RequestValues::new()).unwrap(), Parsed::Absent);
    }

    #[test]
    fn timestamp_now_overrides_text() {
        let field = FieldSpec::new("f", FieldKind::Timestamp);
        let values = RequestValues::new().with("f", "now").with("f", "2011-02-09T09:23:34Z");
        let Parsed::Provided(Value::String(stamp)) = parse_timestamp(&field, &values).unwrap() else {
            panic!("expected a timestamp");
        };
        assert_ne!(stamp, "2011-02-09T09:23:34Z");
        assert!(parse_iso(&stamp).is_some());
    }

    #[test]
    fn timestamp_uses_last_text_value() {
        let field = FieldSpec::new("f", FieldKind::Timestamp);
        let values = RequestValues::new().with("f", "2011-02-09T09:23:34Z");
        assert_eq!(
            parse_timestamp(&field, &values).unwrap(),
            Parsed::Provided(json!("2011-02-09T09:23:34Z"))
        );
    }

    #[rstest]
    #[case(FieldKind::Float, json!(2.0), "2.0")]
    #[case(FieldKind::Integer, json!(12), "12")]
    #[case(FieldKind::Boolean, json!(true), "true")]
    #[case(FieldKind::Steps, json!(["a", "b"]), "a\nb")]
    #[case(FieldKind::String, Value::Null, "")]
    fn stored_values_render_as_inputs(#[case] kind: FieldKind, #[case] value: Value, #[case] input: &str) {
        let field = FieldSpec::new("f", kind);
        assert_eq!(value_to_input(&field, Some(&value)), input);
    }
}
