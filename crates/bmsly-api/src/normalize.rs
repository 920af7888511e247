// Response-shape normalization.
//
// The API wraps payloads in several envelope variants depending on
// endpoint and version. This module extracts the canonical payload with
// a fixed rule ordering -- some bodies structurally match more than one
// rule, so the ordering is part of the behavioral contract.

use serde_json::{Map, Value};

use crate::error::Error;

/// A canonical payload extracted from an API envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Array(Vec<Value>),
    Object(Map<String, Value>),
}

impl Payload {
    /// The payload as an array of records, if it is one.
    pub fn into_array(self) -> Option<Vec<Value>> {
        match self {
            Self::Array(items) => Some(items),
            Self::Object(_) => None,
        }
    }

    /// The payload as a keyed object, if it is one.
    pub fn into_object(self) -> Option<Map<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            Self::Array(_) => None,
        }
    }
}

/// Extract the canonical payload from a response body.
///
/// `named_field` is the endpoint-specific array field (e.g. `"slaves"`,
/// `"series"`), checked both nested under `data` and at the top level.
///
/// Rules, in order of precedence (first match wins):
/// 1. `data.<named_field>` is an array
/// 2. top-level `<named_field>` is an array
/// 3. `success == true` -- `data` is returned verbatim (array or object)
/// 4. `data` is an array
/// 5. the body itself is an array
/// 6. otherwise the shape is unrecognized
pub fn normalize(body: &Value, named_field: Option<&str>) -> Result<Payload, Error> {
    if let Some(field) = named_field {
        if let Some(items) = body
            .get("data")
            .and_then(|data| data.get(field))
            .and_then(Value::as_array)
        {
            return Ok(Payload::Array(items.clone()));
        }
        if let Some(items) = body.get(field).and_then(Value::as_array) {
            return Ok(Payload::Array(items.clone()));
        }
    }

    if body.get("success").and_then(Value::as_bool) == Some(true) {
        return match body.get("data") {
            Some(Value::Array(items)) => Ok(Payload::Array(items.clone())),
            Some(Value::Object(map)) => Ok(Payload::Object(map.clone())),
            _ => Err(Error::UnexpectedShape { body: body.clone() }),
        };
    }

    if let Some(items) = body.get("data").and_then(Value::as_array) {
        return Ok(Payload::Array(items.clone()));
    }

    if let Value::Array(items) = body {
        return Ok(Payload::Array(items.clone()));
    }

    Err(Error::UnexpectedShape { body: body.clone() })
}

/// Coerce a value intended as a number to a finite `f64`.
///
/// Strings are parsed as floats; anything unparsable, absent, or
/// non-finite degrades to `0.0`. NaN never reaches a chart or table.
pub fn num_or_zero(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() { n } else { 0.0 }
}

/// `num_or_zero` over an optional record field.
pub fn field_num(record: &Value, key: &str) -> f64 {
    record.get(key).map_or(0.0, num_or_zero)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;
    use crate::error::Error;

    #[test]
    fn nested_named_field_beats_top_level() {
        let body = json!({ "data": { "slaves": [1, 2] }, "slaves": [9] });
        let payload = normalize(&body, Some("slaves")).unwrap();
        assert_eq!(payload.into_array().unwrap(), vec![json!(1), json!(2)]);
    }

    #[test]
    fn top_level_named_field() {
        let body = json!({ "slaves": [3, 4] });
        let payload = normalize(&body, Some("slaves")).unwrap();
        assert_eq!(payload.into_array().unwrap(), vec![json!(3), json!(4)]);
    }

    #[test]
    fn success_envelope_returns_data_verbatim() {
        let body = json!({ "success": true, "data": [1, 2] });
        let payload = normalize(&body, None).unwrap();
        assert_eq!(payload.into_array().unwrap(), vec![json!(1), json!(2)]);

        let body = json!({ "success": true, "data": { "total": 5 } });
        let payload = normalize(&body, None).unwrap();
        let map = payload.into_object().unwrap();
        assert_eq!(map.get("total"), Some(&json!(5)));
    }

    #[test]
    fn plain_data_array() {
        let body = json!({ "data": [7, 8] });
        let payload = normalize(&body, None).unwrap();
        assert_eq!(payload.into_array().unwrap(), vec![json!(7), json!(8)]);
    }

    #[test]
    fn bare_array_passes_through() {
        let body = json!([1, 2, 3]);
        let payload = normalize(&body, None).unwrap();
        assert_eq!(
            payload.into_array().unwrap(),
            vec![json!(1), json!(2), json!(3)]
        );
    }

    #[test]
    fn unrecognized_shape_errors_with_body() {
        let body = json!({ "foo": 1 });
        match normalize(&body, None) {
            Err(Error::UnexpectedShape { body: raw }) => assert_eq!(raw, body),
            other => panic!("expected UnexpectedShape, got {other:?}"),
        }
    }

    #[test]
    fn success_false_is_not_an_envelope() {
        // Rule 3 requires success == true; a false flag falls through.
        let body = json!({ "success": false, "data": { "x": 1 } });
        assert!(matches!(
            normalize(&body, None),
            Err(Error::UnexpectedShape { .. })
        ));
    }

    #[test]
    fn coercion_never_yields_nan() {
        assert_eq!(num_or_zero(&json!("abc")), 0.0);
        assert_eq!(num_or_zero(&json!("42.5")), 42.5);
        assert_eq!(num_or_zero(&json!(" 7 ")), 7.0);
        assert_eq!(num_or_zero(&json!(3)), 3.0);
        assert_eq!(num_or_zero(&json!(null)), 0.0);
        assert_eq!(num_or_zero(&json!({})), 0.0);
        assert_eq!(field_num(&json!({ "v": "abc" }), "v"), 0.0);
        assert_eq!(field_num(&json!({}), "v"), 0.0);
    }
}
