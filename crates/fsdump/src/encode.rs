//! Conversion of Firestore values into plain JSON.
//!
//! Native JSON kinds map directly. Store-specific kinds are flattened:
//! - timestamps become ISO 8601 text in UTC
//! - references become a tagged object carrying the document path
//! - everything else (bytes, geo points, unknown kinds) becomes text
//!
//! Files are UTF-8 and non-ASCII text is written as-is rather than as
//! `\uXXXX` escapes.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use fsdump_firestore::{paths, Value};
use serde_json::{Map, Number, Value as Json};
use tracing::debug;

/// Marker key identifying an encoded document reference.
pub const REFERENCE_TAG: &str = "__firestore_reference__";

/// Encode a document's fields as a JSON object with sorted keys.
pub fn encode_fields(fields: Option<&HashMap<String, Value>>) -> Json {
    let Some(fields) = fields else {
        return Json::Object(Map::new());
    };
    let mut keys: Vec<&String> = fields.keys().collect();
    keys.sort();

    let mut object = Map::new();
    for key in keys {
        object.insert(key.clone(), encode_value(&fields[key]));
    }
    Json::Object(object)
}

/// Encode a single value.
pub fn encode_value(value: &Value) -> Json {
    match value {
        Value::NullValue(()) => Json::Null,
        Value::BooleanValue(b) => Json::Bool(*b),
        Value::IntegerValue(s) => match s.parse::<i64>() {
            Ok(n) => Json::Number(n.into()),
            Err(_) => Json::String(s.clone()),
        },
        Value::DoubleValue(d) => encode_double(*d),
        Value::TimestampValue(s) => Json::String(encode_timestamp(s)),
        Value::StringValue(s) => Json::String(s.clone()),
        Value::BytesValue(b64) => Json::String(b64.clone()),
        Value::ReferenceValue(name) => encode_reference(name),
        Value::GeoPointValue(point) => Json::String(point.to_string()),
        Value::ArrayValue(array) => Json::Array(
            array
                .values
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(encode_value)
                .collect(),
        ),
        Value::MapValue(map) => encode_fields(map.fields.as_ref()),
        Value::Unrecognized { kind, payload } => {
            debug!(kind = %kind, "Encoding unrecognized value kind as text");
            Json::String(payload.to_string())
        }
    }
}

fn encode_double(d: f64) -> Json {
    match Number::from_f64(d) {
        Some(n) => Json::Number(n),
        None if d.is_nan() => Json::String("NaN".to_string()),
        None if d.is_sign_positive() => Json::String("Infinity".to_string()),
        None => Json::String("-Infinity".to_string()),
    }
}

/// Normalise an RFC 3339 timestamp to UTC with a `+00:00` offset.
///
/// Sub-second precision is microseconds: six fractional digits when the
/// microsecond part is non-zero, none otherwise. Text that does not parse is
/// passed through unchanged.
pub fn encode_timestamp(raw: &str) -> String {
    let Ok(ts) = DateTime::parse_from_rfc3339(raw) else {
        return raw.to_string();
    };
    let ts = ts.with_timezone(&Utc);
    let format = if ts.nanosecond() / 1_000 == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    ts.to_rfc3339_opts(format, false)
}

fn encode_reference(name: &str) -> Json {
    let mut object = Map::new();
    object.insert(REFERENCE_TAG.to_string(), Json::Bool(true));
    object.insert(
        "path".to_string(),
        Json::String(paths::relative_name(name).to_string()),
    );
    Json::Object(object)
}

/// Render a JSON value the way export files are written.
pub fn to_pretty(value: &Json) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsdump_firestore::types::{ArrayValue, MapValue};
    use fsdump_firestore::GeoPoint;
    use serde_json::json;

    fn fields(pairs: Vec<(&str, Value)>) -> HashMap<String, Value> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(encode_value(&Value::NullValue(())), Json::Null);
        assert_eq!(encode_value(&Value::BooleanValue(true)), json!(true));
        assert_eq!(encode_value(&Value::IntegerValue("-17".into())), json!(-17));
        assert_eq!(encode_value(&Value::DoubleValue(2.5)), json!(2.5));
        assert_eq!(encode_value(&Value::StringValue("Ann".into())), json!("Ann"));
    }

    #[test]
    fn test_integer_out_of_range_stays_text() {
        assert_eq!(
            encode_value(&Value::IntegerValue("99999999999999999999".into())),
            json!("99999999999999999999")
        );
    }

    #[test]
    fn test_non_finite_doubles() {
        assert_eq!(encode_value(&Value::DoubleValue(f64::NAN)), json!("NaN"));
        assert_eq!(encode_value(&Value::DoubleValue(f64::INFINITY)), json!("Infinity"));
        assert_eq!(
            encode_value(&Value::DoubleValue(f64::NEG_INFINITY)),
            json!("-Infinity")
        );
    }

    #[test]
    fn test_timestamp_becomes_iso_text() {
        assert_eq!(
            encode_value(&Value::TimestampValue("2024-01-02T03:04:05Z".into())),
            json!("2024-01-02T03:04:05+00:00")
        );
        assert_eq!(
            encode_value(&Value::TimestampValue("2024-01-02T03:04:05.123456Z".into())),
            json!("2024-01-02T03:04:05.123456+00:00")
        );
        assert_eq!(
            encode_timestamp("2024-01-02T05:04:05+02:00"),
            "2024-01-02T03:04:05+00:00"
        );
        assert_eq!(encode_timestamp("2024-03-01T10:00:00.5Z"), "2024-03-01T10:00:00.500000+00:00");
        assert_eq!(
            encode_timestamp("2024-03-01T10:00:00.123456789Z"),
            "2024-03-01T10:00:00.123456+00:00"
        );
        assert_eq!(encode_timestamp("2024-03-01T10:00:00.000000500Z"), "2024-03-01T10:00:00+00:00");
        assert_eq!(encode_timestamp("not a time"), "not a time");
    }

    #[test]
    fn test_reference_becomes_tagged_path() {
        let value = Value::ReferenceValue(
            "projects/demo/databases/(default)/documents/users/u1".into(),
        );
        assert_eq!(
            encode_value(&value),
            json!({"__firestore_reference__": true, "path": "users/u1"})
        );

        let value = Value::ReferenceValue(
            "projects/demo/databases/documents/documents/users/u1".into(),
        );
        assert_eq!(
            encode_value(&value),
            json!({"__firestore_reference__": true, "path": "users/u1"})
        );
    }

    #[test]
    fn test_store_specific_kinds_become_text() {
        assert_eq!(encode_value(&Value::BytesValue("aGk=".into())), json!("aGk="));
        assert_eq!(
            encode_value(&Value::GeoPointValue(GeoPoint {
                latitude: 1.5,
                longitude: -2.0
            })),
            json!("GeoPoint(latitude=1.5, longitude=-2)")
        );
        assert_eq!(
            encode_value(&Value::Unrecognized {
                kind: "vectorValue".into(),
                payload: json!({"values": [1]}),
            }),
            json!("{\"values\":[1]}")
        );
    }

    #[test]
    fn test_nested_structures() {
        let nested = Value::MapValue(MapValue {
            fields: Some(fields(vec![
                (
                    "tags",
                    Value::ArrayValue(ArrayValue {
                        values: Some(vec![
                            Value::StringValue("a".into()),
                            Value::IntegerValue("2".into()),
                        ]),
                    }),
                ),
                ("empty", Value::ArrayValue(ArrayValue { values: None })),
            ])),
        });
        assert_eq!(
            encode_value(&nested),
            json!({"tags": ["a", 2], "empty": []})
        );
    }

    #[test]
    fn test_non_ascii_written_unescaped() {
        let doc = fields(vec![("city", Value::StringValue("Tromsø".into()))]);
        let rendered = to_pretty(&encode_fields(Some(&doc))).unwrap();
        assert_eq!(rendered, "{\n  \"city\": \"Tromsø\"\n}");
    }

    #[test]
    fn test_missing_fields_encode_as_empty_object() {
        assert_eq!(encode_fields(None), json!({}));
    }

    #[test]
    fn test_pretty_output_sorted_and_stable() {
        let doc = fields(vec![
            ("zeta", Value::BooleanValue(false)),
            ("alpha", Value::StringValue("x".into())),
        ]);
        let rendered = to_pretty(&encode_fields(Some(&doc))).unwrap();
        assert_eq!(rendered, "{\n  \"alpha\": \"x\",\n  \"zeta\": false\n}");
        assert_eq!(rendered, to_pretty(&encode_fields(Some(&doc))).unwrap());
    }
}
