//! Firestore REST API types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::paths;

/// Wire shape of a value: a single-key object naming its kind.
type RawValue = serde_json::Map<String, serde_json::Value>;

/// Firestore document value types.
///
/// Deserialization goes through [`RawValue`] so that value kinds this crate
/// does not know about land in [`Value::Unrecognized`] instead of failing
/// the whole document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawValue")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String), // Firestore sends integers as strings
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
    Unrecognized {
        kind: String,
        payload: serde_json::Value,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoPoint {
    // proto3 JSON omits zero-valued coordinates
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GeoPoint(latitude={}, longitude={})",
            self.latitude, self.longitude
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArrayValue {
    pub values: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapValue {
    pub fields: Option<HashMap<String, Value>>,
}

impl TryFrom<RawValue> for Value {
    type Error = String;

    fn try_from(raw: RawValue) -> Result<Self, Self::Error> {
        if raw.len() != 1 {
            return Err(format!(
                "expected exactly one value kind, found {}",
                raw.len()
            ));
        }
        let Some((kind, payload)) = raw.into_iter().next() else {
            return Err("empty value".to_string());
        };

        let value = match kind.as_str() {
            "nullValue" => Value::NullValue(()),
            "booleanValue" => Value::BooleanValue(decode(&kind, payload)?),
            "integerValue" => Value::IntegerValue(match payload {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                other => return Err(format!("integerValue: unexpected {}", other)),
            }),
            "doubleValue" => Value::DoubleValue(decode_double(payload)?),
            "timestampValue" => Value::TimestampValue(decode(&kind, payload)?),
            "stringValue" => Value::StringValue(decode(&kind, payload)?),
            "bytesValue" => Value::BytesValue(decode(&kind, payload)?),
            "referenceValue" => Value::ReferenceValue(decode(&kind, payload)?),
            "geoPointValue" => Value::GeoPointValue(decode(&kind, payload)?),
            "arrayValue" => Value::ArrayValue(decode(&kind, payload)?),
            "mapValue" => Value::MapValue(decode(&kind, payload)?),
            _ => Value::Unrecognized { kind, payload },
        };
        Ok(value)
    }
}

fn decode<T: serde::de::DeserializeOwned>(kind: &str, payload: serde_json::Value) -> Result<T, String> {
    serde_json::from_value(payload).map_err(|e| format!("{}: {}", kind, e))
}

/// Doubles arrive as numbers, or as strings for the non-finite cases.
fn decode_double(payload: serde_json::Value) -> Result<f64, String> {
    match payload {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("doubleValue: {} is not representable", n)),
        serde_json::Value::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            _ => s.parse().map_err(|_| format!("doubleValue: invalid {}", s)),
        },
        other => Err(format!("doubleValue: unexpected {}", other)),
    }
}

/// Firestore document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name
    pub name: Option<String>,
    /// Document fields
    pub fields: Option<HashMap<String, Value>>,
    /// Create time
    pub create_time: Option<String>,
    /// Update time
    pub update_time: Option<String>,
}

impl Document {
    /// Create a document with the given resource name and fields.
    pub fn new(name: impl Into<String>, fields: HashMap<String, Value>) -> Self {
        Self {
            name: Some(name.into()),
            fields: Some(fields),
            create_time: None,
            update_time: None,
        }
    }

    /// Path relative to the documents root (`users/u1`).
    pub fn path(&self) -> &str {
        self.name.as_deref().map(paths::relative_name).unwrap_or("")
    }

    /// True for the placeholder entries a `showMissing` listing returns for
    /// paths that only hold subcollections.
    pub fn is_missing(&self) -> bool {
        self.create_time.is_none() && self.update_time.is_none() && self.fields.is_none()
    }
}

/// List documents response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    pub documents: Option<Vec<Document>>,
    pub next_page_token: Option<String>,
}

/// Body of a `:listCollectionIds` call.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCollectionIdsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

/// Response of a `:listCollectionIds` call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCollectionIdsResponse {
    pub collection_ids: Option<Vec<String>>,
    pub next_page_token: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================
