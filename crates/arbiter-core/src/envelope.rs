//! The API's `{data, included, meta}` response wrapper and the generic typed
//! record it carries.
//!
//! Records are kept verbatim: anything the API sends beyond `id`, `type`,
//! `attributes` and `relationships` survives a decode/encode cycle through
//! [`Resource::extra`], so pass-through output matches what was fetched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::FetchError;

/// A single API record: `{id, type, attributes, relationships, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    /// Attribute rendered as text. Numbers and booleans are stringified;
    /// null, blank strings, arrays and objects count as absent.
    pub fn attr_text(&self, key: &str) -> Option<String> {
        match self.attr(key)? {
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Meta {
    #[serde(rename = "totalPages", default)]
    pub total_pages: Option<u64>,
}

/// The standard response wrapper.
///
/// `data` and `included` are decoded lazily so one odd record does not sink
/// the whole response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub data: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub included: Vec<Value>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl Envelope {
    /// Decode a response body.
    pub fn parse(body: &str) -> Result<Self, FetchError> {
        serde_json::from_str(body).map_err(|e| FetchError::malformed(format!("envelope: {e}")))
    }

    /// `data` as a single record.
    pub fn single(&self) -> Result<Resource, FetchError> {
        match &self.data {
            Value::Null => Err(FetchError::NotFound("response carried no data".into())),
            Value::Object(_) => Resource::deserialize(&self.data)
                .map_err(|e| FetchError::malformed(format!("data record: {e}"))),
            Value::Array(_) => Err(FetchError::malformed(
                "expected a single record, got a list",
            )),
            other => Err(FetchError::malformed(format!(
                "expected a single record, got {}",
                json_kind(other)
            ))),
        }
    }

    /// `data` as a list of records. Missing data is an empty list; records
    /// that fail to decode are skipped with a warning.
    pub fn list(&self) -> Result<Vec<Resource>, FetchError> {
        match &self.data {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => Ok(decode_records(items.iter(), "data")),
            other => Err(FetchError::malformed(format!(
                "expected a list of records, got {}",
                json_kind(other)
            ))),
        }
    }

    /// Side-loaded records whose `type` tag equals `kind`, in response order.
    pub fn included_of_type(&self, kind: &str) -> Vec<Resource> {
        let matching = self
            .included
            .iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some(kind));
        decode_records(matching, "included")
    }

    /// `meta.totalPages`, or 0 when the API does not report it.
    pub fn total_pages(&self) -> u32 {
        self.meta
            .as_ref()
            .and_then(|m| m.total_pages)
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
            .unwrap_or(0)
    }
}

fn decode_records<'a>(items: impl Iterator<Item = &'a Value>, section: &str) -> Vec<Resource> {
    items
        .filter_map(|item| match Resource::deserialize(item) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!(section, error = %e, "skipping malformed record");
                None
            }
        })
        .collect()
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn string_or_number<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            json_kind(&other)
        ))),
    }
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}
