//! Field codec: schema attributes to and from flat API payloads.
//!
//! Only present attributes are encoded; defaults are applied by the schema
//! before the codec runs. Decoding treats missing or `null` keys as absent.

use declarative::{ResourceData, Value};
use serde_json::Value as Json;
use vaultapi::Payload;

/// How a value is represented on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// Same shape as the attribute
    #[default]
    Verbatim,
    /// A list attribute sent as one `"a,b,c"` string
    CommaJoined,
}

/// Mapping of one attribute onto one payload key.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub key: &'static str,
    pub wire_key: &'static str,
    pub format: WireFormat,
    /// Sent when the attribute is absent, so a full rewrite clears it
    pub when_absent: Option<Json>,
}

impl FieldMapping {
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            wire_key: key,
            format: WireFormat::Verbatim,
            when_absent: None,
        }
    }

    /// Use a different payload key.
    pub fn wire_key(mut self, wire_key: &'static str) -> Self {
        self.wire_key = wire_key;
        self
    }

    pub fn comma_joined(mut self) -> Self {
        self.format = WireFormat::CommaJoined;
        self
    }

    /// Send `value` when the attribute is absent.
    pub fn when_absent(mut self, value: Json) -> Self {
        self.when_absent = Some(value);
        self
    }

    fn encode(&self, value: &Value) -> Json {
        match self.format {
            WireFormat::Verbatim => value.to_json(),
            WireFormat::CommaJoined => match value {
                Value::List(_) => Json::String(value.string_list().join(",")),
                other => other.to_json(),
            },
        }
    }

    fn decode(&self, value: &Json) -> Option<Value> {
        match (self.format, value) {
            (WireFormat::CommaJoined, Json::String(s)) => Some(Value::from(
                s.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>(),
            )),
            _ => Value::from_json(value),
        }
    }
}

/// The set of mappings for one resource kind.
#[derive(Debug, Clone, Default)]
pub struct FieldCodec {
    fields: Vec<FieldMapping>,
}

impl FieldCodec {
    pub fn new(fields: Vec<FieldMapping>) -> Self {
        Self { fields }
    }

    /// Verbatim mappings for the given keys.
    pub fn verbatim(keys: &[&'static str]) -> Self {
        Self::new(keys.iter().copied().map(FieldMapping::new).collect())
    }

    /// Build the request payload from present attributes.
    pub fn encode(&self, data: &ResourceData) -> Payload {
        let mut payload = Payload::new();
        for field in &self.fields {
            match (data.get(field.key), &field.when_absent) {
                (Some(value), _) => {
                    payload.insert(field.wire_key.to_string(), field.encode(value));
                }
                (None, Some(fallback)) => {
                    payload.insert(field.wire_key.to_string(), fallback.clone());
                }
                (None, None) => {}
            }
        }
        payload
    }

    /// Write payload values back into attributes.
    pub fn decode(&self, payload: &Payload, data: &mut ResourceData) {
        for field in &self.fields {
            match payload.get(field.wire_key).and_then(|v| field.decode(v)) {
                Some(value) => data.set(field.key, value),
                None => {
                    data.remove(field.key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn codec() -> FieldCodec {
        FieldCodec::new(vec![
            FieldMapping::new("iam_alias"),
            FieldMapping::new("iam_metadata").when_absent(json!([])),
            FieldMapping::new("policies").wire_key("value").comma_joined(),
            FieldMapping::new("custom_metadata"),
        ])
    }

    #[test]
    fn test_encode_only_present_fields() {
        let mut data = ResourceData::new();
        data.set("iam_alias", "role_id");
        data.set("unrelated", "x");

        let payload = codec().encode(&data);
        assert_eq!(
            Json::Object(payload),
            json!({"iam_alias": "role_id", "iam_metadata": []})
        );
    }

    #[test]
    fn test_encode_wire_formats() {
        let mut data = ResourceData::new();
        data.set("policies", vec!["default", "dev"]);
        data.set(
            "custom_metadata",
            BTreeMap::from([("version".to_string(), "1".to_string())]),
        );
        data.set("iam_metadata", vec!["account_id"]);

        let payload = codec().encode(&data);
        assert_eq!(payload["value"], json!("default,dev"));
        assert_eq!(payload["custom_metadata"], json!({"version": "1"}));
        assert_eq!(payload["iam_metadata"], json!(["account_id"]));
    }

    #[test]
    fn test_decode_tolerates_missing_keys() {
        let mut data = ResourceData::new();
        data.set("custom_metadata", BTreeMap::from([("a".to_string(), "b".to_string())]));

        let payload = json!({"iam_alias": "unique_id", "custom_metadata": null, "value": "a, b,"})
            .as_object()
            .cloned()
            .unwrap();
        codec().decode(&payload, &mut data);

        assert_eq!(data.get_str("iam_alias"), Some("unique_id"));
        assert!(data.get("custom_metadata").is_none());
        assert!(data.get("iam_metadata").is_none());
        assert_eq!(data.get_string_list("policies"), vec!["a", "b"]);
    }

    #[test]
    fn test_decode_comma_joined_accepts_arrays() {
        let mut data = ResourceData::new();
        let payload = json!({"value": ["x", "y"]}).as_object().cloned().unwrap();
        codec().decode(&payload, &mut data);
        assert_eq!(data.get_string_list("policies"), vec!["x", "y"]);
    }
}
