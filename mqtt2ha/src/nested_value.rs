use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A decoded message body: either a mapping of keys to further values, or a
/// scalar leaf.
///
/// JSON arrays are not mappings and are kept whole as a single leaf, the same
/// way strings, numbers, booleans and `null` are.
#[derive(Clone, Debug, PartialEq)]
pub enum NestedValue {
    Mapping(Vec<(String, NestedValue)>),
    Scalar(Value),
}

impl NestedValue {
    /// Decodes a raw MQTT payload.
    ///
    /// Only payloads with a JSON object at the root are accepted: a bare
    /// scalar has no key to name a sensor after.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(payload)?;
        match NestedValue::from(value) {
            NestedValue::Scalar(_) => Err(Error::ScalarRoot),
            mapping => Ok(mapping),
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, NestedValue::Mapping(_))
    }

    /// Number of scalar leaves reachable from this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            NestedValue::Mapping(entries) => {
                entries.iter().map(|(_, child)| child.leaf_count()).sum()
            }
            NestedValue::Scalar(_) => 1,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            NestedValue::Mapping(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, child)| (key.clone(), child.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
            NestedValue::Scalar(value) => value.clone(),
        }
    }
}

impl From<Value> for NestedValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => NestedValue::Mapping(
                map.into_iter()
                    .map(|(key, child)| (key, NestedValue::from(child)))
                    .collect(),
            ),
            scalar => NestedValue::Scalar(scalar),
        }
    }
}
