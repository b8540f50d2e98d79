use std::fmt;

use serde_json::Value;

use crate::nested_value::NestedValue;

/// Keys leading from the root of a payload to one of its leaves.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, key: impl Into<String>) {
        self.0.push(key.into());
    }
}

impl<S: Into<String>> FromIterator<S> for KeyPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// One leaf of a payload together with the path that leads to it.
#[derive(Clone, Debug, PartialEq)]
pub struct LeafRecord<'a> {
    pub path: KeyPath,
    pub value: &'a Value,
}

/// Collects every scalar leaf of `root`, depth first and in key order.
///
/// Empty mappings contribute nothing. A scalar root produces a single record
/// with an empty path, which callers have to reject before describing it.
pub fn flatten(root: &NestedValue) -> Vec<LeafRecord<'_>> {
    let mut records = Vec::new();
    let mut path = Vec::new();
    collect_leaves(root, &mut path, &mut records);
    records
}

fn collect_leaves<'a>(
    node: &'a NestedValue,
    path: &mut Vec<&'a str>,
    records: &mut Vec<LeafRecord<'a>>,
) {
    match node {
        NestedValue::Mapping(entries) => {
            for (key, child) in entries {
                path.push(key);
                collect_leaves(child, path, records);
                path.pop();
            }
        }
        NestedValue::Scalar(value) => records.push(LeafRecord {
            path: path.iter().copied().collect(),
            value,
        }),
    }
}
