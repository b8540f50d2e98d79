use std::fmt;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::flatten::KeyPath;

/// Name of the decoded message body inside a Home Assistant template.
pub const VALUE_JSON: &str = "value_json";

/// Jinja filter appended to a value template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateFilter {
    Round(u8),
}

impl fmt::Display for TemplateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateFilter::Round(precision) => write!(f, "round({precision})"),
        }
    }
}

/// A `value_json["a"]["b"]` lookup, kept as typed segments until rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueTemplate {
    segments: Vec<String>,
    filter: Option<TemplateFilter>,
}

impl ValueTemplate {
    pub fn new(path: &KeyPath) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::EmptyKeyPath);
        }
        Ok(Self {
            segments: path.segments().to_vec(),
            filter: None,
        })
    }

    pub fn with_filter(mut self, filter: TemplateFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn filter(&self) -> Option<TemplateFilter> {
        self.filter
    }

    /// The bare lookup expression, without the `{{ }}` delimiters.
    pub fn expression(&self) -> String {
        let mut expression = String::from(VALUE_JSON);
        for segment in &self.segments {
            // a JSON string literal is also a valid Jinja string literal
            expression.push('[');
            expression.push_str(&Value::String(segment.clone()).to_string());
            expression.push(']');
        }
        if let Some(filter) = self.filter {
            expression.push_str(&format!(" | {filter}"));
        }
        expression
    }
}

impl fmt::Display for ValueTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{{ {} }}}}", self.expression())
    }
}

/// Names and lookup template derived from the key path of one leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub display_name: String,
    pub object_id: String,
    pub value_template: ValueTemplate,
}

impl FieldDescriptor {
    pub fn with_filter(mut self, filter: TemplateFilter) -> Self {
        self.value_template = self.value_template.with_filter(filter);
        self
    }
}

pub fn describe(path: &KeyPath) -> Result<FieldDescriptor> {
    let value_template = ValueTemplate::new(path)?;
    Ok(FieldDescriptor {
        display_name: display_name(path),
        object_id: object_id(path),
        value_template,
    })
}

/// Segments joined by spaces, each word title cased.
pub fn display_name(path: &KeyPath) -> String {
    title_case(&path.segments().join(" "))
}

/// Lower case segments with spaces and dots turned into underscores.
pub fn object_id(path: &KeyPath) -> String {
    path.segments()
        .iter()
        .map(|segment| {
            segment
                .to_lowercase()
                .replace(|c: char| c == ' ' || c == '.', "_")
        })
        .collect::<Vec<_>>()
        .join("_")
}

// A cased letter is upper cased when it starts a word and lower cased
// otherwise; anything that isn't a cased letter ends the word.
fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_uppercase() || c.is_lowercase() {
            if in_word {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            titled.push(c);
            in_word = false;
        }
    }
    titled
}
