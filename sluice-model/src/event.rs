use crate::{ModelError, Result, FIELD_SEPARATOR};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

const SELECTOR_SEPARATOR: &str = "::";

/// A resolved path identifying where in an event a mapped value lives.
///
/// Textual form is `s0::outer::inner`: an optional stream prefix (`s` plus the
/// input stream index) followed by runtime names separated by `::`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldSelector {
    stream: Option<String>,
    path: Vec<String>,
}

fn is_stream_prefix(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('s')
        && segment[1..].bytes().all(|b| b.is_ascii_digit())
}

impl FieldSelector {
    /// Selector without a stream prefix.
    pub fn new<S: Into<String>>(path: impl IntoIterator<Item = S>) -> Self {
        Self {
            stream: None,
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    pub fn parse(selector: &str) -> Result<Self> {
        let mut segments: Vec<&str> = selector.split(SELECTOR_SEPARATOR).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ModelError::InvalidSelector(selector.to_string()));
        }
        let stream = if segments.len() > 1 && is_stream_prefix(segments[0]) {
            Some(segments.remove(0).to_string())
        } else {
            None
        };
        Ok(Self {
            stream,
            path: segments.into_iter().map(str::to_string).collect(),
        })
    }

    /// Stream prefix such as `s0`, if present.
    pub fn stream(&self) -> Option<&str> {
        self.stream.as_deref()
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The same text read with the stream prefix as the first field name,
    /// for schemas with a top-level property named like `s1`. `None` when
    /// there is no prefix.
    pub fn unprefixed(&self) -> Option<Self> {
        let stream = self.stream.as_ref()?;
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.push(stream.clone());
        path.extend(self.path.iter().cloned());
        Some(Self { stream: None, path })
    }

    /// Name of the flattened field this selector points at (`outer_inner`).
    pub fn flattened_name(&self) -> String {
        self.path.join(FIELD_SEPARATOR)
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(stream) = &self.stream {
            write!(f, "{stream}{SELECTOR_SEPARATOR}")?;
        }
        f.write_str(&self.path.join(SELECTOR_SEPARATOR))
    }
}

impl FromStr for FieldSelector {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldSelector {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<FieldSelector> for String {
    fn from(selector: FieldSelector) -> Self {
        selector.to_string()
    }
}

/// One record on an event stream.
///
/// Holds a JSON object whose shape follows the stream's
/// [`EventSchema`](crate::EventSchema); values are looked up with a
/// [`FieldSelector`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event {
    fields: Map<String, Value>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON value. Anything but an object is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(ModelError::NotAnObject(type_name(&other).to_string())),
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::from_value(serde_json::from_slice(bytes)?)
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Looks up the value a selector points at. The stream prefix is ignored.
    ///
    /// A path that continues past an array reads from its first element,
    /// matching the single-occurrence layout lists are flattened to. A path
    /// ending on an array returns the whole array.
    pub fn get(&self, selector: &FieldSelector) -> Option<&Value> {
        let (first, rest) = selector.path().split_first()?;
        let mut current = self.fields.get(first)?;
        for segment in rest {
            current = child(current, segment)?;
        }
        Some(current)
    }

    pub fn get_str(&self, selector: &FieldSelector) -> Option<&str> {
        self.get(selector).and_then(|v| v.as_str())
    }

    pub fn get_number(&self, selector: &FieldSelector) -> Option<f64> {
        self.get(selector).and_then(|v| v.as_f64())
    }

    pub fn get_bool(&self, selector: &FieldSelector) -> Option<bool> {
        self.get(selector).and_then(|v| v.as_bool())
    }
}

fn child<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(fields) => fields.get(segment),
        Value::Array(items) => child(items.first()?, segment),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
