//! Binds declared configuration options to runtime values.
//!
//! Every check happens at bind time: a missing or mistyped required option,
//! or a mapping that points outside the input schema, fails here rather than
//! at the first event.

use crate::error::{ElementError, ElementResult};
use serde_json::Value;
use sluice_model::{
    ElementDescription, EventProperty, EventSchema, FieldSelector, MappingProperty, StaticProperty, ValueType,
};
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::debug;

/// Option id to user-supplied value, as received from the configuration layer.
pub type RawParameters = HashMap<String, Value>;

/// A value bound to one declared option.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Selector(FieldSelector),
}

impl BoundValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Selector(_) => "field selector",
        }
    }
}

/// A mapping option resolved against the input schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMapping {
    pub option_id: String,
    pub selector: FieldSelector,
    /// Name of the flattened field the selected value is written to.
    pub field_name: String,
}

/// All bound options of one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeParameters {
    values: HashMap<String, BoundValue>,
    mappings: Vec<ResolvedMapping>,
}

impl RuntimeParameters {
    pub fn get(&self, option_id: &str) -> Option<&BoundValue> {
        self.values.get(option_id)
    }

    pub fn contains(&self, option_id: &str) -> bool {
        self.values.contains_key(option_id)
    }

    fn bound(&self, option_id: &str) -> ElementResult<&BoundValue> {
        self.values
            .get(option_id)
            .ok_or_else(|| ElementError::MissingParameter {
                option_id: option_id.to_string(),
            })
    }

    fn mismatch(option_id: &str, expected: &'static str, found: &BoundValue) -> ElementError {
        ElementError::InvalidParameter {
            option_id: option_id.to_string(),
            expected,
            detail: format!("bound as {}", found.kind()),
        }
    }

    pub fn text(&self, option_id: &str) -> ElementResult<&str> {
        match self.bound(option_id)? {
            BoundValue::Text(s) => Ok(s),
            other => Err(Self::mismatch(option_id, "text", other)),
        }
    }

    pub fn integer(&self, option_id: &str) -> ElementResult<i64> {
        match self.bound(option_id)? {
            BoundValue::Integer(i) => Ok(*i),
            other => Err(Self::mismatch(option_id, "integer", other)),
        }
    }

    pub fn float(&self, option_id: &str) -> ElementResult<f64> {
        match self.bound(option_id)? {
            BoundValue::Float(f) => Ok(*f),
            BoundValue::Integer(i) => Ok(*i as f64),
            other => Err(Self::mismatch(option_id, "float", other)),
        }
    }

    pub fn boolean(&self, option_id: &str) -> ElementResult<bool> {
        match self.bound(option_id)? {
            BoundValue::Boolean(b) => Ok(*b),
            other => Err(Self::mismatch(option_id, "boolean", other)),
        }
    }

    pub fn selector(&self, option_id: &str) -> ElementResult<&FieldSelector> {
        match self.bound(option_id)? {
            BoundValue::Selector(s) => Ok(s),
            other => Err(Self::mismatch(option_id, "field selector", other)),
        }
    }

    /// Resolved mappings, in option declaration order.
    pub fn mappings(&self) -> &[ResolvedMapping] {
        &self.mappings
    }
}

/// Conversion from a raw JSON parameter to a typed value.
pub trait ParameterValue: Sized {
    /// Name used in error messages.
    const EXPECTED: &'static str;

    fn from_raw(raw: &Value) -> Result<Self, String>;
}

impl ParameterValue for String {
    const EXPECTED: &'static str = "text";

    fn from_raw(raw: &Value) -> Result<Self, String> {
        match raw {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(format!("got {other}")),
        }
    }
}

impl ParameterValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_raw(raw: &Value) -> Result<Self, String> {
        match raw {
            Value::Number(n) => n.as_i64().ok_or_else(|| format!("{n} is not an integer")),
            Value::String(s) => s.trim().parse().map_err(|e| format!("'{s}': {e}")),
            other => Err(format!("got {other}")),
        }
    }
}

impl ParameterValue for u32 {
    const EXPECTED: &'static str = "unsigned integer";

    fn from_raw(raw: &Value) -> Result<Self, String> {
        let wide = i64::from_raw(raw)?;
        u32::try_from(wide).map_err(|_| format!("{wide} is out of range"))
    }
}

impl ParameterValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_raw(raw: &Value) -> Result<Self, String> {
        match raw {
            Value::Number(n) => n.as_f64().ok_or_else(|| format!("{n} is not a float")),
            Value::String(s) => s.trim().parse().map_err(|e| format!("'{s}': {e}")),
            other => Err(format!("got {other}")),
        }
    }
}

impl ParameterValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_raw(raw: &Value) -> Result<Self, String> {
        match raw {
            Value::Bool(b) => Ok(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(format!("'{s}' is not true/false")),
            },
            other => Err(format!("got {other}")),
        }
    }
}

/// Binds options of one element description against supplied parameters and
/// the input schema.
pub struct ParameterExtractor<'a> {
    description: &'a ElementDescription,
    raw: &'a RawParameters,
    schema: &'a EventSchema,
}

impl<'a> ParameterExtractor<'a> {
    pub fn new(
        description: &'a ElementDescription,
        raw: &'a RawParameters,
        schema: &'a EventSchema,
    ) -> Self {
        Self {
            description,
            raw,
            schema,
        }
    }

    fn declared(&self, option_id: &str) -> ElementResult<&'a StaticProperty> {
        self.description
            .static_property(option_id)
            .ok_or_else(|| ElementError::UndeclaredOption {
                element_id: self.description.id().to_string(),
                option_id: option_id.to_string(),
            })
    }

    /// Supplied value, else the declared default. JSON `null` counts as absent.
    fn supplied(&self, property: &StaticProperty) -> Option<Cow<'a, Value>> {
        match self.raw.get(property.id()) {
            Some(Value::Null) | None => match property {
                StaticProperty::FreeText(p) => p
                    .default_value
                    .as_ref()
                    .map(|d| Cow::Owned(Value::String(d.clone()))),
                StaticProperty::MappingUnary(_) => None,
            },
            Some(value) => Some(Cow::Borrowed(value)),
        }
    }

    /// Binds a required option to `T`.
    pub fn bind<T: ParameterValue>(&self, option_id: &str) -> ElementResult<T> {
        self.bind_optional(option_id)?
            .ok_or_else(|| ElementError::MissingParameter {
                option_id: option_id.to_string(),
            })
    }

    /// Binds an option to `T`; `None` only when it is absent and not required.
    pub fn bind_optional<T: ParameterValue>(&self, option_id: &str) -> ElementResult<Option<T>> {
        let property = self.declared(option_id)?;
        let Some(raw) = self.supplied(property) else {
            if property.is_required() {
                return Err(ElementError::MissingParameter {
                    option_id: option_id.to_string(),
                });
            }
            return Ok(None);
        };
        T::from_raw(&raw)
            .map(Some)
            .map_err(|detail| ElementError::InvalidParameter {
                option_id: option_id.to_string(),
                expected: T::EXPECTED,
                detail,
            })
    }

    /// Resolves a mapping option to a selector that exists in the input
    /// schema and satisfies the option's property requirement.
    pub fn mapping(&self, option_id: &str) -> ElementResult<FieldSelector> {
        match self.declared(option_id)? {
            StaticProperty::MappingUnary(mapping) => self.resolve_mapping(mapping),
            StaticProperty::FreeText(_) => Err(ElementError::InvalidParameter {
                option_id: option_id.to_string(),
                expected: "mapping option",
                detail: "declared as free text".into(),
            }),
        }
    }

    fn resolve_mapping(&self, mapping: &MappingProperty) -> ElementResult<FieldSelector> {
        let option_id = mapping.label.id.as_str();
        let raw = match self.raw.get(option_id) {
            Some(Value::Null) | None => {
                return Err(ElementError::MissingParameter {
                    option_id: option_id.to_string(),
                });
            }
            Some(raw) => raw,
        };
        let text = raw.as_str().ok_or_else(|| ElementError::InvalidParameter {
            option_id: option_id.to_string(),
            expected: "field selector",
            detail: format!("got {raw}"),
        })?;
        let selector =
            FieldSelector::parse(text).map_err(|e| ElementError::InvalidParameter {
                option_id: option_id.to_string(),
                expected: "field selector",
                detail: e.to_string(),
            })?;
        let (selector, property) = self.locate(selector).map_err(|selector| {
            ElementError::UnresolvedMapping {
                option_id: option_id.to_string(),
                selector: selector.to_string(),
            }
        })?;
        if !property.satisfies(mapping.requirement) {
            return Err(ElementError::RequirementNotMet {
                option_id: option_id.to_string(),
                selector: selector.to_string(),
                requirement: mapping.requirement.to_string(),
            });
        }
        Ok(selector)
    }

    /// Finds the schema property `selector` names. A leading `s<N>` segment
    /// is a stream prefix unless only the literal reading resolves.
    fn locate(
        &self,
        selector: FieldSelector,
    ) -> Result<(FieldSelector, &'a EventProperty), FieldSelector> {
        if let Some(property) = self.schema.property_at(selector.path()) {
            return Ok((selector, property));
        }
        let Some(literal) = selector.unprefixed() else {
            return Err(selector);
        };
        match self.schema.property_at(literal.path()) {
            Some(property) => Ok((literal, property)),
            None => Err(selector),
        }
    }

    /// Binds every declared option, failing on the first problem.
    pub fn bind_all(&self) -> ElementResult<RuntimeParameters> {
        let mut params = RuntimeParameters::default();
        for property in self.description.static_properties() {
            let id = property.id();
            match property {
                StaticProperty::FreeText(p) => {
                    let bound = match p.value_type {
                        ValueType::Text => self.bind_optional::<String>(id)?.map(BoundValue::Text),
                        ValueType::Integer => {
                            self.bind_optional::<i64>(id)?.map(BoundValue::Integer)
                        }
                        ValueType::Float => self.bind_optional::<f64>(id)?.map(BoundValue::Float),
                        ValueType::Boolean => {
                            self.bind_optional::<bool>(id)?.map(BoundValue::Boolean)
                        }
                    };
                    if let Some(value) = bound {
                        params.values.insert(id.to_string(), value);
                    }
                }
                StaticProperty::MappingUnary(mapping) => {
                    let absent = matches!(self.raw.get(id), None | Some(Value::Null));
                    if absent && !mapping.required {
                        continue;
                    }
                    let selector = self.resolve_mapping(mapping)?;
                    params.mappings.push(ResolvedMapping {
                        option_id: id.to_string(),
                        field_name: selector.flattened_name(),
                        selector: selector.clone(),
                    });
                    params
                        .values
                        .insert(id.to_string(), BoundValue::Selector(selector));
                }
            }
        }
        for key in self.raw.keys() {
            if self.description.static_property(key).is_none() {
                debug!(element_id = %self.description.id(), option_id = %key, "Ignoring undeclared parameter");
            }
        }
        Ok(params)
    }
}
