//! Schema - Define attribute schemas for resources and data sources
//!
//! Every resource and data source declares its attributes here: names, types,
//! and the required / optional / computed / sensitive flags the host uses when
//! planning and when rendering state.

use std::collections::HashMap;
use std::fmt;

use crate::resource::{Attributes, Value};

/// Shape an attribute value must have
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Single nested object with its own attributes
    Object(Vec<AttributeSchema>),
    /// List of nested objects
    ListOfObjects(Vec<AttributeSchema>),
}

impl AttributeType {
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Object(attrs), Value::Map(map)) => {
                validate_nested(attrs, map).map_err(|errors| TypeError::NestedError {
                    path: "object".to_string(),
                    inner: errors,
                })
            }

            (AttributeType::ListOfObjects(attrs), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    match item {
                        Value::Map(map) => validate_nested(attrs, map).map_err(|errors| {
                            TypeError::NestedError {
                                path: format!("[{}]", i),
                                inner: errors,
                            }
                        })?,
                        other => {
                            return Err(TypeError::ListItemError {
                                index: i,
                                inner: Box::new(TypeError::TypeMismatch {
                                    expected: "Object".to_string(),
                                    got: other.type_name(),
                                }),
                            });
                        }
                    }
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Object(_) => "Object".to_string(),
            AttributeType::ListOfObjects(_) => "List<Object>".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

fn validate_nested(
    attrs: &[AttributeSchema],
    map: &HashMap<String, Value>,
) -> Result<(), Vec<TypeError>> {
    let mut errors = Vec::new();
    for schema in attrs {
        match map.get(&schema.name) {
            Some(value) => {
                if let Err(e) = schema.attr_type.validate(value) {
                    errors.push(TypeError::AttributeError {
                        name: schema.name.clone(),
                        inner: Box::new(e),
                    });
                }
            }
            None if schema.is_required() => {
                errors.push(TypeError::MissingRequired {
                    name: schema.name.clone(),
                });
            }
            None => {}
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Why a value or attribute map was rejected
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ComputedOnly { name: String },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("{path}: {}", join_errors(.inner))]
    NestedError { path: String, inner: Vec<TypeError> },
}

fn join_errors(errors: &[TypeError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// How an attribute is populated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be supplied by configuration
    Required,
    /// May be supplied by configuration
    Optional,
    /// Set only by the remote platform
    Computed,
    /// May be supplied; filled in by the provider when absent
    OptionalComputed,
}

#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub presence: Presence,
    /// Value is redacted in host output
    pub sensitive: bool,
    /// Value is sent to the platform but never read back
    pub write_only: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            presence: Presence::Optional,
            sensitive: false,
            write_only: false,
            default: None,
            description: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::String)
    }

    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }

    pub fn computed(mut self) -> Self {
        self.presence = Presence::Computed;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    /// Default applied when configuration leaves the attribute unset
    pub fn with_default(mut self, value: Value) -> Self {
        self.presence = Presence::OptionalComputed;
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.presence, Presence::Computed | Presence::OptionalComputed)
    }

    /// Set by configuration at all
    pub fn is_configurable(&self) -> bool {
        self.presence != Presence::Computed
    }
}

/// Attributes of one resource or data source type
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Attribute names sorted, for stable rendering
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Fill in defaults for unset optional attributes
    pub fn apply_defaults(&self, attributes: &mut Attributes) {
        for (name, schema) in &self.attributes {
            if let Some(default) = &schema.default
                && !attributes.contains_key(name)
            {
                attributes.insert(name.clone(), default.clone());
            }
        }
    }

    /// Names of attributes only the platform sets
    ///
    /// Attributes with a default are left out; an unset one takes its default again.
    pub fn computed_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .values()
            .filter(|s| !s.is_configurable())
            .map(|s| s.name.as_str())
    }

    /// Validate an attribute map that may carry computed values from prior state
    pub fn validate(&self, attributes: &Attributes) -> Result<(), Vec<TypeError>> {
        self.validate_inner(attributes, true)
    }

    /// Validate configuration as written by a user, rejecting computed-only attributes
    pub fn validate_config(&self, attributes: &Attributes) -> Result<(), Vec<TypeError>> {
        self.validate_inner(attributes, false)
    }

    fn validate_inner(
        &self,
        attributes: &Attributes,
        allow_computed: bool,
    ) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        for (name, schema) in &self.attributes {
            if schema.is_required() && !attributes.contains_key(name) {
                errors.push(TypeError::MissingRequired { name: name.clone() });
            }
        }

        for (name, value) in attributes {
            if let Some(schema) = self.attributes.get(name) {
                if !allow_computed && !schema.is_configurable() {
                    errors.push(TypeError::ComputedOnly { name: name.clone() });
                    continue;
                }
                if let Err(e) = schema.attr_type.validate(value) {
                    errors.push(TypeError::AttributeError {
                        name: name.clone(),
                        inner: Box::new(e),
                    });
                }
            }
            // unknown keys pass through untouched
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
