//! Mapper - Generic CRUD skeleton shared by every resource and data source
//!
//! Each entity contributes a small descriptor: its schema, and how to turn an
//! attribute map into client requests and responses back into attribute
//! overlays. The mappers here do everything else: defaults, validation,
//! logging, and applying overlays only after a call succeeds.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use qlik_client::{ClientError, QlikApi};
use qlik_core::provider::ResourceType;
use qlik_core::resource::{Attributes, Value};
use qlik_core::schema::{ResourceSchema, TypeError};

use crate::connection_string::ConnectorError;

/// Lifecycle step a mapper was performing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Query,
}

impl Operation {
    fn verb(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Query => "query",
        }
    }

    /// Present participle, for diagnostics ("Error creating Space")
    pub fn gerund(&self) -> &'static str {
        match self {
            Operation::Create => "creating",
            Operation::Read => "reading",
            Operation::Update => "updating",
            Operation::Delete => "deleting",
            Operation::Query => "querying",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    #[error("invalid attributes: {}", join_type_errors(.0))]
    Validation(Vec<TypeError>),

    #[error("{entity} has no id in state")]
    MissingId { entity: &'static str },

    #[error("attribute '{name}' {message}")]
    InvalidAttribute { name: String, message: String },

    #[error("connector type '{0}' cannot be managed yet")]
    UnsupportedConnector(String),

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error("Could not {operation} {entity}{}: {source}", id_suffix(.id))]
    Remote {
        operation: Operation,
        entity: &'static str,
        id: Option<String>,
        #[source]
        source: ClientError,
    },
}

fn join_type_errors(errors: &[TypeError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn id_suffix(id: &Option<String>) -> String {
    match id {
        Some(id) => format!(" ID {}", id),
        None => String::new(),
    }
}

impl MapperError {
    /// Whether the platform reported the entity as gone
    pub fn is_not_found(&self) -> bool {
        matches!(self, MapperError::Remote { source, .. } if source.is_not_found())
    }
}

/// Fields to write back into an attribute map
///
/// `None` clears the attribute. Nothing is applied unless the remote call
/// that produced the overlay succeeded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    fields: Vec<(String, Option<Value>)>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.push((name.into(), Some(value)));
        self
    }

    pub fn set_str(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, Value::String(value.into()))
    }

    /// Empty strings from the platform mean "unset" and clear the attribute
    pub fn set_optional_str(mut self, name: impl Into<String>, value: &str) -> Self {
        let value = (!value.is_empty()).then(|| Value::string(value));
        self.fields.push((name.into(), value));
        self
    }

    pub fn apply_to(self, attributes: &mut Attributes) {
        for (name, value) in self.fields {
            match value {
                Some(value) => {
                    attributes.insert(name, value);
                }
                None => {
                    attributes.remove(&name);
                }
            }
        }
    }
}

// =============================================================================
// Attribute access
// =============================================================================

/// String attribute that must be present
pub(crate) fn required_str(attributes: &Attributes, name: &str) -> Result<String, MapperError> {
    match attributes.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(invalid(name, "must be a string")),
        None => Err(invalid(name, "is required")),
    }
}

/// String attribute that may be unset; unset reads as empty
pub(crate) fn optional_str(attributes: &Attributes, name: &str) -> Result<String, MapperError> {
    match attributes.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(invalid(name, "must be a string")),
        None => Ok(String::new()),
    }
}

pub(crate) fn optional_bool(
    attributes: &Attributes,
    name: &str,
    default: bool,
) -> Result<bool, MapperError> {
    match attributes.get(name) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(invalid(name, "must be a boolean")),
        None => Ok(default),
    }
}

/// Platform-assigned id recorded by an earlier create
pub(crate) fn state_id(
    attributes: &Attributes,
    entity: &'static str,
) -> Result<String, MapperError> {
    match attributes.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(MapperError::MissingId { entity }),
    }
}

fn invalid(name: &str, message: &str) -> MapperError {
    MapperError::InvalidAttribute {
        name: name.to_string(),
        message: message.to_string(),
    }
}

// =============================================================================
// Descriptors
// =============================================================================

/// A resource or data source type
pub trait Entity: ResourceType + 'static {
    /// Human-readable name used in logs and diagnostics (e.g., "Data Connection")
    fn display_name(&self) -> &'static str;

    fn remote_error(
        &self,
        operation: Operation,
        id: Option<&str>,
        source: ClientError,
    ) -> MapperError {
        MapperError::Remote {
            operation,
            entity: self.display_name(),
            id: id.map(str::to_string),
            source,
        }
    }
}

/// Request/response conversions of a manageable entity
///
/// Each method receives the full attribute map and returns only the fields
/// the platform computed.
#[async_trait]
pub trait ManagedEntity: Entity {
    async fn create(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError>;

    async fn read(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError>;

    async fn update(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError>;

    async fn delete(&self, api: &dyn QlikApi, model: &Attributes) -> Result<(), MapperError>;
}

/// Filter-to-result conversion of a read-only data source
#[async_trait]
pub trait QueryEntity: Entity {
    async fn query(&self, api: &dyn QlikApi, filter: &Attributes) -> Result<Overlay, MapperError>;
}

// =============================================================================
// Mappers
// =============================================================================

/// Object-safe view of a `ResourceMapper`, for the provider registry
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn display_name(&self) -> &'static str;
    fn schema(&self) -> ResourceSchema;

    async fn create(&self, model: &Attributes) -> Result<Attributes, MapperError>;
    async fn read(&self, model: &Attributes) -> Result<Attributes, MapperError>;
    async fn update(&self, model: &Attributes) -> Result<Attributes, MapperError>;
    async fn delete(&self, model: &Attributes) -> Result<(), MapperError>;
}

/// Object-safe view of a `DataSourceMapper`
#[async_trait]
pub trait DataSourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn display_name(&self) -> &'static str;
    fn schema(&self) -> ResourceSchema;

    async fn query(&self, filter: &Attributes) -> Result<Attributes, MapperError>;
}

pub struct ResourceMapper<E> {
    entity: E,
    api: Arc<dyn QlikApi>,
}

impl<E: ManagedEntity> ResourceMapper<E> {
    pub fn new(entity: E, api: Arc<dyn QlikApi>) -> Self {
        Self { entity, api }
    }

    /// Defaults applied, then checked against the schema
    fn prepare(&self, model: &Attributes) -> Result<Attributes, MapperError> {
        let schema = self.entity.schema();
        let mut model = model.clone();
        schema.apply_defaults(&mut model);
        schema.validate(&model).map_err(MapperError::Validation)?;
        Ok(model)
    }
}

#[async_trait]
impl<E: ManagedEntity> ResourceHandler for ResourceMapper<E> {
    fn type_name(&self) -> &'static str {
        self.entity.name()
    }

    fn display_name(&self) -> &'static str {
        self.entity.display_name()
    }

    fn schema(&self) -> ResourceSchema {
        self.entity.schema()
    }

    async fn create(&self, model: &Attributes) -> Result<Attributes, MapperError> {
        let mut model = self.prepare(model)?;
        log::debug!("Creating {}", self.entity.display_name());

        let overlay = self.entity.create(self.api.as_ref(), &model).await?;
        overlay.apply_to(&mut model);

        log::info!(
            "Created {} {}",
            self.entity.display_name(),
            model.get("id").and_then(Value::as_str).unwrap_or_default()
        );
        Ok(model)
    }

    async fn read(&self, model: &Attributes) -> Result<Attributes, MapperError> {
        let id = state_id(model, self.entity.display_name())?;
        log::debug!("Reading {} {}", self.entity.display_name(), id);

        let overlay = self.entity.read(self.api.as_ref(), model).await?;
        let mut model = model.clone();
        overlay.apply_to(&mut model);
        Ok(model)
    }

    async fn update(&self, model: &Attributes) -> Result<Attributes, MapperError> {
        let mut model = self.prepare(model)?;
        let id = state_id(&model, self.entity.display_name())?;
        log::debug!("Updating {} {}", self.entity.display_name(), id);

        let overlay = self.entity.update(self.api.as_ref(), &model).await?;
        overlay.apply_to(&mut model);

        log::info!("Updated {} {}", self.entity.display_name(), id);
        Ok(model)
    }

    async fn delete(&self, model: &Attributes) -> Result<(), MapperError> {
        let id = state_id(model, self.entity.display_name())?;
        log::debug!("Deleting {} {}", self.entity.display_name(), id);

        self.entity.delete(self.api.as_ref(), model).await?;

        log::info!("Deleted {} {}", self.entity.display_name(), id);
        Ok(())
    }
}

pub struct DataSourceMapper<Q> {
    entity: Q,
    api: Arc<dyn QlikApi>,
}

impl<Q: QueryEntity> DataSourceMapper<Q> {
    pub fn new(entity: Q, api: Arc<dyn QlikApi>) -> Self {
        Self { entity, api }
    }
}

#[async_trait]
impl<Q: QueryEntity> DataSourceHandler for DataSourceMapper<Q> {
    fn type_name(&self) -> &'static str {
        self.entity.name()
    }

    fn display_name(&self) -> &'static str {
        self.entity.display_name()
    }

    fn schema(&self) -> ResourceSchema {
        self.entity.schema()
    }

    async fn query(&self, filter: &Attributes) -> Result<Attributes, MapperError> {
        self.entity
            .schema()
            .validate_config(filter)
            .map_err(MapperError::Validation)?;
        log::debug!("Querying {}", self.entity.display_name());

        let overlay = self.entity.query(self.api.as_ref(), filter).await?;
        let mut result = filter.clone();
        overlay.apply_to(&mut result);
        Ok(result)
    }
}
