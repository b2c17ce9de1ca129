//! Provider - Trait abstracting resource operations
//!
//! A Provider exposes the resources and data sources of one remote platform.
//! It is responsible for turning host lifecycle calls into API calls.

use std::future::Future;
use std::pin::Pin;

use crate::diagnostics::Diagnostic;
use crate::resource::{Resource, ResourceId, State};
use crate::schema::ResourceSchema;

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    /// Short summary shown first by the host
    pub message: String,
    /// Longer explanation, usually carrying the upstream error text verbatim
    pub detail: Option<String>,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}.{}] {}", id.resource_type, id.name, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
            resource_id: None,
            cause: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Render as a host diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let summary = match &self.resource_id {
            Some(id) => format!("{} ({})", self.message, id),
            None => self.message.clone(),
        };
        Diagnostic::error(summary, self.detail.clone().unwrap_or_default())
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Definition of resource and data source types that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Provider-prefixed type name (e.g., "qlik_space")
    fn name(&self) -> &'static str;

    /// Attribute schema for this type
    fn schema(&self) -> ResourceSchema;
}

/// Main Provider trait
///
/// All operations are async and involve side effects on the remote platform.
/// Operations are independent of each other; all state travels in and out
/// through the arguments and return values.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "qlik")
    fn name(&self) -> &'static str;

    /// List of resource types this Provider can manage
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// List of read-only data source types this Provider can query
    fn data_source_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Refresh a resource from its last known state
    ///
    /// Returns `State::not_found()` if the resource no longer exists remotely.
    fn read(&self, current: &State) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource
    ///
    /// Returns State with identifier set to the id assigned by the platform
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource with the complete desired state
    fn update(
        &self,
        id: &ResourceId,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource
    fn delete(&self, current: &State) -> BoxFuture<'_, ProviderResult<()>>;

    /// Run a data source query; the query's attributes are the filter
    fn read_data_source(&self, query: &Resource) -> BoxFuture<'_, ProviderResult<State>>;
}
