//! Request and response bodies of the Qlik Cloud APIs
//!
//! Field names follow the platform's JSON. String fields the platform may omit
//! default to empty.

use serde::{Deserialize, Serialize};

// =============================================================================
// Listing
// =============================================================================

/// Server-side listing filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Name filter, applied by the platform
    pub name: Option<String>,
    /// Maximum number of items returned
    pub limit: u32,
}

impl ListFilter {
    pub fn with_limit(limit: u32) -> Self {
        Self { name: None, limit }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Query string pairs in a stable order
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(name) = &self.name {
            pairs.push(("name", name.clone()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs
    }
}

/// Generic `{"data": [...]}` list envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

// =============================================================================
// Spaces
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub space_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateSpace {
    pub name: String,
    #[serde(rename = "type")]
    pub space_type: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSpace {
    pub name: String,
    pub owner_id: String,
    pub description: String,
}

// =============================================================================
// Data connections
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    #[serde(rename = "qName", default)]
    pub name: String,
    /// Driver executable
    #[serde(rename = "qType", default)]
    pub driver: String,
    #[serde(rename = "space", default)]
    pub space_id: String,
    /// Connector tag (e.g., "reptgt_qdisnowflake")
    #[serde(rename = "datasourceID", default)]
    pub data_source_id: String,
    #[serde(rename = "qEngineObjectID", default)]
    pub engine_id: String,
    #[serde(rename = "qConnectStatement", default)]
    pub connect_statement: String,
    #[serde(rename = "qCredentialsID", default)]
    pub credentials_id: String,
    #[serde(rename = "qCredentialsName", default)]
    pub credentials_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionCreate {
    #[serde(rename = "qName")]
    pub name: String,
    #[serde(rename = "space")]
    pub space_id: String,
    #[serde(rename = "qLogOn")]
    pub log_on: u8,
    #[serde(rename = "qConnectStatement")]
    pub connect_statement: String,
    #[serde(rename = "datasourceID")]
    pub data_source_id: String,
    #[serde(rename = "qType")]
    pub driver: String,
    #[serde(rename = "qUsername")]
    pub username: String,
    #[serde(rename = "qPassword")]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionUpdate {
    #[serde(rename = "qID")]
    pub id: String,
    #[serde(rename = "qName")]
    pub name: String,
    #[serde(rename = "space")]
    pub space_id: String,
    #[serde(rename = "qEngineObjectID")]
    pub engine_id: String,
    #[serde(rename = "qConnectStatement")]
    pub connect_statement: String,
    #[serde(rename = "datasourceID")]
    pub data_source_id: String,
    #[serde(rename = "qType")]
    pub driver: String,
    #[serde(rename = "qUsername")]
    pub username: String,
    #[serde(rename = "qPassword")]
    pub password: String,
}

/// One named connection property; order within a list is significant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProperty {
    pub name: String,
    pub value: String,
}

impl ConnectionProperty {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Request for an assembled connect statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStringRequest {
    /// Connector tag; part of the request path
    #[serde(skip)]
    pub data_source_id: String,
    pub properties_list: Vec<ConnectionProperty>,
    pub credentials_properties_list: Vec<ConnectionProperty>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStringResponse {
    #[serde(default)]
    pub connection_string: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub credentials_connection_string: String,
}

// =============================================================================
// Data projects
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProjectConfiguration {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lakehouse_type: String,
    #[serde(rename = "type", default)]
    pub project_type: String,
    #[serde(default)]
    pub storage_connection: String,
    #[serde(default)]
    pub batch_mode: bool,
}

/// Body of both the create and the (full) update call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProjectRequest {
    pub space_id: String,
    pub data: DataProjectConfiguration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProjectResponse {
    pub data_project: DataProjectConfiguration,
}

// =============================================================================
// Data apps
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataApp {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub app_type: String,
    #[serde(default)]
    pub description: String,
}

/// Body of both the create and the (full) update call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataAppRequest {
    pub data: DataApp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataAppResponse {
    pub data_app: DataApp,
}

// =============================================================================
// Source selection and source entities
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data_app_id: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub database: String,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default)]
    pub project_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataEntitiesSelection {
    #[serde(default)]
    pub source_connection_id: String,
    #[serde(default)]
    pub data_entities: Vec<SourceEntity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSelectionData {
    #[serde(default)]
    pub data_entities_selection: DataEntitiesSelection,
}

/// Replaces the whole selection of a data app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSelectionPut {
    pub data: SourceSelectionData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceSelectionKey {
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSelection {
    pub key: String,
    #[serde(default)]
    pub source_selection: SourceSelectionData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludePattern {
    pub project_id: String,
    pub database: String,
    pub table_pattern: String,
    pub schema_pattern: String,
    pub entity_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySearchSelection {
    pub source_connection_id: String,
    pub include_patterns: Vec<IncludePattern>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySearchSource {
    pub data_entities_selection: EntitySearchSelection,
}

/// Search for source entities; the patterns are evaluated by the platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntitiesQuery {
    pub source_selection: EntitySearchSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceEntityList {
    #[serde(default)]
    pub entities: Vec<SourceEntity>,
}

// =============================================================================
// Data gateways
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataGateway {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub gateway_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub space_id: String,
}
