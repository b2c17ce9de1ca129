//! Connection-string requests for data connections
//!
//! A data connection's connect statement and credentials token are assembled
//! by the platform from a connector-specific property list. Key names and
//! their order are consumed verbatim by the platform.

use std::str::FromStr;

use qlik_client::models::{ConnectionProperty, ConnectionStringRequest};
use qlik_core::resource::Value;

/// Driver executable every supported connector runs on
pub const COMMON_SERVICE_DRIVER: &str = "QlikConnectorsCommonService.exe";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectorError {
    #[error("unknown connector type '{0}'")]
    Unknown(String),
}

/// Connector tag of a data connection (its `type` attribute)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorType {
    Snowflake,
    SapApplication,
}

impl ConnectorType {
    pub fn tag(&self) -> &'static str {
        match self {
            ConnectorType::Snowflake => "reptgt_qdisnowflake",
            ConnectorType::SapApplication => "SAP_APPLICATION",
        }
    }

    pub fn driver(&self) -> &'static str {
        match self {
            ConnectorType::Snowflake | ConnectorType::SapApplication => COMMON_SERVICE_DRIVER,
        }
    }
}

impl FromStr for ConnectorType {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reptgt_qdisnowflake" => Ok(ConnectorType::Snowflake),
            "SAP_APPLICATION" => Ok(ConnectorType::SapApplication),
            other => Err(ConnectorError::Unknown(other.to_string())),
        }
    }
}

impl std::fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// The `connection_parameters` block; unset fields are empty
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub server: String,
    pub username: String,
    pub warehouse: String,
    pub database: String,
    pub metadata_schema: String,
    pub sap_client: String,
    pub password: String,
}

impl std::fmt::Debug for ConnectionParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParameters")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("metadata_schema", &self.metadata_schema)
            .field("sap_client", &self.sap_client)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ConnectionParameters {
    /// Read from the nested attribute value; non-string members are ignored
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(map) = value.and_then(Value::as_map) else {
            return Self::default();
        };
        let get = |key: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            server: get("server"),
            username: get("username"),
            warehouse: get("warehouse"),
            database: get("database"),
            metadata_schema: get("metadata_schema"),
            sap_client: get("sap_client"),
            password: get("password"),
        }
    }
}

/// Build the connection-string request for a connector
///
/// Returns `None` for connectors whose property set is not defined yet
/// (`SAP_APPLICATION`).
pub fn build_connection_request(
    connector: ConnectorType,
    gateway_id: &str,
    params: &ConnectionParameters,
) -> Option<ConnectionStringRequest> {
    match connector {
        ConnectorType::Snowflake => Some(snowflake_request(gateway_id, params)),
        ConnectorType::SapApplication => None,
    }
}

fn snowflake_request(gateway_id: &str, params: &ConnectionParameters) -> ConnectionStringRequest {
    let tag = ConnectorType::Snowflake.tag();
    let properties_list = vec![
        ConnectionProperty::new("sourceType", tag),
        ConnectionProperty::new("agentId", gateway_id),
        ConnectionProperty::new("endpointTypePrefix", "reptgt_"),
        ConnectionProperty::new("useDbCommandForTest", "true"),
        ConnectionProperty::new("replicateEndpointType", "snowflake"),
        ConnectionProperty::new("server", &params.server),
        ConnectionProperty::new("port", "443"),
        ConnectionProperty::new("username", &params.username),
        ConnectionProperty::new("warehouse", &params.warehouse),
        ConnectionProperty::new("database", &params.database),
        ConnectionProperty::new("metadataschema", &params.metadata_schema),
        ConnectionProperty::new("stagingtype", "SNOWFLAKE_STAGE"),
        ConnectionProperty::new("proxySettingsOrigin", "ENDPOINT"),
        ConnectionProperty::new("useProxyServer", "false"),
    ];

    ConnectionStringRequest {
        data_source_id: tag.to_string(),
        properties_list,
        credentials_properties_list: vec![ConnectionProperty::new("password", &params.password)],
    }
}
