//! qlik_data_connection - Link to an external data source through a gateway
//!
//! The connect statement, driver and credential references are derived by the
//! platform: every create and update first requests a connection string for
//! the connector, then sends the result along with the connection itself.
//! The password goes out once, inside that request, and is never read back.

use async_trait::async_trait;
use qlik_client::QlikApi;
use qlik_client::models::{ConnectionCreate, ConnectionStringResponse, ConnectionUpdate};
use qlik_core::provider::ResourceType;
use qlik_core::resource::Attributes;
use qlik_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::connection_string::{ConnectionParameters, ConnectorType, build_connection_request};
use crate::mapper::{
    Entity, ManagedEntity, MapperError, Operation, Overlay, optional_str, required_str, state_id,
};

pub struct DataConnectionResource;

fn connection_parameters_schema() -> AttributeSchema {
    AttributeSchema::new(
        "connection_parameters",
        AttributeType::Object(vec![
            AttributeSchema::string("server"),
            AttributeSchema::string("username"),
            AttributeSchema::string("warehouse"),
            AttributeSchema::string("database"),
            AttributeSchema::string("metadata_schema"),
            AttributeSchema::string("sap_client"),
            AttributeSchema::string("password").sensitive().write_only(),
        ]),
    )
    .required()
}

impl ResourceType for DataConnectionResource {
    fn name(&self) -> &'static str {
        "qlik_data_connection"
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(self.name())
            .attribute(AttributeSchema::string("id").computed())
            .attribute(AttributeSchema::string("name").required())
            .attribute(AttributeSchema::string("space_id").required())
            .attribute(AttributeSchema::string("gateway_id").required())
            .attribute(
                AttributeSchema::string("type")
                    .required()
                    .with_description("Connector tag, e.g. reptgt_qdisnowflake"),
            )
            .attribute(connection_parameters_schema())
            .attribute(AttributeSchema::string("driver").computed())
            .attribute(AttributeSchema::string("engine_id").computed())
            .attribute(AttributeSchema::string("connect_statement").computed())
            .attribute(AttributeSchema::string("credentials_id").computed())
            .attribute(AttributeSchema::string("credentials_name").computed())
    }
}

impl Entity for DataConnectionResource {
    fn display_name(&self) -> &'static str {
        "Data Connection"
    }
}

/// Connection fields shared by the create and update requests
struct Prepared {
    name: String,
    space_id: String,
    connector: ConnectorType,
    connection: ConnectionStringResponse,
}

impl DataConnectionResource {
    async fn prepare(
        &self,
        api: &dyn QlikApi,
        model: &Attributes,
        operation: Operation,
    ) -> Result<Prepared, MapperError> {
        let connector: ConnectorType = required_str(model, "type")?.parse()?;
        let gateway_id = required_str(model, "gateway_id")?;
        let params = ConnectionParameters::from_value(model.get("connection_parameters"));

        let request = build_connection_request(connector, &gateway_id, &params)
            .ok_or_else(|| MapperError::UnsupportedConnector(connector.tag().to_string()))?;

        let connection = api
            .get_connection_string(&request)
            .await
            .map_err(|e| self.remote_error(operation, None, e))?;

        Ok(Prepared {
            name: required_str(model, "name")?,
            space_id: required_str(model, "space_id")?,
            connector,
            connection,
        })
    }
}

#[async_trait]
impl ManagedEntity for DataConnectionResource {
    async fn create(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError> {
        let prepared = self.prepare(api, model, Operation::Create).await?;
        let request = ConnectionCreate {
            name: prepared.name,
            space_id: prepared.space_id,
            log_on: 1,
            connect_statement: prepared.connection.connection_string,
            data_source_id: prepared.connector.tag().to_string(),
            driver: prepared.connector.driver().to_string(),
            username: prepared.connection.user_id,
            password: prepared.connection.credentials_connection_string,
        };

        let connection = api
            .create_connection(&request)
            .await
            .map_err(|e| self.remote_error(Operation::Create, None, e))?;

        Ok(Overlay::new()
            .set_str("id", connection.id)
            .set_str("engine_id", connection.engine_id)
            .set_str("connect_statement", connection.connect_statement)
            .set_str("driver", connection.driver)
            .set_str("credentials_id", connection.credentials_id)
            .set_str("credentials_name", connection.credentials_name))
    }

    async fn read(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError> {
        let id = state_id(model, self.display_name())?;
        let connection = api
            .get_connection(&id)
            .await
            .map_err(|e| self.remote_error(Operation::Read, Some(&id), e))?;

        Ok(Overlay::new()
            .set_str("name", connection.name)
            .set_str("space_id", connection.space_id))
    }

    async fn update(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError> {
        let id = state_id(model, self.display_name())?;
        let prepared = self.prepare(api, model, Operation::Update).await?;
        let request = ConnectionUpdate {
            id: id.clone(),
            name: prepared.name,
            space_id: prepared.space_id,
            engine_id: optional_str(model, "engine_id")?,
            connect_statement: prepared.connection.connection_string,
            data_source_id: prepared.connector.tag().to_string(),
            driver: prepared.connector.driver().to_string(),
            username: prepared.connection.user_id,
            password: prepared.connection.credentials_connection_string,
        };

        api.update_connection(&id, &request)
            .await
            .map_err(|e| self.remote_error(Operation::Update, Some(&id), e))?;

        Ok(Overlay::new()
            .set_str("connect_statement", request.connect_statement)
            .set_str("driver", request.driver))
    }

    async fn delete(&self, api: &dyn QlikApi, model: &Attributes) -> Result<(), MapperError> {
        let id = state_id(model, self.display_name())?;
        api.delete_connection(&id)
            .await
            .map_err(|e| self.remote_error(Operation::Delete, Some(&id), e))
    }
}
