//! qlik_data_connections data source - First page of data connections

use std::collections::HashMap;

use async_trait::async_trait;
use qlik_client::QlikApi;
use qlik_client::models::{Connection, ListFilter};
use qlik_core::provider::ResourceType;
use qlik_core::resource::{Attributes, Value};
use qlik_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::DEFAULT_PAGE_SIZE;
use crate::mapper::{Entity, MapperError, Operation, Overlay, QueryEntity};

pub struct DataConnectionsDataSource;

impl ResourceType for DataConnectionsDataSource {
    fn name(&self) -> &'static str {
        "qlik_data_connections"
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(self.name()).attribute(
            AttributeSchema::new(
                "data_connections",
                AttributeType::ListOfObjects(vec![
                    AttributeSchema::string("id").computed(),
                    AttributeSchema::string("name").computed(),
                    AttributeSchema::string("type").computed(),
                    AttributeSchema::string("data_source_id").computed(),
                ]),
            )
            .computed(),
        )
    }
}

impl Entity for DataConnectionsDataSource {
    fn display_name(&self) -> &'static str {
        "Data Connections"
    }
}

fn connection_to_value(connection: Connection) -> Value {
    let mut map = HashMap::new();
    map.insert("id".to_string(), Value::String(connection.id));
    map.insert("name".to_string(), Value::String(connection.name));
    // The listing reports the driver as the connection type
    map.insert("type".to_string(), Value::String(connection.driver));
    map.insert(
        "data_source_id".to_string(),
        Value::String(connection.data_source_id),
    );
    Value::Map(map)
}

#[async_trait]
impl QueryEntity for DataConnectionsDataSource {
    async fn query(&self, api: &dyn QlikApi, _filter: &Attributes) -> Result<Overlay, MapperError> {
        let connections = api
            .list_connections(&ListFilter::with_limit(DEFAULT_PAGE_SIZE))
            .await
            .map_err(|e| self.remote_error(Operation::Query, None, e))?;

        Ok(Overlay::new().set(
            "data_connections",
            Value::List(connections.into_iter().map(connection_to_value).collect()),
        ))
    }
}
