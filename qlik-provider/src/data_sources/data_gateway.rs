//! qlik_data_gateway data source - Look up a registered gateway by id

use async_trait::async_trait;
use qlik_client::QlikApi;
use qlik_core::provider::ResourceType;
use qlik_core::resource::Attributes;
use qlik_core::schema::{AttributeSchema, ResourceSchema};

use crate::mapper::{Entity, MapperError, Operation, Overlay, QueryEntity, required_str};

pub struct DataGatewayDataSource;

impl ResourceType for DataGatewayDataSource {
    fn name(&self) -> &'static str {
        "qlik_data_gateway"
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(self.name())
            .attribute(AttributeSchema::string("id").required())
            .attribute(AttributeSchema::string("name").computed())
            .attribute(AttributeSchema::string("type").computed())
            .attribute(AttributeSchema::string("description").computed())
            .attribute(AttributeSchema::string("space_id").computed())
    }
}

impl Entity for DataGatewayDataSource {
    fn display_name(&self) -> &'static str {
        "DataGateway"
    }
}

#[async_trait]
impl QueryEntity for DataGatewayDataSource {
    async fn query(&self, api: &dyn QlikApi, filter: &Attributes) -> Result<Overlay, MapperError> {
        let id = required_str(filter, "id")?;
        let gateway = api
            .get_data_gateway(&id)
            .await
            .map_err(|e| self.remote_error(Operation::Query, Some(&id), e))?;

        Ok(Overlay::new()
            .set_str("id", gateway.id)
            .set_str("name", gateway.name)
            .set_str("type", gateway.gateway_type)
            .set_str("description", gateway.description)
            .set_str("space_id", gateway.space_id))
    }
}
