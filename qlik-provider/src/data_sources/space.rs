//! qlik_space data source - Look up one space by id

use async_trait::async_trait;
use qlik_client::QlikApi;
use qlik_core::provider::ResourceType;
use qlik_core::resource::Attributes;
use qlik_core::schema::{AttributeSchema, ResourceSchema};

use crate::mapper::{Entity, MapperError, Operation, Overlay, QueryEntity, required_str};

pub struct SpaceDataSource;

impl ResourceType for SpaceDataSource {
    fn name(&self) -> &'static str {
        "qlik_space"
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(self.name())
            .attribute(AttributeSchema::string("id").required())
            .attribute(AttributeSchema::string("name").computed())
            .attribute(AttributeSchema::string("type").computed())
            .attribute(AttributeSchema::string("description").computed())
    }
}

impl Entity for SpaceDataSource {
    fn display_name(&self) -> &'static str {
        "Space"
    }
}

#[async_trait]
impl QueryEntity for SpaceDataSource {
    async fn query(&self, api: &dyn QlikApi, filter: &Attributes) -> Result<Overlay, MapperError> {
        let id = required_str(filter, "id")?;
        let space = api
            .get_space(&id)
            .await
            .map_err(|e| self.remote_error(Operation::Query, Some(&id), e))?;

        Ok(Overlay::new()
            .set_str("id", space.id)
            .set_str("name", space.name)
            .set_str("type", space.space_type)
            .set_str("description", space.description))
    }
}
