//! qlik_data_project - Data integration project bound to a space and a storage connection

use async_trait::async_trait;
use qlik_client::QlikApi;
use qlik_client::models::{DataProjectConfiguration, DataProjectRequest};
use qlik_core::provider::ResourceType;
use qlik_core::resource::{Attributes, Value};
use qlik_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::mapper::{
    Entity, ManagedEntity, MapperError, Operation, Overlay, optional_bool, optional_str,
    required_str, state_id,
};

const DEFAULT_BATCH_MODE: bool = true;

pub struct DataProjectResource;

impl ResourceType for DataProjectResource {
    fn name(&self) -> &'static str {
        "qlik_data_project"
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(self.name())
            .attribute(AttributeSchema::string("id").computed())
            .attribute(AttributeSchema::string("name").required())
            .attribute(AttributeSchema::string("description"))
            .attribute(AttributeSchema::string("space_id").required())
            .attribute(AttributeSchema::string("lakehouse_type").required())
            .attribute(AttributeSchema::string("type").required())
            .attribute(AttributeSchema::string("storage_connection").required())
            .attribute(
                AttributeSchema::new("batch_mode", AttributeType::Bool)
                    .with_default(Value::Bool(DEFAULT_BATCH_MODE)),
            )
    }
}

impl Entity for DataProjectResource {
    fn display_name(&self) -> &'static str {
        "Data Project"
    }
}

impl DataProjectResource {
    /// Full project body; the update call replaces every field
    fn request(&self, model: &Attributes, id: String) -> Result<DataProjectRequest, MapperError> {
        Ok(DataProjectRequest {
            space_id: required_str(model, "space_id")?,
            data: DataProjectConfiguration {
                id,
                name: required_str(model, "name")?,
                description: optional_str(model, "description")?,
                lakehouse_type: required_str(model, "lakehouse_type")?,
                project_type: required_str(model, "type")?,
                storage_connection: required_str(model, "storage_connection")?,
                batch_mode: optional_bool(model, "batch_mode", DEFAULT_BATCH_MODE)?,
            },
        })
    }
}

#[async_trait]
impl ManagedEntity for DataProjectResource {
    async fn create(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError> {
        let request = self.request(model, String::new())?;
        let project = api
            .create_data_project(&request)
            .await
            .map_err(|e| self.remote_error(Operation::Create, None, e))?;

        Ok(Overlay::new().set_str("id", project.id))
    }

    async fn read(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError> {
        let id = state_id(model, self.display_name())?;
        let project = api
            .get_data_project(&id)
            .await
            .map_err(|e| self.remote_error(Operation::Read, Some(&id), e))?;

        Ok(Overlay::new()
            .set_str("name", project.name)
            .set_optional_str("description", &project.description))
    }

    async fn update(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError> {
        let id = state_id(model, self.display_name())?;
        let request = self.request(model, id.clone())?;
        api.update_data_project(&id, &request)
            .await
            .map_err(|e| self.remote_error(Operation::Update, Some(&id), e))?;

        Ok(Overlay::new())
    }

    async fn delete(&self, api: &dyn QlikApi, model: &Attributes) -> Result<(), MapperError> {
        let id = state_id(model, self.display_name())?;
        api.delete_data_project(&id)
            .await
            .map_err(|e| self.remote_error(Operation::Delete, Some(&id), e))
    }
}
