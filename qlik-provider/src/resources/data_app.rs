//! qlik_data_app - Data app inside a data project

use async_trait::async_trait;
use qlik_client::QlikApi;
use qlik_client::models::{DataApp, DataAppRequest};
use qlik_core::provider::ResourceType;
use qlik_core::resource::Attributes;
use qlik_core::schema::{AttributeSchema, ResourceSchema};

use crate::mapper::{
    Entity, ManagedEntity, MapperError, Operation, Overlay, optional_str, required_str, state_id,
};

pub struct DataAppResource;

impl ResourceType for DataAppResource {
    fn name(&self) -> &'static str {
        "qlik_data_app"
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(self.name())
            .attribute(AttributeSchema::string("id").computed())
            .attribute(AttributeSchema::string("name").required())
            .attribute(AttributeSchema::string("type").required())
            .attribute(AttributeSchema::string("description"))
            .attribute(AttributeSchema::string("project_id").required())
    }
}

impl Entity for DataAppResource {
    fn display_name(&self) -> &'static str {
        "Data App"
    }
}

fn request(model: &Attributes) -> Result<DataAppRequest, MapperError> {
    Ok(DataAppRequest {
        data: DataApp {
            id: String::new(),
            name: required_str(model, "name")?,
            app_type: required_str(model, "type")?,
            description: optional_str(model, "description")?,
        },
    })
}

#[async_trait]
impl ManagedEntity for DataAppResource {
    async fn create(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError> {
        let project_id = required_str(model, "project_id")?;
        let app = api
            .create_data_app(&project_id, &request(model)?)
            .await
            .map_err(|e| self.remote_error(Operation::Create, None, e))?;

        Ok(Overlay::new().set_str("id", app.id))
    }

    async fn read(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError> {
        let id = state_id(model, self.display_name())?;
        let project_id = required_str(model, "project_id")?;
        let app = api
            .get_data_app(&project_id, &id)
            .await
            .map_err(|e| self.remote_error(Operation::Read, Some(&id), e))?;

        Ok(Overlay::new()
            .set_str("name", app.name)
            .set_optional_str("description", &app.description))
    }

    async fn update(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError> {
        let id = state_id(model, self.display_name())?;
        let project_id = required_str(model, "project_id")?;
        let app = api
            .update_data_app(&project_id, &id, &request(model)?)
            .await
            .map_err(|e| self.remote_error(Operation::Update, Some(&id), e))?;

        Ok(Overlay::new()
            .set_str("name", app.name)
            .set_optional_str("description", &app.description))
    }

    async fn delete(&self, api: &dyn QlikApi, model: &Attributes) -> Result<(), MapperError> {
        let id = state_id(model, self.display_name())?;
        let project_id = required_str(model, "project_id")?;
        api.delete_data_app(&project_id, &id)
            .await
            .map_err(|e| self.remote_error(Operation::Delete, Some(&id), e))
    }
}
