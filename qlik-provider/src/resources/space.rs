//! qlik_space - Organizational container for other entities

use async_trait::async_trait;
use qlik_client::QlikApi;
use qlik_client::models::{CreateSpace, UpdateSpace};
use qlik_core::provider::ResourceType;
use qlik_core::resource::Attributes;
use qlik_core::schema::{AttributeSchema, ResourceSchema};

use crate::mapper::{
    Entity, ManagedEntity, MapperError, Operation, Overlay, optional_str, required_str, state_id,
};

pub struct SpaceResource;

impl ResourceType for SpaceResource {
    fn name(&self) -> &'static str {
        "qlik_space"
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(self.name())
            .with_description("A space groups apps, data connections and projects")
            .attribute(AttributeSchema::string("id").computed())
            .attribute(AttributeSchema::string("name").required())
            .attribute(
                AttributeSchema::string("type")
                    .required()
                    .with_description("shared, managed or data"),
            )
            .attribute(AttributeSchema::string("description"))
            .attribute(AttributeSchema::string("owner_id").computed())
    }
}

impl Entity for SpaceResource {
    fn display_name(&self) -> &'static str {
        "Space"
    }
}

#[async_trait]
impl ManagedEntity for SpaceResource {
    async fn create(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError> {
        let request = CreateSpace {
            name: required_str(model, "name")?,
            space_type: required_str(model, "type")?,
            description: optional_str(model, "description")?,
        };

        let space = api
            .create_space(&request)
            .await
            .map_err(|e| self.remote_error(Operation::Create, None, e))?;

        Ok(Overlay::new()
            .set_str("id", space.id)
            .set_optional_str("owner_id", &space.owner_id))
    }

    async fn read(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError> {
        let id = state_id(model, self.display_name())?;
        let space = api
            .get_space(&id)
            .await
            .map_err(|e| self.remote_error(Operation::Read, Some(&id), e))?;

        Ok(Overlay::new()
            .set_str("id", space.id)
            .set_str("name", space.name)
            .set_str("type", space.space_type)
            .set_optional_str("description", &space.description)
            .set_optional_str("owner_id", &space.owner_id))
    }

    async fn update(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError> {
        let id = state_id(model, self.display_name())?;
        let request = UpdateSpace {
            name: required_str(model, "name")?,
            owner_id: optional_str(model, "owner_id")?,
            description: optional_str(model, "description")?,
        };

        let space = api
            .update_space(&id, &request)
            .await
            .map_err(|e| self.remote_error(Operation::Update, Some(&id), e))?;

        Ok(Overlay::new().set_optional_str("owner_id", &space.owner_id))
    }

    async fn delete(&self, api: &dyn QlikApi, model: &Attributes) -> Result<(), MapperError> {
        let id = state_id(model, self.display_name())?;
        api.delete_space(&id)
            .await
            .map_err(|e| self.remote_error(Operation::Delete, Some(&id), e))
    }
}
