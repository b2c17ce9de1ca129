//! qlik_data_app_source_selection - The source entities bound to a data app
//!
//! The platform keeps one selection per data app. Every write replaces the
//! whole list, and the returned key becomes the resource id.

use std::collections::HashMap;

use async_trait::async_trait;
use qlik_client::QlikApi;
use qlik_client::models::{
    DataEntitiesSelection, SourceEntity, SourceSelectionData, SourceSelectionPut,
};
use qlik_core::provider::ResourceType;
use qlik_core::resource::{Attributes, Value};
use qlik_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::mapper::{
    Entity, ManagedEntity, MapperError, Operation, Overlay, optional_str, required_str, state_id,
};

const ENTITY_FIELDS: [&str; 7] = [
    "id",
    "name",
    "data_app_id",
    "schema",
    "database",
    "type",
    "project_id",
];

/// Nested attributes of one source entity
pub(crate) fn source_entity_attributes(required: bool) -> Vec<AttributeSchema> {
    ENTITY_FIELDS
        .iter()
        .map(|name| {
            let attr = AttributeSchema::string(*name);
            if required {
                attr.required()
            } else {
                attr.computed()
            }
        })
        .collect()
}

pub(crate) fn source_entity_to_value(entity: &SourceEntity) -> Value {
    let fields = [
        ("id", &entity.id),
        ("name", &entity.name),
        ("data_app_id", &entity.data_app_id),
        ("schema", &entity.schema),
        ("database", &entity.database),
        ("type", &entity.entity_type),
        ("project_id", &entity.project_id),
    ];
    Value::Map(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::string(v.as_str())))
            .collect::<HashMap<_, _>>(),
    )
}

fn source_entity_from_value(index: usize, value: &Value) -> Result<SourceEntity, MapperError> {
    let map = value.as_map().ok_or_else(|| MapperError::InvalidAttribute {
        name: format!("source_selection[{}]", index),
        message: "must be an object".to_string(),
    })?;
    let get = |key: &str| -> Result<String, MapperError> {
        required_str(map, key).map_err(|_| MapperError::InvalidAttribute {
            name: format!("source_selection[{}].{}", index, key),
            message: "is required".to_string(),
        })
    };
    Ok(SourceEntity {
        id: get("id")?,
        name: get("name")?,
        data_app_id: get("data_app_id")?,
        schema: get("schema")?,
        database: get("database")?,
        entity_type: get("type")?,
        project_id: get("project_id")?,
    })
}

pub struct DataAppSourceSelectionResource;

impl ResourceType for DataAppSourceSelectionResource {
    fn name(&self) -> &'static str {
        "qlik_data_app_source_selection"
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(self.name())
            .attribute(AttributeSchema::string("id").computed())
            .attribute(AttributeSchema::string("project_id").required())
            .attribute(AttributeSchema::string("app_id").required())
            .attribute(AttributeSchema::string("source_connection_id").required())
            .attribute(
                AttributeSchema::new(
                    "source_selection",
                    AttributeType::ListOfObjects(source_entity_attributes(true)),
                )
                .required(),
            )
    }
}

impl Entity for DataAppSourceSelectionResource {
    fn display_name(&self) -> &'static str {
        "Data App Source Selection"
    }
}

impl DataAppSourceSelectionResource {
    async fn put(
        &self,
        api: &dyn QlikApi,
        model: &Attributes,
        entities: Vec<SourceEntity>,
        operation: Operation,
    ) -> Result<String, MapperError> {
        let project_id = required_str(model, "project_id")?;
        let app_id = required_str(model, "app_id")?;
        let request = SourceSelectionPut {
            data: SourceSelectionData {
                data_entities_selection: DataEntitiesSelection {
                    source_connection_id: required_str(model, "source_connection_id")?,
                    data_entities: entities,
                },
            },
        };

        let id = optional_str(model, "id")?;
        let id = (!id.is_empty()).then_some(id);
        let key = api
            .put_source_selection(&project_id, &app_id, &request)
            .await
            .map_err(|e| self.remote_error(operation, id.as_deref(), e))?;
        Ok(key.key)
    }

    fn desired_entities(model: &Attributes) -> Result<Vec<SourceEntity>, MapperError> {
        match model.get("source_selection") {
            Some(Value::List(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| source_entity_from_value(i, item))
                .collect(),
            Some(_) => Err(MapperError::InvalidAttribute {
                name: "source_selection".to_string(),
                message: "must be a list".to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl ManagedEntity for DataAppSourceSelectionResource {
    async fn create(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError> {
        let entities = Self::desired_entities(model)?;
        let key = self.put(api, model, entities, Operation::Create).await?;
        Ok(Overlay::new().set_str("id", key))
    }

    async fn read(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError> {
        let id = state_id(model, self.display_name())?;
        let project_id = required_str(model, "project_id")?;
        let app_id = required_str(model, "app_id")?;
        let selection = api
            .get_source_selection(&project_id, &app_id)
            .await
            .map_err(|e| self.remote_error(Operation::Read, Some(&id), e))?;

        let current = selection.source_selection.data_entities_selection;
        let entities = current
            .data_entities
            .iter()
            .map(source_entity_to_value)
            .collect();

        Ok(Overlay::new()
            .set_str("id", selection.key)
            .set_str("source_connection_id", current.source_connection_id)
            .set("source_selection", Value::List(entities)))
    }

    async fn update(&self, api: &dyn QlikApi, model: &Attributes) -> Result<Overlay, MapperError> {
        let entities = Self::desired_entities(model)?;
        let key = self.put(api, model, entities, Operation::Update).await?;
        Ok(Overlay::new().set_str("id", key))
    }

    /// Clears the selection; the data app itself stays
    async fn delete(&self, api: &dyn QlikApi, model: &Attributes) -> Result<(), MapperError> {
        self.put(api, model, Vec::new(), Operation::Delete).await?;
        Ok(())
    }
}
