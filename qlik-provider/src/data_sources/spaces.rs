//! qlik_spaces data source - Spaces filtered by name on the platform

use std::collections::HashMap;

use async_trait::async_trait;
use qlik_client::QlikApi;
use qlik_client::models::{ListFilter, Space};
use qlik_core::provider::ResourceType;
use qlik_core::resource::{Attributes, Value};
use qlik_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::DEFAULT_PAGE_SIZE;
use crate::mapper::{Entity, MapperError, Operation, Overlay, QueryEntity, optional_str};

pub struct SpacesDataSource;

impl ResourceType for SpacesDataSource {
    fn name(&self) -> &'static str {
        "qlik_spaces"
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(self.name())
            .attribute(AttributeSchema::string("name"))
            .attribute(
                AttributeSchema::new(
                    "spaces",
                    AttributeType::ListOfObjects(vec![
                        AttributeSchema::string("id").computed(),
                        AttributeSchema::string("name").computed(),
                        AttributeSchema::string("type").computed(),
                        AttributeSchema::string("description").computed(),
                    ]),
                )
                .computed(),
            )
    }
}

impl Entity for SpacesDataSource {
    fn display_name(&self) -> &'static str {
        "Spaces"
    }
}

fn space_to_value(space: Space) -> Value {
    let mut map = HashMap::new();
    map.insert("id".to_string(), Value::String(space.id));
    map.insert("name".to_string(), Value::String(space.name));
    map.insert("type".to_string(), Value::String(space.space_type));
    map.insert("description".to_string(), Value::String(space.description));
    Value::Map(map)
}

#[async_trait]
impl QueryEntity for SpacesDataSource {
    async fn query(&self, api: &dyn QlikApi, filter: &Attributes) -> Result<Overlay, MapperError> {
        let mut list_filter = ListFilter::with_limit(DEFAULT_PAGE_SIZE);
        let name = optional_str(filter, "name")?;
        if !name.is_empty() {
            list_filter = list_filter.name(name);
        }

        let spaces = api
            .list_spaces(&list_filter)
            .await
            .map_err(|e| self.remote_error(Operation::Query, None, e))?;

        Ok(Overlay::new().set(
            "spaces",
            Value::List(spaces.into_iter().map(space_to_value).collect()),
        ))
    }
}
