//! qlik_source_entities data source - Source entities matching one include pattern
//!
//! Patterns are evaluated by the platform; nothing is filtered locally.

use async_trait::async_trait;
use qlik_client::QlikApi;
use qlik_client::models::{
    EntitySearchSelection, EntitySearchSource, IncludePattern, SourceEntitiesQuery,
};
use qlik_core::provider::ResourceType;
use qlik_core::resource::{Attributes, Value};
use qlik_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::mapper::{Entity, MapperError, Operation, Overlay, QueryEntity, required_str};
use crate::resources::data_app_source_selection::{
    source_entity_attributes, source_entity_to_value,
};

pub struct SourceEntitiesDataSource;

impl ResourceType for SourceEntitiesDataSource {
    fn name(&self) -> &'static str {
        "qlik_source_entities"
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(self.name())
            .attribute(AttributeSchema::string("project_id").required())
            .attribute(AttributeSchema::string("app_id").required())
            .attribute(AttributeSchema::string("source_connection_id").required())
            .attribute(AttributeSchema::string("database").required())
            .attribute(AttributeSchema::string("table_pattern").required())
            .attribute(AttributeSchema::string("schema_pattern").required())
            .attribute(AttributeSchema::string("entity_type").required())
            .attribute(
                AttributeSchema::new(
                    "entities",
                    AttributeType::ListOfObjects(source_entity_attributes(false)),
                )
                .computed(),
            )
    }
}

impl Entity for SourceEntitiesDataSource {
    fn display_name(&self) -> &'static str {
        "Source Entities"
    }
}

fn search_query(filter: &Attributes) -> Result<SourceEntitiesQuery, MapperError> {
    let pattern = IncludePattern {
        project_id: required_str(filter, "project_id")?,
        database: required_str(filter, "database")?,
        table_pattern: required_str(filter, "table_pattern")?,
        schema_pattern: required_str(filter, "schema_pattern")?,
        entity_type: required_str(filter, "entity_type")?,
    };
    Ok(SourceEntitiesQuery {
        source_selection: EntitySearchSource {
            data_entities_selection: EntitySearchSelection {
                source_connection_id: required_str(filter, "source_connection_id")?,
                include_patterns: vec![pattern],
            },
        },
    })
}

#[async_trait]
impl QueryEntity for SourceEntitiesDataSource {
    async fn query(&self, api: &dyn QlikApi, filter: &Attributes) -> Result<Overlay, MapperError> {
        let project_id = required_str(filter, "project_id")?;
        let app_id = required_str(filter, "app_id")?;
        let query = search_query(filter)?;

        let entities = api
            .search_source_entities(&project_id, &app_id, &query)
            .await
            .map_err(|e| self.remote_error(Operation::Query, None, e))?;

        Ok(Overlay::new().set(
            "entities",
            Value::List(entities.iter().map(source_entity_to_value).collect()),
        ))
    }
}
