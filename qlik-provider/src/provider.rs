//! QlikProvider - Registry of resource and data source mappers
//!
//! Configured once with a client handle and then serves every lifecycle call
//! by dispatching on the resource type.

use std::sync::Arc;

use qlik_client::{ClientCredentials, QlikApi, QlikClient};
use qlik_core::diagnostics::{Diagnostic, Diagnostics};
use qlik_core::provider::{BoxFuture, Provider, ProviderError, ProviderResult, ResourceType};
use qlik_core::resource::{Attributes, Resource, ResourceId, State, Value};

use crate::config::{EnvLookup, ProviderSettings, resolve_config};
use crate::data_sources::{data_source_handlers, data_source_types};
use crate::mapper::{DataSourceHandler, MapperError, Operation, ResourceHandler};
use crate::resources::{resource_handlers, resource_types};

pub struct QlikProvider {
    resources: Vec<Box<dyn ResourceHandler>>,
    data_sources: Vec<Box<dyn DataSourceHandler>>,
}

impl QlikProvider {
    /// Build the registry around an already configured client
    pub fn new(api: Arc<dyn QlikApi>) -> Self {
        Self {
            resources: resource_handlers(&api),
            data_sources: data_source_handlers(&api),
        }
    }

    /// Resolve settings against the environment and connect to the tenant
    pub fn configure(
        settings: &ProviderSettings,
        env: &dyn EnvLookup,
    ) -> Result<Self, Diagnostics> {
        let config = resolve_config(settings, env)?;
        log::debug!("Configuring Qlik Cloud client for {}", config.base_url());

        let client = QlikClient::new(
            config.base_url(),
            ClientCredentials::new(config.client_id.clone(), config.client_secret.clone()),
        )
        .map_err(|e| {
            Diagnostics::from(Diagnostic::error(
                "Unable to Create Qlik Cloud Client",
                format!(
                    "An unexpected error occurred when creating the Qlik Cloud client.\n\nQlik Cloud Client Error: {}",
                    e
                ),
            ))
        })?;

        Ok(Self::new(Arc::new(client)))
    }

    fn resource_handler(&self, id: &ResourceId) -> ProviderResult<&dyn ResourceHandler> {
        self.resources
            .iter()
            .find(|h| h.type_name() == id.resource_type)
            .map(|h| h.as_ref())
            .ok_or_else(|| {
                ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
                    .for_resource(id.clone())
            })
    }

    fn data_source_handler(&self, id: &ResourceId) -> ProviderResult<&dyn DataSourceHandler> {
        self.data_sources
            .iter()
            .find(|h| h.type_name() == id.resource_type)
            .map(|h| h.as_ref())
            .ok_or_else(|| {
                ProviderError::new(format!("Unknown data source type: {}", id.resource_type))
                    .for_resource(id.clone())
            })
    }
}

fn mapper_error(
    operation: Operation,
    entity: &str,
    id: &ResourceId,
    err: MapperError,
) -> ProviderError {
    let summary = match operation {
        Operation::Query => format!("Unable to Read Qlik Cloud {}", entity),
        _ => format!("Error {} {}", operation.gerund(), entity),
    };
    ProviderError::new(summary)
        .with_detail(err.to_string())
        .for_resource(id.clone())
        .with_cause(err)
}

/// State for a resource whose attributes came back from the platform
fn existing_state(id: ResourceId, attributes: Attributes) -> State {
    let identifier = attributes
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string);
    let state = State::existing(id, attributes);
    match identifier {
        Some(identifier) => state.with_identifier(identifier),
        None => state,
    }
}

/// Computed attributes the plan leaves unknown keep their prior value
fn merge_prior_computed(handler: &dyn ResourceHandler, from: &State, to: &Resource) -> Attributes {
    let schema = handler.schema();
    let mut attributes = to.attributes.clone();
    for name in schema.computed_attributes() {
        if !attributes.contains_key(name)
            && let Some(value) = from.attributes.get(name)
        {
            attributes.insert(name.to_string(), value.clone());
        }
    }
    attributes
}

impl Provider for QlikProvider {
    fn name(&self) -> &'static str {
        "qlik"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resource_types()
    }

    fn data_source_types(&self) -> Vec<Box<dyn ResourceType>> {
        data_source_types()
    }

    fn read(&self, current: &State) -> BoxFuture<'_, ProviderResult<State>> {
        let current = current.clone();
        Box::pin(async move {
            let handler = self.resource_handler(&current.id)?;
            match handler.read(&current.attributes).await {
                Ok(attributes) => Ok(existing_state(current.id, attributes)),
                Err(e) if e.is_not_found() => {
                    log::warn!(
                        "{} no longer exists remotely, removing it from state: {}",
                        current.id,
                        e
                    );
                    Ok(State::not_found(current.id))
                }
                Err(e) => Err(mapper_error(
                    Operation::Read,
                    handler.display_name(),
                    &current.id,
                    e,
                )),
            }
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            let handler = self.resource_handler(&resource.id)?;
            let attributes = handler.create(&resource.attributes).await.map_err(|e| {
                mapper_error(Operation::Create, handler.display_name(), &resource.id, e)
            })?;
            Ok(existing_state(resource.id, attributes))
        })
    }

    fn update(
        &self,
        id: &ResourceId,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move {
            let handler = self.resource_handler(&id)?;
            let planned = merge_prior_computed(handler, &from, &to);
            let attributes = handler
                .update(&planned)
                .await
                .map_err(|e| mapper_error(Operation::Update, handler.display_name(), &id, e))?;
            Ok(existing_state(id, attributes))
        })
    }

    fn delete(&self, current: &State) -> BoxFuture<'_, ProviderResult<()>> {
        let current = current.clone();
        Box::pin(async move {
            let handler = self.resource_handler(&current.id)?;
            handler.delete(&current.attributes).await.map_err(|e| {
                mapper_error(Operation::Delete, handler.display_name(), &current.id, e)
            })
        })
    }

    fn read_data_source(&self, query: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let query = query.clone();
        Box::pin(async move {
            let handler = self.data_source_handler(&query.id)?;
            let attributes = handler.query(&query.attributes).await.map_err(|e| {
                mapper_error(Operation::Query, handler.display_name(), &query.id, e)
            })?;
            Ok(existing_state(query.id, attributes))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use qlik_client::models::{DataGateway, SourceEntity, Space};

    use crate::fake::FakeApi;

    fn setup() -> (Arc<FakeApi>, QlikProvider) {
        let fake = Arc::new(FakeApi::new());
        let provider = QlikProvider::new(fake.clone());
        (fake, provider)
    }

    fn attrs(pairs: &[(&str, Value)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn s(value: &str) -> Value {
        Value::string(value)
    }

    fn resource(resource_type: &str, pairs: &[(&str, Value)]) -> Resource {
        Resource {
            id: ResourceId::new(resource_type, "main"),
            attributes: attrs(pairs),
            read_only: false,
        }
    }

    fn snowflake_connection() -> Resource {
        let params = attrs(&[
            ("server", s("host1")),
            ("username", s("u")),
            ("warehouse", s("w")),
            ("database", s("d")),
            ("metadata_schema", s("s")),
            ("password", s("p")),
        ]);
        resource(
            "qlik_data_connection",
            &[
                ("name", s("warehouse")),
                ("space_id", s("space-9")),
                ("gateway_id", s("gw-1")),
                ("type", s("reptgt_qdisnowflake")),
                ("connection_parameters", Value::Map(params)),
            ],
        )
    }

    fn assert_same(a: &State, b: &State, fields: &[&str]) {
        for field in fields {
            assert_eq!(
                a.attributes.get(*field),
                b.attributes.get(*field),
                "attribute {} differs",
                field
            );
        }
    }

    #[tokio::test]
    async fn space_round_trips_through_read() {
        let (_, provider) = setup();
        let desired = resource(
            "qlik_space",
            &[
                ("name", s("analytics")),
                ("type", s("shared")),
                ("description", s("team space")),
            ],
        );

        let created = provider.create(&desired).await.unwrap();
        assert_eq!(created.identifier.as_deref(), Some("space-1"));
        assert_eq!(created.attributes.get("owner_id"), Some(&s("user-1")));

        let read = provider.read(&created).await.unwrap();
        assert!(read.exists);
        assert_same(&created, &read, &["id", "name", "type", "description", "owner_id"]);
    }

    #[tokio::test]
    async fn unset_optional_description_stays_unset_after_read() {
        let (_, provider) = setup();
        let desired = resource("qlik_space", &[("name", s("a")), ("type", s("shared"))]);

        let created = provider.create(&desired).await.unwrap();
        let read = provider.read(&created).await.unwrap();
        assert!(!read.attributes.contains_key("description"));
    }

    #[tokio::test]
    async fn data_connection_create_sends_connection_string_results() {
        let (fake, provider) = setup();

        let created = provider.create(&snowflake_connection()).await.unwrap();

        let requests = fake.connection_string_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].properties_list.len(), 14);
        assert_eq!(requests[0].properties_list[1].value, "gw-1");

        let creates = fake.connection_creates();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].log_on, 1);
        assert_eq!(creates[0].driver, "QlikConnectorsCommonService.exe");
        assert_eq!(creates[0].data_source_id, "reptgt_qdisnowflake");
        assert_eq!(creates[0].username, "u");
        assert_eq!(creates[0].password, "enc:p");

        assert_eq!(created.attributes.get("driver"), Some(&s("QlikConnectorsCommonService.exe")));
        assert!(created.attributes.contains_key("engine_id"));
        assert!(created.attributes.contains_key("credentials_id"));
        assert!(created.attributes.contains_key("connect_statement"));
    }

    #[tokio::test]
    async fn data_connection_read_never_returns_password() {
        let (_, provider) = setup();
        let created = provider.create(&snowflake_connection()).await.unwrap();

        let mut without_params = created.clone();
        without_params.attributes.remove("connection_parameters");
        let read = provider.read(&without_params).await.unwrap();
        assert!(!read.attributes.contains_key("connection_parameters"));
        assert_same(&created, &read, &["id", "name", "space_id"]);

        // With the password in prior state it is carried over untouched
        let read = provider.read(&created).await.unwrap();
        assert_eq!(
            read.attributes.get("connection_parameters"),
            created.attributes.get("connection_parameters")
        );
    }

    #[tokio::test]
    async fn sap_connections_are_refused_without_remote_calls() {
        let (fake, provider) = setup();
        let mut desired = snowflake_connection();
        desired
            .attributes
            .insert("type".to_string(), s("SAP_APPLICATION"));

        let err = provider.create(&desired).await.unwrap_err();
        assert_eq!(err.message, "Error creating Data Connection");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_connector_tag_is_an_error() {
        let (fake, provider) = setup();
        let mut desired = snowflake_connection();
        desired.attributes.insert("type".to_string(), s("postgres"));

        let err = provider.create(&desired).await.unwrap_err();
        assert!(err.detail.unwrap().contains("postgres"));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn update_keeps_computed_attributes_from_prior_state() {
        let (_, provider) = setup();
        let created = provider.create(&snowflake_connection()).await.unwrap();

        let mut desired = snowflake_connection();
        desired.attributes.insert("name".to_string(), s("renamed"));
        let updated = provider
            .update(&desired.id, &created, &desired)
            .await
            .unwrap();

        assert_eq!(updated.identifier, created.identifier);
        assert_same(&created, &updated, &["engine_id", "credentials_id", "credentials_name"]);
        assert_eq!(updated.attributes.get("name"), Some(&s("renamed")));

        let read = provider.read(&updated).await.unwrap();
        assert_eq!(read.attributes.get("name"), Some(&s("renamed")));
    }

    #[tokio::test]
    async fn unchanged_update_is_idempotent_for_every_resource() {
        let (_, provider) = setup();
        let cases = vec![
            (
                resource("qlik_space", &[("name", s("a")), ("type", s("shared"))]),
                vec!["name", "type", "description", "owner_id"],
            ),
            (snowflake_connection(), vec!["name", "space_id"]),
            (
                resource(
                    "qlik_data_project",
                    &[
                        ("name", s("lake")),
                        ("description", s("raw")),
                        ("space_id", s("space-9")),
                        ("lakehouse_type", s("QLIK")),
                        ("type", s("DATA_PIPELINE")),
                        ("storage_connection", s("conn-1")),
                    ],
                ),
                vec!["name", "description", "batch_mode"],
            ),
            (
                resource(
                    "qlik_data_app",
                    &[
                        ("name", s("orders")),
                        ("type", s("LANDING")),
                        ("project_id", s("project-1")),
                    ],
                ),
                vec!["name", "description"],
            ),
        ];

        for (desired, fields) in cases {
            let created = provider.create(&desired).await.unwrap();
            let updated = provider
                .update(&desired.id, &created, &desired)
                .await
                .unwrap();
            let read = provider.read(&updated).await.unwrap();
            assert_same(&created, &read, &fields);
        }
    }

    #[tokio::test]
    async fn data_project_batch_mode_defaults_to_true() {
        let (_, provider) = setup();
        let desired = resource(
            "qlik_data_project",
            &[
                ("name", s("lake")),
                ("space_id", s("space-9")),
                ("lakehouse_type", s("QLIK")),
                ("type", s("DATA_PIPELINE")),
                ("storage_connection", s("conn-1")),
            ],
        );

        let created = provider.create(&desired).await.unwrap();
        assert_eq!(created.attributes.get("batch_mode"), Some(&Value::Bool(true)));
    }

    #[tokio::test]
    async fn unset_batch_mode_returns_to_default_on_update() {
        let (_, provider) = setup();
        let project = |batch_mode: Option<bool>| {
            let mut desired = resource(
                "qlik_data_project",
                &[
                    ("name", s("lake")),
                    ("space_id", s("space-9")),
                    ("lakehouse_type", s("QLIK")),
                    ("type", s("DATA_PIPELINE")),
                    ("storage_connection", s("conn-1")),
                ],
            );
            if let Some(batch_mode) = batch_mode {
                desired
                    .attributes
                    .insert("batch_mode".to_string(), Value::Bool(batch_mode));
            }
            desired
        };

        let created = provider.create(&project(Some(false))).await.unwrap();
        assert_eq!(created.attributes.get("batch_mode"), Some(&Value::Bool(false)));

        let desired = project(None);
        let updated = provider
            .update(&desired.id, &created, &desired)
            .await
            .unwrap();
        assert_eq!(updated.attributes.get("batch_mode"), Some(&Value::Bool(true)));
        assert_eq!(updated.identifier, created.identifier);
    }

    #[tokio::test]
    async fn read_after_delete_drops_resource_from_state() {
        let (_, provider) = setup();
        let desired = resource("qlik_space", &[("name", s("a")), ("type", s("shared"))]);
        let created = provider.create(&desired).await.unwrap();

        provider.delete(&created).await.unwrap();

        let read = provider.read(&created).await.unwrap();
        assert!(!read.exists);

        // A second delete surfaces the remote error unchanged
        let err = provider.delete(&created).await.unwrap_err();
        assert_eq!(err.message, "Error deleting Space");
        assert!(err.detail.unwrap().contains("404"));
    }

    #[tokio::test]
    async fn mapper_read_after_delete_is_a_typed_not_found() {
        let (fake, _) = setup();
        let api: Arc<dyn QlikApi> = fake;
        let handlers = crate::resources::resource_handlers(&api);
        let spaces = &handlers[0];

        let created = spaces
            .create(&attrs(&[("name", s("a")), ("type", s("shared"))]))
            .await
            .unwrap();
        spaces.delete(&created).await.unwrap();

        let err = spaces.read(&created).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn missing_required_attribute_fails_before_any_call() {
        let (fake, provider) = setup();
        let desired = resource("qlik_space", &[("name", s("a"))]);

        let err = provider.create(&desired).await.unwrap_err();
        assert_eq!(err.message, "Error creating Space");
        assert!(err.detail.unwrap().contains("'type'"));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn source_selection_is_replaced_on_every_write() {
        let (fake, provider) = setup();
        let entity = |id: &str| {
            Value::Map(attrs(&[
                ("id", s(id)),
                ("name", s(id)),
                ("data_app_id", s("app-1")),
                ("schema", s("PUBLIC")),
                ("database", s("SALES")),
                ("type", s("TABLE")),
                ("project_id", s("project-1")),
            ]))
        };
        let selection = |entities: Vec<Value>| {
            resource(
                "qlik_data_app_source_selection",
                &[
                    ("project_id", s("project-1")),
                    ("app_id", s("app-1")),
                    ("source_connection_id", s("conn-1")),
                    ("source_selection", Value::List(entities)),
                ],
            )
        };

        let first = selection(vec![entity("orders"), entity("customers")]);
        let created = provider.create(&first).await.unwrap();
        let key = created.identifier.clone().unwrap();

        let second = selection(vec![entity("invoices")]);
        let updated = provider.update(&second.id, &created, &second).await.unwrap();
        assert_eq!(updated.identifier.as_deref(), Some(key.as_str()));

        let read = provider.read(&updated).await.unwrap();
        let list = read.attributes.get("source_selection").unwrap().as_list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].as_map().unwrap().get("id"), Some(&s("invoices")));

        provider.delete(&read).await.unwrap();
        let cleared = fake.selection("project-1", "app-1").unwrap();
        assert!(cleared.data_entities.is_empty());
        assert_eq!(cleared.source_connection_id, "conn-1");
    }

    #[tokio::test]
    async fn spaces_listing_requests_one_page() {
        let (fake, provider) = setup();
        for i in 0..12 {
            fake.add_space(Space {
                id: format!("s{:02}", i),
                name: format!("sales-{}", i),
                space_type: "shared".to_string(),
                ..Default::default()
            });
        }

        let query = resource("qlik_spaces", &[("name", s("sales"))]).with_read_only(true);
        let state = provider.read_data_source(&query).await.unwrap();

        let spaces = state.attributes.get("spaces").unwrap().as_list().unwrap();
        assert_eq!(spaces.len(), 10);
        let filters = fake.list_filters();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].limit, 10);
        assert_eq!(filters[0].name.as_deref(), Some("sales"));
    }

    #[tokio::test]
    async fn spaces_listing_without_name_sends_no_name_filter() {
        let (fake, provider) = setup();
        let query = resource("qlik_spaces", &[]).with_read_only(true);
        provider.read_data_source(&query).await.unwrap();
        assert_eq!(fake.list_filters()[0].name, None);
    }

    #[tokio::test]
    async fn data_connections_listing_reports_driver_as_type() {
        let (fake, provider) = setup();
        provider.create(&snowflake_connection()).await.unwrap();

        let query = resource("qlik_data_connections", &[]).with_read_only(true);
        let state = provider.read_data_source(&query).await.unwrap();

        let items = state
            .attributes
            .get("data_connections")
            .unwrap()
            .as_list()
            .unwrap();
        let first = items[0].as_map().unwrap();
        assert_eq!(first.get("type"), Some(&s("QlikConnectorsCommonService.exe")));
        assert_eq!(first.get("data_source_id"), Some(&s("reptgt_qdisnowflake")));
        assert_eq!(fake.list_filters()[0].limit, 10);
    }

    #[tokio::test]
    async fn gateway_lookup_by_id() {
        let (fake, provider) = setup();
        fake.add_gateway(DataGateway {
            id: "gw-1".to_string(),
            name: "on-prem".to_string(),
            gateway_type: "DATA_MOVEMENT".to_string(),
            description: String::new(),
            space_id: "space-9".to_string(),
        });

        let query = resource("qlik_data_gateway", &[("id", s("gw-1"))]).with_read_only(true);
        let state = provider.read_data_source(&query).await.unwrap();
        assert_eq!(state.attributes.get("name"), Some(&s("on-prem")));
        assert_eq!(state.attributes.get("space_id"), Some(&s("space-9")));

        let missing = resource("qlik_data_gateway", &[("id", s("gw-2"))]).with_read_only(true);
        let err = provider.read_data_source(&missing).await.unwrap_err();
        assert_eq!(err.message, "Unable to Read Qlik Cloud DataGateway");
    }

    #[tokio::test]
    async fn source_entities_are_returned_as_the_platform_matched_them() {
        let (fake, provider) = setup();
        fake.add_source_entity(SourceEntity {
            id: "e1".to_string(),
            name: "ORDERS".to_string(),
            ..Default::default()
        });

        let query = resource(
            "qlik_source_entities",
            &[
                ("project_id", s("project-1")),
                ("app_id", s("app-1")),
                ("source_connection_id", s("conn-1")),
                ("database", s("SALES")),
                ("table_pattern", s("%")),
                ("schema_pattern", s("PUBLIC")),
                ("entity_type", s("TABLE")),
            ],
        )
        .with_read_only(true);
        let state = provider.read_data_source(&query).await.unwrap();

        let entities = state.attributes.get("entities").unwrap().as_list().unwrap();
        assert_eq!(entities.len(), 1);
        let queries = fake.entity_queries();
        assert_eq!(
            queries[0]
                .source_selection
                .data_entities_selection
                .include_patterns
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn unknown_types_are_rejected() {
        let (_, provider) = setup();
        let err = provider
            .create(&resource("qlik_app", &[]))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Unknown resource type: qlik_app");
    }

    #[test]
    fn registries_match_declared_types() {
        let (_, provider) = setup();
        let names: Vec<_> = provider.resource_types().iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "qlik_space",
                "qlik_data_connection",
                "qlik_data_project",
                "qlik_data_app",
                "qlik_data_app_source_selection",
            ]
        );
        let data_sources: HashMap<_, _> = provider
            .data_source_types()
            .iter()
            .map(|t| (t.name(), t.schema().attributes.len()))
            .collect();
        assert_eq!(data_sources.len(), 5);
        assert_eq!(data_sources.get("qlik_data_gateway"), Some(&5));
    }

    #[test]
    fn configure_reports_all_missing_settings() {
        let env: HashMap<String, String> = HashMap::new();
        let diagnostics = match QlikProvider::configure(&ProviderSettings::default(), &env) {
            Ok(_) => panic!("configuration should fail"),
            Err(diagnostics) => diagnostics,
        };
        assert_eq!(diagnostics.len(), 4);
    }
}
