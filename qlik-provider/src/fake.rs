//! In-memory QlikApi for tests
//!
//! Assigns ids the way the platform does and records every call so tests can
//! check what was sent.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use qlik_client::models::{
    Connection, ConnectionCreate, ConnectionStringRequest, ConnectionStringResponse,
    ConnectionUpdate, CreateSpace, DataApp, DataAppRequest, DataEntitiesSelection, DataGateway,
    DataProjectConfiguration, DataProjectRequest, ListFilter, SourceEntitiesQuery, SourceEntity,
    SourceSelection, SourceSelectionData, SourceSelectionKey, SourceSelectionPut, Space,
    UpdateSpace,
};
use qlik_client::{ClientError, ClientResult, QlikApi};

#[derive(Default)]
struct Store {
    next_id: u32,
    spaces: HashMap<String, Space>,
    connections: HashMap<String, Connection>,
    projects: HashMap<String, DataProjectConfiguration>,
    apps: HashMap<(String, String), DataApp>,
    selections: HashMap<(String, String), (String, DataEntitiesSelection)>,
    gateways: HashMap<String, DataGateway>,
    source_entities: Vec<SourceEntity>,
    connection_string_requests: Vec<ConnectionStringRequest>,
    connection_creates: Vec<ConnectionCreate>,
    list_filters: Vec<ListFilter>,
    entity_queries: Vec<SourceEntitiesQuery>,
    calls: Vec<String>,
}

impl Store {
    fn assign_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

#[derive(Default)]
pub struct FakeApi {
    store: Mutex<Store>,
}

fn not_found(method: &str, path: String) -> ClientError {
    ClientError::NotFound {
        method: method.to_string(),
        path,
        message: "Not Found".to_string(),
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_store<T>(&self, call: &str, f: impl FnOnce(&mut Store) -> T) -> T {
        let mut store = self.store.lock().unwrap();
        store.calls.push(call.to_string());
        f(&mut store)
    }

    pub fn add_gateway(&self, gateway: DataGateway) {
        let mut store = self.store.lock().unwrap();
        store.gateways.insert(gateway.id.clone(), gateway);
    }

    pub fn add_space(&self, space: Space) {
        let mut store = self.store.lock().unwrap();
        store.spaces.insert(space.id.clone(), space);
    }

    pub fn add_source_entity(&self, entity: SourceEntity) {
        self.store.lock().unwrap().source_entities.push(entity);
    }

    pub fn calls(&self) -> Vec<String> {
        self.store.lock().unwrap().calls.clone()
    }

    pub fn connection_string_requests(&self) -> Vec<ConnectionStringRequest> {
        self.store.lock().unwrap().connection_string_requests.clone()
    }

    pub fn connection_creates(&self) -> Vec<ConnectionCreate> {
        self.store.lock().unwrap().connection_creates.clone()
    }

    pub fn list_filters(&self) -> Vec<ListFilter> {
        self.store.lock().unwrap().list_filters.clone()
    }

    pub fn entity_queries(&self) -> Vec<SourceEntitiesQuery> {
        self.store.lock().unwrap().entity_queries.clone()
    }

    pub fn selection(&self, project_id: &str, app_id: &str) -> Option<DataEntitiesSelection> {
        self.store
            .lock()
            .unwrap()
            .selections
            .get(&(project_id.to_string(), app_id.to_string()))
            .map(|(_, selection)| selection.clone())
    }
}

#[async_trait]
impl QlikApi for FakeApi {
    async fn create_space(&self, request: &CreateSpace) -> ClientResult<Space> {
        self.with_store("create_space", |store| {
            let space = Space {
                id: store.assign_id("space"),
                name: request.name.clone(),
                space_type: request.space_type.clone(),
                description: request.description.clone(),
                owner_id: "user-1".to_string(),
            };
            store.spaces.insert(space.id.clone(), space.clone());
            Ok(space)
        })
    }

    async fn get_space(&self, space_id: &str) -> ClientResult<Space> {
        self.with_store("get_space", |store| {
            store
                .spaces
                .get(space_id)
                .cloned()
                .ok_or_else(|| not_found("GET", format!("/api/v1/spaces/{}", space_id)))
        })
    }

    async fn update_space(&self, space_id: &str, request: &UpdateSpace) -> ClientResult<Space> {
        self.with_store("update_space", |store| {
            let space = store
                .spaces
                .get_mut(space_id)
                .ok_or_else(|| not_found("PUT", format!("/api/v1/spaces/{}", space_id)))?;
            space.name = request.name.clone();
            space.description = request.description.clone();
            if !request.owner_id.is_empty() {
                space.owner_id = request.owner_id.clone();
            }
            Ok(space.clone())
        })
    }

    async fn delete_space(&self, space_id: &str) -> ClientResult<()> {
        self.with_store("delete_space", |store| {
            store
                .spaces
                .remove(space_id)
                .map(|_| ())
                .ok_or_else(|| not_found("DELETE", format!("/api/v1/spaces/{}", space_id)))
        })
    }

    async fn list_spaces(&self, filter: &ListFilter) -> ClientResult<Vec<Space>> {
        self.with_store("list_spaces", |store| {
            store.list_filters.push(filter.clone());
            let mut spaces: Vec<Space> = store
                .spaces
                .values()
                .filter(|s| filter.name.as_ref().is_none_or(|n| s.name.contains(n.as_str())))
                .cloned()
                .collect();
            spaces.sort_by(|a, b| a.id.cmp(&b.id));
            spaces.truncate(filter.limit as usize);
            Ok(spaces)
        })
    }

    async fn create_connection(&self, request: &ConnectionCreate) -> ClientResult<Connection> {
        self.with_store("create_connection", |store| {
            store.connection_creates.push(request.clone());
            let n = store.next_id + 1;
            let connection = Connection {
                id: store.assign_id("connection"),
                name: request.name.clone(),
                driver: request.driver.clone(),
                space_id: request.space_id.clone(),
                data_source_id: request.data_source_id.clone(),
                engine_id: format!("engine-{}", n),
                connect_statement: request.connect_statement.clone(),
                credentials_id: format!("credentials-{}", n),
                credentials_name: format!("{}-credentials", request.username),
            };
            store
                .connections
                .insert(connection.id.clone(), connection.clone());
            Ok(connection)
        })
    }

    async fn get_connection(&self, connection_id: &str) -> ClientResult<Connection> {
        self.with_store("get_connection", |store| {
            store.connections.get(connection_id).cloned().ok_or_else(|| {
                not_found("GET", format!("/api/v1/data-connections/{}", connection_id))
            })
        })
    }

    async fn update_connection(
        &self,
        connection_id: &str,
        request: &ConnectionUpdate,
    ) -> ClientResult<()> {
        self.with_store("update_connection", |store| {
            let connection = store.connections.get_mut(connection_id).ok_or_else(|| {
                not_found("PUT", format!("/api/v1/data-connections/{}", connection_id))
            })?;
            connection.name = request.name.clone();
            connection.space_id = request.space_id.clone();
            connection.connect_statement = request.connect_statement.clone();
            connection.driver = request.driver.clone();
            Ok(())
        })
    }

    async fn delete_connection(&self, connection_id: &str) -> ClientResult<()> {
        self.with_store("delete_connection", |store| {
            store.connections.remove(connection_id).map(|_| ()).ok_or_else(|| {
                not_found(
                    "DELETE",
                    format!("/api/v1/data-connections/{}", connection_id),
                )
            })
        })
    }

    async fn list_connections(&self, filter: &ListFilter) -> ClientResult<Vec<Connection>> {
        self.with_store("list_connections", |store| {
            store.list_filters.push(filter.clone());
            let mut connections: Vec<Connection> = store.connections.values().cloned().collect();
            connections.sort_by(|a, b| a.id.cmp(&b.id));
            connections.truncate(filter.limit as usize);
            Ok(connections)
        })
    }

    async fn get_connection_string(
        &self,
        request: &ConnectionStringRequest,
    ) -> ClientResult<ConnectionStringResponse> {
        self.with_store("get_connection_string", |store| {
            store.connection_string_requests.push(request.clone());
            let property = |name: &str| {
                request
                    .properties_list
                    .iter()
                    .find(|p| p.name == name)
                    .map(|p| p.value.clone())
                    .unwrap_or_default()
            };
            let password = request
                .credentials_properties_list
                .first()
                .map(|p| p.value.clone())
                .unwrap_or_default();
            Ok(ConnectionStringResponse {
                connection_string: format!(
                    "CUSTOM CONNECT TO \"provider={};server={};\"",
                    request.data_source_id,
                    property("server")
                ),
                user_id: property("username"),
                credentials_connection_string: format!("enc:{}", password),
            })
        })
    }

    async fn create_data_project(
        &self,
        request: &DataProjectRequest,
    ) -> ClientResult<DataProjectConfiguration> {
        self.with_store("create_data_project", |store| {
            let mut project = request.data.clone();
            project.id = store.assign_id("project");
            store.projects.insert(project.id.clone(), project.clone());
            Ok(project)
        })
    }

    async fn get_data_project(&self, project_id: &str) -> ClientResult<DataProjectConfiguration> {
        self.with_store("get_data_project", |store| {
            store
                .projects
                .get(project_id)
                .cloned()
                .ok_or_else(|| not_found("GET", format!("/api/v1/di-projects/{}", project_id)))
        })
    }

    async fn update_data_project(
        &self,
        project_id: &str,
        request: &DataProjectRequest,
    ) -> ClientResult<DataProjectConfiguration> {
        self.with_store("update_data_project", |store| {
            let project = store
                .projects
                .get_mut(project_id)
                .ok_or_else(|| not_found("PUT", format!("/api/v1/di-projects/{}", project_id)))?;
            *project = request.data.clone();
            project.id = project_id.to_string();
            Ok(project.clone())
        })
    }

    async fn delete_data_project(&self, project_id: &str) -> ClientResult<()> {
        self.with_store("delete_data_project", |store| {
            store.projects.remove(project_id).map(|_| ()).ok_or_else(|| {
                not_found("DELETE", format!("/api/v1/di-projects/{}", project_id))
            })
        })
    }

    async fn create_data_app(
        &self,
        project_id: &str,
        request: &DataAppRequest,
    ) -> ClientResult<DataApp> {
        self.with_store("create_data_app", |store| {
            let mut app = request.data.clone();
            app.id = store.assign_id("app");
            store
                .apps
                .insert((project_id.to_string(), app.id.clone()), app.clone());
            Ok(app)
        })
    }

    async fn get_data_app(&self, project_id: &str, app_id: &str) -> ClientResult<DataApp> {
        self.with_store("get_data_app", |store| {
            store
                .apps
                .get(&(project_id.to_string(), app_id.to_string()))
                .cloned()
                .ok_or_else(|| {
                    not_found(
                        "GET",
                        format!("/api/v1/di-projects/{}/di-apps/{}", project_id, app_id),
                    )
                })
        })
    }

    async fn update_data_app(
        &self,
        project_id: &str,
        app_id: &str,
        request: &DataAppRequest,
    ) -> ClientResult<DataApp> {
        self.with_store("update_data_app", |store| {
            let app = store
                .apps
                .get_mut(&(project_id.to_string(), app_id.to_string()))
                .ok_or_else(|| {
                    not_found(
                        "PUT",
                        format!("/api/v1/di-projects/{}/di-apps/{}", project_id, app_id),
                    )
                })?;
            *app = request.data.clone();
            app.id = app_id.to_string();
            Ok(app.clone())
        })
    }

    async fn delete_data_app(&self, project_id: &str, app_id: &str) -> ClientResult<()> {
        self.with_store("delete_data_app", |store| {
            store
                .apps
                .remove(&(project_id.to_string(), app_id.to_string()))
                .map(|_| ())
                .ok_or_else(|| {
                    not_found(
                        "DELETE",
                        format!("/api/v1/di-projects/{}/di-apps/{}", project_id, app_id),
                    )
                })
        })
    }

    async fn put_source_selection(
        &self,
        project_id: &str,
        app_id: &str,
        request: &SourceSelectionPut,
    ) -> ClientResult<SourceSelectionKey> {
        self.with_store("put_source_selection", |store| {
            let slot = (project_id.to_string(), app_id.to_string());
            let key = match store.selections.get(&slot) {
                Some((key, _)) => key.clone(),
                None => store.assign_id("selection"),
            };
            store.selections.insert(
                slot,
                (key.clone(), request.data.data_entities_selection.clone()),
            );
            Ok(SourceSelectionKey { key })
        })
    }

    async fn get_source_selection(
        &self,
        project_id: &str,
        app_id: &str,
    ) -> ClientResult<SourceSelection> {
        self.with_store("get_source_selection", |store| {
            store
                .selections
                .get(&(project_id.to_string(), app_id.to_string()))
                .map(|(key, selection)| SourceSelection {
                    key: key.clone(),
                    source_selection: SourceSelectionData {
                        data_entities_selection: selection.clone(),
                    },
                })
                .ok_or_else(|| {
                    not_found(
                        "GET",
                        format!(
                            "/api/v1/di-projects/{}/di-apps/{}/source-selection",
                            project_id, app_id
                        ),
                    )
                })
        })
    }

    async fn search_source_entities(
        &self,
        _project_id: &str,
        _app_id: &str,
        query: &SourceEntitiesQuery,
    ) -> ClientResult<Vec<SourceEntity>> {
        self.with_store("search_source_entities", |store| {
            store.entity_queries.push(query.clone());
            Ok(store.source_entities.clone())
        })
    }

    async fn get_data_gateway(&self, gateway_id: &str) -> ClientResult<DataGateway> {
        self.with_store("get_data_gateway", |store| {
            store
                .gateways
                .get(gateway_id)
                .cloned()
                .ok_or_else(|| not_found("GET", format!("/api/v1/data-gateways/{}", gateway_id)))
        })
    }
}
