//! QlikClient - reqwest-backed implementation of `QlikApi`

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api::QlikApi;
use crate::auth::{ClientCredentials, TokenSource};
use crate::error::{ClientError, ClientResult};
use crate::models::{
    Connection, ConnectionCreate, ConnectionStringRequest, ConnectionStringResponse,
    ConnectionUpdate, CreateSpace, DataApp, DataAppRequest, DataAppResponse, DataGateway,
    DataProjectConfiguration, DataProjectRequest, DataProjectResponse, ListFilter, ListResponse,
    SourceEntitiesQuery, SourceEntity, SourceEntityList, SourceSelection, SourceSelectionKey,
    SourceSelectionPut, Space, UpdateSpace,
};

const SPACES: &str = "/api/v1/spaces";
const DATA_CONNECTIONS: &str = "/api/v1/data-connections";
const DATA_SOURCES: &str = "/api/v1/data-sources";
const DI_PROJECTS: &str = "/api/v1/di-projects";
const DATA_GATEWAYS: &str = "/api/v1/data-gateways";

/// Authenticated client for one Qlik Cloud tenant
pub struct QlikClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenSource,
}

impl std::fmt::Debug for QlikClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QlikClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl QlikClient {
    /// Create a client for `base_url` (e.g., "https://tenant.eu.qlikcloud.com")
    pub fn new(base_url: impl Into<String>, credentials: ClientCredentials) -> ClientResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base URL is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        let tokens = TokenSource::new(&base_url, credentials);
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<serde_json::Value>,
    ) -> ClientResult<String> {
        let url = format!("{}{}", self.base_url, path);
        let token = self.tokens.bearer(&self.http).await?;
        log::debug!("{} {}", method, path);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(token)
            .header("Accept", "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| ClientError::Transport {
                path: path.to_string(),
                source,
            })?;

        if status.is_success() {
            return Ok(text);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound {
                method: method.to_string(),
                path: path.to_string(),
                message: text,
            });
        }
        Err(ClientError::Http {
            status: status.as_u16(),
            method: method.to_string(),
            path: path.to_string(),
            message: text,
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<serde_json::Value>,
    ) -> ClientResult<T> {
        let text = self.execute(method, path, query, body).await?;
        serde_json::from_str(&text).map_err(|e| ClientError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(Method::GET, path, &[], None).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = encode(path, body)?;
        self.send(Method::POST, path, &[], Some(body)).await
    }

    async fn put<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = encode(path, body)?;
        self.send(Method::PUT, path, &[], Some(body)).await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        self.execute(Method::DELETE, path, &[], None).await?;
        Ok(())
    }
}

fn encode<B: Serialize>(path: &str, body: &B) -> ClientResult<serde_json::Value> {
    serde_json::to_value(body).map_err(|e| ClientError::Decode {
        path: path.to_string(),
        message: format!("failed to encode request body: {}", e),
    })
}

fn app_path(project_id: &str, app_id: &str) -> String {
    format!("{}/{}/di-apps/{}", DI_PROJECTS, project_id, app_id)
}

#[async_trait]
impl QlikApi for QlikClient {
    async fn create_space(&self, request: &CreateSpace) -> ClientResult<Space> {
        self.post(SPACES, request).await
    }

    async fn get_space(&self, space_id: &str) -> ClientResult<Space> {
        self.get(&format!("{}/{}", SPACES, space_id)).await
    }

    async fn update_space(&self, space_id: &str, request: &UpdateSpace) -> ClientResult<Space> {
        self.put(&format!("{}/{}", SPACES, space_id), request).await
    }

    async fn delete_space(&self, space_id: &str) -> ClientResult<()> {
        self.delete(&format!("{}/{}", SPACES, space_id)).await
    }

    async fn list_spaces(&self, filter: &ListFilter) -> ClientResult<Vec<Space>> {
        let list: ListResponse<Space> = self
            .send(Method::GET, SPACES, &filter.query_pairs(), None)
            .await?;
        Ok(list.data)
    }

    async fn create_connection(&self, request: &ConnectionCreate) -> ClientResult<Connection> {
        self.post(DATA_CONNECTIONS, request).await
    }

    async fn get_connection(&self, connection_id: &str) -> ClientResult<Connection> {
        self.get(&format!("{}/{}", DATA_CONNECTIONS, connection_id))
            .await
    }

    async fn update_connection(
        &self,
        connection_id: &str,
        request: &ConnectionUpdate,
    ) -> ClientResult<()> {
        let path = format!("{}/{}", DATA_CONNECTIONS, connection_id);
        let body = encode(&path, request)?;
        // answered with 204 and no body
        self.execute(Method::PUT, &path, &[], Some(body)).await?;
        Ok(())
    }

    async fn delete_connection(&self, connection_id: &str) -> ClientResult<()> {
        self.delete(&format!("{}/{}", DATA_CONNECTIONS, connection_id))
            .await
    }

    async fn list_connections(&self, filter: &ListFilter) -> ClientResult<Vec<Connection>> {
        let list: ListResponse<Connection> = self
            .send(Method::GET, DATA_CONNECTIONS, &filter.query_pairs(), None)
            .await?;
        Ok(list.data)
    }

    async fn get_connection_string(
        &self,
        request: &ConnectionStringRequest,
    ) -> ClientResult<ConnectionStringResponse> {
        let path = format!(
            "{}/{}/actions/connection-string",
            DATA_SOURCES, request.data_source_id
        );
        self.post(&path, request).await
    }

    async fn create_data_project(
        &self,
        request: &DataProjectRequest,
    ) -> ClientResult<DataProjectConfiguration> {
        let response: DataProjectResponse = self.post(DI_PROJECTS, request).await?;
        Ok(response.data_project)
    }

    async fn get_data_project(&self, project_id: &str) -> ClientResult<DataProjectConfiguration> {
        let response: DataProjectResponse =
            self.get(&format!("{}/{}", DI_PROJECTS, project_id)).await?;
        Ok(response.data_project)
    }

    async fn update_data_project(
        &self,
        project_id: &str,
        request: &DataProjectRequest,
    ) -> ClientResult<DataProjectConfiguration> {
        let response: DataProjectResponse = self
            .put(&format!("{}/{}", DI_PROJECTS, project_id), request)
            .await?;
        Ok(response.data_project)
    }

    async fn delete_data_project(&self, project_id: &str) -> ClientResult<()> {
        self.delete(&format!("{}/{}", DI_PROJECTS, project_id))
            .await
    }

    async fn create_data_app(
        &self,
        project_id: &str,
        request: &DataAppRequest,
    ) -> ClientResult<DataApp> {
        let path = format!("{}/{}/di-apps", DI_PROJECTS, project_id);
        let response: DataAppResponse = self.post(&path, request).await?;
        Ok(response.data_app)
    }

    async fn get_data_app(&self, project_id: &str, app_id: &str) -> ClientResult<DataApp> {
        let response: DataAppResponse = self.get(&app_path(project_id, app_id)).await?;
        Ok(response.data_app)
    }

    async fn update_data_app(
        &self,
        project_id: &str,
        app_id: &str,
        request: &DataAppRequest,
    ) -> ClientResult<DataApp> {
        let response: DataAppResponse = self.put(&app_path(project_id, app_id), request).await?;
        Ok(response.data_app)
    }

    async fn delete_data_app(&self, project_id: &str, app_id: &str) -> ClientResult<()> {
        self.delete(&app_path(project_id, app_id)).await
    }

    async fn put_source_selection(
        &self,
        project_id: &str,
        app_id: &str,
        request: &SourceSelectionPut,
    ) -> ClientResult<SourceSelectionKey> {
        let path = format!("{}/source-selection", app_path(project_id, app_id));
        self.put(&path, request).await
    }

    async fn get_source_selection(
        &self,
        project_id: &str,
        app_id: &str,
    ) -> ClientResult<SourceSelection> {
        let path = format!("{}/source-selection", app_path(project_id, app_id));
        self.get(&path).await
    }

    async fn search_source_entities(
        &self,
        project_id: &str,
        app_id: &str,
        query: &SourceEntitiesQuery,
    ) -> ClientResult<Vec<SourceEntity>> {
        let path = format!(
            "{}/source-entities/actions/search",
            app_path(project_id, app_id)
        );
        let list: SourceEntityList = self.post(&path, query).await?;
        Ok(list.entities)
    }

    async fn get_data_gateway(&self, gateway_id: &str) -> ClientResult<DataGateway> {
        self.get(&format!("{}/{}", DATA_GATEWAYS, gateway_id)).await
    }
}
