//! QlikApi - The set of remote calls the provider depends on
//!
//! One method per platform endpoint. `QlikClient` implements it over HTTPS;
//! tests substitute an in-memory implementation.

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::models::{
    Connection, ConnectionCreate, ConnectionStringRequest, ConnectionStringResponse,
    ConnectionUpdate, CreateSpace, DataApp, DataAppRequest, DataGateway, DataProjectConfiguration,
    DataProjectRequest, ListFilter, SourceEntitiesQuery, SourceEntity, SourceSelection,
    SourceSelectionKey, SourceSelectionPut, Space, UpdateSpace,
};

#[async_trait]
pub trait QlikApi: Send + Sync {
    // Spaces
    async fn create_space(&self, request: &CreateSpace) -> ClientResult<Space>;
    async fn get_space(&self, space_id: &str) -> ClientResult<Space>;
    async fn update_space(&self, space_id: &str, request: &UpdateSpace) -> ClientResult<Space>;
    async fn delete_space(&self, space_id: &str) -> ClientResult<()>;
    async fn list_spaces(&self, filter: &ListFilter) -> ClientResult<Vec<Space>>;

    // Data connections
    async fn create_connection(&self, request: &ConnectionCreate) -> ClientResult<Connection>;
    async fn get_connection(&self, connection_id: &str) -> ClientResult<Connection>;
    async fn update_connection(
        &self,
        connection_id: &str,
        request: &ConnectionUpdate,
    ) -> ClientResult<()>;
    async fn delete_connection(&self, connection_id: &str) -> ClientResult<()>;
    async fn list_connections(&self, filter: &ListFilter) -> ClientResult<Vec<Connection>>;
    async fn get_connection_string(
        &self,
        request: &ConnectionStringRequest,
    ) -> ClientResult<ConnectionStringResponse>;

    // Data projects
    async fn create_data_project(
        &self,
        request: &DataProjectRequest,
    ) -> ClientResult<DataProjectConfiguration>;
    async fn get_data_project(&self, project_id: &str) -> ClientResult<DataProjectConfiguration>;
    async fn update_data_project(
        &self,
        project_id: &str,
        request: &DataProjectRequest,
    ) -> ClientResult<DataProjectConfiguration>;
    async fn delete_data_project(&self, project_id: &str) -> ClientResult<()>;

    // Data apps
    async fn create_data_app(
        &self,
        project_id: &str,
        request: &DataAppRequest,
    ) -> ClientResult<DataApp>;
    async fn get_data_app(&self, project_id: &str, app_id: &str) -> ClientResult<DataApp>;
    async fn update_data_app(
        &self,
        project_id: &str,
        app_id: &str,
        request: &DataAppRequest,
    ) -> ClientResult<DataApp>;
    async fn delete_data_app(&self, project_id: &str, app_id: &str) -> ClientResult<()>;

    // Source selection of a data app
    async fn put_source_selection(
        &self,
        project_id: &str,
        app_id: &str,
        request: &SourceSelectionPut,
    ) -> ClientResult<SourceSelectionKey>;
    async fn get_source_selection(
        &self,
        project_id: &str,
        app_id: &str,
    ) -> ClientResult<SourceSelection>;
    async fn search_source_entities(
        &self,
        project_id: &str,
        app_id: &str,
        query: &SourceEntitiesQuery,
    ) -> ClientResult<Vec<SourceEntity>>;

    // Data gateways
    async fn get_data_gateway(&self, gateway_id: &str) -> ClientResult<DataGateway>;
}
