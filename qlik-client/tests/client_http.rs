use qlik_client::models::{
    ConnectionProperty, ConnectionStringRequest, ConnectionUpdate, CreateSpace, DataApp,
    DataAppRequest, DataEntitiesSelection, DataProjectConfiguration, DataProjectRequest,
    ListFilter, SourceSelectionData, SourceSelectionPut,
};
use qlik_client::{ClientCredentials, ClientError, QlikApi, QlikClient};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_with_token() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_json(json!({
            "client_id": "client-1",
            "client_secret": "secret-1",
            "grant_type": "client_credentials"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token-abc",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    server
}

fn client_for(server: &MockServer) -> QlikClient {
    QlikClient::new(server.uri(), ClientCredentials::new("client-1", "secret-1")).unwrap()
}

#[tokio::test]
async fn create_space_posts_body_with_bearer_token() {
    let server = server_with_token().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/spaces"))
        .and(header("authorization", "Bearer token-abc"))
        .and(body_json(json!({
            "name": "analytics",
            "type": "shared",
            "description": ""
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "space-1",
            "name": "analytics",
            "type": "shared",
            "ownerId": "user-9"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let space = client
        .create_space(&CreateSpace {
            name: "analytics".to_string(),
            space_type: "shared".to_string(),
            description: String::new(),
        })
        .await
        .unwrap();

    assert_eq!(space.id, "space-1");
    assert_eq!(space.owner_id, "user-9");
    assert_eq!(space.description, "");
}

#[tokio::test]
async fn token_is_reused_across_calls() {
    let server = server_with_token().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/spaces/space-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "space-1",
            "name": "analytics",
            "type": "shared"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.get_space("space-1").await.unwrap();
    client.get_space("space-1").await.unwrap();
    // The token mock expects exactly one call; verified when the server drops.
}

#[tokio::test]
async fn missing_entity_maps_to_not_found() {
    let server = server_with_token().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/spaces/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("space not found"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_space("gone").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("space not found"));
}

#[tokio::test]
async fn other_failures_keep_status_and_body() {
    let server = server_with_token().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/spaces/space-1"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = client_for(&server).delete_space("space-1").await.unwrap_err();
    match err {
        ClientError::Http {
            status, message, ..
        } => {
            assert_eq!(status, 403);
            assert_eq!(message, "forbidden");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn rejected_credentials_surface_as_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_space("space-1").await.unwrap_err();
    assert!(matches!(err, ClientError::Auth { status: 401, .. }));
}

#[tokio::test]
async fn list_spaces_sends_name_and_limit() {
    let server = server_with_token().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/spaces"))
        .and(query_param("name", "sales"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "s1", "name": "sales", "type": "managed"},
                {"id": "s2", "name": "sales-eu", "type": "shared", "description": "EU"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let spaces = client_for(&server)
        .list_spaces(&ListFilter::with_limit(10).name("sales"))
        .await
        .unwrap();
    assert_eq!(spaces.len(), 2);
    assert_eq!(spaces[1].description, "EU");
}

#[tokio::test]
async fn connection_string_is_requested_for_source_type() {
    let server = server_with_token().await;
    Mock::given(method("POST"))
        .and(path(
            "/api/v1/data-sources/reptgt_qdisnowflake/actions/connection-string",
        ))
        .and(body_json(json!({
            "propertiesList": [{"name": "server", "value": "host1"}],
            "credentialsPropertiesList": [{"name": "password", "value": "p"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "connectionString": "CUSTOM CONNECT TO \"provider=...\"",
            "userId": "u",
            "credentialsConnectionString": "cred-token"
        })))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .get_connection_string(&ConnectionStringRequest {
            data_source_id: "reptgt_qdisnowflake".to_string(),
            properties_list: vec![ConnectionProperty::new("server", "host1")],
            credentials_properties_list: vec![ConnectionProperty::new("password", "p")],
        })
        .await
        .unwrap();
    assert_eq!(response.user_id, "u");
    assert_eq!(response.credentials_connection_string, "cred-token");
}

#[tokio::test]
async fn connection_update_accepts_empty_reply() {
    let server = server_with_token().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/data-connections/c1"))
        .and(body_json(json!({
            "qID": "c1",
            "qName": "warehouse",
            "space": "space-1",
            "qEngineObjectID": "engine-1",
            "qConnectStatement": "CUSTOM CONNECT TO \"provider=QvOdbcConnectorPackage.exe\"",
            "datasourceID": "reptgt_qdisnowflake",
            "qType": "QlikConnectorsCommonService.exe",
            "qUsername": "user-1",
            "qPassword": "enc:p"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .update_connection(
            "c1",
            &ConnectionUpdate {
                id: "c1".to_string(),
                name: "warehouse".to_string(),
                space_id: "space-1".to_string(),
                engine_id: "engine-1".to_string(),
                connect_statement: "CUSTOM CONNECT TO \"provider=QvOdbcConnectorPackage.exe\""
                    .to_string(),
                data_source_id: "reptgt_qdisnowflake".to_string(),
                driver: "QlikConnectorsCommonService.exe".to_string(),
                username: "user-1".to_string(),
                password: "enc:p".to_string(),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn data_project_is_unwrapped_from_envelope() {
    let server = server_with_token().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/di-projects"))
        .and(body_json(json!({
            "spaceId": "space-1",
            "data": {
                "name": "lake",
                "description": "",
                "lakehouseType": "QLIK",
                "type": "DATA_PIPELINE",
                "storageConnection": "conn-1",
                "batchMode": true
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "dataProject": {"id": "proj-1", "name": "lake", "batchMode": true}
        })))
        .mount(&server)
        .await;

    let project = client_for(&server)
        .create_data_project(&DataProjectRequest {
            space_id: "space-1".to_string(),
            data: DataProjectConfiguration {
                name: "lake".to_string(),
                lakehouse_type: "QLIK".to_string(),
                project_type: "DATA_PIPELINE".to_string(),
                storage_connection: "conn-1".to_string(),
                batch_mode: true,
                ..Default::default()
            },
        })
        .await
        .unwrap();
    assert_eq!(project.id, "proj-1");
}

#[tokio::test]
async fn data_app_paths_nest_under_project() {
    let server = server_with_token().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/di-projects/proj-1/di-apps/app-1"))
        .and(body_json(json!({
            "data": {"name": "orders", "type": "LANDING", "description": "raw"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dataApp": {"id": "app-1", "name": "orders", "type": "LANDING", "description": "raw"}
        })))
        .mount(&server)
        .await;

    let app = client_for(&server)
        .update_data_app(
            "proj-1",
            "app-1",
            &DataAppRequest {
                data: DataApp {
                    id: String::new(),
                    name: "orders".to_string(),
                    app_type: "LANDING".to_string(),
                    description: "raw".to_string(),
                },
            },
        )
        .await
        .unwrap();
    assert_eq!(app.description, "raw");
}

#[tokio::test]
async fn source_selection_put_returns_key() {
    let server = server_with_token().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/di-projects/proj-1/di-apps/app-1/source-selection"))
        .and(body_json(json!({
            "data": {
                "dataEntitiesSelection": {
                    "sourceConnectionId": "conn-1",
                    "dataEntities": []
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "sel-1"})))
        .mount(&server)
        .await;

    let key = client_for(&server)
        .put_source_selection(
            "proj-1",
            "app-1",
            &SourceSelectionPut {
                data: SourceSelectionData {
                    data_entities_selection: DataEntitiesSelection {
                        source_connection_id: "conn-1".to_string(),
                        data_entities: vec![],
                    },
                },
            },
        )
        .await
        .unwrap();
    assert_eq!(key.key, "sel-1");
}

#[tokio::test]
async fn data_gateway_lookup() {
    let server = server_with_token().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/data-gateways/gw-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "gw-1",
            "name": "on-prem",
            "type": "DATA_MOVEMENT",
            "spaceId": "space-1"
        })))
        .mount(&server)
        .await;

    let gateway = client_for(&server).get_data_gateway("gw-1").await.unwrap();
    assert_eq!(gateway.name, "on-prem");
    assert_eq!(gateway.space_id, "space-1");
    assert_eq!(gateway.description, "");
}
