//! Service provider HTTP API handler tests

use super::{
    build_test_router, delete_json, get_json, patch_json, post_json, put_json, TestAppState,
};
use axum::http::StatusCode;
use serde_json::json;

async fn create_credential(app: &axum::Router, username: &str) -> i64 {
    let response = post_json(app, "/api/credentials", &json!({ "username": username })).await;
    response.data()["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_create_service_provider_with_credential() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let credential_id = create_credential(&app, "alice").await;

    let response = post_json(
        &app,
        "/api/service-providers",
        &json!({"name": "billing", "credential": {"id": credential_id}}),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let id = response.data()["id"].as_i64().unwrap();
    assert_eq!(response.data()["credential"]["id"], credential_id);
    assert_eq!(response.data()["credential"]["username"], "alice");
    assert_eq!(
        response.header("x-credhub-alert"),
        Some("credhub.serviceProvider.created")
    );

    // Visible from the credential side too
    let credential = get_json(&app, &format!("/api/credentials/{}", credential_id)).await;
    let linked = credential.data()["service_providers"].as_array().unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0]["id"], id);
}

#[tokio::test]
async fn test_create_service_provider_with_unknown_credential() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());

    let response = post_json(
        &app,
        "/api/service-providers",
        &json!({"name": "billing", "credential": {"id": 77}}),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(state.service_provider_index.len().await, 0);
}

#[tokio::test]
async fn test_create_service_provider_with_id_is_rejected() {
    let state = TestAppState::new();
    let app = build_test_router(state);

    let response = post_json(&app, "/api/service-providers", &json!({"id": 1})).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body.unwrap()["details"]["key"], "idexists");
}

#[tokio::test]
async fn test_update_service_provider_moves_between_credentials() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let first = create_credential(&app, "alice").await;
    let second = create_credential(&app, "bob").await;

    let created = post_json(
        &app,
        "/api/service-providers",
        &json!({"name": "billing", "credential": {"id": first}}),
    )
    .await;
    let id = created.data()["id"].as_i64().unwrap();

    let response = put_json(
        &app,
        &format!("/api/service-providers/{}", id),
        &json!({"id": id, "name": "billing", "credential": {"id": second}}),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(state.db.credential_id_of(id).await, Some(second));

    let first = get_json(&app, &format!("/api/credentials/{}", first)).await;
    assert!(first.data()["service_providers"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_service_provider_id_checks() {
    let state = TestAppState::new();
    let app = build_test_router(state);

    let missing = put_json(&app, "/api/service-providers/3", &json!({"name": "x"})).await;
    assert_eq!(missing.body.unwrap()["details"]["key"], "idnull");

    let unknown = put_json(&app, "/api/service-providers/3", &json!({"id": 3})).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_partial_update_keeps_credential_link() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let credential_id = create_credential(&app, "alice").await;

    let created = post_json(
        &app,
        "/api/service-providers",
        &json!({"name": "billing", "credential": {"id": credential_id}}),
    )
    .await;
    let id = created.data()["id"].as_i64().unwrap();

    let response = patch_json(
        &app,
        &format!("/api/service-providers/{}", id),
        &json!({"id": id, "name": "invoicing"}),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["name"], "invoicing");
    assert_eq!(state.db.credential_id_of(id).await, Some(credential_id));
    assert_eq!(
        state.service_provider_index.get(id).await.unwrap().name.as_deref(),
        Some("invoicing")
    );
}

#[tokio::test]
async fn test_list_service_providers_eagerload() {
    let state = TestAppState::new();
    let app = build_test_router(state);
    let credential_id = create_credential(&app, "alice").await;

    post_json(
        &app,
        "/api/service-providers",
        &json!({"name": "a", "credential": {"id": credential_id}}),
    )
    .await;
    post_json(&app, "/api/service-providers", &json!({"name": "b"})).await;

    let plain = get_json(&app, "/api/service-providers").await;
    assert_eq!(plain.header("x-total-count"), Some("2"));
    let plain = plain.body.unwrap();
    assert_eq!(plain["data"][0]["credential"]["id"], credential_id);
    assert!(plain["data"][0]["credential"]["username"].is_null());

    let eager = get_json(&app, "/api/service-providers?eagerload=true").await;
    let eager = eager.body.unwrap();
    assert_eq!(eager["data"][0]["credential"]["username"], "alice");
    assert!(eager["data"][1].get("credential").is_none());
}

#[tokio::test]
async fn test_get_service_provider_not_found() {
    let state = TestAppState::new();
    let app = build_test_router(state);

    let response = get_json(&app, "/api/service-providers/9").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_service_provider() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());
    let credential_id = create_credential(&app, "alice").await;

    let created = post_json(
        &app,
        "/api/service-providers",
        &json!({"name": "billing", "credential": {"id": credential_id}}),
    )
    .await;
    let id = created.data()["id"].as_i64().unwrap();

    let response = delete_json(&app, &format!("/api/service-providers/{}", id)).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(state.service_provider_index.get(id).await.is_none());

    let credential = get_json(&app, &format!("/api/credentials/{}", credential_id)).await;
    assert!(credential.data()["service_providers"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_search_service_providers() {
    let state = TestAppState::new();
    let app = build_test_router(state);

    post_json(&app, "/api/service-providers", &json!({"name": "billing"})).await;
    post_json(&app, "/api/service-providers", &json!({"name": "payroll"})).await;

    let response = get_json(&app, "/api/_search/service-providers?query=*&size=1").await;

    assert_eq!(response.status, StatusCode::OK);
    // Count of hits on this page, not of all matches
    assert_eq!(response.header("x-total-count"), Some("1"));
}
