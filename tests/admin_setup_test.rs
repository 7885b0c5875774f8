//! One-time admin promotion endpoint.

mod common;

use axum::http::StatusCode;
use common::{read_json, unique, TestApp, TEST_SETUP_KEY};
use logbook_service::models::Role;

#[tokio::test]
async fn wrong_setup_key_is_forbidden() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let response = app
        .post_json(
            "/api/admin/setup",
            serde_json::json!({ "email": "parent@example.com", "setupKey": "wrong" }),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_email_is_not_found() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let response = app
        .post_json(
            "/api/admin/setup",
            serde_json::json!({
                "email": format!("{}@example.com", unique("ghost")),
                "setupKey": TEST_SETUP_KEY,
            }),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn setup_promotes_an_existing_identity() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let email = format!("{}@example.com", unique("first"));
    let user_id = app.provider.seed_user(&email, serde_json::json!({}));

    let response = app
        .post_json(
            "/api/admin/setup",
            serde_json::json!({ "email": email, "setupKey": TEST_SETUP_KEY }),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], serde_json::json!(true));

    let profile = app
        .state
        .db
        .find_profile_by_id(user_id)
        .await
        .unwrap()
        .expect("profile must exist after setup");
    assert_eq!(profile.role, Role::Admin);
}

#[tokio::test]
async fn setup_promotes_an_already_profiled_user_in_place() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let email = format!("{}@example.com", unique("later"));
    let (user_id, _) = app.seed_session(&email, Role::Friend).await;

    let response = app
        .post_json(
            "/api/admin/setup",
            serde_json::json!({ "email": email, "setupKey": TEST_SETUP_KEY }),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let profile = app
        .state
        .db
        .find_profile_by_id(user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.role, Role::Admin);
}
