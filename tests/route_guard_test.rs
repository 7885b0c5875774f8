//! Route guard behavior through the full router.

mod common;

use axum::http::{header, StatusCode};
use common::{unique, TestApp};
use logbook_service::models::Role;

fn location(response: &axum::http::Response<axum::body::Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn anonymous_user_is_sent_to_login_with_return_path() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let response = app.get("/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?redirectTo=/dashboard");
}

#[tokio::test]
async fn public_routes_need_no_session() {
    let Some(app) = TestApp::try_spawn().await else { return };

    for path in ["/", "/login", "/signup", "/join/family/sometoken"] {
        let response = app.get(path, None).await;
        assert_eq!(response.status(), StatusCode::OK, "path {}", path);
    }
}

#[tokio::test]
async fn friend_is_bounced_from_admin_to_dashboard() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let (_, token) = app
        .seed_session(&format!("{}@example.com", unique("friend")), Role::Friend)
        .await;

    let response = app.get("/admin", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn admin_reaches_admin_routes_with_identity_annotation() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let (user_id, token) = app
        .seed_session(&format!("{}@example.com", unique("admin")), Role::Admin)
        .await;

    let response = app.get("/admin", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-user-id").unwrap().to_str().unwrap(),
        user_id.to_string()
    );
    assert_eq!(
        response.headers().get("x-user-role").unwrap().to_str().unwrap(),
        "admin"
    );
}

#[tokio::test]
async fn family_tier_allows_family_but_not_friend() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let (_, family_token) = app
        .seed_session(&format!("{}@example.com", unique("fam")), Role::Family)
        .await;
    let (_, friend_token) = app
        .seed_session(&format!("{}@example.com", unique("fr")), Role::Friend)
        .await;

    let allowed = app.get("/gallery/upload", Some(&family_token)).await;
    assert_eq!(allowed.status(), StatusCode::OK);

    let denied = app.get("/gallery/upload", Some(&friend_token)).await;
    assert_eq!(denied.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&denied), "/dashboard");
}

#[tokio::test]
async fn authenticated_user_is_bounced_off_the_login_page() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let (_, token) = app
        .seed_session(&format!("{}@example.com", unique("in")), Role::Friend)
        .await;

    let response = app.get("/login", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn garbage_token_counts_as_anonymous() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let response = app.get("/dashboard", Some("not-a-jwt")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?redirectTo=/dashboard");
}

#[tokio::test]
async fn api_routes_are_exempt_from_the_page_guard() {
    let Some(app) = TestApp::try_spawn().await else { return };

    // Unauthenticated API call gets a 401 body, not a redirect.
    let response = app.get("/api/profile/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
