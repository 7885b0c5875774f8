//! Invite code lifecycle: creation, validation, atomic consumption.

mod common;

use common::{unique_code, TestApp};
use logbook_service::models::{InviteCode, Role};

#[tokio::test]
async fn validate_reports_role_for_valid_code() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let code = unique_code("GRAN");
    let invite = InviteCode::new(code.clone(), Role::Family, None, None, None);
    app.state.db.insert_invite_code(&invite).await.unwrap();

    let outcome = app
        .state
        .sessions
        .validate_invite_code(&code.to_lowercase())
        .await
        .unwrap();
    assert!(outcome.valid);
    assert_eq!(outcome.role, Some(Role::Family));
}

#[tokio::test]
async fn validate_rejects_unknown_inactive_and_exhausted_codes() {
    let Some(app) = TestApp::try_spawn().await else { return };

    // Unknown.
    let outcome = app
        .state
        .sessions
        .validate_invite_code("NO-SUCH-CODE")
        .await
        .unwrap();
    assert!(!outcome.valid);
    assert!(outcome.error.is_some());

    // Inactive.
    let code = unique_code("OFF");
    let invite = InviteCode::new(code.clone(), Role::Friend, None, None, None);
    app.state.db.insert_invite_code(&invite).await.unwrap();
    app.state
        .db
        .set_invite_code_active(invite.code_id, false)
        .await
        .unwrap();
    let outcome = app.state.sessions.validate_invite_code(&code).await.unwrap();
    assert!(!outcome.valid);

    // Exhausted: consume the single use, then validate.
    let code = unique_code("ONE");
    let invite = InviteCode::new(code.clone(), Role::Friend, Some(1), None, None);
    app.state.db.insert_invite_code(&invite).await.unwrap();
    assert!(app.state.db.consume_invite_code(&code).await.unwrap().is_some());
    let outcome = app.state.sessions.validate_invite_code(&code).await.unwrap();
    assert!(!outcome.valid);
}

#[tokio::test]
async fn duplicate_code_is_a_conflict() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let code = unique_code("DUP");
    let first = InviteCode::new(code.clone(), Role::Friend, None, None, None);
    app.state.db.insert_invite_code(&first).await.unwrap();

    let second = InviteCode::new(code, Role::Family, None, None, None);
    let err = app.state.db.insert_invite_code(&second).await.unwrap_err();
    assert!(matches!(
        err,
        logbook_service::error::AppError::Conflict(_)
    ));
}

#[tokio::test]
async fn consume_stops_exactly_at_max_uses() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let code = unique_code("CAP");
    let invite = InviteCode::new(code.clone(), Role::Family, Some(2), None, None);
    app.state.db.insert_invite_code(&invite).await.unwrap();

    assert!(app.state.db.consume_invite_code(&code).await.unwrap().is_some());
    assert!(app.state.db.consume_invite_code(&code).await.unwrap().is_some());
    assert!(app.state.db.consume_invite_code(&code).await.unwrap().is_none());

    let row = app.state.db.find_invite_code(&code).await.unwrap().unwrap();
    assert_eq!(row.current_uses, 2);
}

#[tokio::test]
async fn concurrent_signups_cannot_overrun_a_single_use_code() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let code = unique_code("FAMILY2024");
    let invite = InviteCode::new(code.clone(), Role::Family, Some(1), None, None);
    app.state.db.insert_invite_code(&invite).await.unwrap();

    let db_a = app.state.db.clone();
    let db_b = app.state.db.clone();
    let code_a = code.clone();
    let code_b = code.clone();

    let (a, b) = tokio::join!(
        tokio::spawn(async move { db_a.consume_invite_code(&code_a).await.unwrap() }),
        tokio::spawn(async move { db_b.consume_invite_code(&code_b).await.unwrap() }),
    );

    let winners = [a.unwrap(), b.unwrap()]
        .into_iter()
        .filter(Option::is_some)
        .count();
    assert_eq!(winners, 1, "exactly one concurrent consume may succeed");

    let row = app.state.db.find_invite_code(&code).await.unwrap().unwrap();
    assert_eq!(row.current_uses, 1);
}

#[tokio::test]
async fn released_use_becomes_available_again() {
    let Some(app) = TestApp::try_spawn().await else { return };

    let code = unique_code("REL");
    let invite = InviteCode::new(code.clone(), Role::Friend, Some(1), None, None);
    app.state.db.insert_invite_code(&invite).await.unwrap();

    assert!(app.state.db.consume_invite_code(&code).await.unwrap().is_some());
    assert!(app.state.db.consume_invite_code(&code).await.unwrap().is_none());

    app.state.db.release_invite_code(&code).await.unwrap();
    assert!(app.state.db.consume_invite_code(&code).await.unwrap().is_some());
}
