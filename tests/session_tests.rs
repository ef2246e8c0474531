// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in, registration and route guard scenarios.

use second_innings_admin::models::{Role, Status};
use second_innings_admin::services::Registration;
use second_innings_admin::session::{SessionError, SessionState, SignInOutcome};
use second_innings_admin::storage::{keys, KeyValueStore};
use serde_json::json;

mod common;

use common::{user_envelope, StubBackend};

fn admin_user(status: &str) -> serde_json::Value {
    json!({
        "id": 1,
        "full_name": "Test Admin One",
        "gmail_id": "admin1@test.com",
        "role": "admin",
        "status": status
    })
}

#[tokio::test]
async fn test_existing_admin_signs_in_and_skips_login() {
    let stub = StubBackend::start().await;
    stub.respond("POST", "/api/auth/verify-token", 200, user_envelope(admin_user("active")));
    let ctx = stub.context();

    let outcome = ctx
        .session
        .sign_in_with_test_user("test_admin_token_001")
        .await;
    let SignInOutcome::ExistingUser { user, redirect_to } = outcome else {
        panic!("Expected existing user, got {outcome:?}");
    };
    assert_eq!(user.role, Some(Role::Admin));
    assert_eq!(redirect_to, "/dashboard");

    let view = ctx.session.view().await;
    assert!(view.is_authenticated);
    assert_eq!(view.user_name(), Some("Test Admin One"));
    assert!(view.permissions().can_manage_officials);

    // The identity token goes both in the header and the body.
    let request = &stub.requests_to("POST", "/api/auth/verify-token")[0];
    assert_eq!(
        request.headers.get("authorization").map(String::as_str),
        Some("Bearer test_admin_token_001")
    );
    assert_eq!(
        request.body.as_ref().unwrap()["id_token"],
        "test_admin_token_001"
    );

    let navigation = ctx.navigator.navigate("/login").await.unwrap();
    assert_eq!(navigation.resolved, "/dashboard");
    assert!(!navigation.logged_out);

    let navigation = ctx.navigator.navigate("/officials").await.unwrap();
    assert_eq!(navigation.resolved, "/officials");
}

#[tokio::test]
async fn test_new_user_is_sent_to_registration() {
    let stub = StubBackend::start().await;
    stub.respond(
        "POST",
        "/api/auth/verify-token",
        201,
        json!({
            "message": "User not registered",
            "data": {
                "user_info": {
                    "gmail_id": "unregistered1@test.com",
                    "firebase_uid": "test_unregistered_uid_001"
                }
            }
        }),
    );
    let ctx = stub.context();

    let outcome = ctx
        .session
        .sign_in_with_test_user("test_unregistered_token_001")
        .await;
    let SignInOutcome::NewUser {
        prefill,
        redirect_to,
    } = outcome
    else {
        panic!("Expected new user, got {outcome:?}");
    };
    assert_eq!(redirect_to, "/register");
    assert_eq!(prefill.full_name, "Test Unregistered User One");
    assert_eq!(prefill.gmail_id, "unregistered1@test.com");

    let view = ctx.session.view().await;
    assert!(view.is_new_user());
    assert!(!view.is_authenticated);
    assert!(!ctx.storage.is_logged_in());

    let navigation = ctx.navigator.navigate("/register").await.unwrap();
    assert_eq!(navigation.resolved, "/register");
    let navigation = ctx.navigator.navigate("/dashboard").await.unwrap();
    assert_eq!(navigation.resolved, "/login");
}

#[tokio::test]
async fn test_registration_completes_session() {
    let stub = StubBackend::start().await;
    stub.respond(
        "POST",
        "/api/auth/verify-token",
        201,
        json!({ "data": { "user_info": { "gmail_id": "unregistered2@test.com" } } }),
    );
    let registered = json!({
        "id": 40,
        "full_name": "New Caregiver",
        "gmail_id": "unregistered2@test.com",
        "role": "caregiver",
        "status": "pending_approval"
    });
    stub.respond("POST", "/api/auth/register", 201, user_envelope(registered.clone()));
    stub.respond("POST", "/api/user/profile", 200, user_envelope(registered));
    let ctx = stub.context();

    ctx.session
        .sign_in_with_test_user("test_unregistered_token_002")
        .await;

    let user = ctx
        .session
        .complete_registration(&Registration {
            full_name: "New Caregiver".to_string(),
            role: Role::Caregiver,
            date_of_birth: Some("1970-02-03".to_string()),
            youtube_url: Some("https://youtu.be/intro".to_string()),
            description: Some("Retired nurse".to_string()),
            tags: Some("nursing".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(user.id, Some(40));
    assert_eq!(user.status, Some(Status::PendingApproval));

    let view = ctx.session.view().await;
    assert!(view.is_authenticated);
    assert!(view.is_pending_approval());
    assert!(ctx.storage.is_logged_in());

    let body = stub.requests_to("POST", "/api/auth/register")[0]
        .body
        .clone()
        .unwrap();
    assert_eq!(body["role"], "caregiver");
    assert_eq!(body["tags"], "nursing");
    assert_eq!(body["id_token"], "test_unregistered_token_002");
}

#[tokio::test]
async fn test_invalid_registration_is_not_sent() {
    let stub = StubBackend::start().await;
    stub.respond(
        "POST",
        "/api/auth/verify-token",
        201,
        json!({ "data": { "user_info": {} } }),
    );
    let ctx = stub.context();
    ctx.session
        .sign_in_with_test_user("test_unregistered_token_001")
        .await;

    let err = ctx
        .session
        .complete_registration(&Registration {
            full_name: "Someone".to_string(),
            role: Role::FamilyMember,
            date_of_birth: Some("03/02/1970".to_string()),
            youtube_url: None,
            description: None,
            tags: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Validation(_)), "{err:?}");
    assert!(stub.requests_to("POST", "/api/auth/register").is_empty());
}

#[tokio::test]
async fn test_blocked_user_is_logged_out_on_navigation() {
    let stub = StubBackend::start().await;
    stub.respond("POST", "/api/auth/verify-token", 200, user_envelope(admin_user("blocked")));
    let ctx = stub.context();

    let outcome = ctx
        .session
        .sign_in_with_test_user("test_admin_token_001")
        .await;
    assert!(outcome.is_success());

    let navigation = ctx.navigator.navigate("/officials").await.unwrap();
    assert_eq!(navigation.resolved, "/login");
    assert!(navigation.logged_out);

    let view = ctx.session.view().await;
    assert!(!view.is_authenticated);
    assert_eq!(view.state, SessionState::Anonymous);
    assert!(!ctx.storage.is_logged_in());
    assert!(ctx.storage.get(keys::TEST_TOKEN).is_none());
}

#[tokio::test]
async fn test_blocked_user_cannot_stay_on_register() {
    let stub = StubBackend::start().await;
    stub.respond("POST", "/api/auth/verify-token", 200, user_envelope(admin_user("blocked")));
    let ctx = stub.context();

    ctx.session
        .sign_in_with_test_user("test_admin_token_001")
        .await;

    let navigation = ctx.navigator.navigate("/register").await.unwrap();
    assert_eq!(navigation.resolved, "/login");
    assert!(navigation.logged_out);

    let view = ctx.session.view().await;
    assert!(!view.is_authenticated);
    assert!(!ctx.storage.is_logged_in());
}

#[tokio::test]
async fn test_failed_verification_clears_session() {
    let stub = StubBackend::start().await;
    stub.respond(
        "POST",
        "/api/auth/verify-token",
        401,
        json!({ "error": "Invalid token" }),
    );
    let ctx = stub.context();

    let outcome = ctx
        .session
        .sign_in_with_test_user("test_admin_token_001")
        .await;
    let SignInOutcome::Failed(err) = outcome else {
        panic!("Expected failure, got {outcome:?}");
    };
    assert_eq!(err.to_string(), "Invalid token");
    assert_eq!(ctx.session.last_error().await.as_deref(), Some("Invalid token"));
    assert!(!ctx.session.view().await.is_authenticated);
    assert!(ctx.storage.get(keys::TEST_TOKEN).is_none());
}

#[tokio::test]
async fn test_unknown_test_token_is_rejected() {
    let stub = StubBackend::start().await;
    let ctx = stub.context();

    let outcome = ctx.session.sign_in_with_test_user("not_a_token").await;
    assert!(!outcome.is_success());
    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn test_session_survives_restart() {
    let stub = StubBackend::start().await;
    stub.respond("POST", "/api/auth/verify-token", 200, user_envelope(admin_user("active")));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    {
        let ctx = stub.context_with_storage(KeyValueStore::open(&path).unwrap());
        let outcome = ctx
            .session
            .sign_in_with_test_user("test_admin_token_001")
            .await;
        assert!(outcome.is_success());
    }

    let ctx = stub.context_with_storage(KeyValueStore::open(&path).unwrap());
    assert!(!ctx.session.view().await.is_authenticated);

    let view = ctx.session.restore().await;
    assert!(view.is_authenticated);
    assert_eq!(view.user_id(), Some(1));
    assert_eq!(view.role(), Some(&Role::Admin));
    assert_eq!(
        view.identity_user.as_ref().map(|u| u.uid.as_str()),
        Some("test_admin_uid_001")
    );

    // Only the one verification call; restore does not touch the backend.
    assert_eq!(stub.requests_to("POST", "/api/auth/verify-token").len(), 1);

    ctx.session.logout().await.unwrap();
    let reopened = KeyValueStore::open(&path).unwrap();
    assert!(!reopened.is_logged_in());
    assert!(reopened.load_user_record().unwrap().is_none());
}

#[tokio::test]
async fn test_restored_blocked_user_is_not_authenticated() {
    let stub = StubBackend::start().await;
    let storage = KeyValueStore::in_memory();
    let blocked = serde_json::from_value(admin_user("blocked")).unwrap();
    storage.save_user_record(&blocked).unwrap();

    let ctx = stub.context_with_storage(storage);
    let view = ctx.session.restore().await;
    assert!(!view.is_authenticated);
    assert!(view.is_blocked());

    let navigation = ctx.navigator.navigate("/dashboard").await.unwrap();
    assert_eq!(navigation.resolved, "/login");
    assert!(navigation.logged_out);
    assert!(!ctx.storage.is_logged_in());
}
