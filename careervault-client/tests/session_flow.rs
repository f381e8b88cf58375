//! Auth lifecycle against a stub backend.

mod support;

use chrono::{Duration, Utc};
use client::{
    AuthErrorKind, AuthStatus, ClientError, MemoryTokenStore, TokenBundle, TokenStore,
};
use shared::models::{LoginRequest, SignupRequest};
use std::sync::{Arc, atomic::Ordering};
use support::{EMAIL, PASSWORD};

fn expired_bundle() -> TokenBundle {
    TokenBundle {
        access_token: "STALE".to_string(),
        refresh_token: Some("R".to_string()),
        id_token: None,
        expires_at: Utc::now() - Duration::minutes(5),
    }
}

#[tokio::test]
async fn login_authenticates_and_loads_profile() {
    let (url, _backend) = support::spawn().await;
    let tokens = Arc::new(MemoryTokenStore::new());
    let context = support::context(&url, tokens.clone());

    let user = context
        .login(&LoginRequest::new(EMAIL, PASSWORD))
        .await
        .unwrap();
    assert_eq!(user.username, "alice");

    let snapshot = context.session().snapshot();
    assert_eq!(snapshot.status, AuthStatus::Authenticated);
    assert!(snapshot.is_authenticated);
    assert_eq!(snapshot.user.unwrap().username, "alice");
    assert!(snapshot.error.is_none());
    assert!(!snapshot.loading);

    let stored = tokens.read().unwrap();
    assert_eq!(stored.access_token, "T");
    assert!(!tokens.is_expired());
}

#[tokio::test]
async fn invalid_credentials_leave_an_error() {
    let (url, _backend) = support::spawn().await;
    let context = support::context(&url, Arc::new(MemoryTokenStore::new()));

    let err = context
        .login(&LoginRequest::new(EMAIL, "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), AuthErrorKind::InvalidCredentials);

    let snapshot = context.session().snapshot();
    assert!(!snapshot.is_authenticated);
    assert_eq!(snapshot.status, AuthStatus::Unauthenticated);
    assert!(snapshot.user.is_none());
    assert!(snapshot.error.is_some_and(|message| !message.is_empty()));
}

#[tokio::test]
async fn expired_token_is_refreshed_before_the_call() {
    let (url, backend) = support::spawn().await;
    let tokens = Arc::new(MemoryTokenStore::with_bundle(expired_bundle()));
    let context = support::context(&url, tokens.clone());

    let user = context.api().current_user().await.unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);

    let stored = tokens.read().unwrap();
    assert_eq!(stored.access_token, "T2");
    assert_eq!(stored.refresh_token.as_deref(), Some("R"));

    // Fresh token now; no second refresh.
    context.api().current_user().await.unwrap();
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn restore_resumes_a_stored_session() {
    let (url, backend) = support::spawn().await;
    backend.seed("SWE", "Acme", "Applied");
    let context = support::context(
        &url,
        Arc::new(MemoryTokenStore::with_bundle(expired_bundle())),
    );

    assert_eq!(context.restore().await, AuthStatus::Authenticated);
    assert!(context.session().is_authenticated());
    assert_eq!(context.jobs().all_jobs().len(), 1);
}

#[tokio::test]
async fn failed_refresh_on_restore_clears_the_session() {
    let (url, backend) = support::spawn().await;
    backend.fail_refresh.store(true, Ordering::SeqCst);
    let tokens = Arc::new(MemoryTokenStore::with_bundle(expired_bundle()));
    let context = support::context(&url, tokens.clone());

    assert_eq!(context.restore().await, AuthStatus::Unauthenticated);
    assert!(tokens.read().is_none());
    assert!(context.session().user().is_none());
}

#[tokio::test]
async fn failed_refresh_mid_session_expires_it() {
    let (url, backend) = support::spawn().await;
    backend.seed("SWE", "Acme", "Applied");
    let tokens = Arc::new(MemoryTokenStore::new());
    let context = support::context(&url, tokens.clone());
    context
        .login(&LoginRequest::new(EMAIL, PASSWORD))
        .await
        .unwrap();
    assert_eq!(context.jobs().all_jobs().len(), 1);

    tokens.write(&expired_bundle()).unwrap();
    backend.fail_refresh.store(true, Ordering::SeqCst);

    let err = context.jobs().refresh().await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired(_)));
    assert_eq!(context.session().status(), AuthStatus::Unauthenticated);
    assert!(context.session().error().is_some());
    assert!(context.jobs().all_jobs().is_empty());
    assert!(tokens.read().is_none());
}

#[tokio::test]
async fn failed_explicit_refresh_empties_the_collection() {
    let (url, backend) = support::spawn().await;
    backend.seed("SWE", "Acme", "Applied");
    let tokens = Arc::new(MemoryTokenStore::new());
    let context = support::context(&url, tokens.clone());
    context
        .login(&LoginRequest::new(EMAIL, PASSWORD))
        .await
        .unwrap();
    assert_eq!(context.jobs().all_jobs().len(), 1);

    backend.fail_refresh.store(true, Ordering::SeqCst);
    context.session().refresh_token().await.unwrap_err();

    assert_eq!(context.session().status(), AuthStatus::Unauthenticated);
    assert!(context.jobs().all_jobs().is_empty());
    assert!(context.jobs().filtered_jobs().is_empty());
    assert!(tokens.read().is_none());
}

#[tokio::test]
async fn failed_login_forgets_the_previous_session() {
    let (url, _backend) = support::spawn().await;
    let tokens = Arc::new(MemoryTokenStore::new());
    let context = support::context(&url, tokens.clone());
    context
        .login(&LoginRequest::new(EMAIL, PASSWORD))
        .await
        .unwrap();

    context
        .login(&LoginRequest::new(EMAIL, "wrong"))
        .await
        .unwrap_err();
    assert_eq!(context.session().status(), AuthStatus::Unauthenticated);
    assert!(tokens.read().is_none());

    let reopened = support::context(&url, tokens.clone());
    assert_eq!(reopened.restore().await, AuthStatus::Unauthenticated);
    assert!(!reopened.session().is_authenticated());
}

#[tokio::test]
async fn explicit_refresh_rotates_the_access_token() {
    let (url, _backend) = support::spawn().await;
    let tokens = Arc::new(MemoryTokenStore::new());
    let context = support::context(&url, tokens.clone());
    context
        .login(&LoginRequest::new(EMAIL, PASSWORD))
        .await
        .unwrap();

    context.session().refresh_token().await.unwrap();
    assert_eq!(tokens.read().unwrap().access_token, "T2");
    assert!(context.session().is_authenticated());
}

#[tokio::test]
async fn rejected_token_is_cleared() {
    let (url, backend) = support::spawn().await;
    let tokens = Arc::new(MemoryTokenStore::new());
    let context = support::context(&url, tokens.clone());
    context
        .login(&LoginRequest::new(EMAIL, PASSWORD))
        .await
        .unwrap();

    backend.accept_token("SOMETHING-ELSE");
    let err = context.api().current_user().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(tokens.read().is_none());
}

#[tokio::test]
async fn signup_signs_in_with_the_new_account() {
    let (url, _backend) = support::spawn().await;
    let context = support::context(&url, Arc::new(MemoryTokenStore::new()));
    let request = SignupRequest {
        username: "bob_b".to_string(),
        email: "bob@b.com".to_string(),
        password: "Sup3r$ecret".to_string(),
        given_name: Some("Bob".to_string()),
        family_name: None,
    };

    context.signup(&request).await.unwrap();
    assert!(context.session().is_authenticated());
}

#[tokio::test]
async fn duplicate_signup_reports_backend_detail() {
    let (url, _backend) = support::spawn().await;
    let context = support::context(&url, Arc::new(MemoryTokenStore::new()));
    let request = SignupRequest {
        username: "alice".to_string(),
        email: EMAIL.to_string(),
        password: "Sup3r$ecret".to_string(),
        given_name: None,
        family_name: None,
    };

    let err = context.signup(&request).await.unwrap_err();
    assert_eq!(err.kind(), AuthErrorKind::Validation);
    assert_eq!(
        context.session().error().as_deref(),
        Some("User with this email already exists")
    );
    assert!(!context.session().is_authenticated());
}

#[tokio::test]
async fn logout_notifies_backend_and_clears_everything() {
    let (url, backend) = support::spawn().await;
    backend.seed("SWE", "Acme", "Applied");
    let tokens = Arc::new(MemoryTokenStore::new());
    let context = support::context(&url, tokens.clone());
    context
        .login(&LoginRequest::new(EMAIL, PASSWORD))
        .await
        .unwrap();
    let mut status = context.session().subscribe();

    context.logout().await;

    assert_eq!(backend.logout_calls.load(Ordering::SeqCst), 1);
    assert!(tokens.read().is_none());
    assert!(context.jobs().all_jobs().is_empty());
    assert!(status.has_changed().unwrap());
    assert_eq!(*status.borrow_and_update(), AuthStatus::Unauthenticated);
}

#[tokio::test]
async fn public_endpoints_need_no_session() {
    let (url, _backend) = support::spawn().await;
    let context = support::context(&url, Arc::new(MemoryTokenStore::new()));

    let health = context.api().health().await.unwrap();
    assert_eq!(health.status, "healthy");

    let requirements = context.api().password_requirements().await.unwrap();
    assert_eq!(requirements.min_length, 8);
    assert!(requirements.require_numbers);
}
