//! HTTP adapter behavior against a fake backend.

mod common;

use common::{context_for, user, FakeServer, PASSWORD, VALID_TOKEN};
use tokio_test::{assert_err, assert_ok};

use univault::api::{ClientError, ErrorKind, Resource};
use univault::list::ListQuery;
use univault::models::{LoginRequest, NewUser, Role, Student};
use univault::navigation::Navigator;
use univault::preferences::Theme;
use univault::routes::paths;
use univault::session::SessionStore;
use univault::storage::{Storage, AUTH_KEY, THEME_KEY, TOKEN_KEY};
use univault::validation::FieldErrors;

#[tokio::test]
async fn test_expired_token_ends_session_and_returns_to_login() {
    let server = FakeServer::start().await;
    let (ctx, storage) = server.context();
    ctx.session.login(user(Role::Admin), "expired".to_string());
    ctx.visit("/admin/students");
    assert_eq!(ctx.history.location(), "/admin/students");

    let err = assert_err!(ctx.client.list_students(&ListQuery::default()).await);

    assert_eq!(err.kind(), ErrorKind::AuthExpired);
    assert!(!ctx.session.is_authenticated());
    assert!(storage.is_empty());
    assert_eq!(ctx.history.location(), paths::LOGIN);
}

#[tokio::test]
async fn test_expiry_keeps_theme_preference() {
    let server = FakeServer::start().await;
    let (ctx, storage) = server.context();
    ctx.preferences.set_theme(Theme::Dark).unwrap();
    ctx.session.login(user(Role::User), "expired".to_string());

    assert_err!(ctx.client.current_user().await);

    assert_eq!(storage.get(AUTH_KEY).unwrap(), None);
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    assert!(storage.get(THEME_KEY).unwrap().is_some());
    assert_eq!(ctx.preferences.theme(), Theme::Dark);
}

#[tokio::test]
async fn test_rejected_login_is_an_auth_failure() {
    let server = FakeServer::start().await;
    let (ctx, storage) = server.context();

    let request = LoginRequest {
        email: "awa.diop@univ.sn".to_string(),
        password: "wrong-password".to_string(),
    };
    let err = assert_err!(ctx.client.sign_in(&request).await);

    match err {
        ClientError::AuthExpired { message } => assert_eq!(message, "Invalid credentials"),
        other => panic!("expected an auth failure, got {:?}", other),
    }
    assert!(storage.is_empty());
    assert_eq!(ctx.history.location(), paths::LOGIN);
}

#[tokio::test]
async fn test_sign_in_persists_session() {
    let server = FakeServer::start().await;
    let (ctx, storage) = server.context();

    let request = LoginRequest {
        email: "awa.diop@univ.sn".to_string(),
        password: PASSWORD.to_string(),
    };
    let signed_in = assert_ok!(ctx.client.sign_in(&request).await);
    assert_eq!(signed_in.role, Role::Admin);
    assert!(ctx.session.is_authenticated());
    assert!(storage.get(TOKEN_KEY).unwrap().is_some());

    // A fresh process picks the session back up
    let restored = SessionStore::rehydrate(storage.clone());
    assert!(restored.is_authenticated());
    assert_eq!(restored.persisted_token().as_deref(), Some(VALID_TOKEN));

    // Landing view for the role
    ctx.visit(paths::LOGIN);
    assert_eq!(ctx.history.location(), paths::ADMIN_DASHBOARD);
}

#[tokio::test]
async fn test_bearer_header_comes_from_storage() {
    let server = FakeServer::start().await;
    let (ctx, _storage) = server.context();

    assert_ok!(ctx.client.list_services().await);
    ctx.session.login(user(Role::Admin), VALID_TOKEN.to_string());
    assert_ok!(ctx.client.list_students(&ListQuery::default()).await);

    let headers = server.backend.auth_headers.lock().clone();
    assert_eq!(
        headers,
        vec![None, Some(format!("Bearer {}", VALID_TOKEN))]
    );
}

#[tokio::test]
async fn test_refresh_profile_keeps_token() {
    let server = FakeServer::start().await;
    let (ctx, _storage) = server.context();
    ctx.session.login(user(Role::Admin), VALID_TOKEN.to_string());

    let profile = assert_ok!(ctx.client.refresh_profile().await);

    assert_eq!(profile.first_name, "Awa Marie");
    let session = ctx.session.snapshot();
    assert_eq!(session.user().map(|u| u.first_name.as_str()), Some("Awa Marie"));
    assert_eq!(session.token(), Some(VALID_TOKEN));
}

#[tokio::test]
async fn test_server_error_payload_is_kept() {
    let server = FakeServer::start().await;
    let (ctx, _storage) = server.context();
    ctx.session.login(user(Role::Admin), VALID_TOKEN.to_string());

    let err = assert_err!(ctx.client.list_documents(&ListQuery::default()).await);

    assert_eq!(err.kind(), ErrorKind::Server);
    let server_error = err.server_error().unwrap();
    assert_eq!(server_error.status.as_u16(), 500);
    assert_eq!(server_error.message, "Database unavailable");
    assert_eq!(server_error.code.as_deref(), Some("DB_DOWN"));
    assert_eq!(server_error.body["success"], false);
    // A server failure does not end the session
    assert!(ctx.session.is_authenticated());
}

#[tokio::test]
async fn test_field_errors_reach_the_form() {
    let server = FakeServer::start().await;
    let (ctx, _storage) = server.context();
    ctx.session.login(user(Role::SuperAdmin), VALID_TOKEN.to_string());

    let new_user = NewUser {
        first_name: "Ibrahima".to_string(),
        last_name: "Faye".to_string(),
        email: "awa.diop@univ.sn".to_string(),
        password: "secret12".to_string(),
        role: Role::Admin,
        service: Some("svc-1".to_string()),
    };
    let err = assert_err!(ctx.client.create_user(&new_user).await);

    let server_error = err.server_error().unwrap();
    assert_eq!(server_error.field_errors("email"), ["Email already in use".to_string()]);
    let fields = FieldErrors::from_server(server_error);
    assert_eq!(fields.get("email"), ["Email already in use".to_string()]);
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (ctx, _storage) = context_for(&format!("http://{}", addr));
    ctx.session.login(user(Role::Admin), VALID_TOKEN.to_string());

    let err = assert_err!(ctx.client.list_services().await);

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.is_retryable());
    assert_eq!(
        err.user_message(),
        univault::api::error::NETWORK_ERROR_MESSAGE
    );
    assert!(ctx.session.is_authenticated());
}

#[tokio::test]
async fn test_envelopes_are_normalized() {
    let server = FakeServer::start().await;
    let (ctx, _storage) = server.context();
    ctx.session.login(user(Role::SuperAdmin), VALID_TOKEN.to_string());

    // { data: [..], pagination } beside
    let students = assert_ok!(ctx.client.list_students(&ListQuery::default()).await);
    assert_eq!(students.items.len(), 20);
    assert_eq!(students.total, 45);
    assert_eq!(students.pages, 3);

    // { data: { data, pagination } } nested
    let users = assert_ok!(ctx.client.list_users(&ListQuery::default()).await);
    assert_eq!(users.items.len(), 2);
    assert_eq!(users.items[1].role, Role::User);

    // { data: [..] } without pagination
    let services = assert_ok!(ctx.client.list_services().await);
    assert_eq!(services.len(), 2);
    assert_eq!(services[0].document_types.len(), 2);
    assert!(services[1].document_types.is_empty());
}

#[tokio::test]
async fn test_list_sends_search_and_page() {
    let server = FakeServer::start().await;
    let (ctx, _storage) = server.context();
    ctx.session.login(user(Role::Admin), VALID_TOKEN.to_string());

    let query = ListQuery {
        search: "Diallo".to_string(),
        page: 1,
        limit: 5,
    };
    let page = assert_ok!(ctx.client.list::<Student>(Resource::Students, &query).await);

    assert_eq!(page.total, 9);
    assert_eq!(page.pages, 2);
    assert!(page.items.iter().all(|s| s.last_name == "Diallo"));

    let sent = server.backend.student_queries.lock()[0].clone();
    assert_eq!(sent.get("search").map(String::as_str), Some("Diallo"));
    assert_eq!(sent.get("page").map(String::as_str), Some("1"));
    assert_eq!(sent.get("limit").map(String::as_str), Some("5"));
}
