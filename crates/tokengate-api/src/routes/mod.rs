//! REST API 라우트.
//!
//! 라우트는 요구 역할별 그룹으로 나뉘며 그룹마다 `require_roles` 게이트가 붙습니다.
//!
//! | 그룹 | 요구 역할 |
//! |------|-----------|
//! | 공개 (`/health`, 가입, 로그인, 재설정) | anyone |
//! | `/auth/me` | user, instructor, admin 중 하나 |
//! | 사용자 관리 | admin |

pub mod auth;
pub mod health;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tokengate_core::{AuthenticationGate, RequiredRoles, Role};

use crate::middleware::{require_roles, RouteGuard};
use crate::state::AppState;

pub use health::HealthResponse;

/// 전체 API 라우터 생성.
pub fn create_router(state: Arc<AppState>) -> Router {
    let gate = &state.gate;

    let public = guarded(
        Router::new()
            .route("/health", get(health::health_check))
            .route("/auth/register", post(auth::register))
            .route("/auth/login", post(auth::login))
            .route("/auth/reset-password", post(auth::reset_password))
            .route("/auth/reset-request", post(auth::request_reset)),
        gate,
        RequiredRoles::anyone(),
    );

    let members = guarded(
        Router::new().route("/auth/me", get(auth::me)),
        gate,
        RequiredRoles::any_of([Role::User, Role::Instructor, Role::Admin]),
    );

    let admin = guarded(
        Router::new()
            .route("/auth/users/{subject}/roles", post(auth::assign_role))
            .route("/auth/users/{subject}", delete(auth::delete_account)),
        gate,
        RequiredRoles::any_of([Role::Admin]),
    );

    Router::new()
        .merge(public)
        .merge(members)
        .merge(admin)
        .with_state(state)
}

/// 라우트 그룹에 요구 역할 게이트 적용.
fn guarded(
    router: Router<Arc<AppState>>,
    gate: &AuthenticationGate,
    required: RequiredRoles,
) -> Router<Arc<AppState>> {
    router.route_layer(middleware::from_fn_with_state(
        RouteGuard::new(gate.clone(), required),
        require_roles,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tokengate_core::{
        AuthConfig, CredentialStore, InMemoryCredentialStore, PasswordHasher, TokenGrant,
    };
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        store: InMemoryCredentialStore,
    }

    fn test_app() -> TestApp {
        let store = InMemoryCredentialStore::new();
        let state = AppState::with_hasher(
            Arc::new(AuthConfig::development()),
            Arc::new(store.clone()),
            PasswordHasher::with_params(1024, 1, 1).unwrap(),
        )
        .unwrap();

        TestApp {
            router: create_router(Arc::new(state)),
            store,
        }
    }

    async fn call(
        app: &TestApp,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        app.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register(app: &TestApp, subject: &str, password: &str) -> TokenGrant {
        let response = call(
            app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "subject": subject, "password": password })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = test_app();
        let response = call(&app, Method::GET, "/health", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let health: HealthResponse = json_body(response).await;
        assert_eq!(health.status, "healthy");
    }

    #[tokio::test]
    async fn test_register_login_and_me() {
        let app = test_app();
        register(&app, "alice", "secret1").await;

        let response = call(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "subject": "alice", "password": "secret1" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let grant: TokenGrant = json_body(response).await;
        assert_eq!(grant.token_type, "Bearer");

        let response = call(&app, Method::GET, "/auth/me", Some(&grant.access_token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let me: auth::IdentityResponse = json_body(response).await;
        assert_eq!(me.subject, "alice");
        assert_eq!(me.roles, vec!["user".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_unprocessable() {
        let app = test_app();
        register(&app, "alice", "secret1").await;

        let response = call(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "subject": "alice", "password": "other" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_login_failures_share_one_response() {
        let app = test_app();
        register(&app, "alice", "secret1").await;

        let wrong = call(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "subject": "alice", "password": "nope" })),
        )
        .await;
        let unknown = call(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "subject": "ghost", "password": "nope" })),
        )
        .await;

        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);

        let wrong: Value = json_body(wrong).await;
        let unknown: Value = json_body(unknown).await;
        assert_eq!(wrong["code"], unknown["code"]);
        assert_eq!(wrong["message"], unknown["message"]);
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let app = test_app();
        let response = call(&app, Method::GET, "/auth/me", None, None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body: Value = json_body(response).await;
        assert_eq!(body["code"], "MISSING_CREDENTIAL");
    }

    #[tokio::test]
    async fn test_admin_routes_reject_plain_user() {
        let app = test_app();
        let grant = register(&app, "alice", "secret1").await;

        let response = call(
            &app,
            Method::DELETE,
            "/auth/users/alice",
            Some(&grant.access_token),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(app.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_admin_manages_users() {
        let app = test_app();
        register(&app, "root", "rootpw").await;
        register(&app, "bob", "bobpw").await;
        app.store.add_role("root", Role::Admin).await.unwrap();

        // 역할 변경은 다음 발급 토큰부터 반영
        let response = call(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "subject": "root", "password": "rootpw" })),
        )
        .await;
        let admin: TokenGrant = json_body(response).await;

        let response = call(
            &app,
            Method::POST,
            "/auth/users/bob/roles",
            Some(&admin.access_token),
            Some(json!({ "role": "Instructor" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let bob: auth::IdentityResponse = json_body(response).await;
        assert_eq!(bob.roles, vec!["user".to_string(), "instructor".to_string()]);

        let response = call(
            &app,
            Method::POST,
            "/auth/users/bob/roles",
            Some(&admin.access_token),
            Some(json!({ "role": "superuser" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = call(
            &app,
            Method::DELETE,
            "/auth/users/bob",
            Some(&admin.access_token),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(app.store.find("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reset_flow() {
        let app = test_app();
        register(&app, "alice", "secret1").await;

        let response = call(
            &app,
            Method::POST,
            "/auth/reset-request",
            None,
            Some(json!({ "subject": "nobody" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let response = call(
            &app,
            Method::POST,
            "/auth/reset-password",
            None,
            Some(json!({
                "subject": "alice",
                "current_password": "secret1",
                "new_password": "secret2"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = call(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "subject": "alice", "password": "secret2" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_tampered_token_is_unauthorized() {
        let app = test_app();
        let grant = register(&app, "alice", "secret1").await;

        let mut token = grant.access_token;
        let last = token.pop().unwrap();
        token.push(if last == 'A' { 'B' } else { 'A' });

        let response = call(&app, Method::GET, "/auth/me", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
