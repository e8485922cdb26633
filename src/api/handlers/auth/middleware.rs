//! Session gate applied to every team-data route.

use super::session::extract_session_token;
use super::state::AuthState;
use axum::{
    extract::{Extension, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Reject any request without a valid admin session. The response never
/// distinguishes missing, expired, or forged tokens.
pub async fn require_admin(
    Extension(auth_state): Extension<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_session_token(request.headers()) else {
        debug!("Session gate rejected request without a session cookie");

        return unauthorized();
    };

    if auth_state.sessions().verify(&token).is_none() {
        debug!("Session gate rejected an invalid session token");

        return unauthorized();
    }

    next.run(request).await
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogMailer;
    use crate::api::handlers::auth::allowlist::AllowlistConfig;
    use crate::api::handlers::auth::state::AuthConfig;
    use crate::api::handlers::auth::tokens::{RecoverySigner, SessionSigner};
    use axum::{body::Body, http::Request as HttpRequest, middleware, routing::get, Router};
    use secrecy::SecretString;
    use tower::ServiceExt;

    fn auth_state(session_ttl_seconds: i64) -> Arc<AuthState> {
        let secret = SecretString::from("test-secret".to_string());

        Arc::new(AuthState::new(
            AuthConfig::new(),
            AllowlistConfig::new().with_list_file("/nonexistent/admins.json".into()),
            SessionSigner::new(&secret, session_ttl_seconds),
            RecoverySigner::new(&secret, 900),
            Arc::new(LogMailer),
        ))
    }

    fn app(auth_state: Arc<AuthState>) -> Router {
        Router::new()
            .route("/protected", get(|| async { "ok" }))
            .route_layer(middleware::from_fn(require_admin))
            .layer(Extension(auth_state))
    }

    fn request_with_cookie(cookie: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .uri("/protected")
            .header("cookie", cookie)
            .body(Body::empty())
            .expect("build request")
    }

    #[tokio::test]
    async fn test_gate_rejects_missing_cookie() {
        let app = app(auth_state(7200));

        let request = HttpRequest::builder()
            .uri("/protected")
            .body(Body::empty())
            .expect("build request");

        let response = app.oneshot(request).await.expect("run request");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let value: serde_json::Value = serde_json::from_slice(&body).expect("parse body");

        assert_eq!(
            value.get("error").and_then(serde_json::Value::as_str),
            Some("Unauthorized")
        );
    }

    #[tokio::test]
    async fn test_gate_accepts_valid_session() {
        let state = auth_state(7200);
        let token = state
            .sessions()
            .issue("admin@y.dev")
            .expect("issue session token");

        let response = app(state)
            .oneshot(request_with_cookie(&format!("admin_session={token}")))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_gate_rejects_garbage_token() {
        let response = app(auth_state(7200))
            .oneshot(request_with_cookie("admin_session=garbage"))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_gate_rejects_expired_session() {
        let state = auth_state(-120);
        let token = state
            .sessions()
            .issue("admin@y.dev")
            .expect("issue session token");

        let response = app(state)
            .oneshot(request_with_cookie(&format!("admin_session={token}")))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_gate_rejects_foreign_signature() {
        let foreign = SessionSigner::new(&SecretString::from("other-secret".to_string()), 7200);
        let token = foreign.issue("admin@y.dev").expect("issue session token");

        let response = app(auth_state(7200))
            .oneshot(request_with_cookie(&format!("admin_session={token}")))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_gate_ignores_other_cookies() {
        let state = auth_state(7200);
        let token = state
            .sessions()
            .issue("admin@y.dev")
            .expect("issue session token");

        let response = app(state)
            .oneshot(request_with_cookie(&format!("other_cookie={token}")))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
