//! Recovery verification endpoint: exchanges an emailed token for a
//! session.

use super::session::session_cookie;
use super::state::AuthState;
use super::types::{FailureResponse, SessionUserResponse, VerifyRequest};
use super::utils::normalize_email;
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, info};

/// Exchange a recovery token for a signed-in session. The token must
/// carry the recovery marker; session tokens are rejected here even when
/// both signers share a secret.
#[utoipa::path(
    post,
    path = "/api/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionUserResponse),
        (status = 400, description = "Missing email or otp", body = FailureResponse),
        (status = 401, description = "Invalid or expired otp", body = FailureResponse)
    ),
    tag = "auth"
)]
pub async fn verify(
    Extension(auth_state): Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_fields();
    };

    let email = normalize_email(&request.email);

    if email.is_empty() || request.otp.is_empty() {
        return missing_fields();
    }

    if auth_state.recovery().verify(&request.otp).is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(FailureResponse::new("Invalid or expired otp")),
        )
            .into_response();
    }

    let admin_matches = auth_state
        .allowlist()
        .single_admin_email()
        .is_some_and(|admin_email| admin_email == email);

    if !admin_matches {
        return (
            StatusCode::UNAUTHORIZED,
            Json(FailureResponse::new("Invalid email")),
        )
            .into_response();
    }

    let token = match auth_state.sessions().issue(&email) {
        Ok(token) => token,
        Err(error) => {
            error!("Failed to sign session token: {error}");

            return internal_error();
        }
    };

    let mut response_headers = HeaderMap::new();

    match session_cookie(auth_state.config(), &token) {
        Ok(cookie) => {
            response_headers.insert(SET_COOKIE, cookie);
        }
        Err(error) => {
            error!("Failed to build session cookie: {error}");

            return internal_error();
        }
    }

    info!("Admin {email} signed in through recovery");

    (
        StatusCode::OK,
        response_headers,
        Json(SessionUserResponse::admin(&email)),
    )
        .into_response()
}

fn missing_fields() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(FailureResponse::new("Missing email or otp")),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(FailureResponse::new("Internal server error")),
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
    use axum::{body::Body, http::Request, routing::post, Router};
    use secrecy::SecretString;
    use serde_json::Value;
    use tower::ServiceExt;

    fn auth_state(recovery_ttl_seconds: i64) -> Arc<AuthState> {
        // One shared secret, the CLI fallback when no distinct recovery
        // secret is configured.
        let secret = SecretString::from("shared-secret".to_string());

        let allowlist = AllowlistConfig::new()
            .with_list_file("/nonexistent/admins.json".into())
            .with_admin_email(Some("admin@y.dev".to_string()));

        Arc::new(AuthState::new(
            AuthConfig::new(),
            allowlist,
            SessionSigner::new(&secret, 7200),
            RecoverySigner::new(&secret, recovery_ttl_seconds),
            Arc::new(LogMailer),
        ))
    }

    fn app(state: Arc<AuthState>) -> Router {
        Router::new()
            .route("/api/auth/verify", post(verify))
            .layer(Extension(state))
    }

    fn verify_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/auth/verify")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request")
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        serde_json::from_slice(&bytes).expect("parse body")
    }

    #[tokio::test]
    async fn test_verify_valid_token_signs_in() {
        let state = auth_state(900);
        let otp = state.recovery().issue().expect("issue recovery token");

        let response = app(state.clone())
            .oneshot(verify_request(&format!(
                r#"{{"email":"admin@y.dev","otp":"{otp}"}}"#
            )))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(String::from)
            .expect("set-cookie header");

        assert!(cookie.starts_with("admin_session="));

        let token = cookie
            .trim_start_matches("admin_session=")
            .split(';')
            .next()
            .map(String::from)
            .expect("token in cookie");

        assert!(state.sessions().verify(&token).is_some());

        let value = body_json(response).await;

        assert_eq!(
            value.pointer("/user/email").and_then(Value::as_str),
            Some("admin@y.dev")
        );
    }

    #[tokio::test]
    async fn test_verify_wrong_email() {
        let state = auth_state(900);
        let otp = state.recovery().issue().expect("issue recovery token");

        let response = app(state)
            .oneshot(verify_request(&format!(
                r#"{{"email":"other@y.dev","otp":"{otp}"}}"#
            )))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let value = body_json(response).await;

        assert_eq!(
            value.get("error").and_then(Value::as_str),
            Some("Invalid email")
        );
    }

    #[tokio::test]
    async fn test_verify_garbage_otp() {
        let response = app(auth_state(900))
            .oneshot(verify_request(
                r#"{"email":"admin@y.dev","otp":"garbage"}"#,
            ))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let value = body_json(response).await;

        assert_eq!(
            value.get("error").and_then(Value::as_str),
            Some("Invalid or expired otp")
        );
    }

    #[tokio::test]
    async fn test_verify_expired_otp() {
        let state = auth_state(-120);
        let otp = state.recovery().issue().expect("issue recovery token");

        let response = app(state)
            .oneshot(verify_request(&format!(
                r#"{{"email":"admin@y.dev","otp":"{otp}"}}"#
            )))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_verify_rejects_session_token_as_otp() {
        let state = auth_state(900);
        let session_token = state
            .sessions()
            .issue("admin@y.dev")
            .expect("issue session token");

        let response = app(state)
            .oneshot(verify_request(&format!(
                r#"{{"email":"admin@y.dev","otp":"{session_token}"}}"#
            )))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let value = body_json(response).await;

        assert_eq!(
            value.get("error").and_then(Value::as_str),
            Some("Invalid or expired otp")
        );
    }

    #[tokio::test]
    async fn test_verify_missing_fields() {
        for body in ["", "{}", r#"{"email":"admin@y.dev","otp":""}"#] {
            let response = app(auth_state(900))
                .oneshot(verify_request(body))
                .await
                .expect("run request");

            assert_eq!(
                response.status(),
                StatusCode::BAD_REQUEST,
                "body: {body:?}"
            );

            let value = body_json(response).await;

            assert_eq!(
                value.get("error").and_then(Value::as_str),
                Some("Missing email or otp"),
                "body: {body:?}"
            );
        }
    }
}
