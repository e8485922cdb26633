//! Login endpoint: password check, session issuance, cookie hand-off.

use super::session::session_cookie;
use super::state::AuthState;
use super::types::{FailureResponse, LoginRequest, SessionUserResponse};
use super::utils::{extract_client_ip, normalize_email};
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, info};

/// Authenticate an admin and set the session cookie.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionUserResponse),
        (status = 400, description = "Missing email or password", body = FailureResponse),
        (status = 401, description = "Invalid credentials", body = FailureResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(auth_state): Extension<Arc<AuthState>>,
    headers: HeaderMap,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_fields();
    };

    let email = normalize_email(&request.email);

    if email.is_empty() || request.password.is_empty() {
        return missing_fields();
    }

    if !auth_state.verify_password(&email, &request.password) {
        let client_ip = extract_client_ip(&headers).unwrap_or_else(|| "unknown".to_string());

        info!("Rejected login for {email} from {client_ip}");

        return (
            StatusCode::UNAUTHORIZED,
            Json(FailureResponse::new("Invalid credentials")),
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

    info!("Admin {email} signed in");

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
        Json(FailureResponse::new("Missing email or password")),
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
