//! Recovery link request endpoint.

use super::state::AuthState;
use super::types::{FailureResponse, RecoverRequest, SuccessResponse};
use super::utils::{build_recovery_url, normalize_email};
use crate::api::email::RecoveryMessage;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, info};

/// Email a short-lived sign-in link to the configured admin address. Any
/// other address is rejected without detail.
#[utoipa::path(
    post,
    path = "/api/auth/recover",
    request_body = RecoverRequest,
    responses(
        (status = 200, description = "Recovery link dispatched", body = SuccessResponse),
        (status = 400, description = "Invalid email", body = FailureResponse)
    ),
    tag = "auth"
)]
pub async fn recover(
    Extension(auth_state): Extension<Arc<AuthState>>,
    payload: Option<Json<RecoverRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return invalid_email();
    };

    let email = normalize_email(&request.email);

    // Recovery only works when a single admin email is configured, and
    // only for that address.
    let Some(admin_email) = auth_state.allowlist().single_admin_email() else {
        return invalid_email();
    };

    if email.is_empty() || email != admin_email {
        return invalid_email();
    }

    let token = match auth_state.recovery().issue() {
        Ok(token) => token,
        Err(error) => {
            error!("Failed to sign recovery token: {error}");

            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FailureResponse::new("Internal server error")),
            )
                .into_response();
        }
    };

    let link = build_recovery_url(auth_state.config().frontend_base_url(), &token);
    let minutes = auth_state.config().recovery_ttl_seconds() / 60;

    let message = RecoveryMessage {
        to_email: email.clone(),
        subject: "Admin recovery link".to_string(),
        body: format!("Use this link to sign in (valid for {minutes} minutes):\n\n{link}"),
    };

    // Delivery trouble must not break the flow; the link stays observable
    // through the mailer's own logging.
    if let Err(error) = auth_state.mailer().send(&message) {
        error!("Failed to dispatch recovery email for {email}: {error}");
    }

    info!("Recovery link issued for {email}");

    (StatusCode::OK, Json(SuccessResponse::new())).into_response()
}

fn invalid_email() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(FailureResponse::new("Invalid email")),
    )
        .into_response()
}
