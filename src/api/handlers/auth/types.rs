//! Request and response bodies for the auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Login request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Recovery link request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecoverRequest {
    pub email: String,
}

/// Recovery verification request. `otp` carries the token from the
/// emailed link.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub email: String,
    pub otp: String,
}

/// The signed-in admin as reported to the frontend.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminUser {
    pub email: String,
    pub role: String,
}

/// Successful login or verification response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionUserResponse {
    pub success: bool,
    pub user: AdminUser,
}

impl SessionUserResponse {
    #[must_use]
    pub fn admin(email: &str) -> Self {
        Self {
            success: true,
            user: AdminUser {
                email: email.to_string(),
                role: "admin".to_string(),
            },
        }
    }
}

/// Plain success acknowledgement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    #[must_use]
    pub const fn new() -> Self {
        Self { success: true }
    }
}

impl Default for SuccessResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Failure envelope shared by all endpoints behind the gate and the auth
/// flows themselves.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
}

impl FailureResponse {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}
