//! Session cookie transport and the logout endpoint.

use super::state::{AuthConfig, AuthState};
use super::types::SuccessResponse;
use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::error;

/// Cookie carrying the signed session token.
pub const SESSION_COOKIE_NAME: &str = "admin_session";

/// Build the `Set-Cookie` value for a fresh session.
pub(crate) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();

    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );

    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
}

/// Build the `Set-Cookie` value that clears the session.
pub(crate) fn clear_session_cookie(
    config: &AuthConfig,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");

    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
}

/// Pull the session token out of the `Cookie` header. Segments that do
/// not look like `name=value` are skipped.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;

    for pair in value.split(';') {
        let mut parts = pair.trim().splitn(2, '=');

        let Some(name) = parts.next() else {
            continue;
        };

        let Some(token) = parts.next() else {
            continue;
        };

        if name.trim() == SESSION_COOKIE_NAME {
            return Some(token.trim().to_string());
        }
    }

    None
}

/// Clear the session cookie. Always succeeds, signed in or not.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cleared", body = SuccessResponse)
    ),
    tag = "auth"
)]
pub async fn logout(Extension(auth_state): Extension<Arc<AuthState>>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();

    match clear_session_cookie(auth_state.config()) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(error) => {
            error!("Failed to build clearing session cookie: {error}");
        }
    }

    (StatusCode::OK, headers, Json(SuccessResponse::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_format() {
        let config = AuthConfig::new();

        let cookie = session_cookie(&config, "token123").expect("build session cookie");

        assert_eq!(
            cookie.to_str().expect("cookie header value"),
            "admin_session=token123; Path=/; HttpOnly; SameSite=Lax; Max-Age=7200"
        );
    }

    #[test]
    fn test_session_cookie_secure_over_https() {
        let config =
            AuthConfig::new().with_frontend_base_url("https://admin.example.com".to_string());

        let cookie = session_cookie(&config, "token123").expect("build session cookie");

        assert!(cookie
            .to_str()
            .expect("cookie header value")
            .ends_with("; Secure"));
    }

    #[test]
    fn test_clear_session_cookie() {
        let config = AuthConfig::new();

        let cookie = clear_session_cookie(&config).expect("build clearing cookie");

        assert_eq!(
            cookie.to_str().expect("cookie header value"),
            "admin_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
        );
    }

    #[test]
    fn test_extract_session_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; admin_session=tok.en.123; other=1"),
        );

        assert_eq!(
            extract_session_token(&headers),
            Some("tok.en.123".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_skips_malformed_segments() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("garbage; admin_session=tok"),
        );

        assert_eq!(extract_session_token(&headers), Some("tok".to_string()));
    }

    #[test]
    fn test_extract_session_token_keeps_equals_in_value() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("admin_session=a=b"));

        assert_eq!(extract_session_token(&headers), Some("a=b".to_string()));
    }

    #[test]
    fn test_extract_session_token_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));

        assert_eq!(extract_session_token(&headers), None);

        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }
}
