//! HTTP surface of the back office: router assembly, the shared
//! middleware stack, and server startup.

use crate::api::handlers::{
    auth::{self, middleware::require_admin, AllowlistConfig, AuthConfig, AuthState},
    health, stats, teams,
};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, Request},
    middleware,
    routing::{get, post},
    Extension, Router,
};
use secrecy::SecretString;
use std::sync::Arc;
use tokio::{net::TcpListener, signal, sync::mpsc};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod audit;
pub mod email;
pub mod handlers;
pub mod openapi;
pub mod store;

use audit::AuditTrail;
use store::{MemoryTeamStore, TeamStore};

/// Build the application router: public auth and health routes, the
/// session-gated team and stats routes, Swagger UI, and the shared
/// middleware stack.
///
/// # Errors
///
/// Returns an error when the configured frontend base URL cannot be
/// turned into a CORS origin.
pub fn router(
    auth_state: Arc<AuthState>,
    store: Arc<dyn TeamStore>,
    audit: AuditTrail,
) -> Result<Router> {
    let frontend_origin = frontend_origin(auth_state.config().frontend_base_url())?;

    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(AllowOrigin::exact(frontend_origin))
        .allow_credentials(true);

    let protected = Router::new()
        .route(
            "/api/teams",
            get(teams::list_teams).post(teams::create_team),
        )
        .route("/api/teams/bulk", post(teams::bulk::bulk))
        .route("/api/teams/export", get(teams::export::export_teams))
        .route(
            "/api/teams/:id",
            get(teams::item::get_team)
                .put(teams::item::update_team)
                .delete(teams::item::delete_team),
        )
        .route("/api/stats", get(stats::stats))
        .route_layer(middleware::from_fn(require_admin));

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/login", post(auth::login::login))
        .route("/api/auth/recover", post(auth::recover::recover))
        .route("/api/auth/verify", post(auth::verify::verify))
        .route("/api/auth/logout", post(auth::session::logout))
        .merge(protected)
        .merge(
            SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(auth_state))
                .layer(Extension(store))
                .layer(Extension(audit)),
        );

    Ok(app)
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    auth_config: AuthConfig,
    allowlist: AllowlistConfig,
    session_secret: SecretString,
    recovery_secret: Option<SecretString>,
    email_config: email::MailerConfig,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    spawn_shutdown_watcher(tx);

    let sessions = auth::tokens::SessionSigner::new(&session_secret, auth_config.session_ttl_seconds());

    // Recovery links stay verifiable with only one secret configured.
    let recovery_secret = recovery_secret.unwrap_or_else(|| session_secret.clone());
    let recovery =
        auth::tokens::RecoverySigner::new(&recovery_secret, auth_config.recovery_ttl_seconds());

    let mailer = email::mailer_from_config(&email_config);

    let auth_state = Arc::new(AuthState::new(
        auth_config,
        allowlist,
        sessions,
        recovery,
        mailer,
    ));

    let store: Arc<dyn TeamStore> = Arc::new(MemoryTeamStore::new());
    let audit = AuditTrail::new();

    let app = router(auth_state, store, audit)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            rx.recv().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn spawn_shutdown_watcher(tx: mpsc::UnboundedSender<()>) {
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received interrupt signal");

                let _ = tx.send(());
            }
            Err(error) => error!("Failed to listen for interrupt signal: {error}"),
        }
    });
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn frontend_origin(frontend_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_base_url)
        .with_context(|| format!("Invalid frontend base URL: {frontend_base_url}"))?;
    let host = parsed.host_str().ok_or_else(|| {
        anyhow!("Frontend base URL must include a valid host: {frontend_base_url}")
    })?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::Value;
    use tower::ServiceExt;

    const SESSION_SECRET: &str = "router-session-secret";

    fn test_state() -> Arc<AuthState> {
        let password_hash = bcrypt::hash("hunter2", 4).expect("hash password");

        let allowlist = AllowlistConfig::new()
            .with_admin_email(Some("admin@example.com".to_string()))
            .with_admin_password_hash(Some(password_hash));

        let secret = SecretString::from(SESSION_SECRET.to_string());

        Arc::new(AuthState::new(
            AuthConfig::new(),
            allowlist,
            auth::tokens::SessionSigner::new(&secret, 3600),
            auth::tokens::RecoverySigner::new(&secret, 900),
            Arc::new(email::LogMailer),
        ))
    }

    fn test_app() -> Router {
        router(
            test_state(),
            Arc::new(MemoryTeamStore::new()),
            AuditTrail::new(),
        )
        .expect("build router")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        serde_json::from_slice(&bytes).expect("parse body")
    }

    #[test]
    fn test_frontend_origin_strips_path() {
        let origin = frontend_origin("https://admin.example.com:8443/console/")
            .expect("parse origin");

        assert_eq!(origin.to_str().ok(), Some("https://admin.example.com:8443"));
    }

    #[test]
    fn test_frontend_origin_rejects_garbage() {
        assert!(frontend_origin("not a url").is_err());
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_team_routes_are_gated() {
        for uri in ["/api/teams", "/api/stats", "/api/teams/export"] {
            let response = test_app()
                .oneshot(
                    Request::builder()
                        .uri(uri)
                        .body(Body::empty())
                        .expect("build request"),
                )
                .await
                .expect("run request");

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri: {uri}");
        }
    }

    #[tokio::test]
    async fn test_login_then_list_teams() {
        let app = test_app();

        let login = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"email":"admin@example.com","password":"hunter2"}"#,
                    ))
                    .expect("build request"),
            )
            .await
            .expect("run request");

        assert_eq!(login.status(), StatusCode::OK);

        let cookie = login
            .headers()
            .get("set-cookie")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::to_string)
            .expect("session cookie");

        let list = app
            .oneshot(
                Request::builder()
                    .uri("/api/teams")
                    .header("cookie", cookie)
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("run request");

        assert_eq!(list.status(), StatusCode::OK);

        let value = body_json(list).await;

        assert_eq!(value.get("success").and_then(Value::as_bool), Some(true));
        assert_eq!(value.get("total").and_then(Value::as_u64), Some(0));
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_frontend_origin() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/auth/login")
                    .header("origin", "http://localhost:8080")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|value| value.to_str().ok()),
            Some("http://localhost:8080")
        );
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-credentials")
                .and_then(|value| value.to_str().ok()),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_requests_get_a_request_id() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("run request");

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .expect("request id header");

        assert!(Ulid::from_string(request_id).is_ok());
    }
}
