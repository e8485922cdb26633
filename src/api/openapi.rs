use super::handlers::auth::types::{
    AdminUser, FailureResponse, LoginRequest, RecoverRequest, SessionUserResponse,
    SuccessResponse, VerifyRequest,
};
use super::handlers::health::Health;
use super::handlers::stats::StatsResponse;
use super::handlers::teams::TeamListResponse;
use super::handlers::{auth, health, stats, teams};
use crate::api::store::{CollegeCount, DateCount, Participant, Team, TeamDraft, TeamStats};
use utoipa::OpenApi;

/// Add new endpoints here so they are both served and documented. Info,
/// contact, and license come from Cargo.toml metadata.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::login::login,
        auth::recover::recover,
        auth::verify::verify,
        auth::session::logout,
        teams::list_teams,
        teams::create_team,
        teams::item::get_team,
        teams::item::update_team,
        teams::item::delete_team,
        teams::bulk::bulk,
        teams::export::export_teams,
        stats::stats,
    ),
    components(schemas(
        Health,
        LoginRequest,
        RecoverRequest,
        VerifyRequest,
        AdminUser,
        SessionUserResponse,
        SuccessResponse,
        FailureResponse,
        Team,
        TeamDraft,
        Participant,
        TeamListResponse,
        TeamStats,
        DateCount,
        CollegeCount,
        StatsResponse,
    )),
    tags(
        (name = "auth", description = "Admin login, recovery, and session endpoints"),
        (name = "teams", description = "Registration dataset endpoints"),
        (name = "stats", description = "Aggregate dashboard counters"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

/// Generated OpenAPI document, shared by the docs route and the `openapi` binary.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
