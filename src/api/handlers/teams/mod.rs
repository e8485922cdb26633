//! Team roster endpoints. Everything here sits behind the session gate.

pub mod bulk;
pub mod export;
pub mod item;

use crate::api::audit::AuditTrail;
use crate::api::handlers::auth::types::FailureResponse;
use crate::api::store::{
    Team, TeamDraft, TeamQuery, TeamStore, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

/// Fields a registration payload must carry, checked in order.
const REQUIRED_FIELDS: [&str; 7] = [
    "teamName",
    "leaderName",
    "participants",
    "registrationDate",
    "transactionId",
    "paymentStatus",
    "numberOfParticipants",
];

pub(super) fn failure(status: StatusCode, error: &str) -> Response {
    (status, Json(FailureResponse::new(error))).into_response()
}

pub(super) fn internal_error() -> Response {
    failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Listing filters as they arrive on the query string. Numeric values
/// stay strings so malformed input falls back to defaults instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListTeamsQuery {
    /// Case-insensitive substring over names, colleges, and transaction
    /// ids.
    pub search: Option<String>,
    /// Exact payment status; `all` disables the filter.
    pub payment_status: Option<String>,
    /// Exact college carried by at least one participant.
    pub college: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort_by: Option<String>,
    /// `asc` or `desc`, newest first by default.
    pub sort_order: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ListTeamsQuery {
    fn into_query(self) -> TeamQuery {
        let sort_by = self
            .sort_by
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "registrationDate".to_string());
        let sort_desc = self.sort_order.as_deref() != Some("asc");

        let limit = self
            .limit
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        let offset = self
            .offset
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0);

        TeamQuery {
            search: self.search.filter(|value| !value.trim().is_empty()),
            payment_status: self
                .payment_status
                .filter(|value| !value.is_empty() && value != "all"),
            college: self.college.filter(|value| !value.is_empty()),
            date_from: self.date_from.filter(|value| !value.is_empty()),
            date_to: self.date_to.filter(|value| !value.is_empty()),
            sort_by,
            sort_desc,
            limit,
            offset,
        }
    }
}

/// One page of teams plus the total match count.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TeamListResponse {
    pub success: bool,
    pub teams: Vec<Team>,
    pub total: usize,
}

/// List teams with filtering, sorting, and pagination.
#[utoipa::path(
    get,
    path = "/api/teams",
    params(ListTeamsQuery),
    responses(
        (status = 200, description = "One page of teams", body = TeamListResponse),
        (status = 401, description = "No valid session")
    ),
    tag = "teams"
)]
pub async fn list_teams(
    Extension(store): Extension<Arc<dyn TeamStore>>,
    Query(params): Query<ListTeamsQuery>,
) -> impl IntoResponse {
    let query = params.into_query();

    match store.list(&query) {
        Ok(page) => (
            StatusCode::OK,
            Json(TeamListResponse {
                success: true,
                teams: page.teams,
                total: page.total,
            }),
        )
            .into_response(),
        Err(error) => {
            error!("Failed to list teams: {error}");

            internal_error()
        }
    }
}

/// Register a team.
#[utoipa::path(
    post,
    path = "/api/teams",
    request_body = TeamDraft,
    responses(
        (status = 201, description = "Team registered"),
        (status = 400, description = "Incomplete or inconsistent payload", body = FailureResponse),
        (status = 401, description = "No valid session"),
        (status = 409, description = "Duplicate transaction id", body = FailureResponse)
    ),
    tag = "teams"
)]
pub async fn create_team(
    Extension(store): Extension<Arc<dyn TeamStore>>,
    Extension(audit): Extension<AuditTrail>,
    payload: Option<Json<Value>>,
) -> impl IntoResponse {
    let payload = payload.map_or_else(|| Value::Object(Map::new()), |Json(value)| value);

    for field in REQUIRED_FIELDS {
        if payload.get(field).is_none() {
            return failure(StatusCode::BAD_REQUEST, &format!("Missing {field}"));
        }
    }

    let draft: TeamDraft = match serde_json::from_value(payload) {
        Ok(draft) => draft,
        Err(error) => {
            debug!("Rejected malformed registration payload: {error}");

            return failure(StatusCode::BAD_REQUEST, "Invalid payload");
        }
    };

    if draft.participants.len() != draft.number_of_participants {
        return failure(
            StatusCode::BAD_REQUEST,
            "participants must match numberOfParticipants",
        );
    }

    match store.find_by_transaction(&draft.transaction_id) {
        Ok(Some(_)) => {
            return failure(StatusCode::CONFLICT, "Duplicate transactionId");
        }
        Ok(None) => {}
        Err(error) => {
            error!("Failed to check transaction id: {error}");

            return internal_error();
        }
    }

    let team = Team::from_draft(draft);

    if let Err(error) = store.insert(team.clone()) {
        error!("Failed to insert team: {error}");

        return internal_error();
    }

    audit.record(&team.id, "create", Some(team.team_name.clone()));

    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "team": team })),
    )
        .into_response()
}
