//! Single-team endpoints: fetch with audit history, partial update,
//! delete.

use super::{failure, internal_error};
use crate::api::audit::AuditTrail;
use crate::api::store::{valid_team_id, TeamStore};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::error;

/// Fields a partial update may touch. Anything else rejects the request.
const ALLOWED_UPDATE_FIELDS: [&str; 7] = [
    "teamName",
    "leaderName",
    "numberOfParticipants",
    "participants",
    "registrationDate",
    "transactionId",
    "paymentStatus",
];

/// Fetch one team with its recent audit entries embedded.
#[utoipa::path(
    get,
    path = "/api/teams/{id}",
    params(("id" = String, Path, description = "Team id")),
    responses(
        (status = 200, description = "Team with recent audit history"),
        (status = 400, description = "Malformed id"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Unknown team")
    ),
    tag = "teams"
)]
pub async fn get_team(
    Extension(store): Extension<Arc<dyn TeamStore>>,
    Extension(audit): Extension<AuditTrail>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if !valid_team_id(&id) {
        return failure(StatusCode::BAD_REQUEST, "Invalid id");
    }

    match store.get(&id) {
        Ok(Some(team)) => {
            let mut team_value = json!(team);

            if let Some(fields) = team_value.as_object_mut() {
                fields.insert("audit".to_string(), json!(audit.recent_default(&id)));
            }

            (
                StatusCode::OK,
                Json(json!({ "success": true, "team": team_value })),
            )
                .into_response()
        }
        Ok(None) => failure(StatusCode::NOT_FOUND, "Not found"),
        Err(error) => {
            error!("Failed to fetch team {id}: {error}");

            internal_error()
        }
    }
}

/// Apply a partial update to one team.
#[utoipa::path(
    put,
    path = "/api/teams/{id}",
    params(("id" = String, Path, description = "Team id")),
    responses(
        (status = 200, description = "Updated team"),
        (status = 400, description = "Malformed id or payload"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Unknown team")
    ),
    tag = "teams"
)]
pub async fn update_team(
    Extension(store): Extension<Arc<dyn TeamStore>>,
    Extension(audit): Extension<AuditTrail>,
    Path(id): Path<String>,
    payload: Option<Json<Value>>,
) -> impl IntoResponse {
    if !valid_team_id(&id) {
        return failure(StatusCode::BAD_REQUEST, "Invalid id");
    }

    let payload = payload.map_or_else(|| Value::Object(Map::new()), |Json(value)| value);

    let Value::Object(changes) = payload else {
        return failure(StatusCode::BAD_REQUEST, "Invalid payload");
    };

    for key in changes.keys() {
        if !ALLOWED_UPDATE_FIELDS.contains(&key.as_str()) {
            return failure(StatusCode::BAD_REQUEST, &format!("Unexpected field: {key}"));
        }
    }

    // Count and roster only have to agree when the update names both.
    if let (Some(participants), Some(count)) = (
        changes.get("participants").and_then(Value::as_array),
        changes.get("numberOfParticipants").and_then(Value::as_u64),
    ) {
        if participants.len() as u64 != count {
            return failure(
                StatusCode::BAD_REQUEST,
                "participants must match numberOfParticipants",
            );
        }
    }

    match store.update(&id, &changes) {
        Ok(Some(team)) => {
            let fields: Vec<&str> = changes.keys().map(String::as_str).collect();

            audit.record(&id, "update", serde_json::to_string(&fields).ok());

            (
                StatusCode::OK,
                Json(json!({ "success": true, "team": team })),
            )
                .into_response()
        }
        Ok(None) => failure(StatusCode::NOT_FOUND, "Not found"),
        Err(error) => {
            if error.downcast_ref::<serde_json::Error>().is_some() {
                return failure(StatusCode::BAD_REQUEST, "Invalid payload");
            }

            error!("Failed to update team {id}: {error}");

            internal_error()
        }
    }
}

/// Delete one team.
#[utoipa::path(
    delete,
    path = "/api/teams/{id}",
    params(("id" = String, Path, description = "Team id")),
    responses(
        (status = 200, description = "Team removed"),
        (status = 400, description = "Malformed id"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Unknown team")
    ),
    tag = "teams"
)]
pub async fn delete_team(
    Extension(store): Extension<Arc<dyn TeamStore>>,
    Extension(audit): Extension<AuditTrail>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if !valid_team_id(&id) {
        return failure(StatusCode::BAD_REQUEST, "Invalid id");
    }

    match store.delete(&id) {
        Ok(0) => failure(StatusCode::NOT_FOUND, "Not found"),
        Ok(count) => {
            audit.record(&id, "delete", None);

            (
                StatusCode::OK,
                Json(json!({ "success": true, "count": count })),
            )
                .into_response()
        }
        Err(error) => {
            error!("Failed to delete team {id}: {error}");

            internal_error()
        }
    }
}
