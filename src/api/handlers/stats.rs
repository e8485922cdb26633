//! Aggregate view of the registration dataset.

use super::teams::internal_error;
use crate::api::store::{TeamStats, TeamStore};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

/// Success envelope around the aggregate counters.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub stats: TeamStats,
}

/// Dashboard counters: totals, payment split, registrations per day,
/// and the ten most common colleges.
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Aggregate counters", body = StatsResponse),
        (status = 401, description = "No valid session")
    ),
    tag = "stats"
)]
pub async fn stats(Extension(store): Extension<Arc<dyn TeamStore>>) -> impl IntoResponse {
    match store.stats() {
        Ok(stats) => {
            (StatusCode::OK, Json(StatsResponse { success: true, stats })).into_response()
        }
        Err(error) => {
            error!("Failed to aggregate team stats: {error}");

            internal_error()
        }
    }
}
