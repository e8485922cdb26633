//! Dataset export as a CSV download or a JSON envelope.

use super::internal_error;
use crate::api::store::{valid_team_id, Team, TeamStore};
use axum::{
    extract::{Extension, Query},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;
use utoipa::IntoParams;

/// Column order of the CSV download.
const CSV_COLUMNS: [&str; 8] = [
    "_id",
    "teamName",
    "leaderName",
    "numberOfParticipants",
    "participants",
    "registrationDate",
    "transactionId",
    "paymentStatus",
];

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// `csv` (default) or `json`.
    pub format: Option<String>,
    /// Comma-separated ids restricting the export. Malformed ids are
    /// dropped.
    pub team_ids: Option<String>,
    /// Legacy alias for `teamIds`.
    pub ids: Option<String>,
}

/// Export the dataset, optionally restricted to a list of ids. The
/// whole roster is exported when no ids are given.
#[utoipa::path(
    get,
    path = "/api/teams/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "Export in the requested format"),
        (status = 401, description = "No valid session")
    ),
    tag = "teams"
)]
pub async fn export_teams(
    Extension(store): Extension<Arc<dyn TeamStore>>,
    Query(query): Query<ExportQuery>,
) -> impl IntoResponse {
    let ExportQuery {
        format,
        team_ids,
        ids,
    } = query;

    let id_param = team_ids
        .filter(|value| !value.trim().is_empty())
        .or_else(|| ids.filter(|value| !value.trim().is_empty()));

    let teams = match id_param {
        Some(raw) => {
            let ids: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty() && valid_team_id(id))
                .map(String::from)
                .collect();

            store.fetch_many(&ids)
        }
        None => store.fetch_all(),
    };

    let teams = match teams {
        Ok(teams) => teams,
        Err(error) => {
            error!("Failed to fetch teams for export: {error}");

            return internal_error();
        }
    };

    if format.as_deref() == Some("json") {
        return (
            StatusCode::OK,
            Json(json!({ "success": true, "teams": teams })),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"teams_export.csv\"",
            ),
        ],
        render_csv(&teams),
    )
        .into_response()
}

/// Quote a cell when it carries a delimiter, a quote, or a line break.
fn csv_field(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_csv(teams: &[Team]) -> String {
    let mut lines = Vec::with_capacity(teams.len() + 1);
    lines.push(CSV_COLUMNS.join(","));

    for team in teams {
        let participants =
            serde_json::to_string(&team.participants).unwrap_or_else(|_| "[]".to_string());

        let row = [
            csv_field(&team.id),
            csv_field(&team.team_name),
            csv_field(&team.leader_name),
            team.number_of_participants.to_string(),
            csv_field(&participants),
            csv_field(&team.registration_date),
            csv_field(&team.transaction_id),
            csv_field(&team.payment_status),
        ];

        lines.push(row.join(","));
    }

    lines.join("\n")
}
