//! Bulk operations over a list of team ids.

use super::{failure, internal_error};
use crate::api::audit::AuditTrail;
use crate::api::store::{valid_team_id, TeamStore};
use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, Json,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::error;

/// Apply one action to many teams: `delete`, `updatePaymentStatus`, or
/// `export`. Accepts the ids under `teamIds`, or `ids` for older
/// clients. Malformed ids in the list are skipped.
#[utoipa::path(
    post,
    path = "/api/teams/bulk",
    responses(
        (status = 200, description = "Action applied"),
        (status = 400, description = "Missing ids, missing status, or unknown action"),
        (status = 401, description = "No valid session")
    ),
    tag = "teams"
)]
pub async fn bulk(
    Extension(store): Extension<Arc<dyn TeamStore>>,
    Extension(audit): Extension<AuditTrail>,
    payload: Option<Json<Value>>,
) -> impl IntoResponse {
    let payload = payload.map_or_else(|| Value::Object(Map::new()), |Json(value)| value);

    let list = payload
        .get("teamIds")
        .and_then(Value::as_array)
        .or_else(|| payload.get("ids").and_then(Value::as_array));

    let Some(list) = list.filter(|list| !list.is_empty()) else {
        return failure(StatusCode::BAD_REQUEST, "teamIds required");
    };

    let ids: Vec<String> = list
        .iter()
        .filter_map(Value::as_str)
        .filter(|id| valid_team_id(id))
        .map(String::from)
        .collect();

    let action = payload.get("action").and_then(Value::as_str).unwrap_or("");

    match action {
        "delete" => match store.delete_many(&ids) {
            Ok(count) => {
                for id in &ids {
                    audit.record(id, "bulk-delete", None);
                }

                (StatusCode::OK, Json(json!({ "success": true, "count": count })))
                    .into_response()
            }
            Err(error) => {
                error!("Failed to bulk-delete teams: {error}");

                internal_error()
            }
        },
        "updatePaymentStatus" => {
            let Some(payment_status) = payload
                .get("paymentStatus")
                .and_then(Value::as_str)
                .filter(|status| !status.is_empty())
            else {
                return failure(StatusCode::BAD_REQUEST, "paymentStatus required");
            };

            match store.set_payment_status(&ids, payment_status) {
                Ok(count) => {
                    for id in &ids {
                        audit.record(id, &format!("bulk-status-{payment_status}"), None);
                    }

                    (StatusCode::OK, Json(json!({ "success": true, "count": count })))
                        .into_response()
                }
                Err(error) => {
                    error!("Failed to bulk-update payment status: {error}");

                    internal_error()
                }
            }
        }
        "export" => match store.fetch_many(&ids) {
            Ok(teams) => {
                let count = teams.len();

                (
                    StatusCode::OK,
                    Json(json!({ "success": true, "teams": teams, "count": count })),
                )
                    .into_response()
            }
            Err(error) => {
                error!("Failed to fetch teams for export: {error}");

                internal_error()
            }
        },
        _ => failure(StatusCode::BAD_REQUEST, "Unknown action"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::store::{MemoryTeamStore, Participant, Team, TeamDraft};
    use axum::{body::Body, http::Request, response::Response, routing::post, Router};
    use tower::ServiceExt;

    fn seeded() -> (Arc<dyn TeamStore>, AuditTrail, Vec<String>) {
        let store = MemoryTeamStore::new();
        let mut ids = Vec::new();

        for (name, transaction_id) in [("Alpha", "TXN-001"), ("Bravo", "TXN-002"), ("Charlie", "TXN-003")]
        {
            let team = Team::from_draft(TeamDraft {
                team_name: name.to_string(),
                leader_name: format!("{name} Lead"),
                number_of_participants: 1,
                participants: vec![Participant {
                    name: format!("{name} Jr"),
                    email: "p@students.dev".to_string(),
                    phone: "555-0100".to_string(),
                    college: "North College".to_string(),
                }],
                registration_date: "2026-01-10T09:00:00.000Z".to_string(),
                payment_status: "Unpaid".to_string(),
                transaction_id: transaction_id.to_string(),
            });

            ids.push(team.id.clone());
            store.insert(team).expect("insert team");
        }

        (Arc::new(store), AuditTrail::new(), ids)
    }

    fn app(store: Arc<dyn TeamStore>, audit: AuditTrail) -> Router {
        Router::new()
            .route("/api/teams/bulk", post(bulk))
            .layer(Extension(store))
            .layer(Extension(audit))
    }

    fn bulk_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/teams/bulk")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request")
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        serde_json::from_slice(&bytes).expect("parse body")
    }

    #[tokio::test]
    async fn test_bulk_delete() {
        let (store, audit, ids) = seeded();

        let body = json!({ "action": "delete", "teamIds": [ids[0], ids[1]] }).to_string();

        let response = app(store.clone(), audit.clone())
            .oneshot(bulk_request(&body))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::OK);

        let value = body_json(response).await;

        assert_eq!(value.get("count").and_then(Value::as_u64), Some(2));
        assert_eq!(store.fetch_all().expect("fetch all").len(), 1);

        assert_eq!(audit.recent_default(&ids[0])[0].action, "bulk-delete");
        assert_eq!(audit.recent_default(&ids[1])[0].action, "bulk-delete");
    }

    #[tokio::test]
    async fn test_bulk_delete_accepts_legacy_ids_key() {
        let (store, audit, ids) = seeded();

        let body = json!({ "action": "delete", "ids": [ids[2]] }).to_string();

        let response = app(store.clone(), audit)
            .oneshot(bulk_request(&body))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.fetch_all().expect("fetch all").len(), 2);
    }

    #[tokio::test]
    async fn test_bulk_update_payment_status() {
        let (store, audit, ids) = seeded();

        let body = json!({
            "action": "updatePaymentStatus",
            "teamIds": ids,
            "paymentStatus": "Paid"
        })
        .to_string();

        let response = app(store.clone(), audit.clone())
            .oneshot(bulk_request(&body))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::OK);

        let value = body_json(response).await;

        assert_eq!(value.get("count").and_then(Value::as_u64), Some(3));
        assert!(store
            .fetch_all()
            .expect("fetch all")
            .iter()
            .all(|team| team.payment_status == "Paid"));

        assert_eq!(audit.recent_default(&ids[0])[0].action, "bulk-status-Paid");
    }

    #[tokio::test]
    async fn test_bulk_update_requires_payment_status() {
        let (store, audit, ids) = seeded();

        let body = json!({ "action": "updatePaymentStatus", "teamIds": ids }).to_string();

        let response = app(store, audit)
            .oneshot(bulk_request(&body))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let value = body_json(response).await;

        assert_eq!(
            value.get("error").and_then(Value::as_str),
            Some("paymentStatus required")
        );
    }

    #[tokio::test]
    async fn test_bulk_export() {
        let (store, audit, ids) = seeded();

        let body = json!({ "action": "export", "teamIds": [ids[0], ids[2]] }).to_string();

        let response = app(store, audit)
            .oneshot(bulk_request(&body))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::OK);

        let value = body_json(response).await;

        assert_eq!(value.get("count").and_then(Value::as_u64), Some(2));
        assert_eq!(
            value
                .get("teams")
                .and_then(Value::as_array)
                .map(Vec::len),
            Some(2)
        );
    }

    #[tokio::test]
    async fn test_bulk_requires_ids() {
        let (store, audit, _) = seeded();
        let app = app(store, audit);

        for body in [
            "{}",
            r#"{"action":"delete"}"#,
            r#"{"action":"delete","teamIds":[]}"#,
            r#"{"action":"delete","teamIds":"oops"}"#,
        ] {
            let response = app
                .clone()
                .oneshot(bulk_request(body))
                .await
                .expect("run request");

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");

            let value = body_json(response).await;

            assert_eq!(
                value.get("error").and_then(Value::as_str),
                Some("teamIds required"),
                "body: {body}"
            );
        }
    }

    #[tokio::test]
    async fn test_bulk_unknown_action() {
        let (store, audit, ids) = seeded();

        let body = json!({ "action": "archive", "teamIds": ids }).to_string();

        let response = app(store, audit)
            .oneshot(bulk_request(&body))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let value = body_json(response).await;

        assert_eq!(
            value.get("error").and_then(Value::as_str),
            Some("Unknown action")
        );
    }

    #[tokio::test]
    async fn test_bulk_skips_malformed_ids() {
        let (store, audit, ids) = seeded();

        let body = json!({
            "action": "delete",
            "teamIds": [ids[0], "not-an-id", 42]
        })
        .to_string();

        let response = app(store.clone(), audit)
            .oneshot(bulk_request(&body))
            .await
            .expect("run request");

        assert_eq!(response.status(), StatusCode::OK);

        let value = body_json(response).await;

        assert_eq!(value.get("count").and_then(Value::as_u64), Some(1));
        assert_eq!(store.fetch_all().expect("fetch all").len(), 2);
    }
}
