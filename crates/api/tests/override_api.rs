//! Priority override request and review endpoints.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

async fn file_request(app: &TestApp, ticket_id: i64) -> axum::http::Response<axum::body::Body> {
    let token = app.token(REQUESTER, "requester");
    app.post(
        &format!("/api/v1/tickets/{ticket_id}/priority-overrides"),
        &token,
        json!({ "requested_priority": "P1", "reason": "Entire sales team offline" }),
    )
    .await
}

#[tokio::test]
async fn second_pending_request_conflicts() {
    let app = build_test_app();
    let id = app.create_ticket("P3").await;

    let first = file_request(&app, id).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = body_json(first).await["data"].clone();
    assert_eq!(first["status"], "pending");
    assert_eq!(first["previous_priority"], "P3");

    let second = file_request(&app, id).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["code"], "CONFLICT");
}

#[tokio::test]
async fn review_requires_team_lead_or_admin() {
    let app = build_test_app();
    let id = app.create_ticket("P3").await;
    let request_id = body_json(file_request(&app, id).await).await["data"]["id"]
        .as_i64()
        .unwrap();
    let uri = format!("/api/v1/priority-overrides/{request_id}/review");

    for (user, role) in [(REQUESTER, "requester"), (AGENT, "agent")] {
        let token = app.token(user, role);
        let response = app.post(&uri, &token, json!({ "decision": "approved" })).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    let requester = app.token(REQUESTER, "requester");
    let response = app.get("/api/v1/priority-overrides", &requester).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn approval_updates_ticket_and_clears_the_queue() {
    let app = build_test_app();
    let id = app.create_ticket("P3").await;
    let request_id = body_json(file_request(&app, id).await).await["data"]["id"]
        .as_i64()
        .unwrap();
    let lead = app.token(TEAM_LEAD, "team_lead");

    let response = app.get("/api/v1/priority-overrides?status=pending", &lead).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = app
        .post(
            &format!("/api/v1/priority-overrides/{request_id}/review"),
            &lead,
            json!({ "decision": "approved", "note": "Confirmed outage" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["request"]["status"], "approved");
    assert_eq!(data["request"]["reviewed_by"], TEAM_LEAD);
    assert_eq!(data["ticket"]["priority"], "P1");

    let response = app.get("/api/v1/priority-overrides?status=pending", &lead).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 0);

    // Already reviewed.
    let response = app
        .post(
            &format!("/api/v1/priority-overrides/{request_id}/review"),
            &lead,
            json!({ "decision": "rejected" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let requester = app.token(REQUESTER, "requester");
    let response = app
        .get(&format!("/api/v1/priority-overrides/{request_id}"), &requester)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "approved");
}

#[tokio::test]
async fn unknown_queue_status_is_rejected() {
    let app = build_test_app();
    let lead = app.token(TEAM_LEAD, "team_lead");

    let response = app.get("/api/v1/priority-overrides?status=maybe", &lead).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
