//! Ticket endpoints: intake, visibility, transitions and escalation.

mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::json;

fn resolution() -> serde_json::Value {
    json!({
        "status": "resolved",
        "resolution_summary": "Reseated the RAM module",
        "resolution_category": "hardware",
        "root_cause": "Loose memory module after office move",
    })
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = build_test_app();
    let response = app.send(Method::GET, "/api/v1/tickets", None, None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = build_test_app();
    let response = app.get("/api/v1/tickets", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn requester_creates_ticket_with_deadlines() {
    let app = build_test_app();
    let token = app.token(REQUESTER, "requester");

    let response = app
        .post(
            "/api/v1/tickets",
            &token,
            json!({ "title": "Cannot reach the VPN", "priority": "P2" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let data = body_json(response).await["data"].clone();
    assert_eq!(data["status"], "new");
    assert_eq!(data["priority"], "P2");
    assert_eq!(data["requester_id"], REQUESTER);
    assert!(data["number"].as_str().unwrap().starts_with("TKT-"));
    assert!(data["sla_response_due"].is_string());
    assert!(data["sla_resolution_due"].is_string());
}

#[tokio::test]
async fn blank_title_is_a_validation_error() {
    let app = build_test_app();
    let token = app.token(REQUESTER, "requester");

    let response = app
        .post("/api/v1/tickets", &token, json!({ "title": "", "priority": "P3" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn requesters_only_see_their_own_tickets() {
    let app = build_test_app();
    let id = app.create_ticket("P3").await;

    let stranger = app.token(OTHER_REQUESTER, "requester");
    let response = app.get(&format!("/api/v1/tickets/{id}"), &stranger).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Filtering by someone else's id is overridden for requesters.
    let response = app
        .get(&format!("/api/v1/tickets?requester_id={REQUESTER}"), &stranger)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 0);

    let agent = app.token(AGENT, "agent");
    let response = app.get("/api/v1/tickets?status=new", &agent).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_list_filter_is_rejected() {
    let app = build_test_app();
    let agent = app.token(AGENT, "agent");

    let response = app.get("/api/v1/tickets?priority=P9", &agent).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn requester_cannot_change_status() {
    let app = build_test_app();
    let id = app.create_ticket("P3").await;
    let token = app.token(REQUESTER, "requester");

    let response = app
        .put(
            &format!("/api/v1/tickets/{id}/status"),
            &token,
            json!({ "status": "in_progress" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn resolution_gate_and_confirmation_flow() {
    let app = build_test_app();
    let id = app.create_ticket("P3").await;
    let agent = app.token(AGENT, "agent");

    let response = app
        .put(
            &format!("/api/v1/tickets/{id}/status"),
            &agent,
            json!({ "status": "resolved", "resolution_summary": "Fixed" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("root_cause"));

    let mut body = resolution();
    body["request_confirmation"] = json!(true);
    let response = app
        .put(&format!("/api/v1/tickets/{id}/status"), &agent, body)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["status"], "resolved");
    assert!(data["pending_confirmation_since"].is_string());

    // Only the requester may confirm.
    let response = app
        .send(
            Method::POST,
            &format!("/api/v1/tickets/{id}/confirm"),
            Some(&agent),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let requester = app.token(REQUESTER, "requester");
    let response = app
        .send(
            Method::POST,
            &format!("/api/v1/tickets/{id}/confirm"),
            Some(&requester),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "closed");

    let response = app
        .get(&format!("/api/v1/tickets/{id}/history"), &requester)
        .await;
    let history = body_json(response).await["data"].clone();
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["new_status"], "closed");
    assert_eq!(history[1]["changed_by"], REQUESTER);
}

#[tokio::test]
async fn invalid_transition_is_a_validation_error() {
    let app = build_test_app();
    let id = app.create_ticket("P3").await;
    let agent = app.token(AGENT, "agent");

    let response = app
        .put(
            &format!("/api/v1/tickets/{id}/status"),
            &agent,
            json!({ "status": "reopened" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_ticket_is_404() {
    let app = build_test_app();
    let agent = app.token(AGENT, "agent");

    let response = app.get("/api/v1/tickets/99999", &agent).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn priority_edit_is_admin_only() {
    let app = build_test_app();
    let id = app.create_ticket("P4").await;
    let uri = format!("/api/v1/tickets/{id}/priority");

    let agent = app.token(AGENT, "agent");
    let response = app.put(&uri, &agent, json!({ "priority": "P1" })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = app.token(ADMIN, "admin");
    let response = app.put(&uri, &admin, json!({ "priority": "P1" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["priority"], "P1");

    let response = app
        .get(&format!("/api/v1/tickets/{id}/priority-changes"), &admin)
        .await;
    let changes = body_json(response).await["data"].clone();
    assert_eq!(changes[0]["old_priority"], "P4");
    assert_eq!(changes[0]["changed_by"], ADMIN);
}

#[tokio::test]
async fn staff_can_assign_and_escalate() {
    let app = build_test_app();
    let id = app.create_ticket("P2").await;
    let lead = app.token(TEAM_LEAD, "team_lead");

    let response = app
        .put(
            &format!("/api/v1/tickets/{id}/assignee"),
            &lead,
            json!({ "assigned_to": AGENT }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["assigned_to"], AGENT);

    let response = app
        .post(
            &format!("/api/v1/tickets/{id}/escalations"),
            &lead,
            json!({ "severity": "high", "reason": "Payroll run blocked" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["source"], "manual");
    assert_eq!(data["escalated_by"], TEAM_LEAD);

    let requester = app.token(REQUESTER, "requester");
    let response = app
        .get(&format!("/api/v1/tickets/{id}/escalations"), &requester)
        .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = app
        .post(
            &format!("/api/v1/tickets/{id}/escalations"),
            &requester,
            json!({ "severity": "critical", "reason": "Please hurry" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
