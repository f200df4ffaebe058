//! HTTP surface for the intake pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use super::domain::{ClientContext, IdentityId, SubmissionRequest};
use super::gateway::SecurityError;
use super::service::{IntakeError, IntakePipeline};

/// Header a host sets for requests from an authenticated session.
pub const IDENTITY_HEADER: &str = "x-wellform-identity";

const FORWARDED_HEADER: &str = "x-forwarded-for";

pub fn intake_router(pipeline: Arc<IntakePipeline>) -> Router {
    Router::new()
        .route("/api/v1/assessments", get(list_assessments))
        .route("/api/v1/assessments/submit", post(submit_assessment))
        .with_state(pipeline)
}

async fn list_assessments(State(pipeline): State<Arc<IntakePipeline>>) -> Response {
    Json(json!({ "success": true, "data": pipeline.summaries() })).into_response()
}

async fn submit_assessment(
    State(pipeline): State<Arc<IntakePipeline>>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Json(request): Json<SubmissionRequest>,
) -> Response {
    let ctx = client_context(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    match pipeline.submit(request, &ctx) {
        Ok(receipt) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": receipt })),
        )
            .into_response(),
        Err(error) => {
            let body = json!({ "success": false, "data": { "message": error.to_string() } });
            (status_for(&error), Json(body)).into_response()
        }
    }
}

fn status_for(error: &IntakeError) -> StatusCode {
    match error {
        IntakeError::Security(SecurityError::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
        IntakeError::Security(_) => StatusCode::FORBIDDEN,
        IntakeError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        IntakeError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the client context from proxy headers, falling back to the peer
/// address when no forwarding header is present.
fn client_context(headers: &HeaderMap, peer: Option<SocketAddr>) -> ClientContext {
    let source_ip = forwarded_ip(headers)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string());

    let session_identity = headers
        .get(IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .map(IdentityId);

    ClientContext {
        source_ip,
        session_identity,
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(FORWARDED_HEADER)?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}
