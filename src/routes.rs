//! HTTP handlers for the two endpoints of the bridge.
//!
//! `POST /webhook/donation` runs the admission pipeline in fixed order:
//! signature, rate limit, parse, duplicate check, validation, store. The
//! first failing check short-circuits with its status code; no partial
//! admission occurs. `GET /donations` is the retrieval gate: credential,
//! rate limit, then drain-and-mark.

use crate::app::AppState;
use crate::cors::{API_KEY_HEADER, SIGNATURE_HEADER};
use crate::dedup;
use crate::error::{PledgewayError, Result};
use crate::signature::constant_time_compare;
use crate::store::DonationView;
use crate::validation::DonationPayload;
use axum::{
    Json,
    body::Bytes,
    extract::{ConnectInfo, Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::net::SocketAddr;

/// Response body for webhook submissions.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
}

impl SubmitResponse {
    fn received() -> Self {
        Self {
            success: true,
            message: "Donation received".to_string(),
        }
    }

    /// Duplicates are acknowledged as success so a retrying provider (or a
    /// malicious resender) cannot tell the delivery was suppressed.
    fn duplicate() -> Self {
        Self {
            success: true,
            message: "Donation already processed".to_string(),
        }
    }
}

/// Response body for retrieval polls.
#[derive(Debug, Serialize)]
pub struct DonationsResponse {
    pub success: bool,
    pub count: usize,
    pub donations: Vec<DonationView>,
}

#[derive(Debug, Deserialize)]
pub struct RetrievalQuery {
    pub api_key: Option<String>,
}

/// `POST /webhook/donation` - admit a provider callback.
pub async fn submit_donation(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SubmitResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !state.verifier.verify_signature(&body, signature).await? {
        return Err(PledgewayError::unauthorized("Invalid webhook signature"));
    }

    let origin = client_origin(&headers, connect_info, state.config.submission_limit.trust_proxy);
    if !state.submission_limiter.allow(&origin).await {
        return Err(PledgewayError::too_many_requests(
            "Too many submissions from this origin",
        ));
    }

    let payload: DonationPayload = serde_json::from_slice(&body)
        .map_err(|e| PledgewayError::bad_request(format!("Invalid donation payload: {}", e)))?;

    let key = dedup::submission_key(
        &payload.donor_name,
        payload.amount,
        state.clock.now_millis(),
    );
    if state.duplicates.seen_and_record(&key).await {
        tracing::info!(donor = %payload.donor_name.trim(), "duplicate submission suppressed");
        return Ok(Json(SubmitResponse::duplicate()));
    }

    payload
        .validate()
        .map_err(|e| PledgewayError::bad_request(format!("Invalid donation payload: {}", e)))?;

    let event = state.store.admit(payload).await;
    tracing::info!(
        event_id = %event.id,
        donor = %event.donor_name,
        amount = event.amount,
        "donation admitted"
    );

    Ok(Json(SubmitResponse::received()))
}

/// `GET /donations` - retrieval gate for the polling consumer.
pub async fn fetch_donations(
    State(state): State<AppState>,
    Query(query): Query<RetrievalQuery>,
    headers: HeaderMap,
) -> Result<Json<DonationsResponse>> {
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or(query.api_key);

    let presented = presented
        .ok_or_else(|| PledgewayError::unauthorized("Missing API key"))?;

    // Credential check precedes the limiter: each invalid key maps to its
    // own (absent) identity bucket, so failed auth never drains the quota of
    // the legitimate consumer.
    if !constant_time_compare(
        presented.as_bytes(),
        state.config.retrieval.api_key.as_bytes(),
    ) {
        return Err(PledgewayError::unauthorized("Invalid API key"));
    }

    let identity = credential_identity(&presented);
    if !state.retrieval_limiter.allow(&identity).await {
        return Err(PledgewayError::too_many_requests("Polling too frequently"));
    }

    let events = state.store.take_unprocessed().await;
    tracing::debug!(count = events.len(), "donations delivered to consumer");

    let donations: Vec<DonationView> = events.into_iter().map(DonationView::from).collect();
    Ok(Json(DonationsResponse {
        success: true,
        count: donations.len(),
        donations,
    }))
}

/// `GET /health` - liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Normalized client origin used as the submission limiter identity.
///
/// X-Forwarded-For is only consulted when the deployment trusts its proxy
/// to set it; otherwise spoofed headers would bypass per-origin limiting.
/// The leftmost entry is the original client. Falls back to the connection
/// address, then to a shared bucket when neither is available.
fn client_origin(
    headers: &HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    trust_proxy: bool,
) -> String {
    if trust_proxy {
        if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            let client = forwarded.split(',').next().unwrap_or(forwarded).trim();
            if !client.is_empty() {
                return client.to_string();
            }
        }
    }

    connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Limiter identity for a presented credential.
///
/// The limiter keys on a hash of the key rather than the key itself so the
/// raw credential never sits in an in-memory map.
fn credential_identity(api_key: &str) -> String {
    let digest = Sha256::digest(api_key.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
