//! Request handlers and their JSON shapes.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use faucet_ledger::VerificationReport;
use faucet_service::{ClaimReceipt, Eligibility, FaucetService, FaucetStatus, IssuedAttestation};
use faucet_types::ClaimRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;

/// Header flagging a history answer built without the ledger.
pub const RPC_STATUS_HEADER: HeaderName = HeaderName::from_static("x-rpc-status");

// ── Attestation ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPostRequest {
    #[serde(default, alias = "tweetUrl")]
    pub post_url: String,
    #[serde(default)]
    pub wallet_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPostResponse {
    pub success: bool,
    pub post_id: String,
    pub wallet_address: String,
    pub verified_at: String,
    pub verification_token: String,
}

impl From<IssuedAttestation> for VerifyPostResponse {
    fn from(issued: IssuedAttestation) -> Self {
        Self {
            success: true,
            post_id: issued.post_id.to_string(),
            wallet_address: issued.wallet_address.to_string(),
            verified_at: issued.verified_at.to_rfc3339(),
            verification_token: issued.token,
        }
    }
}

pub async fn verify_post(
    State(service): State<Arc<FaucetService>>,
    body: Result<Json<VerifyPostRequest>, JsonRejection>,
) -> Result<Json<VerifyPostResponse>, ApiError> {
    let Json(request) = body?;
    if request.post_url.trim().is_empty() || request.wallet_address.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Missing postUrl or walletAddress".into(),
        ));
    }
    let issued = service
        .issue_attestation(&request.post_url, &request.wallet_address)
        .await?;
    Ok(Json(issued.into()))
}

// ── Claim ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    #[serde(default)]
    pub wallet_address: String,
    pub verification_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub success: bool,
    pub signature: String,
    pub amount: u64,
    pub recipient: String,
    pub post_id: String,
    pub confirmation: VerificationReport,
    pub provisional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    pub claimed_at: String,
}

impl From<ClaimReceipt> for ClaimResponse {
    fn from(receipt: ClaimReceipt) -> Self {
        Self {
            success: true,
            signature: receipt.signature.to_string(),
            amount: receipt.amount.raw(),
            recipient: receipt.recipient.to_string(),
            post_id: receipt.post_id.to_string(),
            confirmation: receipt.confirmation,
            provisional: receipt.provisional,
            explorer_url: receipt.explorer_url,
            claimed_at: receipt.claimed_at.to_rfc3339(),
        }
    }
}

pub async fn claim(
    State(service): State<Arc<FaucetService>>,
    body: Result<Json<ClaimRequest>, JsonRejection>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let Json(request) = body?;
    let receipt = service
        .claim(
            &request.wallet_address,
            request.verification_token.as_deref(),
        )
        .await?;
    info!(
        wallet = %receipt.recipient,
        signature = %receipt.signature,
        provisional = receipt.provisional,
        "claim served"
    );
    Ok(Json(receipt.into()))
}

// ── Eligibility ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityQuery {
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResponse {
    pub eligible: bool,
    pub last_claim_time: Option<String>,
    pub next_claim_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_hours: Option<u64>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<Eligibility> for EligibilityResponse {
    fn from(e: Eligibility) -> Self {
        Self {
            eligible: e.eligible,
            last_claim_time: e.last_claim_time.map(|t| t.to_rfc3339()),
            next_claim_time: e.next_claim_time.map(|t| t.to_rfc3339()),
            remaining_hours: e.remaining_hours,
            message: e.message,
            warning: e.warning,
        }
    }
}

pub async fn eligibility(
    State(service): State<Arc<FaucetService>>,
    Path(wallet): Path<String>,
    query: Result<Query<EligibilityQuery>, QueryRejection>,
) -> Result<Json<EligibilityResponse>, ApiError> {
    let Query(query) = query?;
    let result = service
        .check_eligibility(&wallet, query.force_refresh)
        .await?;
    Ok(Json(result.into()))
}

// ── History ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub wallet_address: String,
    pub timestamp: String,
    pub amount: u64,
    pub tx_signature: String,
}

impl From<ClaimRecord> for HistoryEntry {
    fn from(record: ClaimRecord) -> Self {
        Self {
            id: record.id,
            wallet_address: record.wallet_address.to_string(),
            timestamp: record.timestamp.to_rfc3339(),
            amount: record.amount.raw(),
            tx_signature: record.tx_signature.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub records: Vec<HistoryEntry>,
    pub partial: bool,
}

/// `206 Partial Content` with `X-RPC-Status: unavailable` when the ledger
/// could not be read.
pub async fn history(
    State(service): State<Arc<FaucetService>>,
    Path(wallet): Path<String>,
) -> Result<Response, ApiError> {
    let history = service.history(&wallet).await?;
    let partial = history.partial;
    let body = Json(HistoryResponse {
        records: history.records.into_iter().map(Into::into).collect(),
        partial,
    });
    if partial {
        debug!(wallet = %wallet, "serving partial history");
        return Ok((
            StatusCode::PARTIAL_CONTENT,
            [(RPC_STATUS_HEADER, HeaderValue::from_static("unavailable"))],
            body,
        )
            .into_response());
    }
    Ok(body.into_response())
}

// ── Transaction verification ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTransactionRequest {
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub wallet_address: String,
}

pub async fn verify_transaction(
    State(service): State<Arc<FaucetService>>,
    body: Result<Json<VerifyTransactionRequest>, JsonRejection>,
) -> Result<Json<VerificationReport>, ApiError> {
    let Json(request) = body?;
    let report = service
        .verify_transaction(&request.signature, &request.wallet_address)
        .await?;
    Ok(Json(report))
}

// ── Status ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub faucet_configured: bool,
    pub faucet_address: Option<String>,
    pub balance: Option<u64>,
    /// Balance in whole tokens.
    pub balance_tokens: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_error: Option<String>,
    pub ledger_endpoint: String,
    pub claim_amount: u64,
    pub total_claims: u64,
}

impl From<FaucetStatus> for StatusResponse {
    fn from(s: FaucetStatus) -> Self {
        let (status, message) = match (s.faucet_configured, &s.balance_error) {
            (false, _) => ("error", "Faucet key not configured"),
            (true, Some(_)) => ("error", "Failed to connect to the ledger"),
            (true, None) => ("ok", "Faucet configured and connected"),
        };
        Self {
            status,
            message,
            faucet_configured: s.faucet_configured,
            faucet_address: s.faucet_address.map(|a| a.to_string()),
            balance: s.balance.map(|b| b.raw()),
            balance_tokens: s.balance.map(|b| b.as_tokens()),
            balance_error: s.balance_error,
            ledger_endpoint: s.ledger_endpoint,
            claim_amount: s.claim_amount.raw(),
            total_claims: s.total_claims,
        }
    }
}

pub async fn status(State(service): State<Arc<FaucetService>>) -> Json<StatusResponse> {
    Json(service.status().await.into())
}

// ── Ambient ──────────────────────────────────────────────────────────────

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

pub async fn metrics(State(service): State<Arc<FaucetService>>) -> Result<Response, ApiError> {
    if !service.config().enable_metrics {
        return Err(ApiError::NotFound);
    }
    let body = service
        .metrics()
        .encode()
        .map_err(|e| ApiError::Service(faucet_service::ServiceError::Internal(e.to_string())))?;
    Ok((
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; version=0.0.4"),
        )],
        body,
    )
        .into_response())
}

// ── Admin ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPostResponse {
    pub post_id: String,
    pub reset: bool,
}

/// Requires `Authorization: Bearer <admin_token>`. Hidden entirely when no
/// admin token is configured.
pub async fn reset_post(
    State(service): State<Arc<FaucetService>>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ResetPostResponse>, ApiError> {
    if !service.admin_enabled() {
        return Err(ApiError::NotFound);
    }
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;
    if !service.is_admin(token) {
        return Err(ApiError::Unauthorized);
    }
    let reset = service.reset_post(&post_id)?;
    info!(post = %post_id, reset, "post usage reset by admin");
    Ok(Json(ResetPostResponse { post_id, reset }))
}
