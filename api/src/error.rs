//! API error type and its HTTP rendering.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use faucet_service::ServiceError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("{0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,
}

/// Body of every rejection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub reason: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_hours: Option<u64>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Service(e) => match e {
                ServiceError::Validation { .. } => StatusCode::BAD_REQUEST,
                ServiceError::Replay { .. } => StatusCode::CONFLICT,
                ServiceError::Eligibility { .. } => StatusCode::TOO_MANY_REQUESTS,
                ServiceError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
                ServiceError::Transport { .. } => StatusCode::BAD_GATEWAY,
                ServiceError::InsufficientFunds { .. } => StatusCode::SERVICE_UNAVAILABLE,
                ServiceError::Store(_) | ServiceError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Stable snake_case code for clients.
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::Service(e) => e.reason().as_str(),
            ApiError::BadRequest(_) => "invalid_request",
            ApiError::Unauthorized => "unauthorized",
            ApiError::NotFound => "not_found",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Service(ServiceError::Store(_) | ServiceError::Internal(_)) => {
                error!(error = %self, "request failed");
                "internal error".to_string()
            }
            other => {
                if status.is_server_error() {
                    warn!(status = status.as_u16(), error = %other, "request failed");
                }
                other.to_string()
            }
        };
        let remaining_hours = match &self {
            ApiError::Service(e) => e.remaining_hours(),
            _ => None,
        };

        let body = ErrorBody {
            success: false,
            error: message,
            reason: self.reason(),
            remaining_hours,
        };
        let mut response = (status, Json(body)).into_response();
        if let Some(hours) = remaining_hours {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(hours * 3600));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faucet_service::RejectReason;

    #[test]
    fn taxonomy_maps_to_one_status_each() {
        let cases = [
            (
                ServiceError::validation(RejectReason::InvalidWalletAddress, "bad"),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::replay(RejectReason::PostAlreadyUsed, "used"),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::Eligibility {
                    reason: RejectReason::Ineligible,
                    message: "wait".into(),
                    remaining_hours: 3,
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                ServiceError::Configuration("no key".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ServiceError::transport("down"), StatusCode::BAD_GATEWAY),
            (
                ServiceError::InsufficientFunds {
                    needed: 2,
                    available: 1,
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ServiceError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[test]
    fn cooldown_rejection_sets_retry_after() {
        let response = ApiError::from(ServiceError::Eligibility {
            reason: RejectReason::Ineligible,
            message: "Wallet must wait 3 hours before claiming again".into(),
            remaining_hours: 3,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "10800");
    }

    #[tokio::test]
    async fn internal_details_are_not_exposed() {
        let err = ApiError::from(ServiceError::Internal("secret path /x".into()));
        assert_eq!(err.reason(), "internal_error");
        let response = err.into_response();
        assert!(response.headers().get(header::RETRY_AFTER).is_none());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "internal error");
        assert_eq!(body["reason"], "internal_error");
        assert_eq!(body["success"], false);
    }
}
