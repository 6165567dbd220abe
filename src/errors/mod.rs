/// Unified error handling module
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Unified error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Failure of a single upstream provider call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("Invalid provider credential: {0}")]
    Unauthorized(String),
    #[error("Upstream request timed out: {0}")]
    Timeout(String),
    #[error("Upstream unreachable: {0}")]
    Unreachable(String),
}

impl UpstreamError {
    fn code(&self) -> &'static str {
        match self {
            UpstreamError::RateLimited(_) => "UPSTREAM_429",
            UpstreamError::Unauthorized(_) => "UPSTREAM_401",
            UpstreamError::Timeout(_) => "UPSTREAM_TIMEOUT",
            UpstreamError::Unreachable(_) => "UPSTREAM_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            UpstreamError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            UpstreamError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            UpstreamError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            UpstreamError::Unreachable(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the access key.
        let err = err.without_url();
        if err.is_timeout() {
            return UpstreamError::Timeout(err.to_string());
        }
        match err.status().map(|s| s.as_u16()) {
            Some(429) => UpstreamError::RateLimited(err.to_string()),
            Some(401) => UpstreamError::Unauthorized(err.to_string()),
            _ => UpstreamError::Unreachable(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid date range: {0}")]
    InvalidRange(String),
    #[error("No historical data: {0}")]
    NoHistoricalData(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Upstream(e) => (e.status(), e.code()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::InvalidRange(_) => (StatusCode::BAD_REQUEST, "INVALID_RANGE"),
            ApiError::NoHistoricalData(_) => (StatusCode::NOT_FOUND, "NO_HISTORICAL_DATA"),
            ApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let error_response = ErrorResponse {
            ok: false,
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_mapping() {
        let resp = ApiError::from(UpstreamError::RateLimited("slow down".into())).into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        let resp = ApiError::from(UpstreamError::Unauthorized("bad key".into())).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = ApiError::from(UpstreamError::Timeout("8s".into())).into_response();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_local_status_mapping() {
        let resp = ApiError::NotFound("flight".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = ApiError::InvalidRange("15 days".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError::NoHistoricalData("none".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_message_keeps_upstream_reason() {
        let err = ApiError::from(UpstreamError::Unreachable("connection refused".into()));
        assert!(err.to_string().contains("connection refused"));
    }
}
