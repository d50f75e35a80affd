use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::api::polygon::PolygonError;

/// Every failure a graph request can end in.
///
/// Each variant maps to exactly one HTTP status and is rendered as
/// `{"error": "<message>"}` by `IntoResponse`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    InvalidParameter {
        field: &'static str,
        message: String,
    },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid Polygon.io API key")]
    ProviderAuthError,
    #[error("Ticker not found")]
    TickerNotFound,
    #[error("{}", provider_message(.0))]
    ProviderError(#[source] PolygonError),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Not found")]
    NotFound,
    #[error("Internal server error: {0}")]
    InternalError(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn provider_message(err: &PolygonError) -> &'static str {
    match err {
        PolygonError::Timeout => "Timed out fetching stock data",
        _ => "Error fetching stock data",
    }
}

impl ServiceError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::InvalidParameter {
            field,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::ProviderAuthError => StatusCode::FORBIDDEN,
            ServiceError::TickerNotFound | ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ServiceError::ProviderError(_) | ServiceError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<PolygonError> for ServiceError {
    fn from(err: PolygonError) -> Self {
        match err {
            PolygonError::Forbidden(_) => ServiceError::ProviderAuthError,
            PolygonError::NotFound(_) => ServiceError::TickerNotFound,
            other => ServiceError::ProviderError(other),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            match &self {
                ServiceError::ProviderError(source) => error!("Provider failure: {}", source),
                other => error!("{}", other),
            }
        } else if let ServiceError::InvalidParameter { field, message } = &self {
            warn!(field = *field, "Invalid parameter: {}", message);
        } else {
            warn!("Request rejected ({}): {}", status.as_u16(), self);
        }

        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        let mut response = (status, body).into_response();

        if matches!(self, ServiceError::Unauthorized) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"Login Required\""),
            );
        }
        if matches!(self, ServiceError::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET"));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::invalid("size", "bad"), 400),
            (ServiceError::Unauthorized, 401),
            (ServiceError::ProviderAuthError, 403),
            (ServiceError::TickerNotFound, 404),
            (ServiceError::NotFound, 404),
            (ServiceError::MethodNotAllowed, 405),
            (ServiceError::ProviderError(PolygonError::Timeout), 500),
            (ServiceError::InternalError("boom".to_string()), 500),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{:?}", err);
        }
    }

    #[test]
    fn test_polygon_error_conversion() {
        assert!(matches!(
            ServiceError::from(PolygonError::Forbidden("bad key".to_string())),
            ServiceError::ProviderAuthError
        ));
        assert!(matches!(
            ServiceError::from(PolygonError::NotFound("NOPE".to_string())),
            ServiceError::TickerNotFound
        ));
        assert!(matches!(
            ServiceError::from(PolygonError::ServerError(502, String::new())),
            ServiceError::ProviderError(PolygonError::ServerError(502, _))
        ));
    }

    #[test]
    fn test_provider_messages() {
        assert_eq!(
            ServiceError::ProviderError(PolygonError::Timeout).to_string(),
            "Timed out fetching stock data"
        );
        assert_eq!(
            ServiceError::ProviderError(PolygonError::HttpError(418, String::new())).to_string(),
            "Error fetching stock data"
        );
    }

    #[test]
    fn test_unauthorized_response_has_challenge() {
        let response = ServiceError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"Login Required\""
        );
    }
}
