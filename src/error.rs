use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Everything the dashboard core can report back to a caller.
///
/// None of these are fatal: the user retries or repeats the action.
#[derive(Debug, Clone, Display, PartialEq, Eq)]
pub enum DashboardError {
    /// Request could not complete, or the backend failed with a 5xx.
    #[display(fmt = "network failure: {}", _0)]
    Network(String),

    /// Rejected before any network call, or by the backend with a 400/409.
    #[display(fmt = "{}", _0)]
    Validation(String),

    /// Missing, expired or rejected bearer token.
    #[display(fmt = "authentication required: {}", _0)]
    Auth(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    /// Local durable store could not be read or written.
    #[display(fmt = "local storage error: {}", _0)]
    Storage(String),

    /// Backend answered with a body we could not read.
    #[display(fmt = "unexpected backend response: {}", _0)]
    Decode(String),
}

impl std::error::Error for DashboardError {}

pub type DashboardResult<T> = Result<T, DashboardError>;

impl DashboardError {
    pub fn validation(message: impl Into<String>) -> Self {
        DashboardError::Validation(message.into())
    }

    pub fn is_network(&self) -> bool {
        matches!(self, DashboardError::Network(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, DashboardError::Auth(_))
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            DashboardError::Decode(e.to_string())
        } else {
            DashboardError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(e: serde_json::Error) -> Self {
        DashboardError::Decode(e.to_string())
    }
}

impl ResponseError for DashboardError {
    fn status_code(&self) -> StatusCode {
        match self {
            DashboardError::Network(_) | DashboardError::Decode(_) => StatusCode::BAD_GATEWAY,
            DashboardError::Validation(_) => StatusCode::BAD_REQUEST,
            DashboardError::Auth(_) => StatusCode::UNAUTHORIZED,
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            // the view tears down and goes back to the login screen
            DashboardError::Auth(_) => json!({
                "error": self.to_string(),
                "redirect": "/login"
            }),
            _ => json!({ "error": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_maps_to_unauthorized_with_redirect() {
        let err = DashboardError::Auth("token expired".into());
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(err.is_auth());
        assert_eq!(err.to_string(), "authentication required: token expired");
    }

    #[test]
    fn validation_is_a_bad_request() {
        let err = DashboardError::validation("holiday already exists");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "holiday already exists");
    }

    #[test]
    fn network_failure_is_a_bad_gateway() {
        let err = DashboardError::Network("connection refused".into());
        assert!(err.is_network());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
