// Mapping of application errors onto HTTP responses
use crate::application::dashboard_catalog::CatalogError;
use crate::application::persistence::PersistenceError;
use crate::application::session::SessionError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {}", self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        let status = match &e {
            SessionError::DashboardNotFound(_) | SessionError::PlacementNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SessionError::NoSpace(_) | SessionError::GestureActive => StatusCode::CONFLICT,
            SessionError::InvalidSize(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SessionError::Persistence(PersistenceError::DashboardNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            SessionError::Persistence(_) | SessionError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, e.to_string())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(e: PersistenceError) -> Self {
        SessionError::from(e).into()
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        let status = match &e {
            CatalogError::EmptyName | CatalogError::GridTooSmall { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CatalogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}
