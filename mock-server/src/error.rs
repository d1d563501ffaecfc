//! Error responses in the backend's `{ sucesso: false, message }` shape.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum MockError {
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
}

impl MockError {
    pub fn not_found(what: &str) -> Self {
        MockError::NotFound(format!("{what} não encontrado"))
    }

    fn parts(self) -> (StatusCode, String) {
        match self {
            MockError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            MockError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            MockError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            MockError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        }
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let (status, message) = self.parts();
        tracing::debug!(status = status.as_u16(), %message, "request refused");
        (status, Json(json!({ "sucesso": false, "message": message }))).into_response()
    }
}

pub type MockResult<T> = Result<T, MockError>;
